//! Canvas: runtime editing state wiring input to tools, selection and scene.

use crate::config::EditorConfig;
use crate::error::{SceneError, SceneResult};
use crate::input::{DoubleClickDetector, InputEvent, Key, Modifiers, MouseButton};
use crate::render::{RenderLayer, render_list};
use crate::scene::Scene;
use crate::selection::{HandleKind, SelectMode, Selection};
use crate::shape::{Shape, ShapeId};
use crate::style::StyleResolver;
use crate::tools::{ToolContext, ToolEffect, ToolEvent, ToolKind, ToolManager};
use kurbo::{Point, Rect, Vec2};

/// Zoom step applied per scroll notch.
const SCROLL_ZOOM_FACTOR: f64 = 1.1;

/// Scale factors below this are ignored while resizing.
const MIN_RESIZE_SCALE: f64 = 1e-3;

/// In-flight pointer gesture of the select tool (and middle-button panning).
#[derive(Debug, Clone, Default, PartialEq)]
enum Gesture {
    #[default]
    None,
    /// Dragging selected shapes. Undo is pushed on the first real movement.
    Moving { last: Point, undo_pushed: bool },
    /// Dragging a selection handle.
    Resizing {
        kind: HandleKind,
        anchor: Point,
        grab: Point,
        applied: Vec2,
        undo_pushed: bool,
    },
    /// Rubber-band selection in world coordinates.
    Marquee {
        start: Point,
        current: Point,
        additive: bool,
    },
    /// Camera pan in device pixels.
    Panning { last: Point },
}

/// What a single input event changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanvasResponse {
    /// Something visible changed (scene, preview, marquee or camera).
    pub redraw: bool,
    /// Scene content changed.
    pub scene_changed: bool,
    pub selection_changed: bool,
    /// Shape committed by a creation tool.
    pub committed: Option<ShapeId>,
    /// An edit was refused.
    pub rejected: Option<SceneError>,
}

impl CanvasResponse {
    fn redraw() -> Self {
        Self {
            redraw: true,
            ..Self::default()
        }
    }

    fn changed() -> Self {
        Self {
            redraw: true,
            scene_changed: true,
            ..Self::default()
        }
    }

    fn selection() -> Self {
        Self {
            redraw: true,
            selection_changed: true,
            ..Self::default()
        }
    }
}

/// Runtime canvas state (not persisted).
#[derive(Debug, Clone)]
pub struct Canvas {
    /// The draft being edited.
    pub scene: Scene,
    pub selection: Selection,
    pub tools: ToolManager,
    pub config: EditorConfig,
    double_click: DoubleClickDetector,
    gesture: Gesture,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Canvas {
    /// Create a canvas with an empty scene.
    pub fn new(config: EditorConfig) -> Self {
        let scene = Scene::from_config(&config);
        Self::with_scene(scene, config)
    }

    /// Create a canvas editing an existing scene.
    pub fn with_scene(mut scene: Scene, config: EditorConfig) -> Self {
        scene.set_max_undo_history(config.max_undo_history);
        Self {
            scene,
            selection: Selection::new(),
            tools: ToolManager::new(),
            double_click: DoubleClickDetector::new(
                config.double_click_ms,
                config.double_click_distance,
            ),
            config,
            gesture: Gesture::None,
        }
    }

    /// Set the current tool, cancelling any construction in progress.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.gesture = Gesture::None;
        if self.tools.set_tool(tool) {
            log::debug!("construction cancelled by switching to {tool:?}");
        }
    }

    /// The in-progress construction, for drawing over the scene.
    pub fn preview(&self) -> Option<Shape> {
        self.tools.preview()
    }

    /// The rubber-band selection rectangle in world coordinates.
    pub fn marquee(&self) -> Option<Rect> {
        match self.gesture {
            Gesture::Marquee { start, current, .. } => Some(Rect::from_points(start, current)),
            _ => None,
        }
    }

    /// Render list of the current scene.
    pub fn render(&self, resolver: &dyn StyleResolver) -> Vec<RenderLayer> {
        render_list(&self.scene, resolver)
    }

    /// Fit the view to show all shapes.
    pub fn fit_to_content(&mut self) {
        self.scene.fit_to_content(50.0);
    }

    fn hit_tolerance(&self) -> f64 {
        self.scene.camera.world_tolerance(self.config.hit_tolerance_px)
    }

    // --- input routing ---

    /// Route one host event. Positions are device pixels.
    pub fn handle_input(
        &mut self,
        event: InputEvent,
        resolver: &dyn StyleResolver,
    ) -> CanvasResponse {
        match event {
            InputEvent::Resize { width, height } => {
                self.scene.camera.set_viewport(width, height);
                CanvasResponse::redraw()
            }
            InputEvent::Scroll { position, delta } => {
                if delta.y == 0.0 {
                    return CanvasResponse::default();
                }
                let factor = if delta.y < 0.0 {
                    SCROLL_ZOOM_FACTOR
                } else {
                    1.0 / SCROLL_ZOOM_FACTOR
                };
                self.scene.camera.zoom_at(position, factor);
                CanvasResponse::redraw()
            }
            InputEvent::PointerDown {
                position,
                button,
                modifiers,
            } => self.pointer_down(position, button, modifiers, resolver),
            InputEvent::PointerMove { position, .. } => self.pointer_move(position, resolver),
            InputEvent::PointerUp {
                position, button, ..
            } => self.pointer_up(position, button, resolver),
            InputEvent::KeyDown { key, modifiers } => self.key_down(key, modifiers, resolver),
            InputEvent::KeyUp { .. } => CanvasResponse::default(),
        }
    }

    fn pointer_down(
        &mut self,
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
        resolver: &dyn StyleResolver,
    ) -> CanvasResponse {
        match button {
            MouseButton::Middle => {
                self.gesture = Gesture::Panning { last: position };
                return CanvasResponse::default();
            }
            MouseButton::Right => return CanvasResponse::default(),
            MouseButton::Left => {}
        }

        let world = self.scene.camera.screen_to_world(position);
        let double = self.double_click.register(position);

        if self.tools.current_tool.is_creation() {
            let mut response = self.run_tool(ToolEvent::PointerDown(world), resolver);
            if double && self.tools.is_active() {
                let second = self.run_tool(ToolEvent::DoubleClick(world), resolver);
                response = merge(response, second);
            }
            return response;
        }
        self.select_down(world, modifiers.shift)
    }

    fn pointer_move(&mut self, position: Point, resolver: &dyn StyleResolver) -> CanvasResponse {
        if let Gesture::Panning { last } = self.gesture {
            self.scene.camera.pan(position - last);
            self.gesture = Gesture::Panning { last: position };
            return CanvasResponse::redraw();
        }
        let world = self.scene.camera.screen_to_world(position);
        if self.tools.current_tool.is_creation() {
            return self.run_tool(ToolEvent::PointerMove(world), resolver);
        }
        self.select_move(world)
    }

    fn pointer_up(
        &mut self,
        position: Point,
        button: MouseButton,
        resolver: &dyn StyleResolver,
    ) -> CanvasResponse {
        if matches!(self.gesture, Gesture::Panning { .. }) {
            self.gesture = Gesture::None;
            return CanvasResponse::default();
        }
        if button != MouseButton::Left {
            return CanvasResponse::default();
        }
        let world = self.scene.camera.screen_to_world(position);
        if self.tools.current_tool.is_creation() {
            return self.run_tool(ToolEvent::PointerUp(world), resolver);
        }
        self.select_up(world)
    }

    fn key_down(
        &mut self,
        key: Key,
        modifiers: Modifiers,
        resolver: &dyn StyleResolver,
    ) -> CanvasResponse {
        if self.tools.is_active() {
            return self.run_tool(ToolEvent::KeyDown(key), resolver);
        }

        if modifiers.command() {
            return match key {
                Key::Char('z') if modifiers.shift => self.redo_response(),
                Key::Char('z') => self.undo_response(),
                Key::Char('y') => self.redo_response(),
                Key::Char('a') => {
                    self.select_all();
                    CanvasResponse::selection()
                }
                Key::Char('d') => {
                    if self.duplicate_selected().is_empty() {
                        CanvasResponse::default()
                    } else {
                        CanvasResponse {
                            selection_changed: true,
                            ..CanvasResponse::changed()
                        }
                    }
                }
                _ => CanvasResponse::default(),
            };
        }

        match key {
            Key::Delete | Key::Backspace => {
                if self.delete_selected() > 0 {
                    CanvasResponse {
                        selection_changed: true,
                        ..CanvasResponse::changed()
                    }
                } else {
                    CanvasResponse::default()
                }
            }
            Key::Escape => {
                let had_gesture = self.gesture != Gesture::None;
                self.gesture = Gesture::None;
                if self.selection.is_empty(&self.scene) && !had_gesture {
                    return CanvasResponse::default();
                }
                self.selection.clear();
                CanvasResponse::selection()
            }
            _ => CanvasResponse::default(),
        }
    }

    // --- creation tools ---

    fn run_tool(&mut self, event: ToolEvent, resolver: &dyn StyleResolver) -> CanvasResponse {
        let effect = {
            let ctx = ToolContext::for_scene(&self.scene, resolver, &self.config);
            self.tools.handle(event, &ctx)
        };
        match effect {
            ToolEffect::Committed(shape) => match self.commit_shape(shape) {
                Ok(id) => CanvasResponse {
                    committed: Some(id),
                    ..CanvasResponse::changed()
                },
                Err(err) => {
                    log::info!("commit refused: {err}");
                    CanvasResponse {
                        rejected: Some(err),
                        ..CanvasResponse::redraw()
                    }
                }
            },
            ToolEffect::Ignored => CanvasResponse::default(),
            ToolEffect::Began
            | ToolEffect::Updated
            | ToolEffect::Discarded
            | ToolEffect::Cancelled => CanvasResponse::redraw(),
        }
    }

    /// Add a finished shape to the active layer as one undoable step.
    ///
    /// Missing style references are taken from the layer defaults. The
    /// selection is left untouched.
    pub fn commit_shape(&mut self, mut shape: Shape) -> SceneResult<ShapeId> {
        let layer = self.scene.active_layer();
        if layer.locked {
            return Err(SceneError::LayerLocked(layer.name.clone()));
        }
        layer.apply_defaults(&mut shape);
        self.scene.push_undo();
        Ok(self.scene.add_shape(shape))
    }

    // --- select tool ---

    fn select_down(&mut self, world: Point, additive: bool) -> CanvasResponse {
        let handle_tolerance = self
            .scene
            .camera
            .world_tolerance(self.config.handle_tolerance_px);
        if !additive && !self.selection.editable_ids(&self.scene).is_empty() {
            let handle = self
                .selection
                .handles(&self.scene)
                .into_iter()
                .find(|h| h.hit_test(world, handle_tolerance));
            if let (Some(handle), Some(bounds)) =
                (handle, self.selection.combined_bounds(&self.scene))
            {
                self.gesture = Gesture::Resizing {
                    kind: handle.kind,
                    anchor: handle.kind.anchor(bounds),
                    grab: handle.position,
                    applied: Vec2::new(1.0, 1.0),
                    undo_pushed: false,
                };
                return CanvasResponse::default();
            }
        }

        let tolerance = self.hit_tolerance();
        match self.scene.hit_test_topmost(world, tolerance) {
            Some(id) if additive => {
                self.selection.select_at(&self.scene, world, tolerance, true);
                log::debug!("toggled {id} in selection");
                CanvasResponse::selection()
            }
            Some(id) => {
                let changed = !self.selection.contains(&self.scene, id);
                if changed {
                    self.selection.select_at(&self.scene, world, tolerance, false);
                }
                self.gesture = Gesture::Moving {
                    last: world,
                    undo_pushed: false,
                };
                if changed {
                    CanvasResponse::selection()
                } else {
                    CanvasResponse::default()
                }
            }
            None => {
                let had_selection = !self.selection.is_empty(&self.scene);
                if !additive {
                    self.selection.clear();
                }
                self.gesture = Gesture::Marquee {
                    start: world,
                    current: world,
                    additive,
                };
                CanvasResponse {
                    selection_changed: had_selection && !additive,
                    ..CanvasResponse::redraw()
                }
            }
        }
    }

    fn select_move(&mut self, world: Point) -> CanvasResponse {
        match self.gesture.clone() {
            Gesture::Moving { last, undo_pushed } => {
                let delta = world - last;
                let ids = self.selection.editable_ids(&self.scene);
                if delta.hypot2() == 0.0 || ids.is_empty() {
                    return CanvasResponse::default();
                }
                if !undo_pushed {
                    self.scene.push_undo();
                }
                for id in ids {
                    if let Some(shape) = self.scene.find_shape_mut(id) {
                        if let Err(err) = shape.translate(delta) {
                            log::warn!("move of {id} rejected: {err}");
                        }
                    }
                }
                self.gesture = Gesture::Moving {
                    last: world,
                    undo_pushed: true,
                };
                CanvasResponse::changed()
            }
            Gesture::Resizing {
                kind,
                anchor,
                grab,
                applied,
                undo_pushed,
            } => {
                let (scale_x, scale_y) = kind.axes();
                let axis_scale = |enabled: bool, target: f64, grab: f64, anchor: f64| {
                    let span = grab - anchor;
                    if !enabled || span.abs() < MIN_RESIZE_SCALE {
                        1.0
                    } else {
                        (target - anchor) / span
                    }
                };
                let wanted = Vec2::new(
                    axis_scale(scale_x, world.x, grab.x, anchor.x),
                    axis_scale(scale_y, world.y, grab.y, anchor.y),
                );
                if wanted.x.abs() < MIN_RESIZE_SCALE || wanted.y.abs() < MIN_RESIZE_SCALE {
                    return CanvasResponse::default();
                }
                let step = Vec2::new(wanted.x / applied.x, wanted.y / applied.y);
                let ids = self.selection.editable_ids(&self.scene);
                if ids.is_empty() {
                    return CanvasResponse::default();
                }
                if !undo_pushed {
                    self.scene.push_undo();
                }
                for id in ids {
                    if let Some(shape) = self.scene.find_shape_mut(id) {
                        if let Err(err) = shape.scale_about(step.x, step.y, anchor) {
                            log::warn!("resize of {id} rejected: {err}");
                        }
                    }
                }
                self.gesture = Gesture::Resizing {
                    kind,
                    anchor,
                    grab,
                    applied: wanted,
                    undo_pushed: true,
                };
                CanvasResponse::changed()
            }
            Gesture::Marquee {
                start, additive, ..
            } => {
                self.gesture = Gesture::Marquee {
                    start,
                    current: world,
                    additive,
                };
                CanvasResponse::redraw()
            }
            Gesture::None | Gesture::Panning { .. } => CanvasResponse::default(),
        }
    }

    fn select_up(&mut self, world: Point) -> CanvasResponse {
        let gesture = std::mem::take(&mut self.gesture);
        let Gesture::Marquee {
            start, additive, ..
        } = gesture
        else {
            return CanvasResponse::default();
        };
        let rect = Rect::from_points(start, world);
        let tolerance = self.hit_tolerance();
        if rect.width() < tolerance && rect.height() < tolerance {
            return CanvasResponse::redraw();
        }
        // Left-to-right drags pick enclosed shapes, right-to-left drags pick crossed ones.
        let mode = if world.x >= start.x {
            SelectMode::Contain
        } else {
            SelectMode::Intersect
        };
        let previous = self.selection.ids(&self.scene);
        self.selection.select_in_rect(&self.scene, rect, mode);
        if additive {
            let picked = self.selection.ids(&self.scene);
            self.selection
                .set(&self.scene, previous.into_iter().chain(picked));
        }
        CanvasResponse::selection()
    }

    // --- commands ---

    fn undo_response(&mut self) -> CanvasResponse {
        if self.undo() {
            CanvasResponse {
                selection_changed: true,
                ..CanvasResponse::changed()
            }
        } else {
            CanvasResponse::default()
        }
    }

    fn redo_response(&mut self) -> CanvasResponse {
        if self.redo() {
            CanvasResponse {
                selection_changed: true,
                ..CanvasResponse::changed()
            }
        } else {
            CanvasResponse::default()
        }
    }

    pub fn undo(&mut self) -> bool {
        self.tools.cancel();
        self.gesture = Gesture::None;
        let undone = self.scene.undo();
        self.selection.prune(&self.scene);
        undone
    }

    pub fn redo(&mut self) -> bool {
        self.tools.cancel();
        self.gesture = Gesture::None;
        let redone = self.scene.redo();
        self.selection.prune(&self.scene);
        redone
    }

    /// Select every editable shape.
    pub fn select_all(&mut self) -> usize {
        self.selection.select_all(&self.scene)
    }

    /// Delete the editable selected shapes. Returns how many were removed.
    pub fn delete_selected(&mut self) -> usize {
        let ids = self.selection.editable_ids(&self.scene);
        if ids.is_empty() {
            return 0;
        }
        self.scene.push_undo();
        let removed = ids
            .into_iter()
            .filter(|id| self.scene.remove_shape(*id).is_ok())
            .count();
        self.selection.prune(&self.scene);
        removed
    }

    /// Copy the editable selected shapes, offset by the configured distance,
    /// onto their own layers. The copies become the selection.
    pub fn duplicate_selected(&mut self) -> Vec<ShapeId> {
        let ids = self.paint_ordered_editable_selection();
        if ids.is_empty() {
            return Vec::new();
        }
        self.scene.push_undo();
        let offset = Vec2::new(self.config.duplicate_offset, self.config.duplicate_offset);
        let mut copies = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(source) = self.scene.find_shape(id) else {
                continue;
            };
            let layer = source.layer();
            let mut copy = source.duplicate();
            if let Err(err) = copy.translate(offset) {
                log::warn!("duplicate of {id} skipped: {err}");
                continue;
            }
            match self.scene.add_shape_to(layer, copy) {
                Ok(new_id) => copies.push(new_id),
                Err(err) => log::warn!("duplicate of {id} skipped: {err}"),
            }
        }
        self.selection.set(&self.scene, copies.iter().copied());
        copies
    }

    /// Bring the editable selected shapes to the front of their layers,
    /// keeping their relative order.
    pub fn bring_selected_to_front(&mut self) -> bool {
        let ids = self.paint_ordered_editable_selection();
        self.reorder(ids, |layer, id| layer.bring_to_front(id))
    }

    /// Send the editable selected shapes to the back of their layers,
    /// keeping their relative order.
    pub fn send_selected_to_back(&mut self) -> bool {
        let mut ids = self.paint_ordered_editable_selection();
        ids.reverse();
        self.reorder(ids, |layer, id| layer.send_to_back(id))
    }

    fn reorder(
        &mut self,
        ids: Vec<ShapeId>,
        op: impl Fn(&mut crate::layer::Layer, ShapeId) -> bool,
    ) -> bool {
        if ids.is_empty() {
            return false;
        }
        self.scene.with_undo(|scene| {
            let before: Vec<ShapeId> = scene.shapes().map(Shape::id).collect();
            for id in ids {
                let Some((layer_id, _)) = scene.shape_location(id) else {
                    continue;
                };
                if let Ok(layer) = scene.layer_mut(layer_id) {
                    op(layer, id);
                }
            }
            scene.shapes().map(Shape::id).ne(before)
        })
    }

    fn paint_ordered_editable_selection(&self) -> Vec<ShapeId> {
        let editable = self.selection.editable_ids(&self.scene);
        self.scene
            .shapes()
            .map(Shape::id)
            .filter(|id| editable.contains(id))
            .collect()
    }
}

fn merge(a: CanvasResponse, b: CanvasResponse) -> CanvasResponse {
    CanvasResponse {
        redraw: a.redraw || b.redraw,
        scene_changed: a.scene_changed || b.scene_changed,
        selection_changed: a.selection_changed || b.selection_changed,
        committed: b.committed.or(a.committed),
        rejected: b.rejected.or(a.rejected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{Line, Primitive, Rectangle};
    use crate::style::{FillRef, StrokeRef, StyleLibrary};

    fn canvas() -> Canvas {
        Canvas::default()
    }

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Shape {
        Shape::new(Primitive::Rectangle(Rectangle::new(Point::new(x, y), w, h)))
    }

    fn feed(canvas: &mut Canvas, events: Vec<InputEvent>) -> Vec<CanvasResponse> {
        let lib = StyleLibrary::with_defaults();
        events
            .into_iter()
            .map(|e| canvas.handle_input(e, &lib))
            .collect()
    }

    #[test]
    fn test_line_tool_commits_to_active_layer() {
        let mut canvas = canvas();
        canvas.set_tool(ToolKind::Line);
        let responses = feed(
            &mut canvas,
            vec![
                InputEvent::down(0.0, 0.0),
                InputEvent::moved(10.0, 0.0),
                InputEvent::up(10.0, 0.0),
            ],
        );
        let id = responses[2].committed.expect("line committed");
        let layer = canvas.scene.active_layer();
        assert_eq!(layer.shape_ids(), vec![id]);
        assert_eq!(
            layer.shape(id).map(|s| &s.primitive),
            Some(&Primitive::Line(Line::new(Point::ZERO, Point::new(10.0, 0.0))))
        );
        assert!(canvas.scene.can_undo());
        assert!(canvas.selection.is_empty(&canvas.scene));
    }

    #[test]
    fn test_zero_length_line_adds_nothing() {
        let mut canvas = canvas();
        canvas.set_tool(ToolKind::Line);
        feed(
            &mut canvas,
            vec![
                InputEvent::down(0.0, 0.0),
                InputEvent::moved(10.0, 0.0),
                InputEvent::up(0.0, 0.0),
            ],
        );
        assert!(canvas.scene.is_empty());
        assert!(!canvas.scene.can_undo());
    }

    #[test]
    fn test_commit_inherits_layer_defaults() {
        let mut canvas = canvas();
        canvas.scene.active_layer_mut().default_stroke = Some(StrokeRef::new("pen.center"));
        canvas.set_tool(ToolKind::Line);
        let responses = feed(
            &mut canvas,
            vec![InputEvent::down(0.0, 0.0), InputEvent::up(30.0, 0.0)],
        );
        let id = responses[1].committed.expect("line committed");
        assert_eq!(
            canvas.scene.shape(id).unwrap().stroke,
            Some(StrokeRef::new("pen.center"))
        );
    }

    #[test]
    fn test_commit_shape_fills_missing_styles_from_layer() {
        let mut canvas = canvas();
        {
            let layer = canvas.scene.active_layer_mut();
            layer.default_stroke = Some(StrokeRef::new("pen.center"));
            layer.default_fill = Some(FillRef::new("brush.white"));
        }
        let boxed = canvas.commit_shape(rect(0.0, 0.0, 10.0, 10.0)).unwrap();
        let open = canvas
            .commit_shape(Shape::new(Primitive::Line(Line::new(Point::ZERO, Point::new(5.0, 0.0)))))
            .unwrap();
        let boxed = canvas.scene.shape(boxed).unwrap();
        assert_eq!(boxed.stroke, Some(StrokeRef::new("pen.center")));
        assert_eq!(boxed.fill, Some(FillRef::new("brush.white")));
        assert_eq!(canvas.scene.shape(open).unwrap().fill, None);
        assert!(canvas.scene.can_undo());
    }

    #[test]
    fn test_commit_refused_on_locked_layer() {
        let mut canvas = canvas();
        canvas.scene.active_layer_mut().set_locked(true);
        canvas.set_tool(ToolKind::Rectangle);
        let responses = feed(
            &mut canvas,
            vec![InputEvent::down(0.0, 0.0), InputEvent::up(30.0, 30.0)],
        );
        assert!(matches!(responses[1].rejected, Some(SceneError::LayerLocked(_))));
        assert!(canvas.scene.is_empty());
    }

    #[test]
    fn test_polyline_via_double_click() {
        let mut canvas = canvas();
        canvas.set_tool(ToolKind::Polyline);
        let responses = feed(
            &mut canvas,
            vec![
                InputEvent::down(0.0, 0.0),
                InputEvent::up(0.0, 0.0),
                InputEvent::down(50.0, 50.0),
                InputEvent::up(50.0, 50.0),
                InputEvent::down(100.0, 0.0),
                InputEvent::up(100.0, 0.0),
                InputEvent::down(100.0, 0.0),
            ],
        );
        let id = responses[6].committed.expect("polyline committed");
        let poly = canvas.scene.shape(id).unwrap().primitive.as_polyline().cloned();
        assert_eq!(poly.map(|p| p.points.len()), Some(3));
    }

    #[test]
    fn test_click_selects_topmost_and_drag_moves() {
        let mut canvas = canvas();
        let _below = canvas.scene.add_shape(rect(0.0, 0.0, 100.0, 100.0));
        let top = canvas.scene.add_shape(rect(0.0, 0.0, 100.0, 100.0));

        let responses = feed(
            &mut canvas,
            vec![
                InputEvent::down(100.0, 50.0),
                InputEvent::moved(110.0, 60.0),
                InputEvent::up(110.0, 60.0),
            ],
        );
        assert!(responses[0].selection_changed);
        assert_eq!(canvas.selection.ids(&canvas.scene), vec![top]);
        let bounds = canvas.scene.shape(top).unwrap().world_bounds().unwrap();
        assert!((bounds.x0 - 10.0).abs() < 1e-9);
        assert!((bounds.y0 - 10.0).abs() < 1e-9);

        assert!(canvas.undo());
        let bounds = canvas.scene.shape(top).unwrap().world_bounds().unwrap();
        assert!(bounds.x0.abs() < 1e-9);
    }

    #[test]
    fn test_locked_shape_selected_but_not_moved() {
        let mut canvas = canvas();
        let mut locked = rect(0.0, 0.0, 100.0, 100.0);
        locked.locked = true;
        let id = canvas.scene.add_shape(locked);
        feed(
            &mut canvas,
            vec![
                InputEvent::down(100.0, 50.0),
                InputEvent::moved(150.0, 50.0),
                InputEvent::up(150.0, 50.0),
            ],
        );
        assert!(canvas.selection.contains(&canvas.scene, id));
        let bounds = canvas.scene.shape(id).unwrap().world_bounds().unwrap();
        assert!(bounds.x0.abs() < 1e-9);
        assert!(!canvas.scene.can_undo());
    }

    #[test]
    fn test_shift_click_toggles() {
        let mut canvas = canvas();
        let a = canvas.scene.add_shape(rect(0.0, 0.0, 10.0, 10.0));
        let b = canvas.scene.add_shape(rect(100.0, 0.0, 10.0, 10.0));
        let shift_down = |x: f64, y: f64| InputEvent::PointerDown {
            position: Point::new(x, y),
            button: MouseButton::Left,
            modifiers: Modifiers::shift(),
        };
        feed(
            &mut canvas,
            vec![
                InputEvent::down(10.0, 5.0),
                InputEvent::up(10.0, 5.0),
                shift_down(110.0, 5.0),
                InputEvent::up(110.0, 5.0),
            ],
        );
        assert_eq!(canvas.selection.ids(&canvas.scene), vec![a, b]);
    }

    #[test]
    fn test_marquee_window_and_crossing() {
        let mut canvas = canvas();
        let inside = canvas.scene.add_shape(rect(10.0, 10.0, 20.0, 20.0));
        let crossing = canvas.scene.add_shape(rect(40.0, 10.0, 100.0, 20.0));

        feed(
            &mut canvas,
            vec![
                InputEvent::down(0.0, 0.0),
                InputEvent::moved(60.0, 60.0),
                InputEvent::up(60.0, 60.0),
            ],
        );
        assert_eq!(canvas.selection.ids(&canvas.scene), vec![inside]);

        feed(
            &mut canvas,
            vec![
                InputEvent::down(60.0, 60.0),
                InputEvent::moved(0.0, 0.0),
                InputEvent::up(0.0, 0.0),
            ],
        );
        assert_eq!(canvas.selection.ids(&canvas.scene), vec![inside, crossing]);
        assert!(canvas.marquee().is_none());
    }

    #[test]
    fn test_handle_resize() {
        let mut canvas = canvas();
        let id = canvas.scene.add_shape(rect(0.0, 0.0, 100.0, 100.0));
        canvas.selection.select(&canvas.scene, id).unwrap();
        feed(
            &mut canvas,
            vec![
                InputEvent::down(100.0, 100.0),
                InputEvent::moved(150.0, 150.0),
                InputEvent::moved(200.0, 200.0),
                InputEvent::up(200.0, 200.0),
            ],
        );
        let bounds = canvas.scene.shape(id).unwrap().world_bounds().unwrap();
        assert!((bounds.x1 - 200.0).abs() < 1e-6);
        assert!((bounds.y1 - 200.0).abs() < 1e-6);
        assert!(bounds.x0.abs() < 1e-6);
    }

    #[test]
    fn test_delete_key_and_undo() {
        let mut canvas = canvas();
        let id = canvas.scene.add_shape(rect(0.0, 0.0, 10.0, 10.0));
        canvas.select_all();
        let responses = feed(&mut canvas, vec![InputEvent::key(Key::Delete)]);
        assert!(responses[0].scene_changed);
        assert!(!canvas.scene.contains_shape(id));
        assert!(canvas.selection.is_empty(&canvas.scene));

        let undo = InputEvent::KeyDown {
            key: Key::Char('z'),
            modifiers: Modifiers::ctrl(),
        };
        feed(&mut canvas, vec![undo]);
        assert!(canvas.scene.contains_shape(id));
    }

    #[test]
    fn test_escape_cancels_construction_before_selection() {
        let mut canvas = canvas();
        let id = canvas.scene.add_shape(rect(0.0, 0.0, 10.0, 10.0));
        canvas.selection.select(&canvas.scene, id).unwrap();
        canvas.set_tool(ToolKind::Polyline);
        feed(
            &mut canvas,
            vec![InputEvent::down(50.0, 50.0), InputEvent::key(Key::Escape)],
        );
        assert!(canvas.preview().is_none());
        assert!(canvas.selection.contains(&canvas.scene, id));
    }

    #[test]
    fn test_duplicate_and_reorder() {
        let mut canvas = canvas();
        let a = canvas.scene.add_shape(rect(0.0, 0.0, 10.0, 10.0));
        let b = canvas.scene.add_shape(rect(20.0, 0.0, 10.0, 10.0));
        canvas.selection.select(&canvas.scene, a).unwrap();

        let copies = canvas.duplicate_selected();
        assert_eq!(copies.len(), 1);
        assert_ne!(copies[0], a);
        let bounds = canvas.scene.shape(copies[0]).unwrap().world_bounds().unwrap();
        assert!((bounds.x0 - 10.0).abs() < 1e-9);
        assert_eq!(canvas.selection.ids(&canvas.scene), copies);

        canvas.selection.select(&canvas.scene, a).unwrap();
        assert!(canvas.bring_selected_to_front());
        assert_eq!(canvas.scene.active_layer().shape_ids(), vec![b, copies[0], a]);
        assert!(canvas.send_selected_to_back());
        assert_eq!(canvas.scene.active_layer().shape_ids(), vec![a, b, copies[0]]);
    }

    #[test]
    fn test_reorder_without_effect_adds_no_undo_step() {
        let mut canvas = canvas();
        let a = canvas.scene.add_shape(rect(0.0, 0.0, 10.0, 10.0));
        let b = canvas.scene.add_shape(rect(20.0, 0.0, 10.0, 10.0));
        canvas.scene.clear_history();
        canvas.selection.set(&canvas.scene, [a, b]);

        assert!(!canvas.bring_selected_to_front());
        assert!(!canvas.scene.can_undo());
        assert!(!canvas.send_selected_to_back());
        assert!(!canvas.scene.can_undo());

        canvas.selection.set(&canvas.scene, [a]);
        assert!(canvas.bring_selected_to_front());
        assert!(canvas.scene.can_undo());
        assert!(canvas.undo());
        assert_eq!(canvas.scene.active_layer().shape_ids(), vec![a, b]);
    }

    #[test]
    fn test_resize_and_scroll_only_touch_camera() {
        let mut canvas = canvas();
        canvas.scene.add_shape(rect(0.0, 0.0, 10.0, 10.0));
        canvas.scene.mark_saved();
        feed(
            &mut canvas,
            vec![
                InputEvent::Resize {
                    width: 1024.0,
                    height: 768.0,
                },
                InputEvent::Scroll {
                    position: Point::new(100.0, 100.0),
                    delta: Vec2::new(0.0, -1.0),
                },
            ],
        );
        assert_eq!(canvas.scene.camera.viewport.width, 1024.0);
        assert!(canvas.scene.camera.zoom > 1.0);
        assert!(!canvas.scene.is_modified());
    }

    #[test]
    fn test_middle_drag_pans() {
        let mut canvas = canvas();
        let down = InputEvent::PointerDown {
            position: Point::new(10.0, 10.0),
            button: MouseButton::Middle,
            modifiers: Modifiers::NONE,
        };
        let up = InputEvent::PointerUp {
            position: Point::new(40.0, 30.0),
            button: MouseButton::Middle,
            modifiers: Modifiers::NONE,
        };
        feed(&mut canvas, vec![down, InputEvent::moved(40.0, 30.0), up]);
        assert_eq!(canvas.scene.camera.offset, Vec2::new(30.0, 20.0));
    }
}
