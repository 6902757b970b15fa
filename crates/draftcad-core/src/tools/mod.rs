//! Tool system: converts world-space input into shape constructions.
//!
//! Each tool is an explicit state machine. [`ToolManager::handle`] maps
//! `(state, event)` to `(state', effect)`; the caller applies the effect
//! (adding a committed shape to the active layer, repainting a preview).
//! Tools never touch the scene or the selection directly.

mod create;
mod image;
mod polyline;

pub use create::{CreateParams, DragConstruction, build_primitive};
pub use image::resolve_frame;
pub use polyline::{PolylineConstruction, VertexOutcome};

use crate::config::EditorConfig;
use crate::input::Key;
use crate::primitives::Primitive;
use crate::scene::Scene;
use crate::shape::Shape;
use crate::snap::snap_point;
use crate::style::{FillRef, FontRef, ImageRef, StrokeRef, StyleResolver};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Line,
    Rectangle,
    Ellipse,
    Arc,
    Polyline,
    Text,
    Image,
}

impl ToolKind {
    /// Every tool, in toolbar order.
    pub const ALL: [ToolKind; 8] = [
        ToolKind::Select,
        ToolKind::Line,
        ToolKind::Rectangle,
        ToolKind::Ellipse,
        ToolKind::Arc,
        ToolKind::Polyline,
        ToolKind::Text,
        ToolKind::Image,
    ];

    /// Whether this tool creates shapes.
    pub fn is_creation(self) -> bool {
        self != ToolKind::Select
    }

    /// Parse a tool name as typed by a user (`"rect"`, `"polyline"`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "select" => Some(ToolKind::Select),
            "line" => Some(ToolKind::Line),
            "rect" | "rectangle" => Some(ToolKind::Rectangle),
            "ellipse" | "circle" => Some(ToolKind::Ellipse),
            "arc" => Some(ToolKind::Arc),
            "polyline" | "poly" => Some(ToolKind::Polyline),
            "text" => Some(ToolKind::Text),
            "image" => Some(ToolKind::Image),
            _ => None,
        }
    }
}

/// Tool input in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolEvent {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp(Point),
    KeyDown(Key),
    DoubleClick(Point),
}

/// What a transition did. `Committed` and `Discarded`/`Cancelled` always
/// leave the tool idle.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolEffect {
    /// The event had no meaning in the current state.
    Ignored,
    /// A construction started.
    Began,
    /// Provisional geometry changed.
    Updated,
    /// A finished, non-degenerate shape ready for the active layer.
    Committed(Shape),
    /// The construction was degenerate and dropped silently.
    Discarded,
    /// The construction was abandoned (Escape, tool switch, unresolved image).
    Cancelled,
}

impl ToolEffect {
    pub fn committed(&self) -> Option<&Shape> {
        match self {
            ToolEffect::Committed(shape) => Some(shape),
            _ => None,
        }
    }

    /// Whether the preview needs repainting.
    pub fn needs_redraw(&self) -> bool {
        !matches!(self, ToolEffect::Ignored)
    }
}

/// In-progress geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Construction {
    Drag(DragConstruction),
    Polyline(PolylineConstruction),
}

impl Construction {
    fn preview(&self) -> Option<Primitive> {
        match self {
            Construction::Drag(drag) => drag.primitive(),
            Construction::Polyline(poly) => Some(poly.preview()),
        }
    }
}

/// State of a tool interaction.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ToolState {
    /// Waiting for input.
    #[default]
    Idle,
    /// A shape is being constructed.
    Constructing(Construction),
}

/// Everything a transition needs from its surroundings.
pub struct ToolContext<'a> {
    pub resolver: &'a dyn StyleResolver,
    pub config: &'a EditorConfig,
    /// Pen given to committed shapes.
    pub default_stroke: Option<StrokeRef>,
    /// Brush given to committed closed shapes.
    pub default_fill: Option<FillRef>,
    /// World-space points input may snap to.
    pub snap_targets: Vec<Point>,
    /// World units per device pixel.
    pub pixel_size: f64,
}

impl<'a> ToolContext<'a> {
    pub fn new(resolver: &'a dyn StyleResolver, config: &'a EditorConfig) -> Self {
        Self {
            resolver,
            config,
            default_stroke: None,
            default_fill: None,
            snap_targets: Vec::new(),
            pixel_size: 1.0,
        }
    }

    /// Context for drawing into `scene`: active-layer defaults, camera scale
    /// and, when shape snapping is on, the anchors of every visible shape.
    pub fn for_scene(
        scene: &Scene,
        resolver: &'a dyn StyleResolver,
        config: &'a EditorConfig,
    ) -> Self {
        let layer = scene.active_layer();
        let snap_targets = if config.snap_mode.snaps_to_shapes() {
            scene
                .layers()
                .iter()
                .filter(|layer| layer.visible)
                .flat_map(|layer| layer.iter())
                .filter(|shape| shape.visible)
                .flat_map(|shape| shape.world_primitive().anchor_points())
                .collect()
        } else {
            Vec::new()
        };
        Self {
            resolver,
            config,
            default_stroke: layer.default_stroke.clone(),
            default_fill: layer.default_fill.clone(),
            snap_targets,
            pixel_size: scene.camera.world_tolerance(1.0),
        }
    }

    fn snap(&self, point: Point) -> Point {
        snap_point(
            point,
            self.config.snap_mode,
            self.config.grid_size,
            &self.snap_targets,
            self.config.hit_tolerance_px * self.pixel_size,
        )
        .point
    }

    fn close_tolerance(&self) -> f64 {
        self.config.polyline_close_tolerance_px * self.pixel_size
    }
}

/// Manages the current tool and its state.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    /// Currently selected tool.
    pub current_tool: ToolKind,
    /// Current state of the tool.
    pub state: ToolState,
    /// Font given to new text runs.
    pub current_font: Option<FontRef>,
    /// Image placed by the image tool.
    pub current_image: Option<ImageRef>,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch tools. Returns true if an active construction was cancelled.
    pub fn set_tool(&mut self, tool: ToolKind) -> bool {
        let cancelled = self.cancel();
        self.current_tool = tool;
        cancelled
    }

    /// Whether a construction is in progress.
    pub fn is_active(&self) -> bool {
        matches!(self.state, ToolState::Constructing(_))
    }

    /// Abandon any construction. Returns true if one was active.
    pub fn cancel(&mut self) -> bool {
        let was_active = self.is_active();
        self.state = ToolState::Idle;
        was_active
    }

    /// The provisional shape for renderers. Never part of the scene.
    pub fn preview(&self) -> Option<Shape> {
        match &self.state {
            ToolState::Constructing(construction) => construction.preview().map(Shape::new),
            ToolState::Idle => None,
        }
    }

    /// Run one transition.
    pub fn handle(&mut self, event: ToolEvent, ctx: &ToolContext<'_>) -> ToolEffect {
        if !self.current_tool.is_creation() {
            return ToolEffect::Ignored;
        }
        let event = match event {
            ToolEvent::PointerDown(p) => ToolEvent::PointerDown(ctx.snap(p)),
            ToolEvent::PointerMove(p) => ToolEvent::PointerMove(ctx.snap(p)),
            ToolEvent::PointerUp(p) => ToolEvent::PointerUp(ctx.snap(p)),
            ToolEvent::DoubleClick(p) => ToolEvent::DoubleClick(ctx.snap(p)),
            key => key,
        };

        let state = std::mem::take(&mut self.state);
        let (state, effect) = match state {
            ToolState::Idle => self.handle_idle(event, ctx),
            ToolState::Constructing(Construction::Drag(drag)) => Self::handle_drag(drag, event, ctx),
            ToolState::Constructing(Construction::Polyline(poly)) => {
                Self::handle_polyline(poly, event, ctx)
            }
        };
        self.state = state;
        effect
    }

    fn handle_idle(&self, event: ToolEvent, ctx: &ToolContext<'_>) -> (ToolState, ToolEffect) {
        let ToolEvent::PointerDown(point) = event else {
            return (ToolState::Idle, ToolEffect::Ignored);
        };
        let construction = if self.current_tool == ToolKind::Polyline {
            Construction::Polyline(PolylineConstruction::new(point, ctx.config.angle_snap))
        } else {
            let params = CreateParams {
                corner_radius: ctx.config.rectangle_corner_radius,
                angle_snap: ctx.config.angle_snap,
                text_content: ctx.config.text_content.clone(),
                text_size: ctx.config.text_size,
                font: self.current_font.clone(),
                image: self.current_image.clone(),
            };
            if self.current_tool == ToolKind::Image && params.image.is_none() {
                log::debug!("image tool has no image selected");
                return (ToolState::Idle, ToolEffect::Ignored);
            }
            Construction::Drag(DragConstruction::new(self.current_tool, point, params))
        };
        (ToolState::Constructing(construction), ToolEffect::Began)
    }

    fn handle_drag(
        mut drag: DragConstruction,
        event: ToolEvent,
        ctx: &ToolContext<'_>,
    ) -> (ToolState, ToolEffect) {
        match event {
            ToolEvent::PointerMove(point) => {
                drag.update(point);
                (
                    ToolState::Constructing(Construction::Drag(drag)),
                    ToolEffect::Updated,
                )
            }
            ToolEvent::PointerUp(point) => {
                drag.update(point);
                let effect = match drag.primitive() {
                    Some(Primitive::Image(frame)) => match resolve_frame(frame, ctx.resolver) {
                        Ok(frame) => commit(Primitive::Image(frame), ctx),
                        Err(err) => {
                            log::debug!("image construction cancelled: {err}");
                            ToolEffect::Cancelled
                        }
                    },
                    Some(primitive) => commit(primitive, ctx),
                    None => ToolEffect::Discarded,
                };
                (ToolState::Idle, effect)
            }
            ToolEvent::KeyDown(Key::Escape) => (ToolState::Idle, ToolEffect::Cancelled),
            _ => (
                ToolState::Constructing(Construction::Drag(drag)),
                ToolEffect::Ignored,
            ),
        }
    }

    fn handle_polyline(
        mut poly: PolylineConstruction,
        event: ToolEvent,
        ctx: &ToolContext<'_>,
    ) -> (ToolState, ToolEffect) {
        let effect = match event {
            ToolEvent::PointerDown(point) => match poly.click(point, ctx.close_tolerance()) {
                VertexOutcome::Appended => ToolEffect::Updated,
                VertexOutcome::Closed => return (ToolState::Idle, commit(poly.finish(), ctx)),
            },
            ToolEvent::PointerMove(point) => {
                poly.hover(point);
                ToolEffect::Updated
            }
            ToolEvent::DoubleClick(_) | ToolEvent::KeyDown(Key::Enter) => {
                return (ToolState::Idle, commit(poly.finish(), ctx));
            }
            ToolEvent::KeyDown(Key::Backspace) => {
                if !poly.pop_vertex() {
                    return (ToolState::Idle, ToolEffect::Cancelled);
                }
                ToolEffect::Updated
            }
            ToolEvent::KeyDown(Key::Escape) => return (ToolState::Idle, ToolEffect::Cancelled),
            ToolEvent::PointerUp(_) | ToolEvent::KeyDown(_) => ToolEffect::Ignored,
        };
        (ToolState::Constructing(Construction::Polyline(poly)), effect)
    }
}

/// Validate a finished primitive and dress it with the context's styles.
fn commit(primitive: Primitive, ctx: &ToolContext<'_>) -> ToolEffect {
    match Shape::from_construction(primitive) {
        Ok(mut shape) => {
            shape.stroke = ctx.default_stroke.clone();
            if shape.primitive.is_fillable() {
                shape.fill = ctx.default_fill.clone();
            }
            log::debug!("committed {:?} {}", shape.primitive.kind(), shape.id());
            ToolEffect::Committed(shape)
        }
        Err(err) => {
            log::debug!("discarded construction: {err}");
            ToolEffect::Discarded
        }
    }
}
