//! Selection set and manipulation handles.
//!
//! [`Selection`] stores shape ids only. Every call takes the [`Scene`] it is
//! scoped to: mutating calls prune ids whose shapes are gone, and read calls
//! filter against the scene, so a removed shape is never reported.

use crate::error::{SceneError, SceneResult};
use crate::scene::{Scene, rects_overlap};
use crate::shape::{Shape, ShapeId};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// How a marquee rectangle selects shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectMode {
    /// World bounds touch the rectangle.
    #[default]
    Intersect,
    /// World bounds lie fully inside the rectangle.
    Contain,
}

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Edge positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    Corner(Corner),
    Edge(Edge),
}

impl HandleKind {
    /// Fixed point of a resize driven by this handle: the opposite corner or edge.
    pub fn anchor(self, bounds: Rect) -> Point {
        let c = bounds.center();
        match self {
            HandleKind::Corner(Corner::TopLeft) => Point::new(bounds.x1, bounds.y1),
            HandleKind::Corner(Corner::TopRight) => Point::new(bounds.x0, bounds.y1),
            HandleKind::Corner(Corner::BottomLeft) => Point::new(bounds.x1, bounds.y0),
            HandleKind::Corner(Corner::BottomRight) => Point::new(bounds.x0, bounds.y0),
            HandleKind::Edge(Edge::Top) => Point::new(c.x, bounds.y1),
            HandleKind::Edge(Edge::Bottom) => Point::new(c.x, bounds.y0),
            HandleKind::Edge(Edge::Left) => Point::new(bounds.x1, c.y),
            HandleKind::Edge(Edge::Right) => Point::new(bounds.x0, c.y),
        }
    }

    /// Axes this handle resizes along (x, y).
    pub fn axes(self) -> (bool, bool) {
        match self {
            HandleKind::Corner(_) => (true, true),
            HandleKind::Edge(Edge::Left | Edge::Right) => (true, false),
            HandleKind::Edge(Edge::Top | Edge::Bottom) => (false, true),
        }
    }
}

/// A selection handle with its position and type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    /// Position in world coordinates.
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a point (in world coordinates) hits this handle.
    /// `tolerance` should be adjusted for camera zoom.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

/// Corner and edge-midpoint handles around a bounding box.
pub fn bounds_handles(bounds: Rect) -> Vec<Handle> {
    let c = bounds.center();
    vec![
        Handle::new(Point::new(bounds.x0, bounds.y0), HandleKind::Corner(Corner::TopLeft)),
        Handle::new(Point::new(bounds.x1, bounds.y0), HandleKind::Corner(Corner::TopRight)),
        Handle::new(Point::new(bounds.x0, bounds.y1), HandleKind::Corner(Corner::BottomLeft)),
        Handle::new(Point::new(bounds.x1, bounds.y1), HandleKind::Corner(Corner::BottomRight)),
        Handle::new(Point::new(c.x, bounds.y0), HandleKind::Edge(Edge::Top)),
        Handle::new(Point::new(bounds.x1, c.y), HandleKind::Edge(Edge::Right)),
        Handle::new(Point::new(c.x, bounds.y1), HandleKind::Edge(Edge::Bottom)),
        Handle::new(Point::new(bounds.x0, c.y), HandleKind::Edge(Edge::Left)),
    ]
}

/// Whether a shape may be picked by marquee / select-all and edited.
pub fn is_editable(scene: &Scene, shape: &Shape) -> bool {
    shape.visible
        && !shape.locked
        && scene
            .layer(shape.layer())
            .is_ok_and(|layer| layer.is_editable())
}

/// The current selection, in selection order.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    ids: Vec<ShapeId>,
    revision: u64,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop ids whose shapes are no longer in the scene. Returns how many were dropped.
    pub fn prune(&mut self, scene: &Scene) -> usize {
        let before = self.ids.len();
        self.ids.retain(|id| scene.contains_shape(*id));
        self.revision = scene.revision();
        before - self.ids.len()
    }

    fn sync(&mut self, scene: &Scene) {
        if self.revision != scene.revision() {
            self.prune(scene);
        }
    }

    /// Pick the topmost shape at `point`.
    ///
    /// Non-additive picks replace the selection (empty when nothing is hit);
    /// additive picks toggle the hit shape. Returns the hit shape.
    pub fn select_at(
        &mut self,
        scene: &Scene,
        point: Point,
        tolerance: f64,
        additive: bool,
    ) -> Option<ShapeId> {
        self.sync(scene);
        let hit = scene.hit_test_topmost(point, tolerance);
        if additive {
            if let Some(id) = hit {
                self.toggle_unchecked(id);
            }
        } else {
            self.ids = hit.into_iter().collect();
        }
        hit
    }

    /// Replace the selection with the editable shapes picked by `rect`.
    pub fn select_in_rect(&mut self, scene: &Scene, rect: Rect, mode: SelectMode) -> usize {
        self.sync(scene);
        let rect = rect.abs();
        self.ids = scene
            .shapes()
            .filter(|s| is_editable(scene, s))
            .filter(|s| {
                s.world_bounds().is_some_and(|b| match mode {
                    SelectMode::Intersect => rects_overlap(rect, b),
                    SelectMode::Contain => {
                        rect.x0 <= b.x0 && rect.y0 <= b.y0 && b.x1 <= rect.x1 && b.y1 <= rect.y1
                    }
                })
            })
            .map(Shape::id)
            .collect();
        self.ids.len()
    }

    /// Select exactly one shape.
    pub fn select(&mut self, scene: &Scene, id: ShapeId) -> SceneResult<()> {
        self.sync(scene);
        scene.shape(id)?;
        self.ids = vec![id];
        Ok(())
    }

    /// Add a shape to the selection.
    pub fn add(&mut self, scene: &Scene, id: ShapeId) -> SceneResult<()> {
        self.sync(scene);
        scene.shape(id)?;
        if !self.ids.contains(&id) {
            self.ids.push(id);
        }
        Ok(())
    }

    /// Toggle membership; returns whether the shape is now selected.
    pub fn toggle(&mut self, scene: &Scene, id: ShapeId) -> SceneResult<bool> {
        self.sync(scene);
        if !scene.contains_shape(id) {
            return Err(SceneError::shape(id));
        }
        Ok(self.toggle_unchecked(id))
    }

    fn toggle_unchecked(&mut self, id: ShapeId) -> bool {
        if let Some(pos) = self.ids.iter().position(|s| *s == id) {
            self.ids.remove(pos);
            false
        } else {
            self.ids.push(id);
            true
        }
    }

    pub fn remove(&mut self, id: ShapeId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|s| *s != id);
        before != self.ids.len()
    }

    /// Select every editable shape in paint order.
    pub fn select_all(&mut self, scene: &Scene) -> usize {
        self.revision = scene.revision();
        self.ids = scene
            .shapes()
            .filter(|s| is_editable(scene, s))
            .map(Shape::id)
            .collect();
        self.ids.len()
    }

    /// Replace the selection with `ids`, ignoring ids not in the scene.
    pub fn set(&mut self, scene: &Scene, ids: impl IntoIterator<Item = ShapeId>) {
        self.revision = scene.revision();
        self.ids.clear();
        for id in ids {
            if scene.contains_shape(id) && !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, scene: &Scene, id: ShapeId) -> bool {
        self.ids.contains(&id) && scene.contains_shape(id)
    }

    /// Selected ids still present in the scene.
    pub fn ids(&self, scene: &Scene) -> Vec<ShapeId> {
        self.ids
            .iter()
            .copied()
            .filter(|id| scene.contains_shape(*id))
            .collect()
    }

    /// Selected shapes that may be mutated (unlocked, on editable layers).
    pub fn editable_ids(&self, scene: &Scene) -> Vec<ShapeId> {
        self.ids
            .iter()
            .copied()
            .filter(|id| scene.find_shape(*id).is_some_and(|s| is_editable(scene, s)))
            .collect()
    }

    pub fn len(&self, scene: &Scene) -> usize {
        self.ids(scene).len()
    }

    pub fn is_empty(&self, scene: &Scene) -> bool {
        self.len(scene) == 0
    }

    /// Union of the world bounds of the selected shapes.
    pub fn combined_bounds(&self, scene: &Scene) -> Option<Rect> {
        self.ids
            .iter()
            .filter_map(|id| scene.find_shape(*id))
            .filter_map(Shape::world_bounds)
            .reduce(|a, b| a.union(b))
    }

    /// Resize handles on the combined bounds (none when nothing is selected).
    pub fn handles(&self, scene: &Scene) -> Vec<Handle> {
        self.combined_bounds(scene)
            .map(bounds_handles)
            .unwrap_or_default()
    }

    /// Handle under `point`, if any.
    pub fn handle_at(&self, scene: &Scene, point: Point, tolerance: f64) -> Option<HandleKind> {
        self.handles(scene)
            .into_iter()
            .find(|h| h.hit_test(point, tolerance))
            .map(|h| h.kind)
    }
}
