//! Layers: ordered, named shape containers.

use crate::shape::{Shape, ShapeId};
use crate::style::{FillRef, StrokeRef};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for layers.
pub type LayerId = Uuid;

/// An ordered container of shapes. Order is paint order: the last shape is
/// frontmost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub(crate) id: LayerId,
    pub name: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    /// Pen inherited by shapes created on this layer.
    #[serde(default)]
    pub default_stroke: Option<StrokeRef>,
    /// Brush inherited by shapes created on this layer.
    #[serde(default)]
    pub default_fill: Option<FillRef>,
    #[serde(default)]
    pub(crate) shapes: Vec<Shape>,
}

fn default_true() -> bool {
    true
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            visible: true,
            locked: false,
            default_stroke: None,
            default_fill: None,
            shapes: Vec::new(),
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Whether shapes on this layer may be edited.
    pub fn is_editable(&self) -> bool {
        self.visible && !self.locked
    }

    /// Fill in missing style references from the layer defaults. Open
    /// outlines never take the default fill.
    pub fn apply_defaults(&self, shape: &mut Shape) {
        if shape.stroke.is_none() {
            shape.stroke = self.default_stroke.clone();
        }
        if shape.fill.is_none() && shape.primitive.is_fillable() {
            shape.fill = self.default_fill.clone();
        }
    }

    /// Append a shape at the front.
    ///
    /// Structural edits go through [`crate::scene::Scene`], which keeps shape
    /// ids unique and bumps its revision.
    pub(crate) fn add_shape(&mut self, shape: Shape) -> ShapeId {
        let index = self.shapes.len();
        self.insert_shape(index, shape)
    }

    /// Insert a shape at `index` (clamped to the shape count).
    pub(crate) fn insert_shape(&mut self, index: usize, mut shape: Shape) -> ShapeId {
        shape.layer = self.id;
        let id = shape.id;
        let index = index.min(self.shapes.len());
        self.shapes.insert(index, shape);
        id
    }

    pub(crate) fn remove_shape(&mut self, id: ShapeId) -> Option<Shape> {
        let index = self.position(id)?;
        Some(self.shapes.remove(index))
    }

    /// Move a shape to `new_index`, clamped to the valid range.
    ///
    /// Returns false when the shape is not on this layer or already there.
    pub fn move_shape(&mut self, id: ShapeId, new_index: usize) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let new_index = new_index.min(self.shapes.len() - 1);
        if new_index == index {
            return false;
        }
        let shape = self.shapes.remove(index);
        self.shapes.insert(new_index, shape);
        true
    }

    /// Bring a shape to the front (topmost).
    pub fn bring_to_front(&mut self, id: ShapeId) -> bool {
        self.move_shape(id, usize::MAX)
    }

    /// Send a shape to the back (bottommost).
    pub fn send_to_back(&mut self, id: ShapeId) -> bool {
        self.move_shape(id, 0)
    }

    /// Move a shape one step towards the front.
    /// Returns true if the shape was moved, false if already at front.
    pub fn bring_forward(&mut self, id: ShapeId) -> bool {
        match self.position(id) {
            Some(pos) if pos + 1 < self.shapes.len() => {
                self.shapes.swap(pos, pos + 1);
                true
            }
            _ => false,
        }
    }

    /// Move a shape one step towards the back.
    /// Returns true if the shape was moved, false if already at back.
    pub fn send_backward(&mut self, id: ShapeId) -> bool {
        match self.position(id) {
            Some(pos) if pos > 0 => {
                self.shapes.swap(pos, pos - 1);
                true
            }
            _ => false,
        }
    }

    /// Frontmost visible shape hit by `point`.
    ///
    /// Locked shapes still hit; mutation eligibility is the caller's concern.
    /// An invisible layer never hits.
    pub fn hit_test_topmost(&self, point: Point, tolerance: f64) -> Option<ShapeId> {
        if !self.visible {
            return None;
        }
        self.shapes
            .iter()
            .rev()
            .filter(|s| s.visible)
            .find(|s| s.hit_test(point, tolerance))
            .map(|s| s.id)
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    pub fn shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.id == id)
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.position(id).is_some()
    }

    /// Paint-order index of a shape.
    pub fn position(&self, id: ShapeId) -> Option<usize> {
        self.shapes.iter().position(|s| s.id == id)
    }

    /// Shapes back to front.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Shape> {
        self.shapes.iter()
    }

    pub fn shape_ids(&self) -> Vec<ShapeId> {
        self.shapes.iter().map(|s| s.id).collect()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Union of the world bounds of all shapes.
    pub fn bounds(&self) -> Option<Rect> {
        self.shapes
            .iter()
            .filter_map(Shape::world_bounds)
            .reduce(|a, b| a.union(b))
    }
}
