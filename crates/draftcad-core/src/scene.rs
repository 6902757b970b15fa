//! The scene: layers, the active layer, the view and edit history.

use crate::camera::Camera;
use crate::config::EditorConfig;
use crate::error::{SceneError, SceneResult};
use crate::layer::{Layer, LayerId};
use crate::shape::{Shape, ShapeId};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use uuid::Uuid;

/// Name given to layers created when the scene would otherwise have none.
pub const DEFAULT_LAYER_NAME: &str = "Layer 1";

/// Maximum number of undo states to keep.
pub const MAX_UNDO_HISTORY: usize = 50;

/// A snapshot of scene content for undo/redo. The camera is not part of it.
#[derive(Debug, Clone)]
struct SceneSnapshot {
    layers: Vec<Layer>,
    active_layer: LayerId,
}

/// The drawing document.
///
/// Invariants maintained by every method:
/// - at least one layer exists;
/// - the active layer id resolves to a live layer;
/// - every shape's layer back-reference names the layer holding it;
/// - shape ids are unique across the scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Unique scene identifier.
    pub id: String,
    /// Scene name.
    pub name: String,
    /// Layers back to front.
    layers: Vec<Layer>,
    active_layer: LayerId,
    /// Global view transform.
    #[serde(default)]
    pub camera: Camera,
    #[serde(skip, default = "default_layer_name")]
    default_layer_name: String,
    #[serde(skip)]
    modified: bool,
    #[serde(skip)]
    revision: u64,
    #[serde(skip, default = "default_max_undo")]
    max_undo_history: usize,
    #[serde(skip)]
    undo_stack: VecDeque<SceneSnapshot>,
    #[serde(skip)]
    redo_stack: Vec<SceneSnapshot>,
}

fn default_layer_name() -> String {
    DEFAULT_LAYER_NAME.to_string()
}

fn default_max_undo() -> usize {
    MAX_UNDO_HISTORY
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Scene {
    /// Content equality: identity, layers, active layer and view.
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.layers == other.layers
            && self.active_layer == other.active_layer
            && self.camera == other.camera
    }
}

impl Scene {
    /// Create a scene with one empty default layer.
    pub fn new() -> Self {
        Self::with_default_layer_name(DEFAULT_LAYER_NAME)
    }

    /// Create a scene whose default layer and history follow `config`.
    pub fn from_config(config: &EditorConfig) -> Self {
        let mut scene = Self::with_default_layer_name(&config.default_layer_name);
        scene.max_undo_history = config.max_undo_history;
        scene
    }

    fn with_default_layer_name(name: &str) -> Self {
        let layer = Layer::new(name);
        Self {
            id: Uuid::new_v4().to_string(),
            name: "Untitled".to_string(),
            active_layer: layer.id(),
            layers: vec![layer],
            camera: Camera::new(),
            default_layer_name: name.to_string(),
            modified: false,
            revision: 0,
            max_undo_history: MAX_UNDO_HISTORY,
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
        }
    }

    pub fn set_max_undo_history(&mut self, max: usize) {
        self.max_undo_history = max;
        while self.undo_stack.len() > max {
            self.undo_stack.pop_front();
        }
    }

    // --- change tracking ---

    /// Counter bumped by every structural change; consumers compare it to
    /// detect that cached ids may be stale.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    fn structural_change(&mut self) {
        self.revision = self.revision.wrapping_add(1);
        self.modified = true;
    }

    // --- layers ---

    /// Layers back to front.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer_ids(&self) -> Vec<LayerId> {
        self.layers.iter().map(Layer::id).collect()
    }

    fn layer_index(&self, id: LayerId) -> SceneResult<usize> {
        self.layers
            .iter()
            .position(|l| l.id() == id)
            .ok_or_else(|| SceneError::layer(id))
    }

    pub fn layer(&self, id: LayerId) -> SceneResult<&Layer> {
        self.layers
            .iter()
            .find(|l| l.id() == id)
            .ok_or_else(|| SceneError::layer(id))
    }

    /// Mutable access to a layer. Marks the scene modified.
    pub fn layer_mut(&mut self, id: LayerId) -> SceneResult<&mut Layer> {
        let index = self.layer_index(id)?;
        self.modified = true;
        Ok(&mut self.layers[index])
    }

    /// Append a new layer at the front. The active layer is unchanged.
    pub fn add_layer(&mut self, name: impl Into<String>) -> LayerId {
        let index = self.layers.len();
        self.insert_layer(index, Layer::new(name))
    }

    /// Insert a layer at `index` (clamped). Shapes it already holds are
    /// re-identified if their ids collide with shapes in the scene.
    pub fn insert_layer(&mut self, index: usize, mut layer: Layer) -> LayerId {
        if self.layers.iter().any(|l| l.id() == layer.id()) {
            layer.id = Uuid::new_v4();
        }
        let layer_id = layer.id();
        let mut seen: HashSet<ShapeId> = self.all_shape_ids().collect();
        for shape in &mut layer.shapes {
            shape.layer = layer_id;
            if !seen.insert(shape.id) {
                shape.id = Uuid::new_v4();
                seen.insert(shape.id);
            }
        }
        let index = index.min(self.layers.len());
        self.layers.insert(index, layer);
        self.structural_change();
        layer_id
    }

    /// Remove a layer and every shape on it.
    ///
    /// When the active layer is removed, the layer now at the same index (or
    /// the one below when it was frontmost) becomes active. Removing the last
    /// layer leaves a fresh default layer behind.
    pub fn remove_layer(&mut self, id: LayerId) -> SceneResult<Layer> {
        let index = self.layer_index(id)?;
        let removed = self.layers.remove(index);
        if self.layers.is_empty() {
            let layer = Layer::new(self.default_layer_name.clone());
            log::info!("Last layer removed, created default layer {}", layer.id());
            self.active_layer = layer.id();
            self.layers.push(layer);
        } else if self.active_layer == id {
            let promoted = &self.layers[index.min(self.layers.len() - 1)];
            log::info!("Active layer removed, promoting '{}'", promoted.name);
            self.active_layer = promoted.id();
        }
        self.structural_change();
        Ok(removed)
    }

    /// Move a layer to `new_index` (clamped).
    pub fn move_layer(&mut self, id: LayerId, new_index: usize) -> SceneResult<()> {
        let index = self.layer_index(id)?;
        let layer = self.layers.remove(index);
        let new_index = new_index.min(self.layers.len());
        self.layers.insert(new_index, layer);
        self.structural_change();
        Ok(())
    }

    pub fn set_active_layer(&mut self, id: LayerId) -> SceneResult<()> {
        self.layer_index(id)?;
        self.active_layer = id;
        Ok(())
    }

    pub fn active_layer_id(&self) -> LayerId {
        self.active_layer
    }

    fn active_index(&self) -> usize {
        self.layers
            .iter()
            .position(|l| l.id() == self.active_layer)
            .unwrap_or(0)
    }

    pub fn active_layer(&self) -> &Layer {
        &self.layers[self.active_index()]
    }

    pub fn active_layer_mut(&mut self) -> &mut Layer {
        let index = self.active_index();
        self.modified = true;
        &mut self.layers[index]
    }

    // --- shapes ---

    fn all_shape_ids(&self) -> impl Iterator<Item = ShapeId> + '_ {
        self.layers.iter().flat_map(|l| l.iter().map(Shape::id))
    }

    /// Add a shape to the active layer.
    pub fn add_shape(&mut self, shape: Shape) -> ShapeId {
        let index = self.active_index();
        self.add_shape_at(index, shape)
    }

    /// Add a shape to a specific layer.
    pub fn add_shape_to(&mut self, layer_id: LayerId, shape: Shape) -> SceneResult<ShapeId> {
        let index = self.layer_index(layer_id)?;
        Ok(self.add_shape_at(index, shape))
    }

    fn add_shape_at(&mut self, layer_index: usize, mut shape: Shape) -> ShapeId {
        if self.find_shape(shape.id).is_some() {
            log::debug!("Shape {} already in scene, assigning a new id", shape.id);
            shape.id = Uuid::new_v4();
        }
        let id = self.layers[layer_index].add_shape(shape);
        self.structural_change();
        id
    }

    pub fn remove_shape(&mut self, id: ShapeId) -> SceneResult<Shape> {
        let (layer_id, _) = self.shape_location(id).ok_or_else(|| SceneError::shape(id))?;
        let index = self.layer_index(layer_id)?;
        let shape = self.layers[index]
            .remove_shape(id)
            .ok_or_else(|| SceneError::shape(id))?;
        self.structural_change();
        Ok(shape)
    }

    /// Move a shape to another layer, appending it or inserting at `index`.
    ///
    /// Both references are validated before anything changes.
    pub fn move_shape_to_layer(
        &mut self,
        id: ShapeId,
        target: LayerId,
        index: Option<usize>,
    ) -> SceneResult<()> {
        let (source, _) = self.shape_location(id).ok_or_else(|| SceneError::shape(id))?;
        let source_index = self.layer_index(source)?;
        let target_index = self.layer_index(target)?;
        let shape = self.layers[source_index]
            .remove_shape(id)
            .ok_or_else(|| SceneError::shape(id))?;
        let layer = &mut self.layers[target_index];
        let at = index.unwrap_or(layer.len());
        layer.insert_shape(at, shape);
        self.structural_change();
        Ok(())
    }

    pub fn find_shape(&self, id: ShapeId) -> Option<&Shape> {
        self.layers.iter().find_map(|l| l.shape(id))
    }

    /// Mutable lookup. Marks the scene modified when found.
    pub fn find_shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        let shape = self.layers.iter_mut().find_map(|l| l.shape_mut(id));
        if shape.is_some() {
            self.modified = true;
        }
        shape
    }

    pub fn shape(&self, id: ShapeId) -> SceneResult<&Shape> {
        self.find_shape(id).ok_or_else(|| SceneError::shape(id))
    }

    pub fn shape_mut(&mut self, id: ShapeId) -> SceneResult<&mut Shape> {
        self.find_shape_mut(id).ok_or_else(|| SceneError::shape(id))
    }

    pub fn contains_shape(&self, id: ShapeId) -> bool {
        self.find_shape(id).is_some()
    }

    /// Owning layer and paint-order index of a shape.
    pub fn shape_location(&self, id: ShapeId) -> Option<(LayerId, usize)> {
        self.layers
            .iter()
            .find_map(|l| l.position(id).map(|i| (l.id(), i)))
    }

    /// All shapes in paint order across layers.
    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.layers.iter().flat_map(|l| l.iter())
    }

    pub fn shape_count(&self) -> usize {
        self.layers.iter().map(Layer::len).sum()
    }

    /// Frontmost shape hit by `point`, searching layers front to back.
    pub fn hit_test_topmost(&self, point: Point, tolerance: f64) -> Option<ShapeId> {
        self.layers
            .iter()
            .rev()
            .find_map(|l| l.hit_test_topmost(point, tolerance))
    }

    /// Shapes whose world bounds intersect `rect`, in paint order.
    pub fn shapes_in_rect(&self, rect: Rect) -> Vec<ShapeId> {
        self.shapes()
            .filter(|s| s.world_bounds().is_some_and(|b| rects_overlap(rect, b)))
            .map(Shape::id)
            .collect()
    }

    /// Union of the world bounds of all shapes.
    pub fn bounds(&self) -> Option<Rect> {
        self.layers
            .iter()
            .filter_map(Layer::bounds)
            .reduce(|a, b| a.union(b))
    }

    pub fn is_empty(&self) -> bool {
        self.shape_count() == 0
    }

    /// Fit the camera to the scene content.
    pub fn fit_to_content(&mut self, padding: f64) {
        if let Some(bounds) = self.bounds() {
            self.camera.fit_to_bounds(bounds, padding);
        }
    }

    // --- history ---

    fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            layers: self.layers.clone(),
            active_layer: self.active_layer,
        }
    }

    fn restore(&mut self, snapshot: SceneSnapshot) {
        self.layers = snapshot.layers;
        self.active_layer = snapshot.active_layer;
        self.structural_change();
    }

    /// Push current state to the undo stack (call before making changes).
    pub fn push_undo(&mut self) {
        let snapshot = self.snapshot();
        self.record_undo(snapshot);
    }

    /// Run `edit` and record one undo step only if it reports a change.
    pub fn with_undo(&mut self, edit: impl FnOnce(&mut Self) -> bool) -> bool {
        let before = self.snapshot();
        let changed = edit(self);
        if changed {
            self.record_undo(before);
        }
        changed
    }

    fn record_undo(&mut self, snapshot: SceneSnapshot) {
        if self.max_undo_history == 0 {
            return;
        }
        self.undo_stack.push_back(snapshot);
        self.redo_stack.clear();
        while self.undo_stack.len() > self.max_undo_history {
            self.undo_stack.pop_front();
        }
    }

    /// Undo the last change.
    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo_stack.pop_back() else {
            return false;
        };
        self.redo_stack.push(self.snapshot());
        self.restore(snapshot);
        true
    }

    /// Redo the last undone change.
    /// Returns true if redo was performed, false if nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push_back(self.snapshot());
        self.restore(snapshot);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    // --- validation ---

    /// Re-establish the scene invariants, returning the number of repairs made.
    ///
    /// Used after deserialization, where the input may have been edited by
    /// hand or produced by another tool.
    pub fn repair(&mut self) -> usize {
        let mut repairs = 0;
        if self.layers.is_empty() {
            log::warn!("Scene has no layers, adding a default layer");
            self.layers.push(Layer::new(self.default_layer_name.clone()));
            repairs += 1;
        }

        let mut layer_ids = HashSet::new();
        for layer in &mut self.layers {
            if !layer_ids.insert(layer.id) {
                log::warn!("Duplicate layer id {}, reassigning", layer.id);
                layer.id = Uuid::new_v4();
                layer_ids.insert(layer.id);
                repairs += 1;
            }
        }

        if !layer_ids.contains(&self.active_layer) {
            let fallback = self.layers[0].id();
            log::warn!(
                "Active layer {} does not exist, using {}",
                self.active_layer,
                fallback
            );
            self.active_layer = fallback;
            repairs += 1;
        }

        let mut shape_ids = HashSet::new();
        for layer in &mut self.layers {
            let layer_id = layer.id;
            let before = layer.shapes.len();
            layer.shapes.retain(|s| shape_ids.insert(s.id));
            let dropped = before - layer.shapes.len();
            if dropped > 0 {
                log::warn!("Dropped {dropped} duplicate shape(s) from layer '{}'", layer.name);
                repairs += dropped;
            }
            for shape in &mut layer.shapes {
                if shape.layer != layer_id {
                    shape.layer = layer_id;
                    repairs += 1;
                }
            }
        }

        if self.camera.sanitize() {
            log::warn!("Camera out of range, clamped to zoom {}", self.camera.zoom);
            repairs += 1;
        }

        if repairs > 0 {
            log::info!("Scene repaired ({repairs} fix(es))");
            self.revision = self.revision.wrapping_add(1);
            self.modified = true;
        }
        repairs
    }

    /// Check the invariants without changing anything.
    pub fn validate(&self) -> SceneResult<()> {
        if self.layers.is_empty() {
            return Err(SceneError::StructuralInvariantViolation(
                "scene has no layers".to_string(),
            ));
        }
        self.layer(self.active_layer).map_err(|_| {
            SceneError::StructuralInvariantViolation(format!(
                "active layer {} does not exist",
                self.active_layer
            ))
        })?;
        let mut seen = HashSet::new();
        for layer in &self.layers {
            for shape in layer.iter() {
                if !seen.insert(shape.id()) {
                    return Err(SceneError::StructuralInvariantViolation(format!(
                        "shape {} appears twice",
                        shape.id()
                    )));
                }
                if shape.layer() != layer.id() {
                    return Err(SceneError::StructuralInvariantViolation(format!(
                        "shape {} points at layer {} but lives on {}",
                        shape.id(),
                        shape.layer(),
                        layer.id()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Closed-interval overlap test; unlike `Rect::intersect(..).area()` it
/// accepts zero-area boxes such as those of axis-aligned lines.
pub(crate) fn rects_overlap(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}
