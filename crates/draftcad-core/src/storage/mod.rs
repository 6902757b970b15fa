//! Draft persistence.
//!
//! A draft is stored as a JSON envelope `{ "format", "version", "scene" }`.
//! Style references are written verbatim; a draft whose pens or fonts are
//! missing still loads, and resolution failures surface at render time.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemoryStorage;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

use crate::scene::Scene;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Format tag written into every draft.
pub const FORMAT_NAME: &str = "draftcad";

/// Current draft format version.
pub const FORMAT_VERSION: u32 = 1;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Draft not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Unsupported draft version {found} (newest supported is {FORMAT_VERSION})")]
    UnsupportedVersion { found: u32 },
    #[error("Storage error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    format: &'a str,
    version: u32,
    scene: &'a Scene,
}

#[derive(Deserialize)]
struct Envelope {
    format: String,
    version: u32,
    scene: Scene,
}

/// Serialize a scene into a draft envelope.
pub fn serialize(scene: &Scene) -> StorageResult<Vec<u8>> {
    let envelope = EnvelopeRef {
        format: FORMAT_NAME,
        version: FORMAT_VERSION,
        scene,
    };
    Ok(serde_json::to_vec_pretty(&envelope)?)
}

/// Parse a draft envelope and re-establish the scene invariants.
pub fn deserialize(bytes: &[u8]) -> StorageResult<Scene> {
    let envelope: Envelope = serde_json::from_slice(bytes)?;
    if envelope.format != FORMAT_NAME {
        return Err(StorageError::Serialization(format!(
            "not a draft: format is '{}'",
            envelope.format
        )));
    }
    if envelope.version > FORMAT_VERSION {
        return Err(StorageError::UnsupportedVersion {
            found: envelope.version,
        });
    }
    let mut scene = envelope.scene;
    let repairs = scene.repair();
    if repairs > 0 {
        log::info!("Draft '{}' needed {repairs} repair(s) on load", scene.name);
    } else {
        scene.mark_saved();
    }
    Ok(scene)
}

/// Synchronous draft storage backend.
pub trait Storage {
    /// Save a draft under `id`, replacing any previous one.
    fn save(&self, id: &str, scene: &Scene) -> StorageResult<()>;

    /// Load a draft.
    fn load(&self, id: &str) -> StorageResult<Scene>;

    /// Delete a draft. Deleting a missing draft is not an error.
    fn delete(&self, id: &str) -> StorageResult<()>;

    /// List all draft ids.
    fn list(&self) -> StorageResult<Vec<String>>;

    /// Check if a draft exists.
    fn exists(&self, id: &str) -> StorageResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{Arc, Line, Polyline, Primitive, Rectangle, Text};
    use crate::shape::Shape;
    use crate::style::{FillRef, FontRef, StrokeRef};
    use kurbo::{Point, Vec2};

    fn sample_scene() -> Scene {
        let mut scene = Scene::new();
        scene.name = "Bracket".to_string();
        let mut frame = Shape::new(Primitive::Rectangle(Rectangle::new(Point::ZERO, 40.0, 20.0)))
            .with_stroke(StrokeRef::new("pen.default"))
            .with_fill(FillRef::new("brush.section"));
        frame.rotate_about(0.3, Point::new(20.0, 10.0)).unwrap();
        scene.add_shape(frame);
        scene.add_shape(Shape::new(Primitive::Arc(Arc::new(Point::new(5.0, 5.0), 3.0, 0.0, 1.5))));

        let notes = scene.add_layer("Notes");
        scene
            .add_shape_to(
                notes,
                Shape::new(Primitive::Text(
                    Text::new(Point::new(0.0, 30.0), "R3").with_font(FontRef::new("font.missing")),
                )),
            )
            .unwrap();
        let mut leader = Shape::new(Primitive::Polyline(Polyline::new(vec![
            Point::ZERO,
            Point::new(4.0, 4.0),
            Point::new(9.0, 4.0),
        ])));
        leader.translate(Vec2::new(1.0, 1.0)).unwrap();
        scene.add_shape_to(notes, leader).unwrap();
        scene.set_active_layer(notes).unwrap();
        scene
    }

    #[test]
    fn test_round_trip() {
        let scene = sample_scene();
        let bytes = serialize(&scene).unwrap();
        let loaded = deserialize(&bytes).unwrap();
        assert_eq!(loaded, scene);
        assert_eq!(loaded.active_layer_id(), scene.active_layer_id());
        assert!(!loaded.is_modified());
        assert!(loaded.validate().is_ok());
    }

    #[test]
    fn test_round_trip_is_exact_for_rotated_geometry() {
        let pivot = Point::new(1.0 / 7.0, 2.0 / 3.0);
        for i in 0..500 {
            let mut scene = Scene::new();
            let mut line = Shape::new(Primitive::Line(Line::new(
                Point::new(1.0 / 3.0, 0.1 * i as f64),
                Point::new(10.0 / 9.0, 5.0 / 11.0),
            )));
            line.rotate_about(0.001 * i as f64 + 0.123, pivot).unwrap();
            scene.add_shape(line);
            let loaded = deserialize(&serialize(&scene).unwrap()).unwrap();
            assert_eq!(loaded, scene, "angle step {i}");
        }
    }

    #[test]
    fn test_envelope_fields() {
        let bytes = serialize(&Scene::new()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["format"], "draftcad");
        assert_eq!(value["version"], 1);
        assert!(value["scene"]["layers"].is_array());
    }

    #[test]
    fn test_newer_version_rejected() {
        let bytes = serialize(&Scene::new()).unwrap();
        let mut value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        value["version"] = serde_json::json!(7);
        let result = deserialize(&serde_json::to_vec(&value).unwrap());
        assert!(matches!(
            result,
            Err(StorageError::UnsupportedVersion { found: 7 })
        ));
    }

    #[test]
    fn test_foreign_format_rejected() {
        let bytes = br#"{"format":"other","version":1,"scene":{}}"#;
        assert!(matches!(
            deserialize(bytes),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn test_load_repairs_dangling_active_layer() {
        let scene = sample_scene();
        let bytes = serialize(&scene).unwrap();
        let mut value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        value["scene"]["active_layer"] = serde_json::json!(uuid::Uuid::new_v4().to_string());
        value["scene"]["unknown_field"] = serde_json::json!(true);

        let loaded = deserialize(&serde_json::to_vec(&value).unwrap()).unwrap();
        assert_eq!(loaded.active_layer_id(), loaded.layers()[0].id());
        assert!(loaded.validate().is_ok());
    }

    #[test]
    fn test_load_clamps_hand_edited_zoom() {
        let bytes = serialize(&sample_scene()).unwrap();
        let mut value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        value["scene"]["camera"]["zoom"] = serde_json::json!(0.0);

        let loaded = deserialize(&serde_json::to_vec(&value).unwrap()).unwrap();
        assert!((loaded.camera.zoom - loaded.camera.min_zoom).abs() < f64::EPSILON);
        assert!(loaded.camera.screen_to_world(Point::new(10.0, 10.0)).is_finite());
        assert!(loaded.is_modified());
    }

    #[test]
    fn test_load_without_layers() {
        let json = format!(
            r#"{{"format":"draftcad","version":1,"scene":{{"id":"x","name":"Empty","layers":[],"active_layer":"{}"}}}}"#,
            uuid::Uuid::nil()
        );
        let loaded = deserialize(json.as_bytes()).unwrap();
        assert_eq!(loaded.layers().len(), 1);
        assert!(loaded.validate().is_ok());
    }

    #[test]
    fn test_line_geometry_survives() {
        let mut scene = Scene::new();
        let id = scene.add_shape(Shape::new(Primitive::Line(Line::new(
            Point::new(0.1, 0.2),
            Point::new(3.3, 4.4),
        ))));
        let loaded = deserialize(&serialize(&scene).unwrap()).unwrap();
        assert_eq!(loaded.shape(id).unwrap(), scene.shape(id).unwrap());
    }
}
