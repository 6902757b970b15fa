//! DraftCAD Core Library
//!
//! Platform-agnostic scene graph, hit-testing, selection and construction
//! tools for the DraftCAD 2D drafting editor. The core draws no pixels and
//! owns no window: hosts feed it [`input::InputEvent`]s and read back a
//! [`render::render_list`].

pub mod camera;
pub mod canvas;
pub mod config;
pub mod error;
pub mod input;
pub mod layer;
pub mod primitives;
pub mod render;
pub mod scene;
pub mod selection;
pub mod shape;
pub mod snap;
pub mod storage;
pub mod style;
pub mod tools;

pub use camera::Camera;
pub use canvas::{Canvas, CanvasResponse};
pub use config::{ConfigError, EditorConfig};
pub use error::{SceneError, SceneResult};
pub use input::{InputEvent, Key, Modifiers, MouseButton};
pub use layer::{Layer, LayerId};
pub use primitives::{Primitive, PrimitiveKind};
pub use render::{RenderItem, RenderLayer, render_list};
pub use scene::Scene;
pub use selection::{SelectMode, Selection};
pub use shape::{Shape, ShapeId};
pub use snap::{GRID_SIZE, SnapMode, SnapResult, snap_point, snap_to_grid};
pub use storage::{Storage, StorageError, StorageResult};
pub use style::{FillRef, FontRef, ImageRef, StrokeRef, StyleLibrary, StyleResolver};
pub use tools::{ToolEffect, ToolEvent, ToolKind, ToolManager};
