//! Error types for scene operations.

use crate::primitives::PrimitiveKind;
use thiserror::Error;

/// Errors reported by the scene graph and its collaborators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    /// An operation targeted a layer or shape that is not in the scene.
    #[error("invalid {kind} reference: {id}")]
    InvalidReference { kind: &'static str, id: String },
    /// A primitive is below the minimum extent (or not finite).
    #[error("degenerate {0:?} geometry")]
    DegenerateGeometry(PrimitiveKind),
    /// A style, font or image identifier has no current resolution.
    #[error("unresolved {kind} reference: {id}")]
    UnresolvedStyleReference { kind: &'static str, id: String },
    /// Internal consistency failure; indicates a bug, never a user error.
    #[error("structural invariant violated: {0}")]
    StructuralInvariantViolation(String),
    /// A transform with NaN or infinite coefficients was rejected.
    #[error("transform is not finite")]
    NonFiniteTransform,
    /// An edit targeted a locked layer.
    #[error("layer '{0}' is locked")]
    LayerLocked(String),
}

impl SceneError {
    pub(crate) fn layer(id: impl ToString) -> Self {
        SceneError::InvalidReference {
            kind: "layer",
            id: id.to_string(),
        }
    }

    pub(crate) fn shape(id: impl ToString) -> Self {
        SceneError::InvalidReference {
            kind: "shape",
            id: id.to_string(),
        }
    }
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;
