//! Error types for exercise-core.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using CompositionError.
pub type Result<T> = std::result::Result<T, CompositionError>;

/// Invariant violations detected by the composition engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompositionError {
    #[error("exercise {0} cannot contain itself")]
    SelfReference(Uuid),

    #[error("adding {child} to {parent} would create a circular reference")]
    CircularReference { parent: Uuid, child: Uuid },

    #[error("component quantity must be at least 1, got {0}")]
    InvalidQuantity(i32),

    #[error("order index must be at least 1, got {0}")]
    InvalidOrderIndex(i32),
}
