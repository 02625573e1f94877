//! Core exercise library shared by the backend application.
//!
//! Provides:
//! - Composition graph with cycle detection for compound exercises
//! - Order-index planning (three-phase swap, next-index allocation)
//! - Assembly of resolved compound exercises from fetched rows
//! - Password strength validation
//! - Shared types (Exercise, CompoundComponent, etc.)

pub mod error;
pub mod graph;
pub mod ordering;
pub mod password;
pub mod resolve;
pub mod types;

pub use error::{CompositionError, Result};
pub use graph::CompositionGraph;
pub use ordering::{next_order_index, swap_steps, OrderMove, SENTINEL_ORDER_INDEX};
pub use password::{validate_password_strength, PasswordIssue, PasswordStrength};
pub use resolve::{assemble_compound, MissingChildPolicy};
pub use types::{
    CompoundComponent, CompoundExercise, Exercise, ExerciseType, ResolvedComponent,
    SimpleExerciseDetail,
};
