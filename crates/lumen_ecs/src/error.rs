//! Recoverable ECS errors.
//!
//! Only capacity exhaustion is reported through `Result`. Misuse such as
//! reading a component an entity does not have is a programming error and
//! panics at the call site instead.

use thiserror::Error;

/// Errors raised when a fixed-size ECS table runs out of room.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcsError {
    #[error("entity limit reached (capacity {capacity})")]
    EntityCapacity { capacity: usize },

    #[error("component type limit reached ({max} types)")]
    ComponentCapacity { max: usize },

    #[error("component type `{0}` is already registered")]
    AlreadyRegistered(&'static str),
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;
