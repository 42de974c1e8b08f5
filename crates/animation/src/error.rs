//! Error types for animation requests.

use thiserror::Error;

/// Warning-class conditions raised by the animation engine. Neither changes
/// engine state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnimationError {
    /// The requested clip is not registered.
    #[error("Unknown animation clip: {0}")]
    UnknownAnimation(String),

    /// A request arrived before any clips were registered.
    #[error("Animation engine has no clips registered yet")]
    UninitializedEngine,
}

/// Result type alias for animation operations.
pub type AnimationResult<T> = Result<T, AnimationError>;
