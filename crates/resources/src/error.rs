//! Error types for resource loading.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for model loading operations.
#[derive(Error, Debug)]
pub enum LoadError {
    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// IO error while streaming a local payload.
    #[error("IO error while reading '{uri}': {source}")]
    Io {
        uri: String,
        #[source]
        source: std::io::Error,
    },

    /// Network failure or non-success status while fetching a remote payload.
    #[error("Failed to fetch '{uri}': {message}")]
    Http {
        /// URL that failed.
        uri: String,
        /// Error message.
        message: String,
    },

    /// The payload is not a glTF document the decoder can read.
    #[error("Failed to decode glTF payload '{uri}': {message}")]
    Decode {
        /// Where the payload came from.
        uri: String,
        /// Error message.
        message: String,
    },

    /// glTF document contains no scene.
    #[error("glTF payload '{0}' contains no scene")]
    NoScene(String),
}

/// Result type alias for resource operations.
pub type LoadResult<T> = Result<T, LoadError>;
