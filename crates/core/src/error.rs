//! Error types for the avatar widget.

use thiserror::Error;

/// Main error type shared by the avatar crates.
#[derive(Error, Debug)]
pub enum Error {
    /// Window creation or management errors
    #[error("Window error: {0}")]
    Window(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration parsed but holds values the widget cannot use
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type alias using the avatar Error type.
pub type Result<T> = std::result::Result<T, Error>;
