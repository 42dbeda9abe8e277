//! Error types for Octodock core library.

use thiserror::Error;

/// Result type alias using Octodock Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Octodock operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
