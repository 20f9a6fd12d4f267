//! Error types for the positioning pipeline.
//!
//! Library crates use [`PositioningError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum PositioningError {
    /// No usable credential, model, or config file could be resolved.
    #[error("config error: {message}")]
    Config { message: String },

    /// An artifact the stage depends on is absent from disk.
    #[error("input not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    /// Fetch or generation request failed at the network/protocol layer.
    #[error("transport error: {0}")]
    Transport(String),

    /// Generated structure is malformed or missing required keys.
    #[error("schema validation error: {message}")]
    SchemaValidation {
        message: String,
        /// Leading slice of the offending raw response, when one exists.
        excerpt: Option<String>,
    },

    /// The binary-document compositor is not available.
    #[error("render dependency missing: {0}")]
    RenderDependencyMissing(String),

    /// The compositor ran but did not produce a document.
    #[error("compositor failed: {0}")]
    Compositor(String),

    /// An artifact exists but cannot be decoded.
    #[error("invalid artifact {}: {message}", path.display())]
    InvalidArtifact { path: PathBuf, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PositioningError>;

impl PositioningError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a schema validation error without a response excerpt.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::SchemaValidation {
            message: msg.into(),
            excerpt: None,
        }
    }

    /// Create an input-not-found error for the given path.
    pub fn input_not_found(path: impl Into<PathBuf>) -> Self {
        Self::InputNotFound { path: path.into() }
    }

    /// Create an invalid-artifact error for the given path.
    pub fn invalid_artifact(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::InvalidArtifact {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit status used when this error ends a command.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            Self::InputNotFound { .. } => 3,
            Self::Transport(_) => 4,
            Self::SchemaValidation { .. } => 5,
            _ => 1,
        }
    }
}
