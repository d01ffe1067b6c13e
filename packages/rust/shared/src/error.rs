//! Error types for ContentForge.
//!
//! Library crates use [`ContentForgeError`] via `thiserror`. The run driver
//! converts per-item failures into item state; only configuration errors
//! abort a run before any item is attempted.

/// Top-level error type for all ContentForge operations.
#[derive(Debug, thiserror::Error)]
pub enum ContentForgeError {
    /// Configuration loading or validation error (missing credentials,
    /// inconsistent run inputs). The only class that aborts a run up front.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transient generation failure (provider error, timeout). Retryable.
    #[error("generation error: {0}")]
    Generation(String),

    /// The generator reported that the analyzed topic does not match the
    /// expected intent. Non-retryable; the item is skipped with the reason.
    #[error("semantic mismatch: {reason}")]
    SemanticMismatch { reason: String },

    /// Publication failure for a single item. Recorded, never aborts a batch.
    #[error("publish error: {0}")]
    Publish(String),

    /// Network/HTTP error talking to an external adapter.
    #[error("network error: {0}")]
    Network(String),

    /// Data validation error (empty group, malformed payload, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ContentForgeError>;

impl ContentForgeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a semantic-mismatch error with the reported reason.
    pub fn mismatch(reason: impl Into<String>) -> Self {
        Self::SemanticMismatch {
            reason: reason.into(),
        }
    }

    /// Whether the pipeline may retry the failed stage.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Generation(_) | Self::Network(_))
    }
}
