//! Error types shared by every stage of the scribe pipeline.

use thiserror::Error;

/// Result type for scribe operations.
pub type Result<T> = std::result::Result<T, ScribeError>;

/// Errors raised by the pitch-to-notation pipeline.
#[derive(Debug, Error)]
pub enum ScribeError {
    /// A frequency that is zero, negative, NaN or infinite.
    #[error("invalid frequency: {freq} Hz")]
    InvalidFrequency {
        /// The rejected frequency.
        freq: f64,
    },

    /// A configuration value outside its valid range.
    #[error("invalid configuration `{name}`: got {value}, {reason}")]
    InvalidConfiguration {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    /// A malformed line in a frame stream.
    #[error("frame stream line {line}: {message}")]
    Parse { line: usize, message: String },

    /// File I/O errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ScribeError {
    pub(crate) fn config(name: &'static str, value: impl ToString, reason: &'static str) -> Self {
        ScribeError::InvalidConfiguration {
            name,
            value: value.to_string(),
            reason,
        }
    }
}
