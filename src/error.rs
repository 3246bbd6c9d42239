// error.rs - Error taxonomy for alignment analysis

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by alignment loading, editing and analysis.
///
/// `Cancelled` is not a failure: it reports that a [`CancelToken`](crate::core::CancelToken)
/// was triggered and the operation unwound without publishing partial results.
#[derive(Error, Debug)]
pub enum MsaError {
    /// I/O errors (unreadable input, output path that cannot be created)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// FASTA records that could not be read
    #[error("FASTA error in {path}: {message}")]
    Fasta { path: PathBuf, message: String },

    /// Alignment shape violations (empty input, unequal row lengths)
    #[error("Invalid alignment: {message}")]
    InvalidAlignment { message: String },

    /// Unknown distance function name
    #[error("Distance function type '{name}' is not supported. Supported types are: {valid}")]
    UnsupportedDistance { name: String, valid: String },

    /// Malformed partition offsets or deletion ranges
    #[error("Invalid partitions: {message}")]
    InvalidPartitions { message: String },

    /// Out-of-range numeric parameters
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Operation applied to a substitution model in the wrong state
    #[error("Invalid substitution model state: {message}")]
    InvalidState { message: String },

    /// Configuration errors (config file, CLI values)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Cooperative cancellation was requested
    #[error("Operation cancelled")]
    Cancelled,
}

/// Type alias for Results using MsaError
pub type Result<T> = std::result::Result<T, MsaError>;

impl MsaError {
    pub fn invalid_alignment(message: impl Into<String>) -> Self {
        Self::InvalidAlignment {
            message: message.into(),
        }
    }

    pub fn invalid_partitions(message: impl Into<String>) -> Self {
        Self::InvalidPartitions {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// True when the error only reports a user-requested cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// The binary reports errors as plain messages
impl From<MsaError> for String {
    fn from(error: MsaError) -> Self {
        error.to_string()
    }
}
