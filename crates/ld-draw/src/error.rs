//! Error types for the draw engine

use thiserror::Error;

/// Draw engine error type
///
/// Every variant is recoverable. A rejected operation leaves the engine
/// exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DrawError {
    #[error("Invalid spec: {0}")]
    InvalidSpec(String),

    #[error("All entries have been drawn")]
    ExhaustedPool,

    #[error("All prizes have been awarded")]
    PrizesComplete,

    #[error("No draws to undo")]
    Empty,

    #[error("Entry not available: {0}")]
    NotAvailable(String),

    #[error("A draw is in progress")]
    Busy,
}

impl DrawError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidSpec(msg.into())
    }
}

/// Result type alias
pub type DrawResult<T> = Result<T, DrawError>;
