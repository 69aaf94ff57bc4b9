//! Backend Error Types

use thiserror::Error;

/// Errors from media backend operations
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to open stream: {0}")]
    OpenFailed(String),

    #[error("Enhanced audio graph unavailable: {0}")]
    GraphUnavailable(String),

    #[error("No stream is open")]
    NoStreamOpen,

    #[error("Backend initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Signal path error: {0}")]
    Dsp(#[from] rewind_dsp::DspError),

    #[error("Internal error: {0}")]
    Internal(String),
}
