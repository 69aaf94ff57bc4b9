//! Player Error Types

use thiserror::Error;

/// Errors that can occur in the player engine
#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("No stream selected")]
    NoStreamSelected,

    #[error("Stream not found: {0}")]
    StreamNotFound(String),

    #[error("This station cannot be played: {0}")]
    StreamUnavailable(String),

    #[error("Could not connect to the stream. Check the URL or your connection.")]
    ConnectionFailed,

    #[error("Invalid stream URL: {0}")]
    InvalidStreamUrl(String),

    #[error("A stream with this URL already exists")]
    DuplicateStream,

    #[error("Built-in stations cannot be removed")]
    BuiltInStream,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Signal path error: {0}")]
    Dsp(#[from] rewind_dsp::DspError),

    #[error("Backend error: {0}")]
    Backend(#[from] rewind_platform::BackendError),

    #[error("Channel send error - receiver dropped")]
    ChannelSendError,
}

/// Result type alias for player operations
pub type PlayerResult<T> = Result<T, PlayerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlayerError::StreamNotFound("lv2".into());
        assert!(err.to_string().contains("lv2"));

        let err = PlayerError::ConnectionFailed;
        assert!(err.to_string().contains("connect"));
    }

    #[test]
    fn test_error_from_backend() {
        let backend_err = rewind_platform::BackendError::NoStreamOpen;
        let err: PlayerError = backend_err.into();
        assert!(matches!(err, PlayerError::Backend(_)));
    }
}
