//! DSP Error Types

use thiserror::Error;

/// Errors that can occur in the signal path
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DspError {
    #[error("Invalid band index: {0} (must be 0-9)")]
    InvalidBandIndex(usize),

    #[error("Invalid filter coefficients for frequency {frequency}Hz at sample rate {sample_rate}Hz")]
    InvalidCoefficients { frequency: f32, sample_rate: f32 },

    #[error("Sample rate must be positive, got {0}")]
    InvalidSampleRate(f32),

    #[error("Requested delay {seconds}s exceeds delay line capacity {max_seconds}s")]
    DelayOutOfRange { seconds: f32, max_seconds: f32 },
}
