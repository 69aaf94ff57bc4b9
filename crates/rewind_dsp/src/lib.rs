//! Rewind DSP - Signal Path Module
//!
//! This crate provides the audio processing chain for Rewind, including:
//! - 10-band per-stream equalizer using BiQuad filters
//! - Time-shift delay line holding up to three minutes of audio
//! - Passive peak-level analysis tap for UI meters
//! - Smoothed master gain for mute, fades and volume
//!
//! # Architecture
//!
//! The chain runs source -> equalizer -> delay -> analysis -> gain, in
//! that order, and follows a strict "no allocation in audio callback"
//! rule. Control-side parameters (gain targets, peak readouts) are
//! exchanged atomically.

mod analysis;
mod delay;
mod eq;
mod error;
mod gain;

pub use analysis::{AnalysisTap, PeakLevels};
pub use delay::DelayLine;
pub use eq::{BandKind, StreamEqualizer, BAND_FREQUENCIES, GAIN_RANGE_DB, NUM_BANDS};
pub use error::DspError;
pub use gain::SmoothedGain;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        // Verify all public types are accessible
        let _eq = StreamEqualizer::new(48000.0);
        let _delay = DelayLine::new(48000.0, 180.0);
        let _tap = AnalysisTap::new();
        let _gain = SmoothedGain::new(48000.0, 1.0);
    }
}
