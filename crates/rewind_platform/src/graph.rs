//! Enhanced Audio Graph
//!
//! Assembles the full signal path for one media element:
//!
//! ```text
//! source -> equalizer -> delay line -> analysis tap -> gain -> output
//! ```
//!
//! The graph owns all stage state. Construction can fail (bad sample
//! rate, filter design failure); callers fall back to basic playback
//! when it does.

use rewind_dsp::{AnalysisTap, DelayLine, PeakLevels, SmoothedGain, StreamEqualizer};

use crate::error::BackendError;

/// Complete per-element signal path
pub struct AudioGraph {
    equalizer: StreamEqualizer,
    delay: DelayLine,
    analysis: AnalysisTap,
    gain: SmoothedGain,
}

impl AudioGraph {
    /// Build the chain for a given sample rate and maximum time shift
    pub fn new(sample_rate: f32, max_delay_seconds: f32) -> Result<Self, BackendError> {
        Ok(Self {
            equalizer: StreamEqualizer::new(sample_rate)?,
            delay: DelayLine::new(sample_rate, max_delay_seconds)?,
            analysis: AnalysisTap::new(),
            gain: SmoothedGain::new(sample_rate, 1.0),
        })
    }

    /// Run one interleaved stereo buffer through every stage in order
    ///
    /// # Real-time Safety
    /// No allocations, no syscalls.
    pub fn process_interleaved(&mut self, buffer: &mut [f32]) {
        self.equalizer.process_interleaved(buffer);
        self.delay.process_interleaved(buffer);
        self.analysis.observe_interleaved(buffer);
        self.gain.process_interleaved(buffer);
    }

    pub fn set_delay(&mut self, seconds: f32, smoothing: f32) -> Result<(), BackendError> {
        self.delay.set_delay(seconds, smoothing)?;
        Ok(())
    }

    pub fn current_delay_seconds(&self) -> f32 {
        self.delay.current_delay_seconds()
    }

    pub fn set_gain(&mut self, value: f32) {
        self.gain.set_value(value);
    }

    pub fn set_gain_target(&mut self, target: f32, time_constant: f32) {
        self.gain.set_target(target, time_constant);
    }

    pub fn set_band_gain(&mut self, band: usize, gain_db: f32) -> Result<(), BackendError> {
        self.equalizer.set_band_gain(band, gain_db)?;
        Ok(())
    }

    pub fn set_band_gains(&mut self, gains_db: &[f32]) -> Result<(), BackendError> {
        self.equalizer.set_gains(gains_db)?;
        Ok(())
    }

    pub fn band_gains(&self) -> [f32; rewind_dsp::NUM_BANDS] {
        self.equalizer.gains()
    }

    pub fn peaks(&self) -> PeakLevels {
        self.analysis.peaks()
    }

    /// Clear all stage state when the media element is torn down
    pub fn reset(&mut self) {
        self.equalizer.reset();
        self.delay.reset();
        self.analysis.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_construction() {
        assert!(AudioGraph::new(48000.0, 180.0).is_ok());
        assert!(AudioGraph::new(0.0, 180.0).is_err());
    }

    #[test]
    fn test_flat_graph_passes_audio() {
        let mut graph = AudioGraph::new(48000.0, 10.0).unwrap();
        let mut buffer = vec![0.5; 256];
        graph.process_interleaved(&mut buffer);
        for sample in &buffer {
            assert!(sample.is_finite());
        }
        assert!(graph.peaks().left > 0.0);
    }

    #[test]
    fn test_delayed_graph_starts_silent() {
        let mut graph = AudioGraph::new(48000.0, 10.0).unwrap();
        graph.set_delay(5.0, 0.0).unwrap();

        let mut buffer = vec![0.8; 100];
        graph.process_interleaved(&mut buffer);
        for sample in &buffer {
            assert_eq!(*sample, 0.0);
        }
    }

    #[test]
    fn test_gain_silences_output() {
        let mut graph = AudioGraph::new(48000.0, 10.0).unwrap();
        graph.set_gain(0.0);

        let mut buffer = vec![0.5; 64];
        graph.process_interleaved(&mut buffer);
        for sample in &buffer {
            assert_eq!(*sample, 0.0);
        }
    }

    #[test]
    fn test_band_gains_round_trip() {
        let mut graph = AudioGraph::new(48000.0, 10.0).unwrap();
        graph.set_band_gains(&[3.0; 10]).unwrap();
        assert_eq!(graph.band_gains(), [3.0; 10]);
    }

    #[test]
    fn test_reset_clears_delay_and_peaks() {
        let mut graph = AudioGraph::new(48000.0, 10.0).unwrap();
        graph.set_delay(2.0, 0.0).unwrap();
        let mut buffer = vec![0.5; 100];
        graph.process_interleaved(&mut buffer);

        graph.reset();
        assert_eq!(graph.current_delay_seconds(), 0.0);
        assert_eq!(graph.peaks().left, 0.0);
    }
}
