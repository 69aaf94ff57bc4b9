//! Level Analysis Tap
//!
//! A passive tap placed between the delay line and the output gain. It
//! measures per-channel peak levels over each processed buffer and
//! publishes them atomically so a UI can draw meters without touching
//! the audio thread.

use std::sync::atomic::{AtomicU32, Ordering};

/// Peak levels read from the tap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakLevels {
    pub left: f32,
    pub right: f32,
}

/// Passive peak-level meter
///
/// Thread-safe: the audio thread writes, any other thread reads.
/// Published peaks decay between buffers so meters fall back smoothly
/// when the signal goes quiet.
pub struct AnalysisTap {
    peak_left_bits: AtomicU32,
    peak_right_bits: AtomicU32,
    /// Multiplier applied to the held peak each processed buffer
    decay: f32,
}

impl AnalysisTap {
    pub fn new() -> Self {
        Self {
            peak_left_bits: AtomicU32::new(0.0_f32.to_bits()),
            peak_right_bits: AtomicU32::new(0.0_f32.to_bits()),
            decay: 0.9,
        }
    }

    /// Observe an interleaved stereo buffer without modifying it
    ///
    /// # Real-time Safety
    /// No allocations, no syscalls, O(n) time.
    pub fn observe_interleaved(&self, buffer: &[f32]) {
        let mut peak_l = 0.0_f32;
        let mut peak_r = 0.0_f32;
        for frame in buffer.chunks_exact(2) {
            peak_l = peak_l.max(frame[0].abs());
            peak_r = peak_r.max(frame[1].abs());
        }

        let held_l = f32::from_bits(self.peak_left_bits.load(Ordering::Relaxed)) * self.decay;
        let held_r = f32::from_bits(self.peak_right_bits.load(Ordering::Relaxed)) * self.decay;

        self.peak_left_bits
            .store(peak_l.max(held_l).to_bits(), Ordering::Relaxed);
        self.peak_right_bits
            .store(peak_r.max(held_r).to_bits(), Ordering::Relaxed);
    }

    /// Latest peak levels
    pub fn peaks(&self) -> PeakLevels {
        PeakLevels {
            left: f32::from_bits(self.peak_left_bits.load(Ordering::Relaxed)),
            right: f32::from_bits(self.peak_right_bits.load(Ordering::Relaxed)),
        }
    }

    /// Clear held peaks, e.g. when playback stops
    pub fn reset(&self) {
        self.peak_left_bits.store(0.0_f32.to_bits(), Ordering::Relaxed);
        self.peak_right_bits.store(0.0_f32.to_bits(), Ordering::Relaxed);
    }
}

impl Default for AnalysisTap {
    fn default() -> Self {
        Self::new()
    }
}
