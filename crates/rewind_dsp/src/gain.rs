//! Smoothed Output Gain
//!
//! The last stage of the signal path. Applies a master gain that either
//! jumps immediately (volume slider, mute) or glides exponentially toward
//! a target (fade-in after the buffering window), matching
//! `setTargetAtTime`-style parameter automation.
//!
//! Targets are thread-safe so the control thread can retune the fade
//! while the audio thread keeps processing.

use std::sync::atomic::{AtomicU32, Ordering};

/// Master gain with one-pole exponential smoothing
///
/// Thread-safe: target and time constant are stored as f32 bits for
/// atomic access; only the processing thread touches the current value.
pub struct SmoothedGain {
    /// Target gain (linear), stored as f32 bits
    target_bits: AtomicU32,
    /// Smoothing time constant in seconds, stored as f32 bits.
    /// Zero means the current value snaps to the target.
    time_constant_bits: AtomicU32,
    /// Current gain, owned by the processing thread
    current: f32,
    sample_rate: f32,
}

impl SmoothedGain {
    pub fn new(sample_rate: f32, initial: f32) -> Self {
        Self {
            target_bits: AtomicU32::new(initial.to_bits()),
            time_constant_bits: AtomicU32::new(0.0_f32.to_bits()),
            current: initial,
            sample_rate,
        }
    }

    /// Jump to a gain value immediately on the next processed sample
    pub fn set_value(&self, gain: f32) {
        self.target_bits.store(gain.max(0.0).to_bits(), Ordering::Relaxed);
        self.time_constant_bits.store(0.0_f32.to_bits(), Ordering::Relaxed);
    }

    /// Glide toward a gain value with the given time constant in seconds
    pub fn set_target(&self, gain: f32, time_constant: f32) {
        self.target_bits.store(gain.max(0.0).to_bits(), Ordering::Relaxed);
        self.time_constant_bits
            .store(time_constant.max(0.0).to_bits(), Ordering::Relaxed);
    }

    /// Target gain the smoother is heading toward
    pub fn target(&self) -> f32 {
        f32::from_bits(self.target_bits.load(Ordering::Relaxed))
    }

    /// Current (smoothed) gain value
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Process an interleaved stereo buffer in-place
    ///
    /// # Real-time Safety
    /// No allocations, no syscalls.
    #[inline]
    pub fn process_interleaved(&mut self, buffer: &mut [f32]) {
        let target = f32::from_bits(self.target_bits.load(Ordering::Relaxed));
        let tc = f32::from_bits(self.time_constant_bits.load(Ordering::Relaxed));

        if tc <= 0.0 {
            self.current = target;
            for sample in buffer.iter_mut() {
                *sample *= target;
            }
            return;
        }

        // Per-frame one-pole coefficient
        let coeff = (-1.0 / (tc * self.sample_rate)).exp();
        for frame in buffer.chunks_exact_mut(2) {
            self.current = target + (self.current - target) * coeff;
            frame[0] *= self.current;
            frame[1] *= self.current;
        }
    }
}
