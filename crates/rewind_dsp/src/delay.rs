//! Time-Shift Delay Line
//!
//! A circular buffer that holds up to three minutes of stereo audio and
//! plays it back at an adjustable distance behind the write head. The
//! delay time follows its target through a one-pole smoother so that user
//! adjustments glide instead of producing audible jumps, mirroring
//! `setTargetAtTime`-style parameter automation.

use crate::error::DspError;

/// A stereo delay line with smoothed delay-time changes
///
/// Samples are written at the live edge and read `delay` seconds behind
/// it, with linear interpolation between frames for fractional delays.
pub struct DelayLine {
    /// Interleaved stereo ring buffer, capacity_frames * 2 samples
    buffer: Vec<f32>,
    capacity_frames: usize,
    write_frame: usize,
    sample_rate: f32,
    max_delay_seconds: f32,
    /// Smoothed current delay in frames (fractional)
    current_delay_frames: f64,
    target_delay_frames: f64,
    /// Per-sample smoothing coefficient derived from the time constant
    smoothing_coeff: f64,
}

impl DelayLine {
    /// Create a delay line able to shift up to `max_delay_seconds`
    pub fn new(sample_rate: f32, max_delay_seconds: f32) -> Result<Self, DspError> {
        if sample_rate <= 0.0 {
            return Err(DspError::InvalidSampleRate(sample_rate));
        }
        let capacity_frames = (sample_rate as f64 * max_delay_seconds as f64).ceil() as usize + 1;

        Ok(Self {
            buffer: vec![0.0; capacity_frames * 2],
            capacity_frames,
            write_frame: 0,
            sample_rate,
            max_delay_seconds,
            current_delay_frames: 0.0,
            target_delay_frames: 0.0,
            smoothing_coeff: 0.0,
        })
    }

    /// Set the target delay with a smoothing time constant in seconds
    ///
    /// The actual delay approaches the target exponentially; after one
    /// time constant it has covered ~63% of the distance.
    pub fn set_delay(&mut self, seconds: f32, smoothing_seconds: f32) -> Result<(), DspError> {
        if !(0.0..=self.max_delay_seconds).contains(&seconds) {
            return Err(DspError::DelayOutOfRange {
                seconds,
                max_seconds: self.max_delay_seconds,
            });
        }

        self.target_delay_frames = seconds as f64 * self.sample_rate as f64;
        self.smoothing_coeff = if smoothing_seconds <= 0.0 {
            self.current_delay_frames = self.target_delay_frames;
            0.0
        } else {
            // One-pole coefficient per processed frame
            (-1.0 / (smoothing_seconds as f64 * self.sample_rate as f64)).exp()
        };
        Ok(())
    }

    /// Current (smoothed) delay in seconds
    pub fn current_delay_seconds(&self) -> f32 {
        (self.current_delay_frames / self.sample_rate as f64) as f32
    }

    pub fn max_delay_seconds(&self) -> f32 {
        self.max_delay_seconds
    }

    /// Process an interleaved stereo buffer in-place
    ///
    /// Writes the input at the live edge, then replaces it with the
    /// delayed signal. Regions of the ring that have never been written
    /// read as silence, which is exactly what an under-filled cache
    /// should sound like.
    pub fn process_interleaved(&mut self, buffer: &mut [f32]) {
        for frame in buffer.chunks_exact_mut(2) {
            // Advance the smoothed delay one frame toward its target
            self.current_delay_frames = self.target_delay_frames
                + (self.current_delay_frames - self.target_delay_frames) * self.smoothing_coeff;

            let w = self.write_frame;
            self.buffer[w * 2] = frame[0];
            self.buffer[w * 2 + 1] = frame[1];

            let (l, r) = self.read_delayed(w);
            frame[0] = l;
            frame[1] = r;

            self.write_frame = (w + 1) % self.capacity_frames;
        }
    }

    /// Read the sample `current_delay_frames` behind `write_frame`,
    /// linearly interpolating between the two neighboring frames.
    fn read_delayed(&self, write_frame: usize) -> (f32, f32) {
        let delay = self.current_delay_frames.max(0.0);
        let whole = delay.floor() as usize;
        let frac = (delay - whole as f64) as f32;

        let cap = self.capacity_frames;
        let a = (write_frame + cap - (whole % cap)) % cap;
        let b = (a + cap - 1) % cap;

        let al = self.buffer[a * 2];
        let ar = self.buffer[a * 2 + 1];
        let bl = self.buffer[b * 2];
        let br = self.buffer[b * 2 + 1];

        (al + (bl - al) * frac, ar + (br - ar) * frac)
    }

    /// Drop all buffered audio and return to the live edge
    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_frame = 0;
        self.current_delay_frames = 0.0;
        self.target_delay_frames = 0.0;
    }
}
