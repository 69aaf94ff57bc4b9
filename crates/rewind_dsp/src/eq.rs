//! 10-Band Stream Equalizer
//!
//! A cascade of BiQuad filters applied between the media source and the
//! delay line. Band layout matches the classic 10-band radio EQ: a low
//! shelf, eight peaking filters and a high shelf, all at Q = 1.0.

use biquad::{Biquad, Coefficients, DirectForm2Transposed, ToHertz, Type};

use crate::error::DspError;

/// Number of EQ bands in the chain
pub const NUM_BANDS: usize = 10;

/// Band center/corner frequencies (Hz), chained in this order
pub const BAND_FREQUENCIES: [f32; NUM_BANDS] = [
    60.0, 170.0, 310.0, 600.0, 1000.0, 3000.0, 6000.0, 12000.0, 14000.0, 16000.0,
];

/// Per-band gain range in dB
pub const GAIN_RANGE_DB: f32 = 12.0;

const BAND_Q: f32 = 1.0;

/// Filter shape for a band
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BandKind {
    LowShelf,
    Peaking,
    HighShelf,
}

impl BandKind {
    fn for_index(index: usize) -> Self {
        match index {
            0 => BandKind::LowShelf,
            9 => BandKind::HighShelf,
            _ => BandKind::Peaking,
        }
    }
}

/// Convert dB gain to linear amplitude: 10^(dB/20)
fn db_to_amplitude(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

fn band_coefficients(
    index: usize,
    gain_db: f32,
    sample_rate: f32,
) -> Result<Coefficients<f32>, DspError> {
    let frequency = BAND_FREQUENCIES[index];
    let kind = BandKind::for_index(index);

    let filter_type = match kind {
        BandKind::LowShelf => Type::LowShelf(db_to_amplitude(gain_db)),
        BandKind::Peaking => Type::PeakingEQ(db_to_amplitude(gain_db)),
        BandKind::HighShelf => Type::HighShelf(db_to_amplitude(gain_db)),
    };

    Coefficients::<f32>::from_params(filter_type, sample_rate.hz(), frequency.hz(), BAND_Q)
        .map_err(|_| DspError::InvalidCoefficients {
            frequency,
            sample_rate,
        })
}

/// The stream equalizer
///
/// Holds per-channel filter state for a stereo signal. No allocations in
/// the processing path.
pub struct StreamEqualizer {
    filters_left: [DirectForm2Transposed<f32>; NUM_BANDS],
    filters_right: [DirectForm2Transposed<f32>; NUM_BANDS],
    gains_db: [f32; NUM_BANDS],
    sample_rate: f32,
}

impl StreamEqualizer {
    /// Create a flat (0 dB everywhere) equalizer
    pub fn new(sample_rate: f32) -> Result<Self, DspError> {
        if sample_rate <= 0.0 {
            return Err(DspError::InvalidSampleRate(sample_rate));
        }

        // Flat coefficients are identical for both channels
        let mut coeff_table = Vec::with_capacity(NUM_BANDS);
        for i in 0..NUM_BANDS {
            coeff_table.push(band_coefficients(i, 0.0, sample_rate)?);
        }
        let filters_left =
            core::array::from_fn(|i| DirectForm2Transposed::<f32>::new(coeff_table[i]));
        let filters_right =
            core::array::from_fn(|i| DirectForm2Transposed::<f32>::new(coeff_table[i]));

        Ok(Self {
            filters_left,
            filters_right,
            gains_db: [0.0; NUM_BANDS],
            sample_rate,
        })
    }

    /// Set gain for a single band, clamped to the supported range
    pub fn set_band_gain(&mut self, band: usize, gain_db: f32) -> Result<(), DspError> {
        if band >= NUM_BANDS {
            return Err(DspError::InvalidBandIndex(band));
        }

        let gain_db = gain_db.clamp(-GAIN_RANGE_DB, GAIN_RANGE_DB);
        self.gains_db[band] = gain_db;

        let coeffs = band_coefficients(band, gain_db, self.sample_rate)?;
        self.filters_left[band].update_coefficients(coeffs);
        self.filters_right[band].update_coefficients(coeffs);
        Ok(())
    }

    /// Replace the whole gain vector (used when a per-stream preset loads)
    ///
    /// Extra entries are ignored, missing entries are left unchanged.
    pub fn set_gains(&mut self, gains_db: &[f32]) -> Result<(), DspError> {
        for (band, &gain) in gains_db.iter().enumerate().take(NUM_BANDS) {
            self.set_band_gain(band, gain)?;
        }
        Ok(())
    }

    /// Current gain vector (for persistence)
    pub fn gains(&self) -> [f32; NUM_BANDS] {
        self.gains_db
    }

    /// Whether every band sits at 0 dB
    pub fn is_flat(&self) -> bool {
        self.gains_db.iter().all(|g| *g == 0.0)
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Process one stereo sample pair through the filter cascade
    ///
    /// # Real-time Safety
    /// No allocations, no syscalls.
    #[inline]
    pub fn process_sample(&mut self, left: f32, right: f32) -> (f32, f32) {
        let mut l = left;
        let mut r = right;
        for i in 0..NUM_BANDS {
            l = self.filters_left[i].run(l);
            r = self.filters_right[i].run(r);
        }
        (l, r)
    }

    /// Process an interleaved stereo buffer in-place ([L0, R0, L1, R1, ...])
    #[inline]
    pub fn process_interleaved(&mut self, buffer: &mut [f32]) {
        for frame in buffer.chunks_exact_mut(2) {
            let (l, r) = self.process_sample(frame[0], frame[1]);
            frame[0] = l;
            frame[1] = r;
        }
    }

    /// Clear filter state without touching the gain settings
    ///
    /// Call when the media source changes to avoid filter ringing.
    pub fn reset(&mut self) {
        for i in 0..NUM_BANDS {
            self.filters_left[i].reset_state();
            self.filters_right[i].reset_state();
        }
    }
}
