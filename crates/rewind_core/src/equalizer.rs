//! Per-Station Equalizer Settings
//!
//! Each station remembers its own EQ curve. Settings are keyed by
//! station id, loaded when a station is selected, and written through
//! to the store on every edit so a crash never loses them.

use tracing::debug;

use rewind_dsp::{DspError, GAIN_RANGE_DB, NUM_BANDS};

use crate::error::PlayerResult;
use crate::store::KeyValueStore;

/// Bridges EQ edits to persistent per-station settings
pub struct EqualizerSettings {
    store: Box<dyn KeyValueStore>,
}

impl EqualizerSettings {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load the saved curve for a station, flat if none is stored
    pub fn gains_for(&self, stream_id: &str) -> [f32; NUM_BANDS] {
        let mut gains = [0.0; NUM_BANDS];
        if let Some(value) = self.store.get(stream_id) {
            if let Ok(saved) = serde_json::from_value::<Vec<f32>>(value) {
                for (slot, gain) in gains.iter_mut().zip(saved) {
                    *slot = gain.clamp(-GAIN_RANGE_DB, GAIN_RANGE_DB);
                }
            }
        }
        gains
    }

    /// Update one band and persist the whole curve
    pub fn set_band(
        &mut self,
        stream_id: &str,
        band: usize,
        gain_db: f32,
    ) -> PlayerResult<[f32; NUM_BANDS]> {
        if band >= NUM_BANDS {
            return Err(DspError::InvalidBandIndex(band).into());
        }

        let mut gains = self.gains_for(stream_id);
        gains[band] = gain_db.clamp(-GAIN_RANGE_DB, GAIN_RANGE_DB);

        self.store
            .set(stream_id, serde_json::to_value(gains.to_vec()).unwrap_or_default())?;
        debug!(stream_id, band, gain_db = gains[band], "EQ band saved");
        Ok(gains)
    }

    /// Forget the saved curve, returning the station to flat
    pub fn reset(&mut self, stream_id: &str) -> PlayerResult<[f32; NUM_BANDS]> {
        self.store.remove(stream_id)?;
        debug!(stream_id, "EQ reset to flat");
        Ok([0.0; NUM_BANDS])
    }
}
