//! Media Backend Traits
//!
//! Defines the interface every playback backend must provide. The core
//! engine talks only to this trait, so the same state machine drives a
//! real media element and the in-process simulation backend used in
//! tests.

use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// Events surfaced by the underlying media element
///
/// These mirror the lifecycle notifications a streaming playback element
/// emits while decoding a live source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum MediaEvent {
    /// Decoding started and audio is flowing
    Playing,
    /// The element stalled waiting for network data
    Waiting,
    /// The element gave up on the source
    Errored(String),
    /// The source ended (live streams only end when the server drops us)
    Ended,
}

/// Trait for playback backends
///
/// A backend owns one media element at a time. `open` tears down any
/// previous element before connecting the new source. Backends that
/// fail to build the enhanced graph (equalizer, delay, analysis, gain)
/// must still play: `is_enhanced` reports which mode is active, and the
/// graph-dependent setters become no-ops in basic mode rather than
/// errors.
pub trait MediaBackend: Send {
    /// Get the name of this backend
    fn name(&self) -> &'static str;

    /// Connect to a stream URL and begin buffering
    fn open(&mut self, url: &str) -> Result<(), BackendError>;

    /// Tear down the current media element, if any
    fn close(&mut self);

    /// Drain the next pending media event, if one is queued
    fn poll_event(&mut self) -> Option<MediaEvent>;

    /// Whether the enhanced graph is active for the current element
    fn is_enhanced(&self) -> bool;

    /// Move the playback point `seconds` behind the live edge
    ///
    /// `smoothing` is the time constant of the glide in seconds; zero
    /// applies the change immediately.
    fn set_delay(&mut self, seconds: f32, smoothing: f32) -> Result<(), BackendError>;

    /// Glide the graph output gain toward `target`
    fn set_gain_target(&mut self, target: f32, time_constant: f32);

    /// Snap the graph output gain to `value`
    fn set_gain(&mut self, value: f32);

    /// Set one equalizer band gain in dB
    fn set_band_gain(&mut self, band: usize, gain_db: f32) -> Result<(), BackendError>;

    /// Replace the equalizer gain vector
    fn set_band_gains(&mut self, gains_db: &[f32]) -> Result<(), BackendError>;

    /// Set the media element's own volume (0.0 to 1.0)
    ///
    /// Applied at the element, independent of the graph gain, so it
    /// works in basic mode too.
    fn set_element_volume(&mut self, volume: f32);

    /// Mute or unmute the media element
    fn set_element_muted(&mut self, muted: bool);
}
