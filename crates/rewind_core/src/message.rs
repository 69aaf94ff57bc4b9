//! Message Types for Thread Communication
//!
//! Commands flow from the UI thread -> player thread
//! Events flow from the player thread -> UI thread

use serde::{Deserialize, Serialize};

use crate::session::PlaybackPhase;

/// Commands sent from the UI thread to the player engine
#[derive(Debug, Clone)]
pub enum Command {
    /// Select a station by id (does not start playback)
    SelectStream(String),

    /// Connect the selected station and start the buffering window
    Play,

    /// Pause playback; the time shift keeps growing while paused
    Pause,

    /// Resume from pause at the accumulated delay
    Resume,

    /// Tear down playback and reset the time shift
    Stop,

    /// Nudge the delay by a signed amount in milliseconds
    AdjustDelay(i64),

    /// Set the delay from a slider position (0 = max shift, max = live)
    SetDelayPosition(u64),

    /// Jump back to the live edge
    GoLive,

    /// Set volume (0.0 - 1.0); zero also mutes
    SetVolume(f32),

    /// Toggle mute, restoring the pre-mute volume on unmute
    ToggleMute,

    /// Set gain for a single EQ band (persisted per station)
    SetBandGain { band: usize, gain_db: f32 },

    /// Reset the EQ to flat for the current station
    ResetEqualizer,

    /// Add a user-defined station
    AddCustomStream { name: String, url: String },

    /// Remove a user-defined station by id
    RemoveCustomStream(String),

    /// Request current state (triggers StateUpdate event)
    RequestState,

    /// Shutdown the engine
    Shutdown,
}

/// Events sent from the player engine to the UI thread
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    /// Playback phase transition
    PhaseChanged { phase: PlaybackPhase },

    /// A station was selected. `known_error` carries the fixed message
    /// for stations that are known to refuse external connections.
    StreamSelected {
        id: String,
        known_error: Option<String>,
    },

    /// The station list changed (custom stream added or removed)
    StreamListChanged,

    /// The time shift moved
    DelayChanged { current_ms: u64, target_ms: u64 },

    /// Cached audio availability update
    CacheUpdated { available_ms: u64 },

    /// A delay request was clamped because not enough audio is cached
    InsufficientCache { requested_ms: u64, available_ms: u64 },

    /// Buffering window progress (for the connect countdown)
    BufferingProgress { elapsed_ms: u64, total_ms: u64 },

    /// Volume or mute state changed
    VolumeChanged { volume: f32, muted: bool },

    /// EQ gains for the current station (after select or edit)
    EqualizerChanged { gains: Vec<f32> },

    /// Error surfaced to the user
    Error { message: String },

    /// Current state snapshot
    StateUpdate {
        phase: PlaybackPhase,
        stream_id: Option<String>,
        current_delay_ms: u64,
        available_cache_ms: u64,
        volume: f32,
        muted: bool,
        enhanced: bool,
        last_error: Option<String>,
    },
}

impl Event {
    /// Create an error event from any error type
    pub fn error<E: std::fmt::Display>(err: E) -> Self {
        Event::Error {
            message: err.to_string(),
        }
    }
}
