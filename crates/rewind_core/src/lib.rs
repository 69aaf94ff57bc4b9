//! Rewind Core - Time-Shift Radio Player
//!
//! This crate provides the core player for Rewind, including:
//! - The playback state machine (connect, buffer, play, pause, time-shift)
//! - The station registry with persisted custom stations
//! - Per-station equalizer settings
//! - A control-thread engine with a channel-based command/event API
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        UI Thread                            │
//! │     (Web) ──commands──▶ PlayerEngine ◀──events── (Web)      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ crossbeam-channel
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Player Thread                          │
//! │   Player ──▶ MediaBackend ──▶ EQ ─▶ Delay ─▶ Gain ─▶ Out    │
//! │     │                                                       │
//! │     └── cache tracker / delay controller / volume state     │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod analytics;
mod cache;
mod config;
mod delay;
mod engine;
mod equalizer;
mod error;
mod message;
mod player;
mod registry;
mod session;
mod store;
mod volume;

pub use analytics::{AnalyticsEvent, AnalyticsSink, LogSink, NullSink};
pub use cache::CacheTracker;
pub use config::PlayerConfig;
pub use delay::{AdjustOutcome, DelayController};
pub use engine::PlayerEngine;
pub use equalizer::EqualizerSettings;
pub use error::{PlayerError, PlayerResult};
pub use message::{Command, Event};
pub use player::Player;
pub use registry::{builtin_streams, StreamDescriptor, StreamRegistry};
pub use session::{PlaybackPhase, PlaybackSession};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use volume::VolumeState;

// Re-export DSP types for convenience
pub use rewind_dsp::{BandKind, StreamEqualizer, BAND_FREQUENCIES, GAIN_RANGE_DB, NUM_BANDS};
