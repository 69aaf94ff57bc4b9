//! Cached Audio Tracking
//!
//! Tracks how much past audio is available to shift back into. The
//! tracker accumulates elapsed time between polls rather than measuring
//! from a fixed start, so pausing freezes the count instead of letting
//! it silently keep growing while nothing is being decoded.

use std::time::Instant;

/// Tracks cached audio availability in milliseconds
#[derive(Debug, Clone)]
pub struct CacheTracker {
    available_ms: u64,
    max_ms: u64,
    last_poll: Option<Instant>,
    paused: bool,
}

impl CacheTracker {
    pub fn new(max_ms: u64) -> Self {
        Self {
            available_ms: 0,
            max_ms,
            last_poll: None,
            paused: false,
        }
    }

    /// Begin accumulating from zero
    pub fn start(&mut self, now: Instant) {
        self.available_ms = 0;
        self.last_poll = Some(now);
        self.paused = false;
    }

    /// Whether the tracker is accumulating
    pub fn is_running(&self) -> bool {
        self.last_poll.is_some()
    }

    /// Accumulate time since the last poll, capped at the maximum
    ///
    /// Returns the updated availability. While paused the count is
    /// frozen and polls only move the reference point.
    pub fn poll(&mut self, now: Instant) -> u64 {
        if let Some(last) = self.last_poll {
            if !self.paused {
                let delta = now.saturating_duration_since(last).as_millis() as u64;
                self.available_ms = (self.available_ms + delta).min(self.max_ms);
            }
            self.last_poll = Some(now);
        }
        self.available_ms
    }

    /// Freeze accumulation (playback paused)
    pub fn pause(&mut self, now: Instant) {
        self.poll(now);
        self.paused = true;
    }

    /// Resume accumulation from `now`
    pub fn resume(&mut self, now: Instant) {
        self.paused = false;
        if self.last_poll.is_some() {
            self.last_poll = Some(now);
        }
    }

    /// Raise availability to at least `ms` (capped at the maximum)
    ///
    /// Used when the delay grew during a pause and the count has to
    /// cover it on resume.
    pub fn ensure_at_least(&mut self, ms: u64) {
        self.available_ms = self.available_ms.max(ms.min(self.max_ms));
    }

    /// Reset to empty and stop accumulating
    pub fn stop(&mut self) {
        self.available_ms = 0;
        self.last_poll = None;
        self.paused = false;
    }

    pub fn available_ms(&self) -> u64 {
        self.available_ms
    }
}
