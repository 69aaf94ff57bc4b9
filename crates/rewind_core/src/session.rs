//! Playback Session State
//!
//! A small state machine that replaces the pile of boolean flags a
//! media-element player tends to grow. Every transition is explicit and
//! invalid ones are rejected, so "paused while buffering" and "stopping
//! twice" have one defined meaning each.

use serde::{Deserialize, Serialize};

/// The phase the player is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackPhase {
    /// No media element exists
    Stopped,
    /// The element is connecting to the stream
    Connecting,
    /// Connected, silently building up the initial delay
    Buffering,
    /// Audible playback
    Playing,
    /// Paused; the time shift keeps growing
    Paused,
}

/// Tracks the phase plus what pause interrupted
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    phase: PlaybackPhase,
    /// Phase to return to when resuming (Buffering or Playing)
    paused_from: Option<PlaybackPhase>,
    /// Message to show the user for the last failure, if any
    last_error: Option<String>,
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self {
            phase: PlaybackPhase::Stopped,
            paused_from: None,
            last_error: None,
        }
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn is_stopped(&self) -> bool {
        self.phase == PlaybackPhase::Stopped
    }

    pub fn is_paused(&self) -> bool {
        self.phase == PlaybackPhase::Paused
    }

    /// Whether a media element currently exists
    pub fn is_active(&self) -> bool {
        self.phase != PlaybackPhase::Stopped
    }

    /// Stopped -> Connecting. Returns false if an element already exists.
    pub fn begin_connect(&mut self) -> bool {
        if self.phase != PlaybackPhase::Stopped {
            return false;
        }
        self.phase = PlaybackPhase::Connecting;
        true
    }

    /// Connecting -> Buffering, when the element reports audio flowing
    pub fn begin_buffering(&mut self) -> bool {
        if self.phase != PlaybackPhase::Connecting {
            return false;
        }
        self.phase = PlaybackPhase::Buffering;
        true
    }

    /// Buffering -> Playing, when the buffering window completes
    pub fn begin_playing(&mut self) -> bool {
        if self.phase != PlaybackPhase::Buffering {
            return false;
        }
        self.phase = PlaybackPhase::Playing;
        true
    }

    /// Playing/Buffering -> Paused. Remembers where we came from.
    pub fn pause(&mut self) -> bool {
        match self.phase {
            PlaybackPhase::Playing | PlaybackPhase::Buffering => {
                self.paused_from = Some(self.phase);
                self.phase = PlaybackPhase::Paused;
                true
            }
            _ => false,
        }
    }

    /// Paused -> the phase pause interrupted
    pub fn resume(&mut self) -> Option<PlaybackPhase> {
        if self.phase != PlaybackPhase::Paused {
            return None;
        }
        let back_to = self.paused_from.take().unwrap_or(PlaybackPhase::Playing);
        self.phase = back_to;
        Some(back_to)
    }

    /// Any phase -> Stopped. Idempotent.
    pub fn stop(&mut self) -> bool {
        let was_active = self.is_active();
        self.phase = PlaybackPhase::Stopped;
        self.paused_from = None;
        was_active
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_lifecycle() {
        let mut session = PlaybackSession::new();
        assert!(session.begin_connect());
        assert!(session.begin_buffering());
        assert!(session.begin_playing());
        assert_eq!(session.phase(), PlaybackPhase::Playing);
        assert!(session.stop());
        assert!(session.is_stopped());
    }

    #[test]
    fn test_cannot_connect_twice() {
        let mut session = PlaybackSession::new();
        assert!(session.begin_connect());
        assert!(!session.begin_connect());
    }

    #[test]
    fn test_cannot_skip_buffering() {
        let mut session = PlaybackSession::new();
        assert!(session.begin_connect());
        assert!(!session.begin_playing());
    }

    #[test]
    fn test_pause_resume_from_playing() {
        let mut session = PlaybackSession::new();
        session.begin_connect();
        session.begin_buffering();
        session.begin_playing();

        assert!(session.pause());
        assert!(session.is_paused());
        assert_eq!(session.resume(), Some(PlaybackPhase::Playing));
    }

    #[test]
    fn test_pause_resume_from_buffering() {
        let mut session = PlaybackSession::new();
        session.begin_connect();
        session.begin_buffering();

        assert!(session.pause());
        assert_eq!(session.resume(), Some(PlaybackPhase::Buffering));
        assert_eq!(session.phase(), PlaybackPhase::Buffering);
    }

    #[test]
    fn test_cannot_pause_while_stopped_or_connecting() {
        let mut session = PlaybackSession::new();
        assert!(!session.pause());
        session.begin_connect();
        assert!(!session.pause());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut session = PlaybackSession::new();
        session.begin_connect();
        assert!(session.stop());
        assert!(!session.stop());
        assert!(session.is_stopped());
    }

    #[test]
    fn test_error_survives_stop() {
        let mut session = PlaybackSession::new();
        session.begin_connect();
        session.set_error("stream refused connection");
        session.stop();
        assert_eq!(session.last_error(), Some("stream refused connection"));

        session.clear_error();
        assert_eq!(session.last_error(), None);
    }

    #[test]
    fn test_resume_clears_paused_from() {
        let mut session = PlaybackSession::new();
        session.begin_connect();
        session.begin_buffering();
        session.begin_playing();
        session.pause();
        session.resume();
        assert_eq!(session.resume(), None);
    }
}
