//! Delay Controller
//!
//! Single owner of the time-shift value. Every path that moves the
//! delay (user nudges, the slider, the buffering ramp, the pause ramp,
//! go-live) funnels through here, and the clamp against cached audio is
//! applied in exactly one place.

/// Result of a user-driven delay change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjustOutcome {
    /// The delay after clamping
    pub current_ms: u64,
    /// Whether the request was clamped at either bound
    pub clamped: bool,
    /// Whether the clamp happened because not enough audio is cached
    pub insufficient_cache: bool,
}

/// Owns the current and target time-shift values
#[derive(Debug, Clone)]
pub struct DelayController {
    current_ms: u64,
    target_ms: u64,
    max_ms: u64,
}

impl DelayController {
    pub fn new(target_ms: u64, max_ms: u64) -> Self {
        Self {
            current_ms: 0,
            target_ms: target_ms.min(max_ms),
            max_ms,
        }
    }

    pub fn current_ms(&self) -> u64 {
        self.current_ms
    }

    pub fn target_ms(&self) -> u64 {
        self.target_ms
    }

    pub fn max_ms(&self) -> u64 {
        self.max_ms
    }

    /// Upper bound the delay may take right now
    fn ceiling(&self, available_ms: u64) -> u64 {
        self.max_ms.min(available_ms)
    }

    /// Apply a signed nudge, clamping to what is actually cached
    pub fn adjust(&mut self, delta_ms: i64, available_ms: u64) -> AdjustOutcome {
        let requested = if delta_ms >= 0 {
            self.current_ms.saturating_add(delta_ms as u64)
        } else {
            self.current_ms.saturating_sub(delta_ms.unsigned_abs())
        };
        self.apply_request(requested, available_ms)
    }

    /// Set the delay from a slider position, where position 0 means the
    /// maximum shift and `max_ms` means live.
    pub fn set_from_position(&mut self, position_ms: u64, available_ms: u64) -> AdjustOutcome {
        let requested = self.max_ms.saturating_sub(position_ms);
        self.apply_request(requested, available_ms)
    }

    /// Jump to the live edge
    pub fn go_live(&mut self) -> u64 {
        self.current_ms = 0;
        self.current_ms
    }

    /// One tick of the buffering ramp: grow toward the target delay.
    /// Returns true once the target is reached.
    pub fn buffering_ramp_tick(&mut self, step_ms: u64) -> bool {
        self.current_ms = (self.current_ms + step_ms).min(self.target_ms);
        self.current_ms >= self.target_ms
    }

    /// One tick of the pause ramp: the shift keeps growing while the
    /// listener is away, bounded only by the maximum.
    pub fn pause_ramp_tick(&mut self, step_ms: u64) {
        self.current_ms = (self.current_ms + step_ms).min(self.max_ms);
    }

    /// Re-clamp after cache availability changed. Returns true if the
    /// delay had to move.
    pub fn clamp_to_available(&mut self, available_ms: u64) -> bool {
        let ceiling = self.ceiling(available_ms);
        if self.current_ms > ceiling {
            self.current_ms = ceiling;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.current_ms = 0;
    }

    fn apply_request(&mut self, requested_ms: u64, available_ms: u64) -> AdjustOutcome {
        let ceiling = self.ceiling(available_ms);
        let applied = requested_ms.min(ceiling);
        let clamped = applied != requested_ms;
        // The clamp is a cache problem only when the cache, not the hard
        // maximum, was the binding constraint.
        let insufficient_cache = clamped && available_ms < self.max_ms;

        self.current_ms = applied;
        AdjustOutcome {
            current_ms: applied,
            clamped,
            insufficient_cache,
        }
    }
}
