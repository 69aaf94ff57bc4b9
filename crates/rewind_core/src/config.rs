//! Player Configuration

use serde::{Deserialize, Serialize};

/// Timing and signal-path configuration for the player
///
/// All durations are in milliseconds. The defaults match the tuned
/// production values: a 10 second target delay built up over a 10 second
/// buffering window, with up to 3 minutes of cached audio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Delay the player ramps to after connecting
    pub target_delay_ms: u64,

    /// Hard ceiling on the time shift (also the delay line capacity)
    pub max_delay_ms: u64,

    /// Length of the silent buffering window after connect
    pub buffering_window_ms: u64,

    /// How much delay each ramp tick adds
    pub ramp_step_ms: u64,

    /// Interval between ramp ticks (buffering and pause ramps)
    pub ramp_tick_ms: u64,

    /// Interval between cache availability polls
    pub cache_poll_ms: u64,

    /// Interval between buffering progress events
    pub progress_tick_ms: u64,

    /// Window after a stop during which stale element events are ignored
    pub stop_cooldown_ms: u64,

    /// Sample rate for the signal path
    pub sample_rate: f32,

    /// Time constant for delay glides, in seconds
    pub delay_smoothing: f32,

    /// Time constant for the fade-in after buffering, in seconds
    pub fade_in_smoothing: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            target_delay_ms: 10_000,
            max_delay_ms: 180_000,
            buffering_window_ms: 10_000,
            ramp_step_ms: 100,
            ramp_tick_ms: 100,
            cache_poll_ms: 500,
            progress_tick_ms: 50,
            stop_cooldown_ms: 100,
            sample_rate: 48_000.0,
            delay_smoothing: 0.1,
            fade_in_smoothing: 0.03,
        }
    }
}

impl PlayerConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.target_delay_ms > self.max_delay_ms {
            return Err(format!(
                "Target delay {}ms exceeds max delay {}ms",
                self.target_delay_ms, self.max_delay_ms
            ));
        }
        if self.ramp_step_ms == 0 || self.ramp_tick_ms == 0 {
            return Err("Ramp step and tick must be non-zero".to_string());
        }
        if self.cache_poll_ms == 0 {
            return Err("Cache poll interval must be non-zero".to_string());
        }
        if self.sample_rate <= 0.0 {
            return Err(format!("Invalid sample rate: {}", self.sample_rate));
        }
        Ok(())
    }

    /// Max delay in seconds, for sizing the delay line
    pub fn max_delay_seconds(&self) -> f32 {
        self.max_delay_ms as f32 / 1000.0
    }

    /// Config with short windows, used by tests and the demo
    pub fn fast() -> Self {
        Self {
            target_delay_ms: 1_000,
            buffering_window_ms: 1_000,
            max_delay_ms: 5_000,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlayerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.target_delay_ms, 10_000);
        assert_eq!(config.max_delay_ms, 180_000);
        assert_eq!(config.max_delay_seconds(), 180.0);
    }

    #[test]
    fn test_validation() {
        let invalid_target = PlayerConfig {
            target_delay_ms: 200_000,
            ..Default::default()
        };
        assert!(invalid_target.validate().is_err());

        let invalid_tick = PlayerConfig {
            ramp_tick_ms: 0,
            ..Default::default()
        };
        assert!(invalid_tick.validate().is_err());

        let invalid_rate = PlayerConfig {
            sample_rate: 0.0,
            ..Default::default()
        };
        assert!(invalid_rate.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = PlayerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: PlayerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.target_delay_ms, deserialized.target_delay_ms);
        assert_eq!(config.max_delay_ms, deserialized.max_delay_ms);
    }
}
