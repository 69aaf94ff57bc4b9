//! Volume and Mute State
//!
//! Volume and mute are coupled: dragging the slider to zero mutes, and
//! unmuting from a zero slider restores the pre-mute level (or a sane
//! default when there is none).

const UNMUTE_FALLBACK: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct VolumeState {
    volume: f32,
    muted: bool,
    /// Level to restore on unmute
    before_mute: f32,
}

impl VolumeState {
    pub fn new(initial: f32) -> Self {
        let volume = initial.clamp(0.0, 1.0);
        Self {
            volume,
            muted: volume == 0.0,
            before_mute: volume,
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Level to actually apply at the output
    pub fn effective(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    /// Set the slider level. Zero mutes, anything else unmutes.
    pub fn set_volume(&mut self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        // Dragging to zero is a mute; remember what to restore
        if volume == 0.0 && self.volume > 0.0 {
            self.before_mute = self.volume;
        }
        self.volume = volume;
        self.muted = self.volume == 0.0;
    }

    /// Toggle mute. Unmuting from a zero slider restores the level that
    /// was active before the mute, falling back to a mid level.
    pub fn toggle_mute(&mut self) {
        if self.muted {
            self.muted = false;
            if self.volume == 0.0 {
                self.volume = if self.before_mute > 0.0 {
                    self.before_mute
                } else {
                    UNMUTE_FALLBACK
                };
            }
        } else {
            self.before_mute = self.volume;
            self.muted = true;
        }
    }
}

impl Default for VolumeState {
    fn default() -> Self {
        Self::new(1.0)
    }
}
