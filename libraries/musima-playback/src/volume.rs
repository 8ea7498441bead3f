//! Volume control with mute bookkeeping
//!
//! Volume range is 0-100%. Muting parks the level in `previous_level` and
//! drops the level to zero; unmuting restores it exactly.

use crate::types::VolumeCurve;

/// Volume controller
#[derive(Debug, Clone)]
pub struct Volume {
    /// Volume level (0-100)
    level: u8,

    /// Mute state
    muted: bool,

    /// Level to restore on unmute
    previous_level: u8,

    curve: VolumeCurve,
}

impl Volume {
    /// Create new volume controller
    ///
    /// # Arguments
    /// * `level` - Initial volume (0-100)
    /// * `curve` - Level-to-gain mapping
    pub fn new(level: u8, curve: VolumeCurve) -> Self {
        let level = level.min(100);
        Self {
            level,
            muted: false,
            previous_level: level,
            curve,
        }
    }

    /// Set volume level (0-100)
    ///
    /// Does not touch the mute state: an explicit zero is not a mute.
    pub fn set_level(&mut self, level: u8) {
        self.level = level.min(100);
    }

    /// Get current volume level (0-100)
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Level that unmuting will restore
    pub fn previous_level(&self) -> u8 {
        self.previous_level
    }

    /// Toggle mute state
    ///
    /// Muting stores the level and sets it to zero. Unmuting restores the
    /// stored level.
    pub fn toggle_mute(&mut self) {
        if self.muted {
            self.level = self.previous_level;
            self.muted = false;
        } else {
            self.previous_level = self.level;
            self.level = 0;
            self.muted = true;
        }
    }

    /// Check if muted
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Output gain for the media element (0.0-1.0)
    ///
    /// Returns 0.0 if muted, otherwise the level mapped through the curve
    pub fn gain(&self) -> f32 {
        if self.muted {
            return 0.0;
        }

        match self.curve {
            VolumeCurve::Linear => self.level as f32 / 100.0,
            VolumeCurve::Logarithmic => Self::logarithmic_gain(self.level),
        }
    }

    /// Convert volume percentage to logarithmic gain
    ///
    /// Formula: gain = 10^((level% - 100) * 0.6 / 20)
    /// - 0%   → silence
    /// - 50%  → -30 dB → 0.0316 gain
    /// - 100% →   0 dB → 1.0 gain
    fn logarithmic_gain(level: u8) -> f32 {
        if level == 0 {
            return 0.0;
        }

        // Map 0-100% to -60 dB to 0 dB
        let db = (level as f32 - 100.0) * 0.6;
        10.0_f32.powf(db / 20.0)
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(70, VolumeCurve::Linear)
    }
}
