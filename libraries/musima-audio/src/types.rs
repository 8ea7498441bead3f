//! Core types for the tone filter graph

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest value of the tone dial
pub const MIN_TONE_GAIN: i8 = -10;

/// Highest value of the tone dial
pub const MAX_TONE_GAIN: i8 = 10;

/// Opaque identity of the media element a graph is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle(u64);

impl ElementHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Bass and treble dial positions
///
/// Both values are integers clamped to -10..=10. Zero means the band's filter
/// is left out of the chain entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ToneGains {
    bass: i8,
    treble: i8,
}

impl ToneGains {
    /// Create tone gains (each clamped to -10..=10)
    pub fn new(bass: i32, treble: i32) -> Self {
        Self {
            bass: clamp_gain(bass),
            treble: clamp_gain(treble),
        }
    }

    /// No boost or cut on either band
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn bass(&self) -> i8 {
        self.bass
    }

    pub fn treble(&self) -> i8 {
        self.treble
    }

    pub fn with_bass(self, bass: i32) -> Self {
        Self {
            bass: clamp_gain(bass),
            ..self
        }
    }

    pub fn with_treble(self, treble: i32) -> Self {
        Self {
            treble: clamp_gain(treble),
            ..self
        }
    }

    /// True when neither band needs a filter
    pub fn is_flat(&self) -> bool {
        self.bass == 0 && self.treble == 0
    }
}

impl fmt::Display for ToneGains {
    /// Formats as `Bass: +5, Treble: -2`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bass: {}, Treble: {}",
            signed(self.bass),
            signed(self.treble)
        )
    }
}

fn clamp_gain(value: i32) -> i8 {
    value.clamp(MIN_TONE_GAIN as i32, MAX_TONE_GAIN as i32) as i8
}

fn signed(value: i8) -> String {
    if value > 0 {
        format!("+{}", value)
    } else {
        value.to_string()
    }
}

/// Shelf filter flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShelfKind {
    /// Boosts/cuts below the corner frequency
    Low,
    /// Boosts/cuts above the corner frequency
    High,
}

/// One shelving filter in the chain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShelfFilter {
    pub kind: ShelfKind,
    pub frequency_hz: f32,
    /// Gain passed to the filter's gain parameter (dial value × gain scale)
    pub gain_db: f32,
}

/// Frequencies and dial scaling used when building the chain
///
/// The dial-to-gain scale of 10 maps the -10..=10 dial onto -100..=100 on the
/// filter's gain parameter. It is not a calibrated dB value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShelfSettings {
    /// Low shelf corner frequency (default: 200 Hz)
    pub bass_frequency_hz: f32,

    /// High shelf corner frequency (default: 2000 Hz)
    pub treble_frequency_hz: f32,

    /// Multiplier from dial value to filter gain (default: 10)
    pub gain_scale: f32,
}

impl Default for ShelfSettings {
    fn default() -> Self {
        Self {
            bass_frequency_hz: 200.0,
            treble_frequency_hz: 2000.0,
            gain_scale: 10.0,
        }
    }
}

impl ShelfSettings {
    /// Filters needed for the given gains, in chain order (bass first)
    pub fn filters_for(&self, gains: ToneGains) -> Vec<ShelfFilter> {
        let mut filters = Vec::with_capacity(2);

        if gains.bass() != 0 {
            filters.push(ShelfFilter {
                kind: ShelfKind::Low,
                frequency_hz: self.bass_frequency_hz,
                gain_db: gains.bass() as f32 * self.gain_scale,
            });
        }

        if gains.treble() != 0 {
            filters.push(ShelfFilter {
                kind: ShelfKind::High,
                frequency_hz: self.treble_frequency_hz,
                gain_db: gains.treble() as f32 * self.gain_scale,
            });
        }

        filters
    }
}

/// A node in the connected chain, as reported by [`crate::FilterGraph::topology`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum GraphNode {
    Source,
    Shelf(ShelfFilter),
    Destination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_gains_clamp() {
        let gains = ToneGains::new(15, -42);
        assert_eq!(gains.bass(), 10);
        assert_eq!(gains.treble(), -10);
    }

    #[test]
    fn tone_gains_display_matches_effects_toast() {
        assert_eq!(ToneGains::new(5, 0).to_string(), "Bass: +5, Treble: 0");
        assert_eq!(ToneGains::new(-3, 7).to_string(), "Bass: -3, Treble: +7");
    }

    #[test]
    fn flat_needs_no_filters() {
        let settings = ShelfSettings::default();
        assert!(settings.filters_for(ToneGains::flat()).is_empty());
    }

    #[test]
    fn filters_are_scaled_and_ordered() {
        let settings = ShelfSettings::default();
        let filters = settings.filters_for(ToneGains::new(5, -2));

        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].kind, ShelfKind::Low);
        assert_eq!(filters[0].frequency_hz, 200.0);
        assert_eq!(filters[0].gain_db, 50.0);
        assert_eq!(filters[1].kind, ShelfKind::High);
        assert_eq!(filters[1].frequency_hz, 2000.0);
        assert_eq!(filters[1].gain_db, -20.0);
    }

    #[test]
    fn treble_only_chain() {
        let filters = ShelfSettings::default().filters_for(ToneGains::new(0, 4));
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].kind, ShelfKind::High);
    }
}
