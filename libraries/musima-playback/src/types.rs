//! Core types for playback management

use crate::error::PlaybackError;
use musima_audio::ShelfSettings;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Track identifier, unique within a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A playable song with display metadata
///
/// Tracks come from the library, playlists or search results. The engine only
/// ever references one as "current"; it never creates or edits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Unique track identifier
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name (optional)
    #[serde(default)]
    pub album: Option<String>,

    /// Cover art locator (may be empty)
    #[serde(default)]
    pub cover_art_url: String,

    /// Locator for the playable resource
    #[serde(default)]
    pub media_url: String,

    /// Known duration, if the catalog has one
    #[serde(default)]
    pub duration_secs: Option<f64>,

    /// User like toggle (catalog state, never touched by playback)
    #[serde(default)]
    pub liked: bool,
}

impl Track {
    pub fn new(
        id: u64,
        title: impl Into<String>,
        artist: impl Into<String>,
        media_url: impl Into<String>,
    ) -> Self {
        Self {
            id: TrackId(id),
            title: title.into(),
            artist: artist.into(),
            album: None,
            cover_art_url: String::new(),
            media_url: media_url.into(),
            duration_secs: None,
            liked: false,
        }
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_cover_art(mut self, url: impl Into<String>) -> Self {
        self.cover_art_url = url.into();
        self
    }

    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration_secs = Some(secs);
        self
    }

    /// Whether the track has something the media element can load
    pub fn is_playable(&self) -> bool {
        !self.media_url.trim().is_empty()
    }
}

/// Transport state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// No track loaded
    Idle,

    /// Play requested, waiting for the media element to confirm
    Loading,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Playing => "playing",
            Self::Paused => "paused",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping from volume level to output gain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeCurve {
    /// gain = level / 100
    #[default]
    Linear,

    /// 0-100% mapped onto -60 dB..0 dB
    Logarithmic,
}

/// Configuration for the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Maximum history size (default: 50)
    pub history_size: usize,

    /// Initial volume (0-100, default: 70)
    pub volume: u8,

    /// Past this position "previous" restarts the current track (default: 3s)
    pub previous_restart_secs: f64,

    /// Level-to-gain mapping (default: linear)
    pub volume_curve: VolumeCurve,

    /// Whether to build the bass/treble filter graph at all (default: true)
    pub effects_enabled: bool,

    /// Shelf frequencies and dial scaling
    pub filters: ShelfSettings,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            history_size: 50,
            volume: 70,
            previous_restart_secs: 3.0,
            volume_curve: VolumeCurve::Linear,
            effects_enabled: true,
            filters: ShelfSettings::default(),
        }
    }
}

/// Observable state of the playback session
///
/// This is what every UI surface reads. It is rebuilt after each engine
/// operation and handed to store subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub current_track: Option<Track>,
    pub queue: Vec<Track>,
    pub state: PlaybackState,
    pub is_playing: bool,
    pub volume_level: u8,
    pub is_muted: bool,
    pub previous_volume_level: u8,
    pub progress_secs: f64,
    /// Catalog duration, else the duration reported by the media element
    pub duration_secs: Option<f64>,
    pub bass_gain: i8,
    pub treble_gain: i8,
    /// False once the filter graph has failed to initialize
    pub effects_available: bool,
    pub error: Option<PlaybackError>,
    pub has_next: bool,
    pub has_previous: bool,
    /// Number of tracks in the back-history
    pub history_len: usize,
}

impl PlaybackSnapshot {
    /// Fraction of the track played (0.0 when the duration is unknown)
    pub fn progress_fraction(&self) -> f64 {
        match self.duration_secs {
            Some(duration) if duration > 0.0 => (self.progress_secs / duration).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}
