//! Playlist files
//!
//! A playlist is a TOML document with one `[[tracks]]` table per entry:
//!
//! ```toml
//! name = "Kind of Blue"
//!
//! [[tracks]]
//! id = 1
//! title = "So What"
//! artist = "Miles Davis"
//! media_url = "/audio/so-what.mp3"
//! duration_secs = 562.0
//!
//! [[tracks]]
//! id = 2
//! title = "Freddie Freeloader"
//! artist = "Miles Davis"
//! media_url = "/audio/freddie.mp3"
//! fail = "MEDIA_ERR_NETWORK"
//! ```
//!
//! `fail` makes the simulated element report a media error for that entry.

use crate::error::{Result, SimError};
use musima_playback::Track;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Playlist {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub tracks: Vec<PlaylistEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistEntry {
    pub id: u64,
    pub title: String,
    pub artist: String,

    #[serde(default)]
    pub album: Option<String>,

    #[serde(default)]
    pub cover_art_url: String,

    #[serde(default)]
    pub media_url: String,

    /// Catalog duration
    #[serde(default)]
    pub duration_secs: Option<f64>,

    /// Media error the simulated element raises on load
    #[serde(default)]
    pub fail: Option<String>,
}

impl Playlist {
    /// Read and validate a playlist file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let playlist = Self::parse(&contents)
            .map_err(|e| SimError::Playlist(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(
            "Loaded playlist {:?} with {} tracks",
            playlist.name,
            playlist.tracks.len()
        );
        Ok(playlist)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let playlist: Playlist =
            toml::from_str(contents).map_err(|e| SimError::Playlist(e.to_string()))?;
        playlist.validate()?;
        Ok(playlist)
    }

    fn validate(&self) -> Result<()> {
        if self.tracks.is_empty() {
            return Err(SimError::Playlist("playlist has no tracks".to_string()));
        }

        let mut seen = HashSet::new();
        for entry in &self.tracks {
            if !seen.insert(entry.id) {
                return Err(SimError::Playlist(format!("duplicate track id {}", entry.id)));
            }
            if let Some(duration) = entry.duration_secs {
                if !(duration.is_finite() && duration > 0.0) {
                    return Err(SimError::Playlist(format!(
                        "track {} has invalid duration {}",
                        entry.id, duration
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn to_tracks(&self) -> Vec<Track> {
        self.tracks.iter().map(PlaylistEntry::to_track).collect()
    }
}

impl PlaylistEntry {
    pub fn to_track(&self) -> Track {
        let mut track = Track::new(self.id, &self.title, &self.artist, &self.media_url)
            .with_cover_art(&self.cover_art_url);
        if let Some(album) = &self.album {
            track = track.with_album(album);
        }
        if let Some(duration) = self.duration_secs {
            track = track.with_duration(duration);
        }
        track
    }
}
