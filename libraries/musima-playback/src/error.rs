//! Error types for playback management

use crate::types::TrackId;
use serde::Serialize;
use thiserror::Error;

/// Message shown when a track cannot be played
pub const PLAYBACK_FAILED_MESSAGE: &str = "Unable to play the audio. Check your connection.";

/// Message shown when effects cannot be enabled
pub const EFFECTS_UNAVAILABLE_MESSAGE: &str =
    "Audio effects are not supported here. Playback continues without them.";

/// Playback errors
///
/// These never escape a transport operation. The engine records them in the
/// session (see [`crate::PlaybackSnapshot::error`]) and emits a notification.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PlaybackError {
    /// Track has no media URL to load
    #[error("Track {track_id} has no media URL")]
    #[serde(rename_all = "camelCase")]
    MissingMediaUrl { track_id: TrackId },

    /// The platform refused to start playback (autoplay policy, network, ...)
    #[error("Playback of track {track_id} was rejected: {reason}")]
    #[serde(rename_all = "camelCase")]
    PlayRejected { track_id: TrackId, reason: String },

    /// The media element failed to load or decode the resource
    #[error("Media error for track {track_id}: {message}")]
    #[serde(rename_all = "camelCase")]
    Media { track_id: TrackId, message: String },

    /// The audio-processing graph could not be built
    #[error("Audio effects unavailable: {message}")]
    Capability { message: String },
}

impl PlaybackError {
    /// Track the failure refers to, if any
    pub fn track_id(&self) -> Option<TrackId> {
        match self {
            Self::MissingMediaUrl { track_id }
            | Self::PlayRejected { track_id, .. }
            | Self::Media { track_id, .. } => Some(*track_id),
            Self::Capability { .. } => None,
        }
    }

    /// Short text for the user-facing notification
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Capability { .. } => EFFECTS_UNAVAILABLE_MESSAGE,
            _ => PLAYBACK_FAILED_MESSAGE,
        }
    }
}
