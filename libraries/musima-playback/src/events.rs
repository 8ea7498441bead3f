//! Playback Events
//!
//! Event-based communication for UI synchronization. The engine queues
//! events as operations run; the store drains them and hands them to
//! subscribers together with the snapshot they produced.

use crate::error::PlaybackError;
use crate::types::{PlaybackState, TrackId};
use musima_audio::ToneGains;
use serde::Serialize;

/// Events emitted by the playback engine
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlaybackEvent {
    /// Transport state changed
    StateChanged {
        /// The new playback state
        state: PlaybackState,
    },

    /// Current track changed (including to none)
    #[serde(rename_all = "camelCase")]
    TrackChanged {
        /// ID of the new current track
        track_id: Option<TrackId>,
        /// ID of the track it replaced
        previous_track_id: Option<TrackId>,
    },

    /// Track reached its natural end
    #[serde(rename_all = "camelCase")]
    TrackFinished {
        /// ID of the finished track
        track_id: TrackId,
    },

    /// Position update, driven by the media element's progress events
    #[serde(rename_all = "camelCase")]
    PositionUpdate {
        position_secs: f64,
        duration_secs: Option<f64>,
    },

    /// Volume or mute changed
    #[serde(rename_all = "camelCase")]
    VolumeChanged {
        /// New volume level (0-100)
        level: u8,
        /// Whether audio is muted
        is_muted: bool,
    },

    /// Queue changed (tracks added/removed/cleared)
    QueueChanged {
        /// New queue length
        length: usize,
    },

    /// Filter chain rebuilt for new tone gains
    EffectsApplied { gains: ToneGains },

    /// One-shot, dismissible message for the user
    Notification(Notification),

    /// Error recorded in the session
    Error { error: PlaybackError },
}

/// Severity of a user notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Error,
}

/// Toast-style message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notification {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Info,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Error,
        }
    }

    /// "Audio Effects Applied" with the gains as description
    pub fn effects_applied(gains: ToneGains) -> Self {
        Self::info("Audio Effects Applied", gains.to_string())
    }

    /// Notification for a recorded playback error
    pub fn for_error(error: &PlaybackError) -> Self {
        let title = match error {
            PlaybackError::Capability { .. } => "Audio Effects Unavailable",
            _ => "Playback Error",
        };
        Self::error(title, error.user_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PLAYBACK_FAILED_MESSAGE;

    #[test]
    fn effects_applied_text() {
        let notification = Notification::effects_applied(ToneGains::new(5, 0));
        assert_eq!(notification.title, "Audio Effects Applied");
        assert_eq!(notification.description, "Bass: +5, Treble: 0");
        assert_eq!(notification.severity, Severity::Info);
    }

    #[test]
    fn error_notification_uses_user_message() {
        let error = PlaybackError::Media {
            track_id: TrackId(3),
            message: "404".to_string(),
        };
        let notification = Notification::for_error(&error);
        assert_eq!(notification.title, "Playback Error");
        assert_eq!(notification.description, PLAYBACK_FAILED_MESSAGE);
        assert_eq!(notification.severity, Severity::Error);
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = PlaybackEvent::VolumeChanged {
            level: 40,
            is_muted: false,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "volumeChanged");
        assert_eq!(json["isMuted"], false);
    }
}
