//! Musima - Playback Engine
//!
//! Platform-agnostic playback session for Musima.
//!
//! This crate provides:
//! - Transport control (play/pause/seek/next/previous/stop)
//! - Pending-track queue and bounded back-history
//! - Volume control (0-100%, mute/unmute with level restore)
//! - Bass/treble effects through a lazily built filter graph
//! - A shared store with subscribe/notify for every UI surface
//!
//! # Architecture
//!
//! `musima-playback` never touches a platform API directly:
//! - The media element is a [`MediaElement`] trait object
//! - The filter graph backend comes from `musima-audio`
//! - Asynchronous results come back as [`MediaEvent`]s and are matched
//!   against a generation/epoch pair, so stale ones are dropped
//!
//! [`SimulatedMediaElement`] is a headless element for tests and native
//! hosts. The `wasm` feature adds `HtmlAudioElement` and Web Audio bindings.
//!
//! # Example: Basic Playback
//!
//! ```rust
//! use musima_audio::DspGraph;
//! use musima_playback::{
//!     PlaybackConfig, PlaybackEngine, PlaybackState, PlaybackStore, SimulatedMediaElement, Track,
//! };
//!
//! let (element, controller) = SimulatedMediaElement::new();
//! controller.set_default_duration(Some(200.0));
//!
//! let engine = PlaybackEngine::new(
//!     PlaybackConfig::default(),
//!     Box::new(element),
//!     Box::new(DspGraph::new(44100)),
//! );
//! let mut store = PlaybackStore::new(engine);
//!
//! store.subscribe(|update| println!("state: {}", update.snapshot.state));
//!
//! store.play_track(Track::new(1, "So What", "Miles Davis", "/audio/so-what.mp3"));
//! store.enqueue(Track::new(2, "Freddie Freeloader", "Miles Davis", "/audio/freddie.mp3"));
//! assert_eq!(store.snapshot().state, PlaybackState::Playing);
//!
//! // Run the first track to its end; the queue head takes over
//! controller.advance(200.0);
//! store.pump();
//! assert_eq!(store.snapshot().current_track.as_ref().map(|t| t.id.0), Some(2));
//! ```
//!
//! # Example: Effects
//!
//! ```rust
//! # use musima_audio::DspGraph;
//! # use musima_playback::{PlaybackConfig, PlaybackEngine, PlaybackStore, SimulatedMediaElement};
//! # let (element, _controller) = SimulatedMediaElement::new();
//! # let engine = PlaybackEngine::new(PlaybackConfig::default(), Box::new(element), Box::new(DspGraph::new(44100)));
//! # let mut store = PlaybackStore::new(engine);
//! store.set_bass_gain(5);
//! store.apply_effects(); // "Audio Effects Applied" - "Bass: +5, Treble: 0"
//! assert_eq!(store.snapshot().bass_gain, 5);
//! ```

mod engine;
mod error;
mod events;
mod history;
pub mod media;
mod queue;
mod simulated;
mod store;
pub mod types;
mod volume;

pub mod wasm;

// Public exports
pub use engine::PlaybackEngine;
pub use error::{PlaybackError, EFFECTS_UNAVAILABLE_MESSAGE, PLAYBACK_FAILED_MESSAGE};
pub use events::{Notification, PlaybackEvent, Severity};
pub use media::{Generation, MediaElement, MediaEvent, MediaEventKind, PlayRequest};
pub use simulated::{PlayPolicy, SimulatedController, SimulatedMediaElement};
pub use store::{PlaybackStore, StoreUpdate, SubscriptionId};
pub use types::{
    PlaybackConfig, PlaybackSnapshot, PlaybackState, Track, TrackId, VolumeCurve,
};
