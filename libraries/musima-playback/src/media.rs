//! Media element abstraction
//!
//! The engine drives exactly one media element. The platform provides it
//! (an `HtmlAudioElement` in the browser, a simulated element in tests and
//! headless hosts). Everything the element reports back is an asynchronous
//! [`MediaEvent`] tagged with the generation, transport epoch or seek it
//! belongs to, so events from superseded requests can be detected and dropped.

use musima_audio::ElementHandle;
use std::fmt;

/// Token identifying one loaded resource
///
/// Every `load` gets a fresh generation. Events carrying an older generation
/// belong to a track that is no longer current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// An asynchronous play request
///
/// `epoch` changes on every play/pause decision. A resolution for an older
/// epoch is stale even if the generation still matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayRequest {
    pub generation: Generation,
    pub epoch: u64,
}

/// Something the element reported
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEventKind {
    /// Enough data to start; duration if the element knows it
    CanPlay { duration_secs: Option<f64> },

    /// Native progress event
    ///
    /// `seek` is the token of the last seek the element had received when
    /// the event was produced.
    TimeUpdate { position_secs: f64, seek: u64 },

    /// Playback reached the end of the resource
    Ended,

    /// Load or decode failure
    Error { message: String },

    /// A play request was honoured
    PlayResolved { epoch: u64 },

    /// A play request was refused (autoplay policy, network, ...)
    PlayRejected { epoch: u64, reason: String },
}

/// Event delivered by a media element
#[derive(Debug, Clone, PartialEq)]
pub struct MediaEvent {
    pub generation: Generation,
    pub kind: MediaEventKind,
}

impl MediaEvent {
    pub fn new(generation: Generation, kind: MediaEventKind) -> Self {
        Self { generation, kind }
    }
}

/// Platform media element
///
/// Calls never block and never fail synchronously: every outcome comes back
/// through [`MediaElement::poll_event`].
pub trait MediaElement {
    /// Stable identity of the element, used to bind the filter graph
    fn handle(&self) -> ElementHandle;

    /// Start loading `url`; subsequent events carry `generation`
    fn load(&mut self, url: &str, generation: Generation);

    /// Request playback of the loaded resource
    ///
    /// Settles later with `PlayResolved` or `PlayRejected` for `request.epoch`.
    fn play(&mut self, request: PlayRequest);

    fn pause(&mut self);

    /// Move the play cursor
    ///
    /// Later `TimeUpdate`s carry `seek` so progress reported before the move
    /// can be told apart.
    fn seek(&mut self, position_secs: f64, seek: u64);

    /// Output gain (0.0-1.0)
    fn set_gain(&mut self, gain: f32);

    /// Drop the loaded resource
    fn unload(&mut self);

    /// Next pending event, if any
    fn poll_event(&mut self) -> Option<MediaEvent>;
}
