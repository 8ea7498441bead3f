//! Shared playback session
//!
//! One store per application. Every UI surface subscribes to it and calls
//! the engine's operations through it, so a change made from one surface is
//! seen by all of them.

use crate::{
    engine::PlaybackEngine,
    events::PlaybackEvent,
    media::MediaEvent,
    types::{PlaybackSnapshot, Track},
};
use serde::Serialize;

/// Handle returned by [`PlaybackStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// What a listener receives after an operation
#[derive(Debug, Clone, Serialize)]
pub struct StoreUpdate {
    /// Session state after the operation and any media events it triggered
    pub snapshot: PlaybackSnapshot,
    /// Events emitted along the way, in order
    pub events: Vec<PlaybackEvent>,
}

type Listener = Box<dyn FnMut(&StoreUpdate)>;

/// Playback store
///
/// Each operation runs the engine, drains pending media events, then
/// notifies every listener once. Listeners never see a half-applied state.
pub struct PlaybackStore {
    engine: PlaybackEngine,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
    snapshot: PlaybackSnapshot,
    closed: bool,
}

impl PlaybackStore {
    pub fn new(engine: PlaybackEngine) -> Self {
        let snapshot = engine.snapshot();
        Self {
            engine,
            listeners: Vec::new(),
            next_id: 0,
            snapshot,
            closed: false,
        }
    }

    /// Register a listener called after every state change
    pub fn subscribe(&mut self, listener: impl FnMut(&StoreUpdate) + 'static) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners.push((id, Box::new(listener)));
        tracing::trace!(subscribers = self.listeners.len(), "Listener subscribed");
        id
    }

    /// Remove a listener; returns false if it was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    /// Current session state
    pub fn snapshot(&self) -> &PlaybackSnapshot {
        &self.snapshot
    }

    /// Read-only access to the engine
    pub fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    // ===== Engine operations =====

    pub fn play_track(&mut self, track: Track) {
        self.run(|engine| engine.play_track(track));
    }

    pub fn play_list(&mut self, tracks: Vec<Track>, start_index: usize) {
        self.run(|engine| engine.play_list(tracks, start_index));
    }

    pub fn toggle_play_pause(&mut self) {
        self.run(PlaybackEngine::toggle_play_pause);
    }

    pub fn seek(&mut self, target_secs: f64) {
        self.run(|engine| engine.seek(target_secs));
    }

    pub fn seek_to_fraction(&mut self, fraction: f64) {
        self.run(|engine| engine.seek_to_fraction(fraction));
    }

    pub fn set_volume(&mut self, level: u8) {
        self.run(|engine| engine.set_volume(level));
    }

    pub fn toggle_mute(&mut self) {
        self.run(PlaybackEngine::toggle_mute);
    }

    pub fn next_track(&mut self) {
        self.run(PlaybackEngine::next_track);
    }

    pub fn previous_track(&mut self) {
        self.run(PlaybackEngine::previous_track);
    }

    pub fn enqueue(&mut self, track: Track) {
        self.run(|engine| engine.enqueue(track));
    }

    pub fn clear_queue(&mut self) {
        self.run(PlaybackEngine::clear_queue);
    }

    pub fn remove_from_queue(&mut self, index: usize) -> Option<Track> {
        let mut removed = None;
        self.run(|engine| removed = engine.remove_from_queue(index));
        removed
    }

    pub fn stop(&mut self) {
        self.run(PlaybackEngine::stop);
    }

    pub fn set_bass_gain(&mut self, db: i32) {
        self.run(|engine| engine.set_bass_gain(db));
    }

    pub fn set_treble_gain(&mut self, db: i32) {
        self.run(|engine| engine.set_treble_gain(db));
    }

    pub fn apply_effects(&mut self) {
        self.run(PlaybackEngine::apply_effects);
    }

    pub fn reset_effects(&mut self) {
        self.run(PlaybackEngine::reset_effects);
    }

    pub fn dismiss_error(&mut self) {
        self.run(PlaybackEngine::dismiss_error);
    }

    /// Feed an event from a host that delivers media events itself
    pub fn handle_media_event(&mut self, event: MediaEvent) {
        self.run(|engine| engine.handle_media_event(event));
    }

    /// Process whatever the media element queued since the last operation
    pub fn pump(&mut self) {
        self.run(|_| {});
    }

    /// Release the media element and the filter graph
    ///
    /// Listeners get one final update. Later operations still work on the
    /// session state but no media is loaded until something plays again.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.run(PlaybackEngine::shutdown);
        self.closed = true;
        tracing::debug!("Playback store shut down");
    }

    fn run(&mut self, op: impl FnOnce(&mut PlaybackEngine)) {
        op(&mut self.engine);
        self.engine.pump();
        self.publish();
    }

    fn publish(&mut self) {
        let events = self.engine.drain_events();
        let snapshot = self.engine.snapshot();
        if events.is_empty() && snapshot == self.snapshot {
            return;
        }

        self.snapshot = snapshot.clone();
        let update = StoreUpdate { snapshot, events };
        for (_, listener) in &mut self.listeners {
            listener(&update);
        }
    }
}

impl Drop for PlaybackStore {
    fn drop(&mut self) {
        if !self.closed {
            self.engine.shutdown();
        }
    }
}
