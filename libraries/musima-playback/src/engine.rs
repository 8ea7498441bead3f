//! Playback engine - core orchestration
//!
//! Owns the media element, the filter graph, the queue and the live session
//! state. Transport operations never fail: problems are recorded in the
//! session and reported as events.

use crate::{
    error::PlaybackError,
    events::{Notification, PlaybackEvent},
    history::History,
    media::{Generation, MediaElement, MediaEvent, MediaEventKind, PlayRequest},
    queue::Queue,
    types::{PlaybackConfig, PlaybackSnapshot, PlaybackState, Track, TrackId},
    volume::Volume,
};
use musima_audio::{FilterGraph, GraphBackend, GraphError, GraphNode, ToneGains};

/// Lifecycle of the lazily built filter graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EffectsStatus {
    /// Not built yet; built on first play or apply
    Pending,
    Active,
    /// Initialization failed once; never retried
    Unavailable,
    /// Turned off by configuration or after shutdown
    Disabled,
}

/// Playback engine
///
/// Responsibilities:
/// - Transport (play/pause/seek/next/previous/stop)
/// - Queue and bounded back-history
/// - Volume and mute
/// - Bass/treble filter chain
/// - Reacting to media element events (progress, end, errors, play results)
///
/// Asynchronous results are matched against the current generation (which
/// track is loaded) and transport epoch (which play/pause decision is
/// current). Anything else is stale and dropped.
pub struct PlaybackEngine {
    config: PlaybackConfig,

    // State
    state: PlaybackState,
    current_track: Option<Track>,
    progress_secs: f64,
    media_duration_secs: Option<f64>,
    last_error: Option<PlaybackError>,

    // Queue and history
    queue: Queue,
    history: History,

    // Output
    volume: Volume,
    gains: ToneGains,
    element: Box<dyn MediaElement>,
    graph: FilterGraph,
    effects: EffectsStatus,

    // Supersede tokens
    generation: Generation,
    epoch: u64,
    seek_token: u64,
    // False after a media error; resuming reloads the resource
    media_ready: bool,

    // Event queue for UI synchronization
    pending_events: Vec<PlaybackEvent>,
}

impl PlaybackEngine {
    /// Create an engine driving `element`, with effects built on `backend`
    pub fn new(
        config: PlaybackConfig,
        element: Box<dyn MediaElement>,
        backend: Box<dyn GraphBackend>,
    ) -> Self {
        let volume = Volume::new(config.volume, config.volume_curve);
        let effects = if config.effects_enabled {
            EffectsStatus::Pending
        } else {
            EffectsStatus::Disabled
        };

        let mut engine = Self {
            state: PlaybackState::Idle,
            current_track: None,
            progress_secs: 0.0,
            media_duration_secs: None,
            last_error: None,
            queue: Queue::new(),
            history: History::new(config.history_size),
            volume,
            gains: ToneGains::flat(),
            element,
            graph: FilterGraph::with_settings(backend, config.filters),
            effects,
            generation: Generation::default(),
            epoch: 0,
            seek_token: 0,
            media_ready: false,
            pending_events: Vec::new(),
            config,
        };
        engine.apply_gain();
        engine
    }

    // ===== Playback Control =====

    /// Make `track` current and start playing it from the beginning
    ///
    /// The previous current track (if any) goes to the back-history.
    pub fn play_track(&mut self, track: Track) {
        let previous = self.current_track.take();
        let previous_id = previous.as_ref().map(|t| t.id);
        if let Some(previous) = previous {
            self.history.push(previous);
        }
        self.start(track, previous_id);
    }

    /// Play `tracks[start_index]` and queue the rest of the list after it
    ///
    /// Tracks before `start_index` are not queued, so playback stops after the
    /// last entry of the list.
    pub fn play_list(&mut self, mut tracks: Vec<Track>, start_index: usize) {
        if start_index >= tracks.len() {
            tracing::warn!(
                start_index,
                len = tracks.len(),
                "play_list index out of range, ignoring"
            );
            return;
        }

        let mut rest = tracks.split_off(start_index);
        let first = rest.remove(0);
        self.queue.replace(rest);
        self.emit_queue_changed();
        self.play_track(first);
    }

    /// Flip between playing and paused
    ///
    /// With nothing loaded this promotes the queue head, or does nothing if
    /// the queue is empty.
    pub fn toggle_play_pause(&mut self) {
        match self.state {
            PlaybackState::Idle => {
                if let Some(next) = self.queue.pop_next() {
                    self.emit_queue_changed();
                    self.play_track(next);
                } else {
                    tracing::debug!("Nothing to play");
                }
            }
            PlaybackState::Playing | PlaybackState::Loading => self.pause(),
            PlaybackState::Paused => self.resume(),
        }
    }

    /// Pause playback (also cancels a pending play request)
    pub fn pause(&mut self) {
        if !matches!(self.state, PlaybackState::Playing | PlaybackState::Loading) {
            return;
        }
        self.epoch += 1;
        self.element.pause();
        self.set_state(PlaybackState::Paused);
    }

    /// Resume a paused track from the current position
    pub fn resume(&mut self) {
        if self.state != PlaybackState::Paused {
            return;
        }
        let Some(track) = self.current_track.clone() else {
            return;
        };

        self.last_error = None;
        if !track.is_playable() {
            self.fail(PlaybackError::MissingMediaUrl { track_id: track.id });
            return;
        }

        if !self.media_ready {
            // Previous load failed; fetch again and restore the cursor
            self.generation = self.generation.next();
            self.element.load(&track.media_url, self.generation);
            self.seek_element(self.progress_secs);
            self.media_ready = true;
        }
        self.request_play();
    }

    /// Stop playback and unload the current track (the queue is kept)
    pub fn stop(&mut self) {
        if self.current_track.is_none() && self.state == PlaybackState::Idle {
            return;
        }

        self.supersede();
        self.element.unload();
        self.media_ready = false;

        let previous = self.current_track.take();
        let previous_id = previous.as_ref().map(|t| t.id);
        if let Some(previous) = previous {
            self.history.push(previous);
        }
        self.reset_progress();
        self.set_state(PlaybackState::Idle);
        self.emit(PlaybackEvent::TrackChanged {
            track_id: None,
            previous_track_id: previous_id,
        });
    }

    /// Skip to the queue head, or stop when the queue is exhausted
    pub fn next_track(&mut self) {
        match self.queue.pop_next() {
            Some(next) => {
                self.emit_queue_changed();
                self.play_track(next);
            }
            None => {
                tracing::debug!("Queue exhausted, stopping");
                self.stop();
            }
        }
    }

    /// Go to previous track
    ///
    /// Past `previous_restart_secs`, or with no history, restarts the current
    /// track. Otherwise the current track goes back to the front of the queue
    /// and the most recent history entry plays.
    pub fn previous_track(&mut self) {
        let restart = self.progress_secs > self.config.previous_restart_secs
            || self.history.is_empty();

        if self.current_track.is_some() && restart {
            self.seek(0.0);
            return;
        }

        let Some(previous) = self.history.pop() else {
            return;
        };
        let current = self.current_track.take();
        let current_id = current.as_ref().map(|t| t.id);
        if let Some(current) = current {
            self.queue.push_front(current);
            self.emit_queue_changed();
        }
        self.start(previous, current_id);
    }

    // ===== Seek =====

    /// Move the play cursor, clamped into [0, duration]
    ///
    /// Does not change the transport state.
    pub fn seek(&mut self, target_secs: f64) {
        if self.current_track.is_none() || !target_secs.is_finite() {
            return;
        }

        let position = self.clamp_position(target_secs);
        self.progress_secs = position;
        self.seek_element(position);
        self.emit_position();
    }

    /// Seek by fraction of the track (0.0 - 1.0)
    pub fn seek_to_fraction(&mut self, fraction: f64) {
        if let Some(duration) = self.duration_secs() {
            self.seek(fraction.clamp(0.0, 1.0) * duration);
        }
    }

    // ===== Volume =====

    /// Set volume (0-100); the mute state is left alone
    pub fn set_volume(&mut self, level: u8) {
        self.volume.set_level(level);
        self.apply_gain();
        self.emit_volume_changed();
    }

    pub fn toggle_mute(&mut self) {
        self.volume.toggle_mute();
        self.apply_gain();
        self.emit_volume_changed();
    }

    // ===== Queue Management =====

    /// Add track to end of queue
    pub fn enqueue(&mut self, track: Track) {
        self.queue.push_back(track);
        self.emit_queue_changed();
    }

    pub fn clear_queue(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        self.queue.clear();
        self.emit_queue_changed();
    }

    /// Remove track from queue by index
    pub fn remove_from_queue(&mut self, index: usize) -> Option<Track> {
        let removed = self.queue.remove(index)?;
        self.emit_queue_changed();
        Some(removed)
    }

    // ===== Effects =====

    /// Set the bass dial (-10..=10); takes effect on the next apply
    pub fn set_bass_gain(&mut self, db: i32) {
        self.gains = self.gains.with_bass(db);
    }

    /// Set the treble dial (-10..=10); takes effect on the next apply
    pub fn set_treble_gain(&mut self, db: i32) {
        self.gains = self.gains.with_treble(db);
    }

    /// Rebuild the filter chain for the current dials
    pub fn apply_effects(&mut self) {
        let was_active = self.effects == EffectsStatus::Active;
        if !self.ensure_effects() {
            tracing::debug!("Effects not available, nothing applied");
            return;
        }
        if was_active && !self.rebuild_chain() {
            return;
        }

        self.emit(PlaybackEvent::EffectsApplied { gains: self.gains });
        self.emit(PlaybackEvent::Notification(Notification::effects_applied(
            self.gains,
        )));
    }

    /// Flatten both dials and apply
    pub fn reset_effects(&mut self) {
        self.gains = ToneGains::flat();
        self.apply_effects();
    }

    // ===== Media Events =====

    /// Drain and handle every event the element has queued
    pub fn pump(&mut self) {
        while let Some(event) = self.element.poll_event() {
            self.handle_media_event(event);
        }
    }

    pub fn handle_media_event(&mut self, event: MediaEvent) {
        if event.generation != self.generation {
            tracing::trace!(
                event_generation = %event.generation,
                current = %self.generation,
                kind = ?event.kind,
                "Dropping media event for superseded track"
            );
            return;
        }

        match event.kind {
            MediaEventKind::CanPlay { duration_secs } => self.on_can_play(duration_secs),
            MediaEventKind::TimeUpdate { position_secs, seek } => {
                if seek != self.seek_token {
                    tracing::trace!(
                        seek,
                        current = self.seek_token,
                        "Ignoring progress from before a seek"
                    );
                    return;
                }
                self.on_time_update(event.generation, position_secs);
            }
            MediaEventKind::Ended => self.on_track_ended(event.generation),
            MediaEventKind::Error { message } => self.on_media_error(message),
            MediaEventKind::PlayResolved { epoch } => self.on_play_resolved(epoch),
            MediaEventKind::PlayRejected { epoch, reason } => self.on_play_rejected(epoch, reason),
        }
    }

    /// The element reached the end of the track loaded as `generation`
    ///
    /// Advances exactly once: a repeated or stale end signal no longer matches
    /// the current generation.
    pub fn on_track_ended(&mut self, generation: Generation) {
        if generation != self.generation {
            tracing::trace!(%generation, "Ignoring end of superseded track");
            return;
        }
        let Some(track_id) = self.current_track.as_ref().map(|t| t.id) else {
            return;
        };

        tracing::debug!(%track_id, "Track finished");
        self.emit(PlaybackEvent::TrackFinished { track_id });
        self.next_track();
    }

    /// Native progress event for the track loaded as `generation`
    pub fn on_time_update(&mut self, generation: Generation, position_secs: f64) {
        if generation != self.generation || self.current_track.is_none() {
            return;
        }
        if !position_secs.is_finite() {
            return;
        }

        let position = self.clamp_position(position_secs);
        if position != self.progress_secs {
            self.progress_secs = position;
            self.emit_position();
        }
    }

    fn on_can_play(&mut self, duration_secs: Option<f64>) {
        self.media_ready = true;
        if let Some(duration) = duration_secs.filter(|d| d.is_finite() && *d > 0.0) {
            self.media_duration_secs = Some(duration);
            let clamped = self.clamp_position(self.progress_secs);
            if clamped != self.progress_secs {
                self.progress_secs = clamped;
                self.emit_position();
            }
        }
    }

    fn on_media_error(&mut self, message: String) {
        let Some(track_id) = self.current_track.as_ref().map(|t| t.id) else {
            return;
        };
        self.media_ready = false;
        self.fail(PlaybackError::Media { track_id, message });
    }

    fn on_play_resolved(&mut self, epoch: u64) {
        if epoch != self.epoch || self.state != PlaybackState::Loading {
            tracing::trace!(epoch, current = self.epoch, "Ignoring stale play resolution");
            return;
        }
        self.last_error = None;
        self.set_state(PlaybackState::Playing);
    }

    fn on_play_rejected(&mut self, epoch: u64, reason: String) {
        if epoch != self.epoch {
            tracing::trace!(epoch, current = self.epoch, "Ignoring stale play rejection");
            return;
        }
        let Some(track_id) = self.current_track.as_ref().map(|t| t.id) else {
            return;
        };
        self.fail(PlaybackError::PlayRejected { track_id, reason });
    }

    // ===== Session =====

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    /// Take every event queued since the last drain
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Stop playback and release the media element and the filter graph
    pub fn shutdown(&mut self) {
        self.stop();
        self.graph.close();
        if self.effects != EffectsStatus::Unavailable {
            self.effects = EffectsStatus::Disabled;
        }
        tracing::debug!("Playback engine shut down");
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            current_track: self.current_track.clone(),
            queue: self.queue.to_vec(),
            state: self.state,
            is_playing: self.is_playing(),
            volume_level: self.volume.level(),
            is_muted: self.volume.is_muted(),
            previous_volume_level: self.volume.previous_level(),
            progress_secs: self.progress_secs,
            duration_secs: self.duration_secs(),
            bass_gain: self.gains.bass(),
            treble_gain: self.gains.treble(),
            effects_available: self.effects_available(),
            error: self.last_error.clone(),
            has_next: !self.queue.is_empty(),
            has_previous: !self.history.is_empty(),
            history_len: self.history.len(),
        }
    }

    // ===== State Queries =====

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current_track.as_ref()
    }

    pub fn queue(&self) -> Vec<&Track> {
        self.queue.get_all()
    }

    /// Back-history, oldest first
    pub fn history(&self) -> Vec<&Track> {
        self.history.iter().collect()
    }

    pub fn progress_secs(&self) -> f64 {
        self.progress_secs
    }

    /// Catalog duration, else what the element reported
    pub fn duration_secs(&self) -> Option<f64> {
        self.current_track
            .as_ref()
            .and_then(|t| t.duration_secs)
            .or(self.media_duration_secs)
    }

    pub fn volume(&self) -> u8 {
        self.volume.level()
    }

    pub fn is_muted(&self) -> bool {
        self.volume.is_muted()
    }

    pub fn gains(&self) -> ToneGains {
        self.gains
    }

    pub fn last_error(&self) -> Option<&PlaybackError> {
        self.last_error.as_ref()
    }

    /// False once the filter graph failed or effects are disabled
    pub fn effects_available(&self) -> bool {
        matches!(self.effects, EffectsStatus::Pending | EffectsStatus::Active)
    }

    /// Connected filter chain (empty until the graph is built)
    pub fn filter_topology(&self) -> Vec<GraphNode> {
        self.graph.topology()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    // ===== Internals =====

    /// Load `track` under a fresh generation and request playback
    fn start(&mut self, track: Track, previous_id: Option<TrackId>) {
        self.supersede();
        self.reset_progress();
        self.last_error = None;

        let track_id = track.id;
        let playable = track.is_playable();
        let url = track.media_url.clone();
        self.current_track = Some(track);
        self.emit(PlaybackEvent::TrackChanged {
            track_id: Some(track_id),
            previous_track_id: previous_id,
        });

        if !playable {
            self.element.unload();
            self.media_ready = false;
            self.fail(PlaybackError::MissingMediaUrl { track_id });
            return;
        }

        if self.effects == EffectsStatus::Pending && self.ensure_effects() {
            tracing::debug!(gains = %self.gains, "Effects initialized on first play");
        }

        tracing::debug!(%track_id, url = %url, generation = %self.generation, "Loading track");
        self.element.load(&url, self.generation);
        self.media_ready = true;
        self.request_play();
    }

    fn request_play(&mut self) {
        self.epoch += 1;
        self.element.play(PlayRequest {
            generation: self.generation,
            epoch: self.epoch,
        });
        self.set_state(PlaybackState::Loading);
    }

    /// Move the element's cursor under a fresh seek token
    fn seek_element(&mut self, position_secs: f64) {
        self.seek_token += 1;
        self.element.seek(position_secs, self.seek_token);
    }

    /// Invalidate every outstanding event and play request
    fn supersede(&mut self) {
        self.generation = self.generation.next();
        self.epoch += 1;
    }

    /// Record a playback failure and settle on a consistent state
    fn fail(&mut self, error: PlaybackError) {
        tracing::warn!(error = %error, "Playback failed");

        self.epoch += 1;
        self.element.pause();
        let state = if self.current_track.is_some() {
            PlaybackState::Paused
        } else {
            PlaybackState::Idle
        };
        self.set_state(state);

        self.report(error.clone());
        self.last_error = Some(error);
    }

    fn report(&mut self, error: PlaybackError) {
        let notification = Notification::for_error(&error);
        self.emit(PlaybackEvent::Error { error });
        self.emit(PlaybackEvent::Notification(notification));
    }

    /// Build the graph if it has not been tried yet
    ///
    /// Returns whether effects are active. A failure is reported once and
    /// playback carries on unfiltered.
    fn ensure_effects(&mut self) -> bool {
        match self.effects {
            EffectsStatus::Active => return true,
            EffectsStatus::Unavailable | EffectsStatus::Disabled => return false,
            EffectsStatus::Pending => {}
        }

        let handle = self.element.handle();
        let result = self
            .graph
            .initialize(handle)
            .and_then(|()| self.graph.rebuild_chain(self.gains));

        match result {
            Ok(()) => {
                self.effects = EffectsStatus::Active;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Filter graph unavailable, playing unfiltered");
                self.disable_effects(&e);
                false
            }
        }
    }

    fn rebuild_chain(&mut self) -> bool {
        match self.graph.rebuild_chain(self.gains) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to rebuild filter chain, playing unfiltered");
                self.disable_effects(&e);
                false
            }
        }
    }

    /// Give up on effects for this session
    ///
    /// A graph that is still bound already routes source to destination and
    /// stays open until shutdown.
    fn disable_effects(&mut self, error: &GraphError) {
        self.effects = EffectsStatus::Unavailable;
        self.report(PlaybackError::Capability {
            message: error.to_string(),
        });
    }

    fn apply_gain(&mut self) {
        self.element.set_gain(self.volume.gain());
    }

    fn clamp_position(&self, secs: f64) -> f64 {
        let max = self.duration_secs().unwrap_or(f64::INFINITY);
        secs.clamp(0.0, max.max(0.0))
    }

    fn reset_progress(&mut self) {
        self.progress_secs = 0.0;
        self.media_duration_secs = None;
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            tracing::debug!(from = %self.state, to = %state, "Playback state changed");
            self.state = state;
            self.emit(PlaybackEvent::StateChanged { state });
        }
    }

    fn emit(&mut self, event: PlaybackEvent) {
        self.pending_events.push(event);
    }

    fn emit_queue_changed(&mut self) {
        self.emit(PlaybackEvent::QueueChanged {
            length: self.queue.len(),
        });
    }

    fn emit_volume_changed(&mut self) {
        self.emit(PlaybackEvent::VolumeChanged {
            level: self.volume.level(),
            is_muted: self.volume.is_muted(),
        });
    }

    fn emit_position(&mut self) {
        self.emit(PlaybackEvent::PositionUpdate {
            position_secs: self.progress_secs,
            duration_secs: self.duration_secs(),
        });
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.element.unload();
    }
}
