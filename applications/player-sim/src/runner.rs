//! Simulated playback session
//!
//! Drives one [`PlaybackStore`] against a [`SimulatedMediaElement`], stepping
//! the element's virtual clock until playback stops or the tick budget runs
//! out. Every store update is logged.

use crate::config::{GraphKind, SimConfig};
use crate::error::{Result, SimError};
use crate::playlist::Playlist;
use musima_audio::{DspGraph, GraphBackend, UnavailableGraph};
use musima_playback::{
    Notification, PlayPolicy, PlaybackEngine, PlaybackEvent, PlaybackSnapshot, PlaybackState,
    PlaybackStore, Severity, SimulatedMediaElement, StoreUpdate, TrackId,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Reason reported by the element when `reject_play` is set
pub const AUTOPLAY_REJECTION: &str = "NotAllowedError: play() can only be initiated by a user gesture";

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Playlist index to start from
    pub start: usize,

    /// Tick budget; falls back to `simulation.max_ticks`
    pub ticks: Option<u32>,

    pub bass: Option<i32>,
    pub treble: Option<i32>,

    /// Make the element refuse every play request
    pub reject_play: bool,
}

/// Outcome of a run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub snapshot: PlaybackSnapshot,
    pub ticks: u32,
    pub updates: usize,
    pub finished: Vec<TrackId>,
    pub notifications: Vec<Notification>,
}

#[derive(Default)]
struct Journal {
    updates: usize,
    finished: Vec<TrackId>,
    notifications: Vec<Notification>,
}

/// Play `playlist` from `options.start` and return the final session state
pub fn run(config: &SimConfig, playlist: &Playlist, options: &RunOptions) -> Result<RunReport> {
    if options.start >= playlist.len() {
        return Err(SimError::Playlist(format!(
            "start index {} out of range (playlist has {} tracks)",
            options.start,
            playlist.len()
        )));
    }

    let simulation = &config.simulation;
    let (element, controller) = SimulatedMediaElement::new();
    controller.set_default_duration(Some(simulation.default_track_secs));
    if options.reject_play {
        controller.set_play_policy(PlayPolicy::Reject(AUTOPLAY_REJECTION.to_string()));
    }
    for entry in &playlist.tracks {
        if let Some(duration) = entry.duration_secs {
            controller.set_duration(&entry.media_url, duration);
        }
        if let Some(message) = &entry.fail {
            controller.fail_url(&entry.media_url, message);
        }
    }

    let graph: Box<dyn GraphBackend> = match simulation.graph {
        GraphKind::Dsp => Box::new(DspGraph::new(simulation.sample_rate)),
        GraphKind::None => Box::new(UnavailableGraph::with_reason(
            "audio processing disabled in simulation config",
        )),
    };
    let engine = PlaybackEngine::new(config.playback.clone(), Box::new(element), graph);
    let mut store = PlaybackStore::new(engine);

    let journal = Rc::new(RefCell::new(Journal::default()));
    let sink = Rc::clone(&journal);
    store.subscribe(move |update| {
        log_update(update);
        let mut journal = sink.borrow_mut();
        journal.updates += 1;
        for event in &update.events {
            match event {
                PlaybackEvent::TrackFinished { track_id } => journal.finished.push(*track_id),
                PlaybackEvent::Notification(notification) => {
                    journal.notifications.push(notification.clone());
                }
                _ => {}
            }
        }
    });

    tracing::info!(
        "Playing {} from track {} of {}",
        playlist.name.as_deref().unwrap_or("playlist"),
        options.start + 1,
        playlist.len()
    );
    store.play_list(playlist.to_tracks(), options.start);

    if options.bass.is_some() || options.treble.is_some() {
        if let Some(bass) = options.bass {
            store.set_bass_gain(bass);
        }
        if let Some(treble) = options.treble {
            store.set_treble_gain(treble);
        }
        store.apply_effects();
    }

    let budget = options.ticks.unwrap_or(simulation.max_ticks);
    let mut ticks = 0;
    while ticks < budget && store.snapshot().state == PlaybackState::Playing {
        controller.advance(simulation.tick_secs);
        store.pump();
        ticks += 1;
    }

    if store.snapshot().state == PlaybackState::Playing {
        tracing::info!("Tick budget of {} exhausted while playing", budget);
    }

    let snapshot = store.snapshot().clone();
    store.shutdown();
    drop(store);

    let journal = journal.take();
    tracing::info!(
        "Run finished after {} ticks: {} updates, {} tracks finished",
        ticks,
        journal.updates,
        journal.finished.len()
    );

    Ok(RunReport {
        snapshot,
        ticks,
        updates: journal.updates,
        finished: journal.finished,
        notifications: journal.notifications,
    })
}

fn log_update(update: &StoreUpdate) {
    for event in &update.events {
        match event {
            PlaybackEvent::StateChanged { state } => tracing::info!("State: {}", state),
            PlaybackEvent::TrackChanged { track_id: None, .. } => {
                tracing::info!("No track loaded");
            }
            PlaybackEvent::TrackChanged { track_id: Some(id), .. } => {
                match &update.snapshot.current_track {
                    Some(track) if track.id == *id => {
                        tracing::info!("Now playing: {} - {}", track.artist, track.title);
                    }
                    _ => tracing::info!("Now playing: track {}", id),
                }
            }
            PlaybackEvent::TrackFinished { track_id } => {
                tracing::info!("Track {} finished", track_id);
            }
            PlaybackEvent::PositionUpdate { position_secs, .. } => {
                tracing::trace!("Position: {:.1}s", position_secs);
            }
            PlaybackEvent::Notification(notification) => match notification.severity {
                Severity::Info => {
                    tracing::info!("{}: {}", notification.title, notification.description);
                }
                Severity::Error => {
                    tracing::warn!("{}: {}", notification.title, notification.description);
                }
            },
            PlaybackEvent::Error { error } => tracing::error!("Playback error: {}", error),
            other => tracing::debug!("{:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playlist() -> Playlist {
        Playlist::parse(
            r#"
            [[tracks]]
            id = 1
            title = "One"
            artist = "A"
            media_url = "/audio/1.mp3"
            duration_secs = 3.0

            [[tracks]]
            id = 2
            title = "Two"
            artist = "A"
            media_url = "/audio/2.mp3"
            duration_secs = 2.0
            "#,
        )
        .unwrap()
    }

    #[test]
    fn plays_to_the_end() {
        let report = run(&SimConfig::default(), &playlist(), &RunOptions::default()).unwrap();

        assert_eq!(report.finished, vec![TrackId(1), TrackId(2)]);
        assert_eq!(report.snapshot.state, PlaybackState::Idle);
        assert!(report.snapshot.current_track.is_none());
        assert_eq!(report.ticks, 5);
    }

    #[test]
    fn start_out_of_range() {
        let options = RunOptions {
            start: 2,
            ..RunOptions::default()
        };
        assert!(matches!(
            run(&SimConfig::default(), &playlist(), &options),
            Err(SimError::Playlist(_))
        ));
    }
}
