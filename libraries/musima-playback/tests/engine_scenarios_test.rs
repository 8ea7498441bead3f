//! Scenario tests for PlaybackEngine
//!
//! Covers:
//! - Transport from an empty session
//! - Auto-advance on track end
//! - Volume versus mute
//! - Failed playback and recovery
//! - Superseded asynchronous results (stale events)
//! - Seek/play-pause independence

use musima_audio::{DspGraph, Endpoint, GraphNode, ShelfKind, ShelfSettings, UnavailableGraph};
use musima_playback::{
    Generation, MediaEvent, MediaEventKind, Notification, PlayPolicy, PlaybackConfig,
    PlaybackEngine, PlaybackError, PlaybackEvent, PlaybackState, SimulatedController,
    SimulatedMediaElement, Track, TrackId, PLAYBACK_FAILED_MESSAGE,
};

// ============================================================================
// Test Infrastructure
// ============================================================================

fn track(id: u64) -> Track {
    Track::new(id, format!("Track {}", id), "Test Artist", format!("/audio/{}.mp3", id))
}

fn setup() -> (PlaybackEngine, SimulatedController) {
    setup_with(PlaybackConfig::default())
}

fn setup_with(config: PlaybackConfig) -> (PlaybackEngine, SimulatedController) {
    let (element, controller) = SimulatedMediaElement::new();
    controller.set_default_duration(Some(120.0));
    let engine = PlaybackEngine::new(config, Box::new(element), Box::new(DspGraph::new(44100)));
    (engine, controller)
}

fn current_id(engine: &PlaybackEngine) -> Option<TrackId> {
    engine.current_track().map(|t| t.id)
}

// ============================================================================
// Transport
// ============================================================================

#[test]
fn toggle_with_nothing_to_play_is_noop() {
    let (mut engine, controller) = setup();

    engine.toggle_play_pause();
    engine.pump();

    assert_eq!(engine.state(), PlaybackState::Idle);
    assert!(!engine.is_playing());
    assert!(engine.current_track().is_none());
    assert_eq!(controller.play_requests(), 0);
    assert!(engine.drain_events().is_empty());
}

#[test]
fn toggle_from_idle_promotes_queue_head() {
    let (mut engine, _controller) = setup();
    engine.enqueue(track(1));
    engine.enqueue(track(2));

    engine.toggle_play_pause();
    engine.pump();

    assert_eq!(current_id(&engine), Some(TrackId(1)));
    assert_eq!(engine.queue().len(), 1);
    assert!(engine.is_playing());
}

#[test]
fn track_end_advances_to_queued_track() {
    let (mut engine, controller) = setup();
    engine.play_track(track(1));
    engine.enqueue(track(2));
    engine.pump();
    controller.advance(30.0);
    engine.pump();
    assert_eq!(engine.progress_secs(), 30.0);

    let generation = engine.generation();
    engine.on_track_ended(generation);
    engine.pump();

    assert_eq!(current_id(&engine), Some(TrackId(2)));
    assert!(engine.queue().is_empty());
    assert_eq!(engine.progress_secs(), 0.0);
    assert!(engine.is_playing());
    assert_eq!(controller.loaded_url().as_deref(), Some("/audio/2.mp3"));
}

#[test]
fn natural_end_of_last_track_goes_idle() {
    let (mut engine, controller) = setup();
    engine.play_track(track(1));
    engine.pump();

    controller.advance(200.0);
    engine.pump();

    assert_eq!(engine.state(), PlaybackState::Idle);
    assert!(engine.current_track().is_none());
    assert!(!engine.is_playing());

    let finished: Vec<_> = engine
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, PlaybackEvent::TrackFinished { .. }))
        .collect();
    assert_eq!(
        finished,
        vec![PlaybackEvent::TrackFinished {
            track_id: TrackId(1)
        }]
    );
}

#[test]
fn play_list_runs_to_the_end_of_the_list() {
    let (mut engine, controller) = setup();
    controller.set_default_duration(Some(10.0));
    engine.play_list((1..=3).map(track).collect(), 1);
    engine.pump();

    controller.advance(10.0);
    engine.pump();
    assert_eq!(current_id(&engine), Some(TrackId(3)));

    controller.advance(10.0);
    engine.pump();
    assert_eq!(engine.state(), PlaybackState::Idle);
}

#[test]
fn duplicate_end_event_advances_once() {
    let (mut engine, controller) = setup();
    engine.play_track(track(1));
    engine.enqueue(track(2));
    engine.enqueue(track(3));
    engine.pump();

    let ended = engine.generation();
    controller.push_event(MediaEvent::new(ended, MediaEventKind::Ended));
    controller.push_event(MediaEvent::new(ended, MediaEventKind::Ended));
    engine.pump();

    assert_eq!(current_id(&engine), Some(TrackId(2)));
    assert_eq!(engine.queue().len(), 1);
}

#[test]
fn next_with_empty_queue_stops() {
    let (mut engine, controller) = setup();
    engine.play_track(track(1));
    engine.pump();

    engine.next_track();

    assert_eq!(engine.state(), PlaybackState::Idle);
    assert!(engine.current_track().is_none());
    assert!(controller.loaded_url().is_none());
}

#[test]
fn enqueue_and_clear_leave_transport_alone() {
    let (mut engine, _controller) = setup();
    engine.play_track(track(1));
    engine.pump();

    engine.enqueue(track(2));
    engine.clear_queue();

    assert_eq!(current_id(&engine), Some(TrackId(1)));
    assert!(engine.is_playing());
    assert!(engine.queue().is_empty());
}

// ============================================================================
// Volume
// ============================================================================

#[test]
fn explicit_zero_volume_is_not_mute() {
    let (mut engine, controller) = setup();

    engine.set_volume(0);

    assert_eq!(engine.volume(), 0);
    assert!(!engine.is_muted());
    assert_eq!(controller.gain(), 0.0);
}

#[test]
fn mute_round_trip_restores_volume() {
    let (mut engine, controller) = setup();
    engine.set_volume(45);

    engine.toggle_mute();
    assert!(engine.is_muted());
    assert_eq!(engine.volume(), 0);
    assert_eq!(engine.snapshot().previous_volume_level, 45);
    assert_eq!(controller.gain(), 0.0);

    engine.toggle_mute();
    assert!(!engine.is_muted());
    assert_eq!(engine.volume(), 45);
    assert!((controller.gain() - 0.45).abs() < 1e-6);
}

#[test]
fn volume_above_range_is_clamped() {
    let (mut engine, controller) = setup();
    engine.set_volume(250);
    assert_eq!(engine.volume(), 100);
    assert_eq!(controller.gain(), 1.0);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn rejected_play_keeps_track_and_reports_error() {
    let (mut engine, controller) = setup();
    controller.set_play_policy(PlayPolicy::Reject("NotAllowedError".to_string()));

    engine.play_track(track(7));
    engine.pump();

    assert!(!engine.is_playing());
    assert_eq!(engine.state(), PlaybackState::Paused);
    assert_eq!(current_id(&engine), Some(TrackId(7)));
    assert_eq!(
        engine.last_error(),
        Some(&PlaybackError::PlayRejected {
            track_id: TrackId(7),
            reason: "NotAllowedError".to_string(),
        })
    );

    let events = engine.drain_events();
    assert!(events.contains(&PlaybackEvent::Notification(Notification::error(
        "Playback Error",
        PLAYBACK_FAILED_MESSAGE
    ))));
}

#[test]
fn controls_work_after_failure() {
    let (mut engine, controller) = setup();
    controller.set_play_policy(PlayPolicy::Reject("NotAllowedError".to_string()));
    engine.play_track(track(1));
    engine.pump();

    controller.set_play_policy(PlayPolicy::Resolve);
    engine.toggle_play_pause();
    engine.pump();

    assert!(engine.is_playing());
    assert!(engine.last_error().is_none());
}

#[test]
fn dismiss_error_clears_it() {
    let (mut engine, controller) = setup();
    controller.fail_url("/audio/1.mp3", "MEDIA_ERR_NETWORK");
    engine.play_track(track(1));
    engine.pump();
    assert!(engine.last_error().is_some());

    engine.dismiss_error();
    assert!(engine.snapshot().error.is_none());
}

#[test]
fn playback_continues_without_effects() {
    let (element, controller) = SimulatedMediaElement::new();
    let mut engine = PlaybackEngine::new(
        PlaybackConfig::default(),
        Box::new(element),
        Box::new(UnavailableGraph::with_reason("no AudioContext")),
    );

    engine.set_treble_gain(3);
    engine.play_track(track(1));
    engine.pump();
    engine.set_volume(20);

    assert!(engine.is_playing());
    assert!(!engine.effects_available());
    assert!((controller.gain() - 0.2).abs() < 1e-6);
    assert!(engine.filter_topology().is_empty());
}

fn unplayable_treble_config() -> PlaybackConfig {
    PlaybackConfig {
        filters: ShelfSettings {
            treble_frequency_hz: 30_000.0,
            ..ShelfSettings::default()
        },
        ..PlaybackConfig::default()
    }
}

fn unavailable_notifications(events: &[PlaybackEvent]) -> usize {
    events
        .iter()
        .filter(|e| {
            matches!(e, PlaybackEvent::Notification(n) if n.title == "Audio Effects Unavailable")
        })
        .count()
}

#[test]
fn failed_rebuild_falls_back_to_unfiltered_output() {
    let (element, _controller) = SimulatedMediaElement::new();
    let dsp = DspGraph::new(44100);
    let mut engine = PlaybackEngine::new(
        unplayable_treble_config(),
        Box::new(element),
        Box::new(dsp.clone()),
    );
    engine.play_track(track(1));
    engine.pump();
    assert!(engine.effects_available());
    engine.drain_events();

    engine.set_treble_gain(3);
    engine.apply_effects();

    assert!(!engine.effects_available());
    assert!(engine.is_playing());
    assert_eq!(unavailable_notifications(&engine.drain_events()), 1);
    assert_eq!(dsp.edges(), vec![(Endpoint::Source, Endpoint::Destination)]);
    let mut buffer = [0.5_f32; 8];
    dsp.process(&mut buffer);
    assert_eq!(buffer, [0.5; 8]);

    // Not retried
    engine.apply_effects();
    assert!(engine.drain_events().is_empty());
}

#[test]
fn failed_first_build_keeps_element_routed() {
    let (element, _controller) = SimulatedMediaElement::new();
    let dsp = DspGraph::new(44100);
    let mut engine = PlaybackEngine::new(
        unplayable_treble_config(),
        Box::new(element),
        Box::new(dsp.clone()),
    );

    engine.set_treble_gain(-2);
    engine.play_track(track(1));
    engine.pump();

    assert!(engine.is_playing());
    assert!(!engine.effects_available());
    assert!(engine.last_error().is_none());
    assert_eq!(unavailable_notifications(&engine.drain_events()), 1);
    assert_eq!(
        engine.filter_topology(),
        vec![GraphNode::Source, GraphNode::Destination]
    );
    assert_eq!(dsp.connected_filters(), Some(Vec::new()));
}

// ============================================================================
// Superseded results
// ============================================================================

#[test]
fn stale_play_resolution_after_pause_is_dropped() {
    let (mut engine, controller) = setup();
    controller.set_play_policy(PlayPolicy::Manual);

    engine.play_track(track(1));
    engine.toggle_play_pause();
    controller.resolve_pending();
    engine.pump();

    assert_eq!(engine.state(), PlaybackState::Paused);
    assert!(!engine.is_playing());
}

#[test]
fn stale_rejection_after_new_track_is_dropped() {
    let (mut engine, controller) = setup();
    controller.set_play_policy(PlayPolicy::Manual);

    engine.play_track(track(1));
    let old = engine.generation();
    engine.play_track(track(2));
    engine.pump();

    controller.push_event(MediaEvent::new(
        old,
        MediaEventKind::PlayRejected {
            epoch: 1,
            reason: "AbortError".to_string(),
        },
    ));
    controller.resolve_pending();
    engine.pump();

    assert!(engine.is_playing());
    assert!(engine.last_error().is_none());
    assert_eq!(current_id(&engine), Some(TrackId(2)));
}

#[test]
fn time_update_from_old_track_is_ignored() {
    let (mut engine, _controller) = setup();
    engine.play_track(track(1));
    let old = engine.generation();
    engine.play_track(track(2));
    engine.pump();

    engine.on_time_update(old, 50.0);
    engine.handle_media_event(MediaEvent::new(old, MediaEventKind::Ended));

    assert_eq!(engine.progress_secs(), 0.0);
    assert_eq!(current_id(&engine), Some(TrackId(2)));
}

#[test]
fn unknown_generation_is_ignored() {
    let (mut engine, _controller) = setup();
    engine.play_track(track(1));
    engine.pump();

    engine.handle_media_event(MediaEvent::new(
        Generation(9999),
        MediaEventKind::Error {
            message: "late".to_string(),
        },
    ));
    assert!(engine.last_error().is_none());
}

// ============================================================================
// Seek
// ============================================================================

#[test]
fn seek_then_toggle_keeps_position() {
    let (mut engine, controller) = setup();
    engine.play_track(track(1));
    engine.pump();

    engine.seek(30.0);
    engine.toggle_play_pause();
    engine.pump();
    assert_eq!(engine.progress_secs(), 30.0);
    assert_eq!(engine.state(), PlaybackState::Paused);

    engine.toggle_play_pause();
    engine.pump();
    assert_eq!(engine.progress_secs(), 30.0);
    assert!(engine.is_playing());
    assert_eq!(controller.position(), 30.0);
}

#[test]
fn seek_does_not_change_transport_state() {
    let (mut engine, _controller) = setup();
    engine.play_track(track(1));
    engine.pump();
    engine.toggle_play_pause();

    engine.seek(12.5);
    assert_eq!(engine.state(), PlaybackState::Paused);
}

#[test]
fn progress_reported_before_seek_is_ignored() {
    let (mut engine, controller) = setup();
    engine.play_track(track(1));
    engine.pump();

    // Progress event already queued when the user drags the cursor
    controller.advance(5.0);
    engine.seek(30.0);
    engine.pump();
    assert_eq!(engine.progress_secs(), 30.0);

    controller.advance(1.0);
    engine.pump();
    assert_eq!(engine.progress_secs(), 31.0);
}

#[test]
fn non_finite_seek_is_ignored() {
    let (mut engine, controller) = setup();
    controller.set_default_duration(None);
    engine.play_track(track(1));
    engine.pump();
    assert_eq!(engine.duration_secs(), None);
    engine.drain_events();

    engine.seek(f64::INFINITY);
    engine.seek(f64::NEG_INFINITY);
    engine.seek(f64::NAN);

    assert_eq!(engine.progress_secs(), 0.0);
    assert_eq!(controller.position(), 0.0);
    assert!(engine.drain_events().is_empty());
}

#[test]
fn time_updates_are_clamped_to_duration() {
    let (mut engine, _controller) = setup();
    engine.play_track(track(1).with_duration(60.0));
    engine.pump();

    let generation = engine.generation();
    engine.on_time_update(generation, 75.0);
    assert_eq!(engine.progress_secs(), 60.0);
}

#[test]
fn seek_to_fraction_uses_duration() {
    let (mut engine, _controller) = setup();
    engine.play_track(track(1));
    engine.pump();

    engine.seek_to_fraction(0.5);
    assert_eq!(engine.progress_secs(), 60.0);
    assert_eq!(engine.snapshot().progress_fraction(), 0.5);
}

// ============================================================================
// Effects
// ============================================================================

#[test]
fn bass_boost_then_flat_connects_directly() {
    let (mut engine, _controller) = setup();

    engine.set_bass_gain(5);
    engine.apply_effects();
    let topology = engine.filter_topology();
    assert_eq!(topology.len(), 3);
    assert!(matches!(
        topology[1],
        GraphNode::Shelf(filter) if filter.kind == ShelfKind::Low && filter.gain_db == 50.0
    ));

    engine.set_bass_gain(0);
    engine.apply_effects();
    assert_eq!(
        engine.filter_topology(),
        vec![GraphNode::Source, GraphNode::Destination]
    );
}

#[test]
fn gains_are_stored_but_applied_on_demand() {
    let (mut engine, _controller) = setup();
    engine.play_track(track(1));
    engine.pump();

    engine.set_treble_gain(-4);
    assert_eq!(
        engine.filter_topology(),
        vec![GraphNode::Source, GraphNode::Destination]
    );
    assert_eq!(engine.snapshot().treble_gain, -4);

    engine.apply_effects();
    assert_eq!(engine.filter_topology().len(), 3);
}

#[test]
fn reset_effects_flattens_and_notifies() {
    let (mut engine, _controller) = setup();
    engine.set_bass_gain(4);
    engine.set_treble_gain(-2);
    engine.apply_effects();
    engine.drain_events();

    engine.reset_effects();

    assert_eq!(engine.snapshot().bass_gain, 0);
    assert_eq!(engine.snapshot().treble_gain, 0);
    let events = engine.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        PlaybackEvent::Notification(n) if n.description == "Bass: 0, Treble: 0"
    )));
}

#[test]
fn dial_values_are_clamped() {
    let (mut engine, _controller) = setup();
    engine.set_bass_gain(25);
    engine.set_treble_gain(-40);
    assert_eq!(engine.snapshot().bass_gain, 10);
    assert_eq!(engine.snapshot().treble_gain, -10);
}

// ============================================================================
// History
// ============================================================================

#[test]
fn previous_returns_current_to_queue_front() {
    let (mut engine, _controller) = setup();
    engine.play_list((1..=3).map(track).collect(), 0);
    engine.pump();
    engine.next_track();
    engine.pump();
    assert_eq!(current_id(&engine), Some(TrackId(2)));

    engine.previous_track();
    engine.pump();

    assert_eq!(current_id(&engine), Some(TrackId(1)));
    let queued: Vec<_> = engine.queue().iter().map(|t| t.id).collect();
    assert_eq!(queued, vec![TrackId(2), TrackId(3)]);
}

#[test]
fn history_is_bounded_by_config() {
    let config = PlaybackConfig {
        history_size: 2,
        ..PlaybackConfig::default()
    };
    let (mut engine, _controller) = setup_with(config);

    for id in 1..=5 {
        engine.play_track(track(id));
    }

    let history: Vec<_> = engine.history().iter().map(|t| t.id).collect();
    assert_eq!(history, vec![TrackId(3), TrackId(4)]);
}
