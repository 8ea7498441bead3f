//! Headless media element
//!
//! Behaves like a browser audio element driven by a virtual clock: `load`
//! reports `CanPlay` (or `Error` for URLs marked as failing), `play` settles
//! with `PlayResolved`/`PlayRejected`, and [`SimulatedController::advance`]
//! moves the playhead and emits `TimeUpdate`/`Ended`.
//!
//! The element is handed to the engine; the controller stays with the test or
//! host so it can drive time and inspect what the engine did.

use crate::media::{Generation, MediaElement, MediaEvent, MediaEventKind, PlayRequest};
use musima_audio::ElementHandle;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// How `play` requests settle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayPolicy {
    /// Resolve as soon as `play` is called
    Resolve,
    /// Reject every request with the given reason
    Reject(String),
    /// Leave requests pending until the controller settles them
    Manual,
}

#[derive(Debug)]
struct SimulatedState {
    handle: ElementHandle,
    loaded: Option<(String, Generation)>,
    duration_secs: Option<f64>,
    position_secs: f64,
    // Token of the last seek, stamped on every TimeUpdate
    seek: u64,
    playing: bool,
    gain: f32,
    policy: PlayPolicy,
    default_duration_secs: Option<f64>,
    durations: HashMap<String, f64>,
    failing: HashMap<String, String>,
    pending: Vec<PlayRequest>,
    play_requests: usize,
    events: VecDeque<MediaEvent>,
}

impl SimulatedState {
    fn generation(&self) -> Option<Generation> {
        self.loaded.as_ref().map(|(_, generation)| *generation)
    }

    fn push(&mut self, generation: Generation, kind: MediaEventKind) {
        self.events.push_back(MediaEvent::new(generation, kind));
    }

    fn resolve(&mut self, request: PlayRequest) {
        if self.loaded.is_some() {
            self.playing = true;
        }
        self.push(
            request.generation,
            MediaEventKind::PlayResolved {
                epoch: request.epoch,
            },
        );
    }

    fn reject(&mut self, request: PlayRequest, reason: String) {
        self.push(
            request.generation,
            MediaEventKind::PlayRejected {
                epoch: request.epoch,
                reason,
            },
        );
    }
}

fn valid_duration(secs: f64) -> Option<f64> {
    (secs.is_finite() && secs > 0.0).then_some(secs)
}

/// Simulated media element owned by the engine
#[derive(Debug)]
pub struct SimulatedMediaElement {
    state: Rc<RefCell<SimulatedState>>,
}

impl SimulatedMediaElement {
    /// Create an element with a fresh handle and its controller
    pub fn new() -> (Self, SimulatedController) {
        let handle = ElementHandle::new(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed));
        let state = Rc::new(RefCell::new(SimulatedState {
            handle,
            loaded: None,
            duration_secs: None,
            position_secs: 0.0,
            seek: 0,
            playing: false,
            gain: 1.0,
            policy: PlayPolicy::Resolve,
            default_duration_secs: None,
            durations: HashMap::new(),
            failing: HashMap::new(),
            pending: Vec::new(),
            play_requests: 0,
            events: VecDeque::new(),
        }));

        (
            Self {
                state: Rc::clone(&state),
            },
            SimulatedController { state },
        )
    }
}

impl MediaElement for SimulatedMediaElement {
    fn handle(&self) -> ElementHandle {
        self.state.borrow().handle
    }

    fn load(&mut self, url: &str, generation: Generation) {
        let mut state = self.state.borrow_mut();
        state.loaded = Some((url.to_string(), generation));
        state.position_secs = 0.0;
        state.playing = false;
        state.pending.clear();

        if let Some(message) = state.failing.get(url).cloned() {
            state.duration_secs = None;
            state.push(generation, MediaEventKind::Error { message });
            return;
        }

        let duration = state
            .durations
            .get(url)
            .copied()
            .or(state.default_duration_secs);
        state.duration_secs = duration;
        state.push(
            generation,
            MediaEventKind::CanPlay {
                duration_secs: duration,
            },
        );
    }

    fn play(&mut self, request: PlayRequest) {
        let mut state = self.state.borrow_mut();
        state.play_requests += 1;

        let failed = state
            .loaded
            .as_ref()
            .is_some_and(|(url, _)| state.failing.contains_key(url));
        if state.loaded.is_none() || failed {
            state.reject(request, "NotSupportedError: no playable source".to_string());
            return;
        }

        match state.policy.clone() {
            PlayPolicy::Resolve => state.resolve(request),
            PlayPolicy::Reject(reason) => state.reject(request, reason),
            PlayPolicy::Manual => state.pending.push(request),
        }
    }

    fn pause(&mut self) {
        self.state.borrow_mut().playing = false;
    }

    fn seek(&mut self, position_secs: f64, seek: u64) {
        let mut state = self.state.borrow_mut();
        state.seek = seek;
        let max = state.duration_secs.unwrap_or(f64::INFINITY);
        if position_secs.is_finite() {
            state.position_secs = position_secs.clamp(0.0, max);
        }
    }

    fn set_gain(&mut self, gain: f32) {
        self.state.borrow_mut().gain = gain.clamp(0.0, 1.0);
    }

    fn unload(&mut self) {
        let mut state = self.state.borrow_mut();
        state.loaded = None;
        state.duration_secs = None;
        state.position_secs = 0.0;
        state.playing = false;
        state.pending.clear();
    }

    fn poll_event(&mut self) -> Option<MediaEvent> {
        self.state.borrow_mut().events.pop_front()
    }
}

/// Test/host side of a [`SimulatedMediaElement`]
#[derive(Debug, Clone)]
pub struct SimulatedController {
    state: Rc<RefCell<SimulatedState>>,
}

impl SimulatedController {
    pub fn set_play_policy(&self, policy: PlayPolicy) {
        self.state.borrow_mut().policy = policy;
    }

    /// Duration reported for URLs without an explicit one
    /// Duration reported for URLs without their own; invalid values mean unknown
    pub fn set_default_duration(&self, secs: Option<f64>) {
        self.state.borrow_mut().default_duration_secs = secs.and_then(valid_duration);
    }

    /// Duration reported for `url`; an invalid value makes it unknown
    pub fn set_duration(&self, url: impl Into<String>, secs: f64) {
        let url = url.into();
        let mut state = self.state.borrow_mut();
        match valid_duration(secs) {
            Some(secs) => {
                state.durations.insert(url, secs);
            }
            None => {
                state.durations.remove(&url);
            }
        }
    }

    /// Make loading `url` fail with a media error
    pub fn fail_url(&self, url: impl Into<String>, message: impl Into<String>) {
        self.state
            .borrow_mut()
            .failing
            .insert(url.into(), message.into());
    }

    /// Resolve every pending play request
    pub fn resolve_pending(&self) {
        let mut state = self.state.borrow_mut();
        for request in std::mem::take(&mut state.pending) {
            state.resolve(request);
        }
    }

    /// Reject every pending play request
    pub fn reject_pending(&self, reason: &str) {
        let mut state = self.state.borrow_mut();
        for request in std::mem::take(&mut state.pending) {
            state.reject(request, reason.to_string());
        }
    }

    /// Advance the virtual clock
    ///
    /// While playing, moves the playhead and emits a `TimeUpdate`. Reaching
    /// the end stops the element and emits `Ended`.
    pub fn advance(&self, secs: f64) {
        let mut state = self.state.borrow_mut();
        let Some(generation) = state.generation() else {
            return;
        };
        if !state.playing || secs <= 0.0 {
            return;
        }

        let mut position = state.position_secs + secs;
        let ended = match state.duration_secs {
            Some(duration) if position >= duration => {
                position = duration;
                true
            }
            _ => false,
        };
        state.position_secs = position;
        let seek = state.seek;
        state.push(
            generation,
            MediaEventKind::TimeUpdate {
                position_secs: position,
                seek,
            },
        );

        if ended {
            state.playing = false;
            state.push(generation, MediaEventKind::Ended);
        }
    }

    /// Inject an arbitrary event (duplicates, stale generations, ...)
    pub fn push_event(&self, event: MediaEvent) {
        self.state.borrow_mut().events.push_back(event);
    }

    /// Generation of the currently loaded resource
    pub fn generation(&self) -> Option<Generation> {
        self.state.borrow().generation()
    }

    pub fn handle(&self) -> ElementHandle {
        self.state.borrow().handle
    }

    pub fn loaded_url(&self) -> Option<String> {
        self.state.borrow().loaded.as_ref().map(|(url, _)| url.clone())
    }

    pub fn gain(&self) -> f32 {
        self.state.borrow().gain
    }

    pub fn position(&self) -> f64 {
        self.state.borrow().position_secs
    }

    pub fn is_playing(&self) -> bool {
        self.state.borrow().playing
    }

    pub fn pending_plays(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Total number of `play` calls
    pub fn play_requests(&self) -> usize {
        self.state.borrow().play_requests
    }

    pub fn queued_events(&self) -> usize {
        self.state.borrow().events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(element: &mut SimulatedMediaElement) -> Vec<MediaEventKind> {
        std::iter::from_fn(|| element.poll_event())
            .map(|event| event.kind)
            .collect()
    }

    #[test]
    fn load_reports_duration() {
        let (mut element, controller) = SimulatedMediaElement::new();
        controller.set_duration("/a.mp3", 12.0);

        element.load("/a.mp3", Generation(1));
        assert_eq!(
            drain(&mut element),
            vec![MediaEventKind::CanPlay {
                duration_secs: Some(12.0)
            }]
        );
        assert_eq!(controller.loaded_url().as_deref(), Some("/a.mp3"));
    }

    #[test]
    fn play_resolves_then_clock_runs_to_end() {
        let (mut element, controller) = SimulatedMediaElement::new();
        controller.set_duration("/a.mp3", 2.0);
        element.load("/a.mp3", Generation(1));
        element.play(PlayRequest {
            generation: Generation(1),
            epoch: 4,
        });
        drain(&mut element);
        assert!(controller.is_playing());

        controller.advance(1.5);
        controller.advance(1.5);
        assert_eq!(
            drain(&mut element),
            vec![
                MediaEventKind::TimeUpdate {
                    position_secs: 1.5,
                    seek: 0
                },
                MediaEventKind::TimeUpdate {
                    position_secs: 2.0,
                    seek: 0
                },
                MediaEventKind::Ended,
            ]
        );
        assert!(!controller.is_playing());
    }

    #[test]
    fn rejecting_policy() {
        let (mut element, controller) = SimulatedMediaElement::new();
        controller.set_play_policy(PlayPolicy::Reject("NotAllowedError".to_string()));
        element.load("/a.mp3", Generation(1));
        element.play(PlayRequest {
            generation: Generation(1),
            epoch: 1,
        });

        let events = drain(&mut element);
        assert_eq!(
            events.last(),
            Some(&MediaEventKind::PlayRejected {
                epoch: 1,
                reason: "NotAllowedError".to_string()
            })
        );
        assert!(!controller.is_playing());
    }

    #[test]
    fn manual_policy_waits_for_controller() {
        let (mut element, controller) = SimulatedMediaElement::new();
        controller.set_play_policy(PlayPolicy::Manual);
        element.load("/a.mp3", Generation(1));
        element.play(PlayRequest {
            generation: Generation(1),
            epoch: 2,
        });
        drain(&mut element);
        assert_eq!(controller.pending_plays(), 1);

        controller.resolve_pending();
        assert_eq!(
            drain(&mut element),
            vec![MediaEventKind::PlayResolved { epoch: 2 }]
        );
    }

    #[test]
    fn failing_url_reports_error() {
        let (mut element, controller) = SimulatedMediaElement::new();
        controller.fail_url("/gone.mp3", "404");
        element.load("/gone.mp3", Generation(3));

        assert_eq!(
            drain(&mut element),
            vec![MediaEventKind::Error {
                message: "404".to_string()
            }]
        );
    }

    #[test]
    fn clock_does_nothing_while_paused() {
        let (mut element, controller) = SimulatedMediaElement::new();
        element.load("/a.mp3", Generation(1));
        drain(&mut element);

        controller.advance(5.0);
        assert_eq!(controller.queued_events(), 0);
        assert_eq!(controller.position(), 0.0);
    }

    #[test]
    fn progress_carries_last_seek() {
        let (mut element, controller) = SimulatedMediaElement::new();
        controller.set_duration("/a.mp3", 60.0);
        element.load("/a.mp3", Generation(1));
        element.play(PlayRequest {
            generation: Generation(1),
            epoch: 1,
        });
        drain(&mut element);

        element.seek(20.0, 3);
        controller.advance(1.0);
        assert_eq!(
            drain(&mut element),
            vec![MediaEventKind::TimeUpdate {
                position_secs: 21.0,
                seek: 3
            }]
        );
    }

    #[test]
    fn invalid_durations_are_unknown() {
        let (mut element, controller) = SimulatedMediaElement::new();
        controller.set_default_duration(Some(f64::NAN));
        controller.set_duration("/a.mp3", -4.0);
        element.load("/a.mp3", Generation(1));

        assert_eq!(
            drain(&mut element),
            vec![MediaEventKind::CanPlay {
                duration_secs: None
            }]
        );
        // No panic clamping against a bogus bound
        element.seek(12.0, 1);
        assert_eq!(controller.position(), 12.0);
    }

    #[test]
    fn handles_are_unique() {
        let (first, _) = SimulatedMediaElement::new();
        let (second, _) = SimulatedMediaElement::new();
        assert_ne!(first.handle(), second.handle());
    }
}
