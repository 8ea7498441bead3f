//! `HtmlAudioElement` as a [`MediaElement`]
//!
//! DOM events and `play()` promise settlements are turned into
//! [`MediaEvent`]s tagged with the generation that was current when the
//! listener fired. A waker lets the owner pump the engine as soon as
//! something arrives.

use crate::media::{Generation, MediaElement, MediaEvent, MediaEventKind, PlayRequest};
use musima_audio::ElementHandle;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, HtmlAudioElement};

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

const LISTENED_EVENTS: [&str; 5] = ["canplay", "loadedmetadata", "timeupdate", "ended", "error"];

#[derive(Default)]
struct Shared {
    generation: Generation,
    seek: u64,
    events: VecDeque<MediaEvent>,
    waker: Option<Rc<dyn Fn()>>,
}

/// Push an event and wake the owner (outside the borrow)
fn deliver(shared: &Rc<RefCell<Shared>>, generation: Generation, kind: MediaEventKind) {
    let waker = {
        let Ok(mut state) = shared.try_borrow_mut() else {
            return;
        };
        state.events.push_back(MediaEvent::new(generation, kind));
        state.waker.clone()
    };
    if let Some(waker) = waker {
        waker();
    }
}

fn finite_duration(audio: &HtmlAudioElement) -> Option<f64> {
    let duration = audio.duration();
    (duration.is_finite() && duration > 0.0).then_some(duration)
}

fn describe(value: &JsValue) -> String {
    value
        .dyn_ref::<js_sys::Error>()
        .map(|e| format!("{}: {}", e.name(), e.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| "play() rejected".to_string())
}

/// Browser audio element
pub struct WebMediaElement {
    audio: HtmlAudioElement,
    handle: ElementHandle,
    shared: Rc<RefCell<Shared>>,
    listeners: Vec<(&'static str, Closure<dyn FnMut(Event)>)>,
}

impl WebMediaElement {
    pub fn new(audio: HtmlAudioElement) -> Result<Self, JsValue> {
        let shared = Rc::new(RefCell::new(Shared::default()));
        let mut listeners = Vec::with_capacity(LISTENED_EVENTS.len());

        for name in LISTENED_EVENTS {
            let element = audio.clone();
            let state = Rc::clone(&shared);
            let closure = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
                let Ok((generation, seek)) = state.try_borrow().map(|s| (s.generation, s.seek))
                else {
                    return;
                };
                let kind = match name {
                    "canplay" | "loadedmetadata" => MediaEventKind::CanPlay {
                        duration_secs: finite_duration(&element),
                    },
                    "timeupdate" => MediaEventKind::TimeUpdate {
                        position_secs: element.current_time(),
                        seek,
                    },
                    "ended" => MediaEventKind::Ended,
                    _ => MediaEventKind::Error {
                        message: element
                            .error()
                            .map(|e| format!("media error code {}", e.code()))
                            .unwrap_or_else(|| "media error".to_string()),
                    },
                };
                deliver(&state, generation, kind);
            });
            audio.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
            listeners.push((name, closure));
        }

        Ok(Self {
            audio,
            handle: ElementHandle::new(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed)),
            shared,
            listeners,
        })
    }

    /// Called after an event is queued
    pub fn set_waker(&self, waker: impl Fn() + 'static) {
        self.shared.borrow_mut().waker = Some(Rc::new(waker));
    }
}

impl MediaElement for WebMediaElement {
    fn handle(&self) -> ElementHandle {
        self.handle
    }

    fn load(&mut self, url: &str, generation: Generation) {
        self.shared.borrow_mut().generation = generation;
        self.audio.set_src(url);
        self.audio.load();
    }

    fn play(&mut self, request: PlayRequest) {
        let promise = match self.audio.play() {
            Ok(promise) => promise,
            Err(e) => {
                deliver(
                    &self.shared,
                    request.generation,
                    MediaEventKind::PlayRejected {
                        epoch: request.epoch,
                        reason: describe(&e),
                    },
                );
                return;
            }
        };

        let shared = Rc::clone(&self.shared);
        let on_resolve = Closure::once(move |_: JsValue| {
            deliver(
                &shared,
                request.generation,
                MediaEventKind::PlayResolved {
                    epoch: request.epoch,
                },
            );
        });
        let shared = Rc::clone(&self.shared);
        let on_reject = Closure::once(move |reason: JsValue| {
            deliver(
                &shared,
                request.generation,
                MediaEventKind::PlayRejected {
                    epoch: request.epoch,
                    reason: describe(&reason),
                },
            );
        });

        let _ = promise.then2(&on_resolve, &on_reject);
        // Exactly one of them runs, once the promise settles
        on_resolve.forget();
        on_reject.forget();
    }

    fn pause(&mut self) {
        self.audio.pause().ok();
    }

    fn seek(&mut self, position_secs: f64, seek: u64) {
        self.shared.borrow_mut().seek = seek;
        // currentTime throws on non-finite values
        if position_secs.is_finite() {
            self.audio.set_current_time(position_secs);
        }
    }

    fn set_gain(&mut self, gain: f32) {
        self.audio.set_volume(f64::from(gain.clamp(0.0, 1.0)));
    }

    fn unload(&mut self) {
        self.audio.pause().ok();
        self.audio.remove_attribute("src").ok();
        self.audio.load();
    }

    fn poll_event(&mut self) -> Option<MediaEvent> {
        self.shared.borrow_mut().events.pop_front()
    }
}

impl Drop for WebMediaElement {
    fn drop(&mut self) {
        for (name, closure) in self.listeners.drain(..) {
            self.audio
                .remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
                .ok();
        }
        self.audio.pause().ok();
    }
}
