//! WASM-compatible PlaybackStore wrapper

use super::{element::WebMediaElement, graph::WebAudioGraph};
use crate::{PlaybackConfig, PlaybackEngine, PlaybackStore, SubscriptionId, Track};
use js_sys::Function;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use web_sys::HtmlAudioElement;

/// JavaScript-facing playback store
///
/// Wraps one [`PlaybackStore`] driving an `HtmlAudioElement` through Web
/// Audio. Listeners registered with `subscribe` receive
/// `{ snapshot, events }` after every change.
#[wasm_bindgen]
pub struct WasmPlaybackStore {
    inner: Rc<RefCell<PlaybackStore>>,
}

#[wasm_bindgen]
impl WasmPlaybackStore {
    /// Create a store
    ///
    /// `audio` defaults to a new detached `<audio>` element. `config` is an
    /// optional partial `PlaybackConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(audio: Option<HtmlAudioElement>, config: JsValue) -> Result<WasmPlaybackStore, JsValue> {
        // Enable panic hooks for better error messages in console
        console_error_panic_hook::set_once();

        let config: PlaybackConfig = if config.is_undefined() || config.is_null() {
            PlaybackConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?
        };

        let audio = match audio {
            Some(audio) => audio,
            None => HtmlAudioElement::new()?,
        };
        let element = WebMediaElement::new(audio.clone())?;

        // Media events arrive on the event loop; pump as soon as they do
        let slot: Rc<RefCell<Weak<RefCell<PlaybackStore>>>> = Rc::new(RefCell::new(Weak::new()));
        let waker_slot = Rc::clone(&slot);
        element.set_waker(move || {
            let Some(store) = waker_slot.borrow().upgrade() else {
                return;
            };
            // Busy means an operation is running and will pump when done
            if let Ok(mut store) = store.try_borrow_mut() {
                store.pump();
            }
        });

        let engine = PlaybackEngine::new(
            config,
            Box::new(element),
            Box::new(WebAudioGraph::new(audio)),
        );
        let inner = Rc::new(RefCell::new(PlaybackStore::new(engine)));
        *slot.borrow_mut() = Rc::downgrade(&inner);

        Ok(Self { inner })
    }

    // ===== Transport =====

    #[wasm_bindgen(js_name = playTrack)]
    pub fn play_track(&self, track: JsValue) -> Result<(), JsValue> {
        let track: Track = parse(track, "track")?;
        self.with_store(|store| store.play_track(track))
    }

    #[wasm_bindgen(js_name = playList)]
    pub fn play_list(&self, tracks: JsValue, start_index: usize) -> Result<(), JsValue> {
        let tracks: Vec<Track> = parse(tracks, "tracks")?;
        self.with_store(|store| store.play_list(tracks, start_index))
    }

    #[wasm_bindgen(js_name = togglePlayPause)]
    pub fn toggle_play_pause(&self) -> Result<(), JsValue> {
        self.with_store(PlaybackStore::toggle_play_pause)
    }

    /// Seek to position in seconds
    pub fn seek(&self, position_secs: f64) -> Result<(), JsValue> {
        self.with_store(|store| store.seek(position_secs))
    }

    /// Seek by fraction of the track (0.0 - 1.0)
    #[wasm_bindgen(js_name = seekToFraction)]
    pub fn seek_to_fraction(&self, fraction: f64) -> Result<(), JsValue> {
        self.with_store(|store| store.seek_to_fraction(fraction))
    }

    #[wasm_bindgen(js_name = nextTrack)]
    pub fn next_track(&self) -> Result<(), JsValue> {
        self.with_store(PlaybackStore::next_track)
    }

    #[wasm_bindgen(js_name = previousTrack)]
    pub fn previous_track(&self) -> Result<(), JsValue> {
        self.with_store(PlaybackStore::previous_track)
    }

    pub fn stop(&self) -> Result<(), JsValue> {
        self.with_store(PlaybackStore::stop)
    }

    // ===== Volume =====

    /// Set volume (0-100, clamped)
    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&self, level: f64) -> Result<(), JsValue> {
        let level = if level.is_nan() { 0 } else { level.round().clamp(0.0, 100.0) as u8 };
        self.with_store(|store| store.set_volume(level))
    }

    #[wasm_bindgen(js_name = toggleMute)]
    pub fn toggle_mute(&self) -> Result<(), JsValue> {
        self.with_store(PlaybackStore::toggle_mute)
    }

    // ===== Queue =====

    pub fn enqueue(&self, track: JsValue) -> Result<(), JsValue> {
        let track: Track = parse(track, "track")?;
        self.with_store(|store| store.enqueue(track))
    }

    #[wasm_bindgen(js_name = clearQueue)]
    pub fn clear_queue(&self) -> Result<(), JsValue> {
        self.with_store(PlaybackStore::clear_queue)
    }

    /// Remove track from queue by index; resolves to the track or `null`
    #[wasm_bindgen(js_name = removeFromQueue)]
    pub fn remove_from_queue(&self, index: usize) -> Result<JsValue, JsValue> {
        let removed = self.with_store(|store| store.remove_from_queue(index))?;
        match removed {
            Some(track) => serde_wasm_bindgen::to_value(&track)
                .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e))),
            None => Ok(JsValue::NULL),
        }
    }

    // ===== Effects =====

    #[wasm_bindgen(js_name = setBassGain)]
    pub fn set_bass_gain(&self, db: i32) -> Result<(), JsValue> {
        self.with_store(|store| store.set_bass_gain(db))
    }

    #[wasm_bindgen(js_name = setTrebleGain)]
    pub fn set_treble_gain(&self, db: i32) -> Result<(), JsValue> {
        self.with_store(|store| store.set_treble_gain(db))
    }

    #[wasm_bindgen(js_name = applyEffects)]
    pub fn apply_effects(&self) -> Result<(), JsValue> {
        self.with_store(PlaybackStore::apply_effects)
    }

    #[wasm_bindgen(js_name = resetEffects)]
    pub fn reset_effects(&self) -> Result<(), JsValue> {
        self.with_store(PlaybackStore::reset_effects)
    }

    // ===== Session =====

    #[wasm_bindgen(js_name = dismissError)]
    pub fn dismiss_error(&self) -> Result<(), JsValue> {
        self.with_store(PlaybackStore::dismiss_error)
    }

    /// Current session state as a plain object
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        let store = self
            .inner
            .try_borrow()
            .map_err(|_| JsValue::from_str("Playback store is busy"))?;
        serde_wasm_bindgen::to_value(store.snapshot())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Register a listener; returns an id for `unsubscribe`
    pub fn subscribe(&self, callback: Function) -> Result<f64, JsValue> {
        let id = self.with_store(|store| {
            store.subscribe(move |update| {
                if let Ok(value) = serde_wasm_bindgen::to_value(update) {
                    callback.call1(&JsValue::NULL, &value).ok();
                }
            })
        })?;
        Ok(id.0 as f64)
    }

    pub fn unsubscribe(&self, id: f64) -> Result<bool, JsValue> {
        self.with_store(|store| store.unsubscribe(SubscriptionId(id as u64)))
    }

    /// Release the audio element and close the audio context
    pub fn shutdown(&self) -> Result<(), JsValue> {
        self.with_store(PlaybackStore::shutdown)
    }

    // ===== Internal =====

    fn with_store<R>(&self, op: impl FnOnce(&mut PlaybackStore) -> R) -> Result<R, JsValue> {
        // Fails when a listener calls back in while being notified
        let mut store = self
            .inner
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("Playback store is busy"))?;
        Ok(op(&mut store))
    }
}

fn parse<T: serde::de::DeserializeOwned>(value: JsValue, what: &str) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse {}: {}", what, e)))
}
