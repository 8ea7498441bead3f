//! WASM bindings for musima-playback
//!
//! Browser implementations of the media element and filter graph seams, and
//! a JavaScript-friendly store on top of them.

#[cfg(feature = "wasm")]
mod element;

#[cfg(feature = "wasm")]
mod graph;

#[cfg(feature = "wasm")]
pub mod store;

#[cfg(feature = "wasm")]
pub use element::WebMediaElement;

#[cfg(feature = "wasm")]
pub use graph::WebAudioGraph;

#[cfg(feature = "wasm")]
pub use store::WasmPlaybackStore;
