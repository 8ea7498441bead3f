//! Musima - Tone Filter Graph
//!
//! Builds the bass/treble processing chain that sits between a media element's
//! audio output and the output device.
//!
//! This crate provides:
//! - Tone gains (integer dial, -10..=10 per band)
//! - Shelf filter specs (low shelf for bass, high shelf for treble)
//! - [`FilterGraph`]: idempotent initialization and chain rebuilding
//! - [`GraphBackend`]: the seam to the platform's audio-processing graph
//! - [`DspGraph`]: an in-process backend built on `biquad`
//! - [`UnavailableGraph`]: a backend for hosts without audio processing
//!
//! # Architecture
//!
//! `musima-audio` knows nothing about playback or media elements. The graph is
//! bound to an opaque [`ElementHandle`] and the platform decides what that
//! handle means (an `HtmlAudioElement`, a decoder output, ...).
//!
//! # Example
//!
//! ```rust
//! use musima_audio::{DspGraph, ElementHandle, FilterGraph, GraphNode, ToneGains};
//!
//! let mut graph = FilterGraph::new(Box::new(DspGraph::new(44100)));
//! graph.initialize(ElementHandle::new(1)).unwrap();
//!
//! // +5 bass, flat treble: source -> low shelf -> destination
//! graph.rebuild_chain(ToneGains::new(5, 0)).unwrap();
//! assert_eq!(graph.topology().len(), 3);
//!
//! // Flat: source -> destination
//! graph.rebuild_chain(ToneGains::flat()).unwrap();
//! assert_eq!(graph.topology(), vec![GraphNode::Source, GraphNode::Destination]);
//! ```

mod backend;
mod dsp;
mod error;
mod graph;
pub mod types;

pub use backend::{Endpoint, GraphBackend, NodeId, UnavailableGraph};
pub use dsp::DspGraph;
pub use error::{GraphError, Result};
pub use graph::FilterGraph;
pub use types::{ElementHandle, GraphNode, ShelfFilter, ShelfKind, ShelfSettings, ToneGains};
