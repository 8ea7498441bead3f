//! Musima Player Simulator Library
//!
//! Headless host for the Musima playback engine: layered configuration,
//! TOML playlists and a tick-driven session against a simulated media element.
//!
//! This library exposes the host's components for testing purposes.

pub mod config;
pub mod error;
pub mod playlist;
pub mod runner;

// Re-export commonly used types for convenience
pub use config::{GraphKind, SimConfig, SimulationSettings};
pub use error::{Result, SimError};
pub use playlist::{Playlist, PlaylistEntry};
pub use runner::{run, RunOptions, RunReport};
