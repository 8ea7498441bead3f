/// Host configuration
use crate::error::{Result, SimError};
use musima_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "player-sim.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SimConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default = "default_simulation")]
    pub simulation: SimulationSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationSettings {
    /// Virtual seconds advanced per tick
    #[serde(default = "default_tick_secs")]
    pub tick_secs: f64,

    /// Sample rate of the in-process filter graph
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Duration the simulated element reports for tracks without one
    #[serde(default = "default_track_secs")]
    pub default_track_secs: f64,

    /// Upper bound on ticks when `--ticks` is not given
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u32,

    #[serde(default)]
    pub graph: GraphKind,
}

/// Filter graph backend used by the simulated host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphKind {
    /// biquad shelves processed in-process
    #[default]
    Dsp,
    /// No audio processing; effects report as unavailable
    None,
}

impl SimConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist. Without one, `player-sim.toml` in the
    /// working directory is used if present. Environment variables prefixed
    /// with `MUSIMA_` override both, `__` separating nested keys
    /// (`MUSIMA_PLAYBACK__VOLUME=40`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(SimError::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path));
            }
            None => {
                let config_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if config_path.exists() {
                    settings = settings.add_source(config::File::from(config_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("MUSIMA")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let simulation = &self.simulation;

        if !(simulation.tick_secs.is_finite() && simulation.tick_secs > 0.0) {
            return Err(SimError::Config(format!(
                "simulation.tick_secs must be positive, got {}",
                simulation.tick_secs
            )));
        }

        if simulation.sample_rate == 0 {
            return Err(SimError::Config(
                "simulation.sample_rate must be positive".to_string(),
            ));
        }

        if !(simulation.default_track_secs.is_finite() && simulation.default_track_secs > 0.0) {
            return Err(SimError::Config(format!(
                "simulation.default_track_secs must be positive, got {}",
                simulation.default_track_secs
            )));
        }

        if self.playback.volume > 100 {
            return Err(SimError::Config(format!(
                "playback.volume must be 0-100, got {}",
                self.playback.volume
            )));
        }

        let nyquist = simulation.sample_rate as f32 / 2.0;
        let filters = &self.playback.filters;
        for (name, frequency) in [
            ("bass_frequency_hz", filters.bass_frequency_hz),
            ("treble_frequency_hz", filters.treble_frequency_hz),
        ] {
            if !(frequency > 0.0 && frequency < nyquist) {
                return Err(SimError::Config(format!(
                    "playback.filters.{} must be between 0 and {} Hz, got {}",
                    name, nyquist, frequency
                )));
            }
        }

        Ok(())
    }
}

// Default values
fn default_simulation() -> SimulationSettings {
    SimulationSettings {
        tick_secs: default_tick_secs(),
        sample_rate: default_sample_rate(),
        default_track_secs: default_track_secs(),
        max_ticks: default_max_ticks(),
        graph: GraphKind::default(),
    }
}

fn default_tick_secs() -> f64 {
    1.0
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_track_secs() -> f64 {
    180.0
}

fn default_max_ticks() -> u32 {
    10_000
}

impl Default for SimulationSettings {
    fn default() -> Self {
        default_simulation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SimConfig::default();
        assert_eq!(config.playback.volume, 70);
        assert_eq!(config.simulation.tick_secs, 1.0);
        assert_eq!(config.simulation.graph, GraphKind::Dsp);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_tick() {
        let mut config = SimConfig::default();
        config.simulation.tick_secs = 0.0;
        assert!(matches!(config.validate(), Err(SimError::Config(_))));
    }

    #[test]
    fn rejects_shelf_above_nyquist() {
        let mut config = SimConfig::default();
        config.simulation.sample_rate = 8000;
        config.playback.filters.treble_frequency_hz = 4000.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("treble_frequency_hz"));
    }

    #[test]
    fn rejects_volume_over_range() {
        let mut config = SimConfig::default();
        config.playback.volume = 150;
        assert!(config.validate().is_err());
    }
}
