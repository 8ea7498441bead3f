/// Musima player simulator - headless playback sessions
use anyhow::Context;
use clap::{Parser, Subcommand};
use player_sim::{run, Playlist, RunOptions, RunReport, SimConfig};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "player-sim")]
#[command(about = "Drive a Musima playback session against a simulated media element", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a playlist file to the end
    Play {
        /// Playlist file (TOML)
        playlist: PathBuf,
        /// Configuration file path
        #[arg(short, long, env = "MUSIMA_CONFIG")]
        config: Option<PathBuf>,
        /// Index of the first track to play
        #[arg(short, long, default_value_t = 0)]
        start: usize,
        /// Maximum number of clock ticks
        #[arg(short, long)]
        ticks: Option<u32>,
        /// Bass gain (-10 to 10)
        #[arg(long, allow_hyphen_values = true)]
        bass: Option<i32>,
        /// Treble gain (-10 to 10)
        #[arg(long, allow_hyphen_values = true)]
        treble: Option<i32>,
        /// Refuse every play request, as an autoplay policy would
        #[arg(long)]
        reject_play: bool,
        /// Print the final snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Load, validate and print the merged configuration
    CheckConfig {
        /// Configuration file path
        #[arg(short, long, env = "MUSIMA_CONFIG")]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "musima_playback=info,player_sim=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            playlist,
            config,
            start,
            ticks,
            bass,
            treble,
            reject_play,
            json,
        } => {
            let options = RunOptions {
                start,
                ticks,
                bass,
                treble,
                reject_play,
            };
            play(&playlist, config.as_deref(), &options, json)?;
        }
        Commands::CheckConfig { config } => {
            check_config(config.as_deref())?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SimConfig> {
    let config = SimConfig::load(path).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn play(playlist: &Path, config: Option<&Path>, options: &RunOptions, json: bool) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let playlist = Playlist::load(playlist)
        .with_context(|| format!("Failed to load playlist {}", playlist.display()))?;

    let report = run(&config, &playlist, options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.snapshot)?);
    } else {
        print_summary(&report);
    }

    Ok(())
}

fn check_config(path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(path)?;
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn print_summary(report: &RunReport) {
    let snapshot = &report.snapshot;
    println!("State:    {}", snapshot.state);
    match &snapshot.current_track {
        Some(track) => println!(
            "Track:    {} - {} ({:.1}s)",
            track.artist, track.title, snapshot.progress_secs
        ),
        None => println!("Track:    none"),
    }
    println!("Queue:    {} tracks", snapshot.queue.len());
    println!("Finished: {} tracks", report.finished.len());
    println!(
        "Volume:   {}%{}",
        snapshot.volume_level,
        if snapshot.is_muted { " (muted)" } else { "" }
    );
    println!(
        "Effects:  Bass: {:+}, Treble: {:+}{}",
        snapshot.bass_gain,
        snapshot.treble_gain,
        if snapshot.effects_available { "" } else { " (unavailable)" }
    );
    if let Some(error) = &snapshot.error {
        println!("Error:    {}", error.user_message());
    }
    println!("Ticks:    {}, updates: {}", report.ticks, report.updates);
}
