//! stateplay - record and replay actuator trajectories
//!
//! # Commands
//!
//! - `stateplay demo` - Drive a simulated machine through a scripted routine and save the recording
//! - `stateplay play <FILE>` / `stateplay play --latest` - Replay a recording on simulated channels
//! - `stateplay show <FILE>` - Print a JSON summary of a recording
//! - `stateplay check <FILE>` - Parse and validate a recording
//!
//! # Usage
//!
//! ```bash
//! # Record the demo routine, then play it back twice as fast
//! stateplay demo
//! stateplay play --latest --speed 2
//!
//! # Simulate an operator abort 750 ms into playback
//! stateplay play --latest --abort-after-ms 750
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use stateplay_rs::{
    channel::{sim::SimulatedChannel, ChannelDirectory},
    config::AppConfig,
    logging,
    session::{HistorySummary, Player, RecordingController},
    storage::HistoryStore,
    timing::{CancelToken, MonotonicClock, ThreadContext},
    HistoryTable,
};

/// Channels on the simulated machine
const MOTORS: [&str; 2] = ["left_drive", "right_drive"];
const SERVOS: [&str; 1] = ["pusher"];

/// How often the demo operator loop samples the channels
const CONTROL_PERIOD: Duration = Duration::from_millis(20);

/// Demo operator routine: pause in ms, then the inputs applied together
const DEMO_SCRIPT: &[(u64, &[(&str, f64)])] = &[
    (300, &[("left_drive", 1.0), ("right_drive", 1.0)]),
    (800, &[("left_drive", 0.5), ("right_drive", -0.5)]),
    (400, &[("left_drive", 0.0), ("right_drive", 0.0)]),
    (200, &[("pusher", 0.75)]),
    (500, &[("pusher", 0.0)]),
    (300, &[("left_drive", -1.0), ("right_drive", -1.0)]),
    (600, &[("left_drive", 0.0), ("right_drive", 0.0)]),
];

/// Record and replay actuator state trajectories
#[derive(Parser)]
#[command(name = "stateplay")]
#[command(about = "Record and replay actuator state trajectories")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $STATEPLAY_CONFIG or the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive the simulated machine through a scripted routine and save it
    Demo(DemoArgs),

    /// Replay a recording on the simulated machine
    Play(PlayArgs),

    /// Print a JSON summary of a recording
    Show {
        /// History file
        file: PathBuf,
    },

    /// Parse and validate a recording
    Check {
        /// History file
        file: PathBuf,
    },
}

#[derive(Args)]
struct DemoArgs {
    /// Save into this directory instead of the configured one
    #[arg(long)]
    history_dir: Option<PathBuf>,

    /// Multiply every scripted pause by this factor
    #[arg(long, default_value_t = 1.0)]
    time_scale: f64,
}

#[derive(Args)]
struct PlayArgs {
    /// History file to play
    #[arg(required_unless_present = "latest", conflicts_with = "latest")]
    file: Option<PathBuf>,

    /// Play the most recent recording in the history directory
    #[arg(long)]
    latest: bool,

    /// Speed multiplier (overrides the config)
    #[arg(long)]
    speed: Option<f64>,

    /// Cancel playback after this many milliseconds
    #[arg(long)]
    abort_after_ms: Option<u64>,

    /// Simulate a motor for every recorded channel the machine lacks
    #[arg(long)]
    auto_channels: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => AppConfig::resolve_path()?,
    };
    let config = AppConfig::load_or_default(&config_path);
    let _log_guard = logging::init_logging(&config.logging);

    tracing::debug!("Using config {:?}", config_path);

    match cli.command {
        Commands::Demo(args) => run_demo(&config, args),
        Commands::Play(args) => run_play(&config, args),
        Commands::Show { file } => {
            let table = HistoryStore::from_config(&config.recording).read_history(&file)?;
            let summary = HistorySummary::from(&table);
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Commands::Check { file } => {
            let table = HistoryStore::from_config(&config.recording).read_history(&file)?;
            table
                .validate()
                .with_context(|| format!("{} is not playable", file.display()))?;
            println!(
                "{}: ok ({} channels, {} rows, {} ms)",
                file.display(),
                table.channel_names().len(),
                table.row_count(),
                table.total_duration().as_millis()
            );
            Ok(())
        }
    }
}

/// Simulated machine with the standard channel set
fn simulated_machine() -> Result<(ChannelDirectory, Vec<(&'static str, SimulatedChannel)>)> {
    let mut directory = ChannelDirectory::new();
    let mut handles = Vec::new();

    for name in MOTORS {
        let channel = SimulatedChannel::motor(0.0);
        directory.register(name, channel.clone())?;
        handles.push((name, channel));
    }
    for name in SERVOS {
        let channel = SimulatedChannel::servo(0.0);
        directory.register(name, channel.clone())?;
        handles.push((name, channel));
    }

    Ok((directory, handles))
}

fn run_demo(config: &AppConfig, args: DemoArgs) -> Result<()> {
    let (directory, handles) = simulated_machine()?;

    let mut recording = config.recording.clone();
    if let Some(dir) = args.history_dir {
        recording.history_dir = dir;
    }
    let store = HistoryStore::from_config(&recording);

    let mut controller = RecordingController::with_clock(&directory, Arc::new(MonotonicClock::new()))
        .with_tolerance(recording.change_tolerance);
    controller.start_recording()?;

    if !args.time_scale.is_finite() || args.time_scale < 0.0 {
        bail!("--time-scale must be a finite, non-negative number");
    }
    let scale = args.time_scale;
    for (pause_ms, inputs) in DEMO_SCRIPT {
        let pause = Duration::from_secs_f64(*pause_ms as f64 / 1000.0 * scale);
        let deadline = Instant::now() + pause;
        while Instant::now() < deadline {
            controller.update_recording()?;
            std::thread::sleep(CONTROL_PERIOD.min(pause));
        }

        for (name, value) in inputs.iter() {
            let (_, channel) = handles
                .iter()
                .find(|(n, _)| n == name)
                .with_context(|| format!("demo machine has no channel {}", name))?;
            channel.set(*value);
        }
        controller.update_recording()?;
    }

    let saved = controller.stop_recording(&store);
    let table = controller
        .last_recording()
        .context("demo session produced no recording")?;

    match saved {
        Some(path) => println!(
            "Recorded {} rows ({} ms) to {}",
            table.row_count(),
            table.total_duration().as_millis(),
            path.display()
        ),
        None => println!(
            "Recorded {} rows but could not save them to {}",
            table.row_count(),
            store.root().display()
        ),
    }
    Ok(())
}

fn run_play(config: &AppConfig, args: PlayArgs) -> Result<()> {
    let store = HistoryStore::from_config(&config.recording);

    let path = match (args.file, args.latest) {
        (Some(file), _) => file,
        (None, true) => store
            .latest_history()?
            .with_context(|| format!("no recordings in {}", store.root().display()))?,
        (None, false) => bail!("give a history file or --latest"),
    };

    let table = store.read_history(&path)?;
    let (mut directory, _handles) = simulated_machine()?;
    if args.auto_channels {
        add_missing_channels(&mut directory, &table)?;
    }

    let speed = match args.speed {
        Some(speed) if speed.is_nan() => bail!("--speed must be a number"),
        Some(speed) => speed,
        None => config.playback.effective_speed(),
    };
    let token = CancelToken::new();
    let ctx = ThreadContext::new(token.clone()).with_speed(speed);

    if let Some(ms) = args.abort_after_ms {
        let remote = token.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(ms));
            tracing::info!("Operator abort after {} ms", ms);
            remote.cancel();
        });
    }

    println!(
        "Playing {} at {}x ({} rows)",
        path.display(),
        ctx.speed(),
        table.row_count()
    );

    let mut player = Player::new();
    match player.play(&table, &directory, &ctx) {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) if e.is_aborted() => {
            println!("{} (machine restored to baseline)", e);
            Ok(())
        }
        Err(e) => Err(anyhow::Error::new(e).context(format!("playback of {} failed", path.display()))),
    }
}

fn add_missing_channels(directory: &mut ChannelDirectory, table: &HistoryTable) -> Result<()> {
    for name in table.channel_names() {
        if !directory.contains(name) {
            tracing::info!("Simulating missing channel {}", name);
            directory.register(name.as_str(), SimulatedChannel::motor(0.0))?;
        }
    }
    Ok(())
}
