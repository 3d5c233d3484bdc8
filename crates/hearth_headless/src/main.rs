//! Headless Hearth runner.
//!
//! This binary runs the game without graphics, controlled via JSON on
//! stdin/stdout, or plays it by itself with a scripted player.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p hearth_headless
//!
//! # Interactive mode with custom tuning
//! cargo run -p hearth_headless -- run --config tuning.ron
//!
//! # Scripted game, JSON summary on stdout
//! cargo run -p hearth_headless -- autoplay --max-turns 20
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information
//!
//! See the protocol module for command/response format.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use hearth_core::simulation::Simulation;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hearth_headless::{autoplay, AutoplayConfig, DataPaths, HeadlessRunner};

#[derive(Parser)]
#[command(name = "hearth_headless")]
#[command(about = "Headless Hearth runner for scripted play and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Data overrides shared by every subcommand.
#[derive(Args, Default)]
struct DataArgs {
    /// SimConfig RON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Combo catalog RON file
    #[arg(long)]
    combos: Option<PathBuf>,

    /// Archetype catalog RON file
    #[arg(long)]
    archetypes: Option<PathBuf>,

    /// Spawn schedule RON file
    #[arg(long)]
    schedule: Option<PathBuf>,
}

impl DataArgs {
    fn into_paths(self) -> DataPaths {
        DataPaths {
            config: self.config,
            combos: self.combos,
            archetypes: self.archetypes,
            schedule: self.schedule,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single interactive game over stdin/stdout
    Run {
        #[command(flatten)]
        data: DataArgs,
    },

    /// Let the scripted player finish a game and print a summary
    Autoplay {
        #[command(flatten)]
        data: DataArgs,

        /// Stop after this turn even without an outcome
        #[arg(long, default_value = "30")]
        max_turns: u32,

        /// Never trigger combos
        #[arg(long)]
        no_combos: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let result = match cli.command {
        Some(Commands::Run { data }) => cmd_run(data),
        Some(Commands::Autoplay {
            data,
            max_turns,
            no_combos,
        }) => cmd_autoplay(data, max_turns, no_combos),
        None => {
            // Default: interactive mode
            cmd_run(DataArgs::default())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            tracing::error!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn load_simulation(data: DataArgs) -> Result<Simulation, String> {
    let data = data.into_paths().load().map_err(|e| e.to_string())?;
    Ok(Simulation::with_data(data))
}

/// Run a single interactive game
fn cmd_run(data: DataArgs) -> Result<(), String> {
    tracing::info!("Starting interactive session");
    let mut runner = HeadlessRunner::with_simulation(load_simulation(data)?);
    let stdin = io::stdin();
    runner
        .run(stdin.lock(), io::stdout().lock())
        .map_err(|e| format!("IO error: {e}"))
}

/// Play a scripted game and print the summary as JSON
fn cmd_autoplay(data: DataArgs, max_turns: u32, no_combos: bool) -> Result<(), String> {
    let mut sim = load_simulation(data)?;
    let config = AutoplayConfig {
        max_turns,
        use_combos: !no_combos,
    };
    let summary = autoplay(&mut sim, config);
    let json = serde_json::to_string_pretty(&summary).map_err(|e| format!("Serialization failed: {e}"))?;
    println!("{json}");
    Ok(())
}
