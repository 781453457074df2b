//! Fortress Siege - Development Tools
//!
//! ```bash
//! cargo run -p siege_tools -- validate --scenario scenarios/default_siege.ron
//! cargo run -p siege_tools -- run scenarios/default_siege.ron --report out.json --replay out.replay
//! cargo run -p siege_tools -- verify out.replay
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use siege_core::replay::{Replay, ReplayPlayer};
use siege_tools::scenario::{run_scenario, write_report, Scenario};
use siege_tools::validate::{validate_scenario, validate_tables};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "siege-tools")]
#[command(about = "Development tools for Fortress Siege")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the data tables and optionally a scenario file
    Validate {
        /// Scenario to check as well
        #[arg(short, long)]
        scenario: Option<PathBuf>,
    },
    /// Run a scenario headless
    Run {
        /// Scenario file
        scenario: PathBuf,
        /// Write the run report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
        /// Write a replay of the run
        #[arg(long)]
        replay: Option<PathBuf>,
        /// Override the scenario seed
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Re-run a replay and compare every checkpoint
    Verify {
        /// Replay file
        replay: PathBuf,
    },
}

fn main() {
    // Logs go to stderr; stdout carries the report when no file is given.
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = execute(cli.command) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn execute(command: Commands) -> siege_tools::Result<()> {
    match command {
        Commands::Validate { scenario } => {
            validate_tables()?;
            if let Some(path) = scenario {
                validate_scenario(&path)?;
            }
        }
        Commands::Run {
            scenario,
            report,
            replay,
            seed,
        } => {
            let mut scenario = Scenario::load(&scenario)?;
            if let Some(seed) = seed {
                scenario.seed = seed;
            }
            let (run_report, run_replay) = run_scenario(&scenario)?;
            match report {
                Some(path) => {
                    write_report(&run_report, &path)?;
                    tracing::info!("Report written to {}", path.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&run_report)?),
            }
            if let Some(path) = replay {
                run_replay.save(&path)?;
                tracing::info!("Replay written to {}", path.display());
            }
        }
        Commands::Verify { replay } => {
            let replay = Replay::load(&replay)?;
            let ticks = replay.duration();
            ReplayPlayer::new(replay)?.verify()?;
            tracing::info!(ticks, "Replay verified");
        }
    }
    Ok(())
}
