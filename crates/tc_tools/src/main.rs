//! Tactical Conquest - Development Tools

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tc_core::engine::Difficulty;
use tc_core::level::Level;
use tc_tools::batch::{run_batch, verify_determinism, BatchConfig};
use tc_tools::validate::validate_path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tc-tools")]
#[command(about = "Development tools for Tactical Conquest")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Who plays a side.
#[derive(Clone, Copy, ValueEnum)]
enum Policy {
    /// End every turn without acting.
    Pass,
    /// Random legal actions.
    Easy,
    /// Focused attacks and steady advance.
    Medium,
    /// Strongest scripted policy.
    Hard,
}

impl Policy {
    fn difficulty(self) -> Option<Difficulty> {
        match self {
            Self::Pass => None,
            Self::Easy => Some(Difficulty::Easy),
            Self::Medium => Some(Difficulty::Medium),
            Self::Hard => Some(Difficulty::Hard),
        }
    }
}

/// AI strength for the enemy side.
#[derive(Clone, Copy, ValueEnum)]
enum Strength {
    /// Random legal actions.
    Easy,
    /// Focused attacks and steady advance.
    Medium,
    /// Strongest scripted policy.
    Hard,
}

impl From<Strength> for Difficulty {
    fn from(strength: Strength) -> Self {
        match strength {
            Strength::Easy => Self::Easy,
            Strength::Medium => Self::Medium,
            Strength::Hard => Self::Hard,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a level file or a directory of level files
    Validate {
        /// Level file or directory
        #[arg(default_value = "levels")]
        path: PathBuf,

        /// Print reports as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Play many seeded matches of one level and summarise them
    Simulate {
        /// Level file to play
        level: PathBuf,

        /// Number of matches
        #[arg(short, long, default_value = "100")]
        games: u32,

        /// Seed of the first match
        #[arg(long, default_value = "0")]
        seed: u64,

        /// AI strength (defaults to the level's campaign difficulty)
        #[arg(long, value_enum)]
        difficulty: Option<Strength>,

        /// Policy playing the human side
        #[arg(long, value_enum, default_value = "medium")]
        player_policy: Policy,

        /// Turn limit per match
        #[arg(long, default_value = "100")]
        max_turns: u32,

        /// Print full results as JSON on stdout instead of a summary
        #[arg(long)]
        json: bool,

        /// Write full results as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replay one seed several times and compare final hashes
    Verify {
        /// Level file to play
        level: PathBuf,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let ok = match cli.command {
        Commands::Validate { path, json } => cmd_validate(&path, json),
        Commands::Simulate {
            level,
            games,
            seed,
            difficulty,
            player_policy,
            max_turns,
            json,
            output,
        } => {
            let config = BatchConfig::new(games)
                .with_seed(seed)
                .with_policies(difficulty.map(Difficulty::from), player_policy.difficulty())
                .with_max_turns(max_turns);
            cmd_simulate(&level, config, json, output.as_deref())
        }
        Commands::Verify { level, seed, runs } => cmd_verify(&level, seed, runs),
    };

    if !ok {
        std::process::exit(1);
    }
}

fn load_level(path: &Path) -> Option<Level> {
    match Level::load(path) {
        Ok(level) => Some(level),
        Err(e) => {
            tracing::error!("Failed to load {}: {e}", path.display());
            None
        }
    }
}

fn cmd_validate(path: &Path, json: bool) -> bool {
    tracing::info!("Validating levels in: {}", path.display());
    let reports = match validate_path(path) {
        Ok(reports) => reports,
        Err(e) => {
            tracing::error!("Validation failed: {e}");
            return false;
        }
    };

    if json {
        match serde_json::to_string_pretty(&reports) {
            Ok(text) => println!("{text}"),
            Err(e) => tracing::error!("Failed to serialize reports: {e}"),
        }
    } else {
        for report in &reports {
            let status = if report.is_valid() { "ok" } else { "FAILED" };
            println!("{:<40} {status}", report.path.display());
            for error in &report.errors {
                println!("    error: {error}");
            }
            for warning in &report.warnings {
                println!("    warning: {warning}");
            }
        }
    }

    reports.iter().all(|r| r.is_valid())
}

fn cmd_simulate(path: &Path, config: BatchConfig, json: bool, output: Option<&Path>) -> bool {
    let Some(level) = load_level(path) else {
        return false;
    };
    let results = run_batch(&level, config);
    let s = &results.summary;

    if json {
        match serde_json::to_string_pretty(&results) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                tracing::error!("Failed to serialize results: {e}");
                return false;
            }
        }
    } else {
        println!("Level {} - {} games", results.level_id, s.total_games);
        println!("  victories:  {}", s.victories);
        println!("  defeats:    {}", s.defeats);
        println!("  unfinished: {}", s.unfinished);
        println!("  win rate:   {:.1}%", s.win_rate * 100.0);
        println!("  avg turns:  {:.1}", s.avg_turns);
        println!("  avg stars:  {:.2}", s.avg_stars);
        for error in &results.errors {
            println!("  seed {} failed: {}", error.seed, error.message);
        }
    }

    if let Some(output) = output {
        if let Err(e) = results.save(output) {
            tracing::error!("Failed to write {}: {e}", output.display());
            return false;
        }
        tracing::info!("Results written to {}", output.display());
    }
    results.errors.is_empty()
}

fn cmd_verify(path: &Path, seed: u64, runs: u32) -> bool {
    let Some(level) = load_level(path) else {
        return false;
    };
    match verify_determinism(&level, &BatchConfig::new(1), seed, runs) {
        Ok(true) => {
            println!("seed {seed}: {runs} runs agree");
            true
        }
        Ok(false) => {
            println!("seed {seed}: runs DIVERGED");
            false
        }
        Err(e) => {
            tracing::error!("Verification failed: {e}");
            false
        }
    }
}
