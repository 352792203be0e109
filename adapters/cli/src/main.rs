#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs headless Dice Defence sessions.

mod autoplay;
mod logger;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context as _};
use clap::{Parser, Subcommand, ValueEnum};
use dice_defence_core::{Event, RunOutcome};
use dice_defence_persistence::{Leaderboard, StoryProgress};
use dice_defence_simulation::{Simulation, SimulationConfig, FIXED_STEP};
use dice_defence_world::{query, story_stages};
use log::{info, LevelFilter};

use crate::autoplay::Autoplay;

/// Ticks between two bot decisions.
const DECISION_INTERVAL: u64 = 30;

/// Headless runner for the Dice Defence simulation.
#[derive(Debug, Parser)]
#[command(name = "dice-defence", version, about)]
struct Cli {
    /// Maximum log level written to stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => Self::Off,
            LogLevel::Error => Self::Error,
            LogLevel::Warn => Self::Warn,
            LogLevel::Info => Self::Info,
            LogLevel::Debug => Self::Debug,
            LogLevel::Trace => Self::Trace,
        }
    }
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Plays a run with the autoplay bot.
    Run(RunArgs),
    /// Prints the leaderboard.
    Leaderboard {
        /// Leaderboard file.
        #[arg(long, default_value = "leaderboard.json")]
        leaderboard: PathBuf,
    },
}

#[derive(Debug, clap::Args)]
struct RunArgs {
    /// TOML file with simulation settings.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Practice level index.
    #[arg(long)]
    level: Option<usize>,
    /// Story stage identifier, e.g. `1-2`.
    #[arg(long)]
    stage: Option<String>,
    /// Seed for every random stream.
    #[arg(long)]
    seed: Option<u64>,
    /// Game-speed preset index.
    #[arg(long)]
    speed_index: Option<usize>,
    /// Stop after this many 60 Hz ticks.
    #[arg(long, default_value_t = 216_000)]
    max_ticks: u64,
    /// Name recorded on the leaderboard.
    #[arg(long, default_value = "autoplay")]
    name: String,
    /// Leaderboard file.
    #[arg(long, default_value = "leaderboard.json")]
    leaderboard: PathBuf,
    /// Story progress file.
    #[arg(long, default_value = "story_progress.json")]
    progress: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init(cli.log_level.into())?;

    match cli.command {
        CliCommand::Run(args) => run(args),
        CliCommand::Leaderboard { leaderboard } => print_leaderboard(&leaderboard),
    }
}

fn load_config(args: &RunArgs) -> anyhow::Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))?
        }
        None => SimulationConfig::default(),
    };

    if let Some(level) = args.level {
        config.level = level;
    }
    if let Some(stage) = &args.stage {
        config.stage = Some(stage.clone());
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(speed_index) = args.speed_index {
        config.speed_index = speed_index;
    }
    Ok(config)
}

fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    if let Some(stage) = &config.stage {
        let mut progress =
            StoryProgress::load(&args.progress).context("failed to load progress")?;
        let order: Vec<&str> = story_stages().iter().map(|stage| stage.id()).collect();
        if !progress.is_unlocked(stage, &order) {
            bail!("stage {stage} is locked; clear the previous stage first");
        }
        progress.select(stage.as_str());
        progress
            .save(&args.progress)
            .context("failed to save progress")?;
    }

    let mut simulation = Simulation::new(config.clone())?;
    info!("{}", query::welcome_banner(simulation.world()));
    let bot = Autoplay;
    let mut kills = 0_u32;

    for tick in 0..args.max_ticks {
        if tick % DECISION_INTERVAL == 0 {
            if let Some(command) = bot.decide(simulation.world()) {
                let _ = simulation.submit(command);
            }
        }
        kills += simulation
            .step(FIXED_STEP)
            .iter()
            .filter(|event| matches!(event, Event::EnemyDied { .. }))
            .count() as u32;
        if simulation.is_over() {
            break;
        }
    }

    let world = simulation.world();
    let outcome = query::outcome(world);
    let waves = query::wave(world).map_or(0, |wave| wave + 1);
    info!(
        "{} on {}: {outcome:?} after {waves} waves, {kills} kills, ${} left, {} coins",
        args.name,
        query::layout(world).name(),
        query::money(world),
        query::coins(world)
    );

    match (outcome, &config.stage) {
        (RunOutcome::Victory, Some(stage)) => complete_stage(&args.progress, stage),
        (RunOutcome::Defeat, None) => record_score(&args.leaderboard, &args.name, waves),
        _ => Ok(()),
    }
}

fn complete_stage(path: &Path, stage: &str) -> anyhow::Result<()> {
    let mut progress = StoryProgress::load(path).context("failed to load progress")?;
    progress.complete(stage);
    progress.save(path).context("failed to save progress")?;
    info!("stage {stage} completed");
    Ok(())
}

fn record_score(path: &Path, name: &str, waves: u32) -> anyhow::Result<()> {
    let mut board = Leaderboard::load(path).context("failed to load leaderboard")?;
    if !board.is_high_score(waves) {
        return Ok(());
    }
    board.record(name, waves);
    board.save(path).context("failed to save leaderboard")?;
    info!("new high score: {waves} waves");
    Ok(())
}

fn print_leaderboard(path: &Path) -> anyhow::Result<()> {
    let board = Leaderboard::load(path).context("failed to load leaderboard")?;
    if board.entries().is_empty() {
        println!("No scores yet.");
        return Ok(());
    }
    for (rank, entry) in board.entries().iter().enumerate() {
        println!("{:>2}. {:<16} {:>4} waves", rank + 1, entry.name, entry.waves);
    }
    Ok(())
}
