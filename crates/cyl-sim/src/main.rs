//! Cylinder spin simulator
//!
//! Usage:
//!   cyl-sim run                       - Spin the reference machine 100 times
//!   cyl-sim run --config fruit.yaml   - Spin a machine loaded from JSON/YAML
//!   cyl-sim run --stages win          - Print the win stages of every cycle
//!   cyl-sim export --format yaml      - Print the reference machine
//!   cyl-sim check fruit.yaml          - Validate a machine document

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};

use cyl_lab::{
    ConfigLoader, MachineConfig, RetriggerPolicy, Sequencer, TimingConfig, TimingProfile,
    to_json, to_yaml,
};
use cyl_stage::StageCategory;

#[derive(Parser)]
#[command(name = "cyl-sim", about = "Headless spin cycle simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run spins headless and print session statistics
    Run {
        /// Machine document (JSON or YAML); reference machine when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of completed cycles to run
        #[arg(short = 'n', long, default_value_t = 100)]
        spins: u64,
        /// RNG seed
        #[arg(long)]
        seed: Option<u64>,
        /// Host tick length in milliseconds
        #[arg(long, default_value_t = 16.0)]
        tick_ms: f64,
        /// Timing profile (normal, turbo, instant)
        #[arg(short, long)]
        profile: Option<TimingProfile>,
        /// Print every cycle's stage trace as JSON
        #[arg(long)]
        trace: bool,
        /// Print the stages of one category (spin, win, input, diagnostics) per cycle
        #[arg(long)]
        stages: Option<StageCategory>,
    },
    /// Print the reference machine
    Export {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Validate a machine document
    Check {
        /// Path to the document
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            spins,
            seed,
            tick_ms,
            profile,
            trace,
            stages,
        } => run(RunOptions {
            path: config,
            spins,
            seed,
            tick_ms,
            profile,
            trace,
            stages,
        }),
        Commands::Export { format } => export(format),
        Commands::Check { path } => check(path),
    }
}

struct RunOptions {
    path: Option<PathBuf>,
    spins: u64,
    seed: Option<u64>,
    tick_ms: f64,
    profile: Option<TimingProfile>,
    trace: bool,
    stages: Option<StageCategory>,
}

fn run(options: RunOptions) -> Result<()> {
    let RunOptions {
        path,
        spins,
        seed,
        tick_ms,
        profile,
        trace,
        stages,
    } = options;

    if !tick_ms.is_finite() || tick_ms <= 0.0 {
        bail!("tick length must be a positive number of milliseconds");
    }

    let mut config = match &path {
        Some(path) => ConfigLoader::new()
            .load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => MachineConfig::reference(),
    };
    if let Some(profile) = profile {
        config.timing = TimingConfig::from_profile(profile);
    }
    if let Some(seed) = seed {
        config.seed = Some(seed);
    }
    // The host triggers a spin whenever the machine rests; nothing to queue
    config.retrigger = RetriggerPolicy::Ignore;

    let dt = tick_ms / 1000.0;
    let ticks_per_cycle = (config.timing.max_cycle_duration(config.reels.len()) / dt).ceil() as u64 + 2;
    let name = config.name.clone();
    let max_reward = config.rewards.max_reward();

    let mut sequencer = Sequencer::headless(config).context("Invalid machine")?;
    sequencer.advance(0.0);

    log::info!("Running {} spins on '{}' ({} ms ticks)", spins, name, tick_ms);

    let mut completed = 0;
    let mut ticks_in_cycle = 0;
    while completed < spins {
        if sequencer.is_at_rest() {
            sequencer.on_spin_requested();
            ticks_in_cycle = 0;
        }

        if let Some(result) = sequencer.advance(dt) {
            completed += 1;
            log::debug!(
                "cycle {}: {:?} -> {}",
                result.cycle,
                result.snapshot.symbol_names(),
                result.total_reward()
            );
            if trace {
                println!("{}", serde_json::to_string(&result.trace)?);
            }
            if let Some(category) = stages {
                for event in result.trace.events_by_category(category) {
                    println!(
                        "{} {} {:>9.1} ms  {}",
                        result.cycle,
                        category.display_name(),
                        event.timestamp_ms,
                        serde_json::to_string(&event.stage)?
                    );
                }
            }
        }

        ticks_in_cycle += 1;
        if ticks_in_cycle > ticks_per_cycle {
            bail!("cycle {} did not complete", sequencer.cycle());
        }
    }

    let stats = sequencer.stats();
    println!("machine:        {}", name);
    println!("spins:          {}", stats.total_spins);
    println!("wins:           {}", stats.wins);
    println!("hit rate:       {:.2}%", stats.hit_rate());
    println!("total reward:   {}", stats.total_reward);
    println!("average reward: {:.3}", stats.average_reward());
    println!("best reward:    {}", stats.best_reward);
    println!("max entry:      {}", max_reward);
    if stats.anomalies > 0 {
        println!("anomalies:      {}", stats.anomalies);
    }

    Ok(())
}

fn export(format: Format) -> Result<()> {
    let reference = MachineConfig::reference();
    let text = match format {
        Format::Json => to_json(&reference)?,
        Format::Yaml => to_yaml(&reference)?,
    };
    println!("{}", text);
    Ok(())
}

fn check(path: PathBuf) -> Result<()> {
    let config = ConfigLoader::new()
        .load(&path)
        .with_context(|| format!("{} is not a valid machine", path.display()))?;
    println!(
        "{}: ok ({} reels × {} rows, {} symbols, {} patterns, max entry {})",
        config.name,
        config.reels.len(),
        config.visible_rows,
        config.symbols.len(),
        config.patterns.len(),
        config.rewards.max_reward()
    );
    Ok(())
}
