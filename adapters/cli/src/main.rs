#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a seeded, self-playing MikanBox session.

mod autopilot;

use std::{fs, io, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use mikanbox_core::WELCOME_BANNER;
use mikanbox_rendering::{FrameSink, TextCanvas, WriterSink};
use mikanbox_scheduler::ActorScheduler;
use mikanbox_system_gameplay::{Game, GameConfig};

use crate::autopilot::Autopilot;

#[derive(Debug, Parser)]
#[command(name = "mikanbox")]
#[command(about = "Runs a seeded, self-playing MikanBox session in the terminal")]
struct Cli {
    /// Seed for item generation and the autopilot; overrides the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum number of scheduler ticks to run
    #[arg(long, default_value_t = 3_000)]
    frames: usize,

    /// TOML file with game configuration overrides
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print a frame every N ticks; 0 prints none
    #[arg(long, default_value_t = 100)]
    every: usize,

    /// Fraction of ticks on which the autopilot presses a button
    #[arg(long, default_value_t = 0.2)]
    activity: f64,
}

fn load_config(cli: &Cli) -> Result<GameConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read configuration at {}", path.display()))?;
            GameConfig::from_toml_str(&contents)
                .with_context(|| format!("invalid configuration in {}", path.display()))?
        }
        None => GameConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    Ok(config)
}

/// Entry point for the MikanBox command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    println!("{WELCOME_BANNER}");

    let config = load_config(&cli)?;
    let mut game = Game::new(&config).context("failed to assemble the game")?;
    let mut canvas = TextCanvas::new(config.columns, config.rows, config.square_size)?;
    let mut sink = WriterSink::new(io::stdout().lock());
    let mut autopilot = Autopilot::new(config.seed, cli.activity);
    let mut scheduler = ActorScheduler::new();
    game.start(&mut scheduler);

    let mut ticks = 0;
    while ticks < cli.frames && !game.is_over() {
        if let Some(event) = autopilot.next_input(&game) {
            Game::submit_input(&mut scheduler, event);
        }
        let _ = scheduler.run(&mut game);
        ticks += 1;

        if cli.every > 0 && ticks % cli.every == 0 {
            canvas.clear();
            game.render(&scheduler, &mut canvas);
            sink.present(&format!("tick {ticks}\n{}", canvas.frame()))?;
        }
    }

    let statistics = game.statistics();
    info!(
        "session finished after {ticks} tick(s){}",
        if game.is_over() { " (game over)" } else { "" }
    );
    println!(
        "pairs: {}  chains: {}  erased: {}  spoiled: {}  longest cascade: {}  score: {}",
        statistics.pairs_landed,
        statistics.chains,
        statistics.erased,
        statistics.spoiled,
        statistics.longest_cascade,
        statistics.score
    );
    Ok(())
}
