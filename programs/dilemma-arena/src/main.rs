//! Dilemma Arena - Iterated Prisoner's Dilemma from the command line
//!
//! Single games, the all-pairs league, custom strategies and
//! historical statistics kept in a JSON data file.

mod error;
mod instructions;
mod state;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use dilemma_logic::{GameLength, LeagueConfig, SeededRng, DEFAULT_GAMES_PER_PAIR};

use crate::state::{ArenaState, DEFAULT_DATA_PATH};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Arena data file
    #[arg(long, env = "DILEMMA_DATA", default_value = DEFAULT_DATA_PATH, global = true)]
    data: PathBuf,
    /// Seed for reproducible games: 64 hex digits, or any text
    #[arg(long, global = true)]
    seed: Option<String>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Play a single game and record it")]
    Play {
        #[arg(required = true)]
        strategy: String,
        /// Opponent name; random when omitted
        #[arg(long)]
        opponent: Option<String>,
        /// Fixed round count; stochastic length when omitted
        #[arg(long)]
        rounds: Option<u32>,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    #[command(about = "Play every strategy against every strategy")]
    League {
        #[arg(long, default_value_t = DEFAULT_GAMES_PER_PAIR)]
        games: u32,
        #[arg(long)]
        rounds: Option<u32>,
    },
    #[command(about = "Show historical performance")]
    Stats,
    #[command(about = "Delete all recorded games and performance")]
    Clear,
    #[command(about = "Register a custom strategy from a description of its play")]
    Add {
        #[arg(required = true)]
        name: String,
        /// Strategy text, e.g. "cooperate 10 moves then defect 10 moves"
        #[arg(long)]
        logic: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    #[command(about = "Remove a custom strategy", alias = "rm")]
    Remove {
        #[arg(required = true)]
        name: String,
    },
    #[command(about = "List built-in and custom strategies", alias = "ls")]
    Strategies,
    #[command(about = "List strategy templates")]
    Templates,
}

/// 64 hex digits are used as-is; other text fills the seed bytewise, zero padded
fn seed_from_text(text: &str) -> [u8; 32] {
    let text = text.trim();
    let mut seed = [0u8; 32];
    if text.len() == 64 && text.chars().all(|c| c.is_ascii_hexdigit()) {
        for (byte, pair) in seed.iter_mut().zip(text.as_bytes().chunks(2)) {
            let digits = std::str::from_utf8(pair).unwrap_or("00");
            *byte = u8::from_str_radix(digits, 16).unwrap_or(0);
        }
    } else {
        for (byte, b) in seed.iter_mut().zip(text.bytes()) {
            *byte = b;
        }
    }
    seed
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let rng = match cli.seed.as_deref() {
        Some(text) => SeededRng::new(&seed_from_text(text), 0),
        None => SeededRng::from_entropy(),
    };
    let mut state = ArenaState::load(&cli.data)?;

    let dirty = match cli.command {
        Command::Play { strategy, opponent, rounds, json } => {
            let length = GameLength::from_rounds(rounds)?;
            let mut rng = rng;
            let outcome = instructions::play_game(&mut state, &strategy, opponent.as_deref(), length, &mut rng)?;
            if json {
                let text = serde_json::to_string_pretty(&outcome.result).context("serializing game result")?;
                println!("{}", text);
            } else {
                print!("{}", instructions::render_outcome(&outcome));
            }
            true
        }
        Command::League { games, rounds } => {
            let config = LeagueConfig::new(games, GameLength::from_rounds(rounds)?)?;
            let report = instructions::run_full_league(&mut state, &config, &rng)?;
            print!("{}", instructions::render_league(&report));
            println!();
            print!("{}", instructions::render_stats(&state.stats, &report.names));
            true
        }
        Command::Stats => {
            let names: Vec<String> = state.roster().iter().map(|s| s.name().to_string()).collect();
            print!("{}", instructions::render_stats(&state.stats, &names));
            false
        }
        Command::Clear => {
            let dropped = instructions::clear_history(&mut state);
            println!("Cleared {} recorded games", dropped);
            true
        }
        Command::Add { name, logic, description } => {
            let custom = instructions::add_strategy(&mut state, &name, &description, &logic)?;
            println!("Added '{}': {}", custom.name, custom.pattern.summary());
            true
        }
        Command::Remove { name } => {
            let removed = instructions::remove_strategy(&mut state, &name)?;
            println!("Removed '{}'", removed.name);
            true
        }
        Command::Strategies => {
            print!("{}", instructions::render_strategies(&state));
            false
        }
        Command::Templates => {
            print!("{}", instructions::render_templates());
            false
        }
    };

    if dirty {
        state.save(&cli.data)?;
    }
    Ok(())
}
