//! Game logic for the iterated Prisoner's Dilemma
//!
//! Strategies, the payoff matrix, single games and all-pairs leagues.
//! This crate is compiled to:
//! - Native (for the command-line arena)
//! - WASM (for browser replay and charts)

mod random;
mod strategy;
mod pattern;
mod interpreter;
mod game;
mod league;
mod stats;
pub mod templates;

#[cfg(feature = "wasm")]
mod wasm;

pub use random::SeededRng;
pub use strategy::{
    cooperation_rate, describe_strategy, AlwaysCooperate, AlwaysDefect, CustomStrategy, History, Move,
    RandomStrategy, Strategy, StrategyBase, StrategySpec, TitForTat,
};
pub use pattern::{Condition, PatternError, PatternStrategy, SimpleAction, StrategyPattern};
pub use interpreter::{
    normalize, CachedInterpreter, InterpretError, Interpreter, JsonInterpreter, PatternCache, RuleInterpreter,
};
pub use game::{
    play_round, run_match, run_tournament, GameError, GameLength, RoundConfig, TournamentResult, END_PROBABILITY,
    MAX_ROUNDS,
};
pub use league::{generate_all_pairings, pick_opponent, run_league, LeagueConfig, LeagueReport, DEFAULT_GAMES_PER_PAIR};
pub use stats::{GameRecord, StatsError, StatsStore, StrategyPerformance, NORMALIZED_ROUNDS};

/// Payoff matrix for the Prisoner's Dilemma
/// Returns (score_a, score_b)
pub fn payoff(a: Move, b: Move) -> (u8, u8) {
    match (a, b) {
        (Move::Cooperate, Move::Cooperate) => (3, 3),
        (Move::Cooperate, Move::Defect) => (0, 5),
        (Move::Defect, Move::Cooperate) => (5, 0),
        (Move::Defect, Move::Defect) => (1, 1),
    }
}
