//! Game execution engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::payoff;
use crate::random::SeededRng;
use crate::strategy::{cooperation_rate, Strategy, StrategySpec};

/// Hard cap on the length of any game
pub const MAX_ROUNDS: u32 = 1000;

/// Chance of the game ending after each round in stochastic mode
pub const END_PROBABILITY: f64 = 0.003;

#[derive(Debug, Error, PartialEq)]
pub enum GameError {
    #[error("round count must be between 1 and 1000, got {0}")]
    RoundsOutOfRange(u32),
    #[error("end probability must be within [0, 1], got {0}")]
    InvalidProbability(f64),
    #[error("a league needs at least one strategy")]
    EmptyRoster,
    #[error("games per pairing must be positive")]
    NoGames,
}

/// Parameters of the stochastic stopping rule
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundConfig {
    pub max_rounds: u32,
    pub end_probability: f64,
}

impl RoundConfig {
    /// 0.3% chance to stop after each round, never more than 1000 rounds
    pub fn standard() -> Self {
        Self { max_rounds: MAX_ROUNDS, end_probability: END_PROBABILITY }
    }

    pub fn new(max_rounds: u32, end_probability: f64) -> Result<Self, GameError> {
        if max_rounds == 0 || max_rounds > MAX_ROUNDS {
            return Err(GameError::RoundsOutOfRange(max_rounds));
        }
        if !(0.0..=1.0).contains(&end_probability) {
            return Err(GameError::InvalidProbability(end_probability));
        }
        Ok(Self { max_rounds, end_probability })
    }

    /// Mean game length under this rule
    pub fn expected_rounds(&self) -> f64 {
        let q = 1.0 - self.end_probability;
        if self.end_probability <= 0.0 {
            return self.max_rounds as f64;
        }
        // E[min(G, max)] for geometric G on {1, 2, ...}
        (1.0 - q.powi(self.max_rounds as i32)) / self.end_probability
    }
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// How long a game runs
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameLength {
    /// Exactly this many rounds
    Fixed(u32),
    /// Stop at random after each round
    Stochastic(RoundConfig),
}

impl GameLength {
    pub fn fixed(rounds: u32) -> Result<Self, GameError> {
        if rounds == 0 || rounds > MAX_ROUNDS {
            return Err(GameError::RoundsOutOfRange(rounds));
        }
        Ok(GameLength::Fixed(rounds))
    }

    /// Fixed when a count is given, standard stochastic otherwise
    pub fn from_rounds(rounds: Option<u32>) -> Result<Self, GameError> {
        rounds.map_or(Ok(GameLength::default()), Self::fixed)
    }
}

impl Default for GameLength {
    fn default() -> Self {
        GameLength::Stochastic(RoundConfig::standard())
    }
}

/// Result of a complete game between two strategies
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentResult {
    /// Cumulative score of the first strategy after each round
    pub scores1: Vec<u32>,
    /// Cumulative score of the second strategy after each round
    pub scores2: Vec<u32>,
    pub final_score1: u32,
    pub final_score2: u32,
    pub cooperation_rate1: f64,
    pub cooperation_rate2: f64,
    pub total_rounds: u32,
}

impl TournamentResult {
    /// Average score per round for each side
    pub fn average_scores(&self) -> (f64, f64) {
        let rounds = self.total_rounds.max(1) as f64;
        (self.final_score1 as f64 / rounds, self.final_score2 as f64 / rounds)
    }

    /// `Some(0)` / `Some(1)` for the winning side, `None` on a tie
    pub fn winner(&self) -> Option<usize> {
        match self.final_score1.cmp(&self.final_score2) {
            std::cmp::Ordering::Greater => Some(0),
            std::cmp::Ordering::Less => Some(1),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Play a single round.
///
/// Both moves are chosen against the histories as they stood before the
/// round, then both histories are updated and the payoffs returned.
pub fn play_round(
    strategy_a: &mut dyn Strategy,
    strategy_b: &mut dyn Strategy,
    rng_a: &mut SeededRng,
    rng_b: &mut SeededRng,
) -> (u32, u32) {
    let move_a = strategy_a.make_choice(rng_a);
    let move_b = strategy_b.make_choice(rng_b);

    strategy_a.update_history(move_a, move_b);
    strategy_b.update_history(move_b, move_a);

    let (score_a, score_b) = payoff(move_a, move_b);
    (score_a as u32, score_b as u32)
}

/// Run a complete game between two fresh strategies
///
/// # Arguments
/// * `strategy_a` - First player's strategy
/// * `strategy_b` - Second player's strategy
/// * `length` - Fixed round count or stochastic stopping rule
/// * `rng` - Game randomness; per-player streams are derived from it
///
/// # Returns
/// Cumulative score walks, final scores and cooperation rates
pub fn run_tournament(
    strategy_a: &mut dyn Strategy,
    strategy_b: &mut dyn Strategy,
    length: GameLength,
    rng: &mut SeededRng,
) -> TournamentResult {
    let (max_rounds, end_probability) = match length {
        GameLength::Fixed(rounds) => (rounds.clamp(1, MAX_ROUNDS), None),
        GameLength::Stochastic(config) => (config.max_rounds.clamp(1, MAX_ROUNDS), Some(config.end_probability)),
    };

    let mut scores1 = Vec::with_capacity(max_rounds as usize);
    let mut scores2 = Vec::with_capacity(max_rounds as usize);
    let mut total_a = 0u32;
    let mut total_b = 0u32;
    let mut round = 0u32;

    // Separate streams per player so one side's randomness never shifts the other's
    let mut rng_a = rng.fork(0);
    let mut rng_b = rng.fork(1);

    while round < max_rounds {
        let (score_a, score_b) = play_round(strategy_a, strategy_b, &mut rng_a, &mut rng_b);
        total_a += score_a;
        total_b += score_b;
        scores1.push(total_a);
        scores2.push(total_b);
        round += 1;

        if let Some(p) = end_probability {
            if rng.chance(p) {
                break;
            }
        }
    }

    let result = TournamentResult {
        scores1,
        scores2,
        final_score1: total_a,
        final_score2: total_b,
        cooperation_rate1: cooperation_rate(strategy_a.history()).unwrap_or(0.0),
        cooperation_rate2: cooperation_rate(strategy_b.history()).unwrap_or(0.0),
        total_rounds: round,
    };

    log::debug!(
        "{} vs {}: {}-{} after {} rounds",
        strategy_a.name(),
        strategy_b.name(),
        result.final_score1,
        result.final_score2,
        result.total_rounds
    );

    result
}

/// Spawn fresh instances from two specs and play one game
pub fn run_match(
    spec_a: &StrategySpec,
    spec_b: &StrategySpec,
    length: GameLength,
    rng: &mut SeededRng,
) -> TournamentResult {
    let mut strategy_a = spec_a.spawn();
    let mut strategy_b = spec_b.spawn();
    run_tournament(strategy_a.as_mut(), strategy_b.as_mut(), length, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{PatternStrategy, SimpleAction, StrategyPattern};
    use crate::strategy::{AlwaysCooperate, AlwaysDefect, Move, RandomStrategy, Strategy, StrategyBase, TitForTat};
    use proptest::prelude::*;

    fn make_rng(match_index: u32) -> SeededRng {
        SeededRng::new(&[42u8; 32], match_index)
    }

    fn base_strategy() -> impl proptest::strategy::Strategy<Value = StrategyBase> {
        prop::sample::select(StrategyBase::ALL.to_vec())
    }

    #[test]
    fn test_play_round_scores_and_histories() {
        let mut a = AlwaysCooperate::new();
        let mut b = AlwaysDefect::new();
        let mut rng_a = make_rng(0);
        let mut rng_b = make_rng(1);

        assert_eq!(play_round(&mut a, &mut b, &mut rng_a, &mut rng_b), (0, 5));
        assert_eq!(a.history(), &[Move::Cooperate]);
        assert_eq!(a.opponent_history(), &[Move::Defect]);
        assert_eq!(b.history(), &[Move::Defect]);
        assert_eq!(b.opponent_history(), &[Move::Cooperate]);
    }

    #[test]
    fn test_play_round_is_simultaneous() {
        // Tit for Tat only reacts to the defection a round later
        let mut a = TitForTat::new();
        let mut b = AlwaysDefect::new();
        let mut rng_a = make_rng(0);
        let mut rng_b = make_rng(1);

        assert_eq!(play_round(&mut a, &mut b, &mut rng_a, &mut rng_b), (0, 5));
        assert_eq!(play_round(&mut a, &mut b, &mut rng_a, &mut rng_b), (1, 1));
    }

    #[test]
    fn test_fixed_cooperate_vs_defect() {
        let mut a = AlwaysCooperate::new();
        let mut b = AlwaysDefect::new();

        let result = run_tournament(&mut a, &mut b, GameLength::fixed(10).unwrap(), &mut make_rng(0));

        assert_eq!(result.total_rounds, 10);
        assert_eq!(result.final_score1, 0);
        assert_eq!(result.final_score2, 50);
        assert_eq!(result.cooperation_rate1, 1.0);
        assert_eq!(result.cooperation_rate2, 0.0);
        assert_eq!(result.scores2, (1..=10).map(|r| r * 5).collect::<Vec<u32>>());
        assert_eq!(result.winner(), Some(1));
    }

    #[test]
    fn test_tft_vs_tft() {
        let mut a = TitForTat::new();
        let mut b = TitForTat::new();

        let result = run_tournament(&mut a, &mut b, GameLength::fixed(50).unwrap(), &mut make_rng(0));

        assert_eq!(result.final_score1, 150);
        assert_eq!(result.final_score2, 150);
        assert_eq!(result.winner(), None);
        assert_eq!(result.average_scores(), (3.0, 3.0));
    }

    #[test]
    fn test_tft_vs_always_defect() {
        let mut a = TitForTat::new();
        let mut b = AlwaysDefect::new();

        let result = run_tournament(&mut a, &mut b, GameLength::fixed(20).unwrap(), &mut make_rng(0));

        assert_eq!(a.history()[0], Move::Cooperate);
        assert!(a.history()[1..].iter().all(|m| *m == Move::Defect));
        // 0 for the opening sucker round, then 1 per mutual defection
        assert_eq!(result.final_score1, 19);
        assert_eq!(result.final_score2, 5 + 19);
    }

    #[test]
    fn test_tft_mirrors_previous_move() {
        let mut a = TitForTat::new();
        let mut b = RandomStrategy::new();

        run_tournament(&mut a, &mut b, GameLength::fixed(200).unwrap(), &mut make_rng(3));

        assert_eq!(a.history()[0], Move::Cooperate);
        for n in 1..a.history().len() {
            assert_eq!(a.history()[n], b.history()[n - 1]);
        }
    }

    #[test]
    fn test_stochastic_bounds_with_extreme_probabilities() {
        let never = GameLength::Stochastic(RoundConfig::new(MAX_ROUNDS, 0.0).unwrap());
        let always = GameLength::Stochastic(RoundConfig::new(MAX_ROUNDS, 1.0).unwrap());

        let result = run_match(
            &StrategyBase::AlwaysCooperate.into(),
            &StrategyBase::AlwaysCooperate.into(),
            never,
            &mut make_rng(0),
        );
        assert_eq!(result.total_rounds, MAX_ROUNDS);

        let result = run_match(
            &StrategyBase::AlwaysCooperate.into(),
            &StrategyBase::AlwaysCooperate.into(),
            always,
            &mut make_rng(0),
        );
        assert_eq!(result.total_rounds, 1);
        assert_eq!(result.scores1, vec![3]);
    }

    #[test]
    fn test_stochastic_length_distribution() {
        let samples = 300;
        let mut total = 0u64;
        for match_index in 0..samples {
            let result = run_match(
                &StrategyBase::AlwaysDefect.into(),
                &StrategyBase::AlwaysDefect.into(),
                GameLength::default(),
                &mut make_rng(match_index),
            );
            assert!(result.total_rounds >= 1 && result.total_rounds <= MAX_ROUNDS);
            total += result.total_rounds as u64;
        }
        let average = total as f64 / samples as f64;
        // Expected is ~317 with the cap, standard deviation of the mean ~16
        assert!(average > 230.0 && average < 400.0, "average {} not ~317", average);
    }

    #[test]
    fn test_expected_rounds() {
        let standard = RoundConfig::standard().expected_rounds();
        assert!(standard > 310.0 && standard < 320.0, "expected {}", standard);
        assert_eq!(RoundConfig::new(10, 0.0).unwrap().expected_rounds(), 10.0);
        assert_eq!(RoundConfig::new(10, 1.0).unwrap().expected_rounds(), 1.0);
    }

    #[test]
    fn test_match_determinism() {
        let a = StrategySpec::Builtin(StrategyBase::TitForTat);
        let b = StrategySpec::Builtin(StrategyBase::Random);

        let result1 = run_match(&a, &b, GameLength::default(), &mut make_rng(0));
        let result2 = run_match(&a, &b, GameLength::default(), &mut make_rng(0));

        assert_eq!(result1, result2);
    }

    #[test]
    fn test_different_matches_differ() {
        let a = StrategySpec::Builtin(StrategyBase::Random);
        let b = StrategySpec::Builtin(StrategyBase::Random);
        let length = GameLength::fixed(100).unwrap();

        let result1 = run_match(&a, &b, length, &mut make_rng(0));
        let result2 = run_match(&a, &b, length, &mut make_rng(1));

        assert_ne!(result1.scores1, result2.scores1);
    }

    #[test]
    fn test_pattern_strategy_in_game() {
        let mut a = PatternStrategy::new(
            "Alternator",
            "one on, one off",
            StrategyPattern::Sequence { cooperate_count: 1, defect_count: 1 },
        );
        let mut b = PatternStrategy::new("Saint", "", StrategyPattern::Simple { action: SimpleAction::Cooperate });

        let result = run_tournament(&mut a, &mut b, GameLength::fixed(4).unwrap(), &mut make_rng(0));

        assert_eq!(result.scores1, vec![3, 8, 11, 16]);
        assert_eq!(result.scores2, vec![3, 3, 6, 6]);
        assert_eq!(result.cooperation_rate1, 0.5);
        assert_eq!(a.move_counter(), 4);
    }

    #[test]
    fn test_fixed_length_is_capped() {
        let mut a = TitForTat::new();
        let mut b = TitForTat::new();
        let result = run_tournament(&mut a, &mut b, GameLength::Fixed(0), &mut make_rng(0));
        assert_eq!(result.total_rounds, 1);

        let mut a = TitForTat::new();
        let mut b = TitForTat::new();
        let result = run_tournament(&mut a, &mut b, GameLength::Fixed(5000), &mut make_rng(0));
        assert_eq!(result.total_rounds, MAX_ROUNDS);
        assert_eq!(result.scores1.len(), MAX_ROUNDS as usize);
    }

    fn repeats(moves: &[Move]) -> usize {
        moves.windows(2).filter(|w| w[0] == w[1]).count()
    }

    #[test]
    fn test_random_moves_are_independent_across_rounds() {
        for seed in [[0u8; 32], [42u8; 32], [7u8; 32]] {
            let mut a = RandomStrategy::new();
            let mut b = TitForTat::new();
            run_tournament(&mut a, &mut b, GameLength::Fixed(MAX_ROUNDS), &mut SeededRng::new(&seed, 0));

            let same = repeats(a.history());
            assert!(same > 400 && same < 600, "{} of 999 adjacent moves equal", same);
        }
    }

    #[test]
    fn test_random_players_are_independent() {
        let mut a = RandomStrategy::new();
        let mut b = RandomStrategy::new();
        run_tournament(&mut a, &mut b, GameLength::Fixed(MAX_ROUNDS), &mut SeededRng::new(&[3u8; 32], 0));

        let agree = a.history().iter().zip(b.history()).filter(|(x, y)| x == y).count();
        assert!(agree > 400 && agree < 600, "players agreed on {} of 1000 rounds", agree);
        assert!(repeats(b.history()) > 400 && repeats(b.history()) < 600);
    }

    #[test]
    fn test_random_pattern_is_independent_across_rounds() {
        let mut a = PatternStrategy::new("Coin", "", StrategyPattern::Simple { action: SimpleAction::Random });
        let mut b = AlwaysCooperate::new();
        run_tournament(&mut a, &mut b, GameLength::Fixed(MAX_ROUNDS), &mut make_rng(5));

        let same = repeats(a.history());
        assert!(same > 400 && same < 600, "{} of 999 adjacent moves equal", same);
    }

    #[test]
    fn test_length_validation() {
        assert_eq!(GameLength::fixed(0), Err(GameError::RoundsOutOfRange(0)));
        assert_eq!(GameLength::fixed(MAX_ROUNDS + 1), Err(GameError::RoundsOutOfRange(MAX_ROUNDS + 1)));
        assert_eq!(GameLength::from_rounds(None), Ok(GameLength::default()));
        assert_eq!(GameLength::from_rounds(Some(7)), Ok(GameLength::Fixed(7)));
        assert!(matches!(RoundConfig::new(10, 1.5), Err(GameError::InvalidProbability(_))));
    }

    #[test]
    fn test_result_json_keys() {
        let result = run_match(
            &StrategyBase::AlwaysCooperate.into(),
            &StrategyBase::AlwaysDefect.into(),
            GameLength::fixed(1).unwrap(),
            &mut make_rng(0),
        );
        let value = serde_json::to_value(&result).unwrap();
        for key in [
            "scores1",
            "scores2",
            "final_score1",
            "final_score2",
            "cooperation_rate1",
            "cooperation_rate2",
            "total_rounds",
        ] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_stochastic_game_terminates(
            seed in any::<[u8; 32]>(),
            a in base_strategy(),
            b in base_strategy(),
        ) {
            let mut rng = SeededRng::new(&seed, 0);
            let result = run_match(&a.into(), &b.into(), GameLength::default(), &mut rng);
            prop_assert!(result.total_rounds >= 1);
            prop_assert!(result.total_rounds <= MAX_ROUNDS);
        }

        #[test]
        fn prop_cumulative_scores_are_walks(
            seed in any::<[u8; 32]>(),
            a in base_strategy(),
            b in base_strategy(),
            rounds in 1u32..=200,
        ) {
            let mut rng = SeededRng::new(&seed, 0);
            let result = run_match(&a.into(), &b.into(), GameLength::fixed(rounds).unwrap(), &mut rng);

            prop_assert_eq!(result.total_rounds, rounds);
            prop_assert_eq!(result.scores1.len(), rounds as usize);
            prop_assert_eq!(result.scores2.len(), rounds as usize);
            prop_assert!(result.scores1.windows(2).all(|w| w[0] <= w[1]));
            prop_assert!(result.scores2.windows(2).all(|w| w[0] <= w[1]));
            prop_assert_eq!(result.scores1.last().copied(), Some(result.final_score1));
            prop_assert_eq!(result.scores2.last().copied(), Some(result.final_score2));
        }

        #[test]
        fn prop_cooperation_rate_matches_history(
            seed in any::<[u8; 32]>(),
            a in base_strategy(),
            b in base_strategy(),
            rounds in 1u32..=100,
        ) {
            let mut strategy_a = a.spawn();
            let mut strategy_b = b.spawn();
            let mut rng = SeededRng::new(&seed, 0);
            let result = run_tournament(
                strategy_a.as_mut(),
                strategy_b.as_mut(),
                GameLength::fixed(rounds).unwrap(),
                &mut rng,
            );

            let history = strategy_a.history();
            let expected = history.iter().filter(|m| m.is_cooperate()).count() as f64 / history.len() as f64;
            prop_assert_eq!(result.cooperation_rate1, expected);
            prop_assert!((0.0..=1.0).contains(&result.cooperation_rate1));
            prop_assert!((0.0..=1.0).contains(&result.cooperation_rate2));
            prop_assert_eq!(strategy_a.history().len(), strategy_a.opponent_history().len());
        }
    }
}
