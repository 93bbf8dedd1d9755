//! Historical game records and per-strategy performance.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::TournamentResult;

/// Scores are normalized to this many rounds before averaging
pub const NORMALIZED_ROUNDS: f64 = 100.0;

#[derive(Debug, Error, PartialEq)]
pub enum StatsError {
    #[error("cannot record a game of zero rounds for `{0}`")]
    NoRounds(String),
}

/// One completed game
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub strategy1_name: String,
    pub strategy2_name: String,
    pub score1: u32,
    pub score2: u32,
    pub total_rounds: u32,
    pub cooperation_rate1: f64,
    pub cooperation_rate2: f64,
    pub timestamp: DateTime<Utc>,
}

/// Running aggregates for one strategy
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyPerformance {
    pub strategy_name: String,
    pub total_games: u32,
    /// Sum of per-game scores normalized to 100 rounds
    pub total_score: f64,
    /// Mean normalized score, i.e. average score per 100 rounds
    pub avg_score_per_round: f64,
    pub avg_cooperation_rate: f64,
    pub last_updated: DateTime<Utc>,
}

impl StrategyPerformance {
    fn new(strategy_name: &str) -> Self {
        Self {
            strategy_name: strategy_name.to_string(),
            total_games: 0,
            total_score: 0.0,
            avg_score_per_round: 0.0,
            avg_cooperation_rate: 0.0,
            last_updated: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsStore {
    #[serde(default)]
    games: Vec<GameRecord>,
    #[serde(default)]
    performance: BTreeMap<String, StrategyPerformance>,
}

impl StatsStore {
    /// Fold one game's score into a strategy's aggregates
    pub fn update_stats(
        &mut self,
        strategy_name: &str,
        score: u32,
        num_rounds: u32,
        cooperation_rate: f64,
    ) -> Result<&StrategyPerformance, StatsError> {
        if num_rounds == 0 {
            return Err(StatsError::NoRounds(strategy_name.to_string()));
        }
        let normalized = score as f64 / num_rounds as f64 * NORMALIZED_ROUNDS;

        let performance = self
            .performance
            .entry(strategy_name.to_string())
            .or_insert_with(|| StrategyPerformance::new(strategy_name));

        let previous_games = performance.total_games as f64;
        performance.total_games += 1;
        performance.total_score += normalized;
        performance.avg_score_per_round = performance.total_score / performance.total_games as f64;
        performance.avg_cooperation_rate = (performance.avg_cooperation_rate * previous_games
            + cooperation_rate)
            / performance.total_games as f64;
        performance.last_updated = Utc::now();

        Ok(performance)
    }

    pub fn record_game(&mut self, result: &TournamentResult, strategy1_name: &str, strategy2_name: &str) {
        self.games.push(GameRecord {
            strategy1_name: strategy1_name.to_string(),
            strategy2_name: strategy2_name.to_string(),
            score1: result.final_score1,
            score2: result.final_score2,
            total_rounds: result.total_rounds,
            cooperation_rate1: result.cooperation_rate1,
            cooperation_rate2: result.cooperation_rate2,
            timestamp: Utc::now(),
        });
    }

    /// Update both sides' aggregates and store the game
    pub fn record_outcome(&mut self, result: &TournamentResult, strategy1_name: &str, strategy2_name: &str) {
        let sides = [
            (strategy1_name, result.final_score1, result.cooperation_rate1),
            (strategy2_name, result.final_score2, result.cooperation_rate2),
        ];
        for (name, score, rate) in sides {
            if let Err(e) = self.update_stats(name, score, result.total_rounds, rate) {
                log::warn!("skipping stats update: {}", e);
            }
        }
        self.record_game(result, strategy1_name, strategy2_name);
    }

    /// Average score per 100 rounds for each strategy seen so far
    pub fn average_scores(&self) -> BTreeMap<String, f64> {
        self.performance
            .iter()
            .map(|(name, p)| (name.clone(), p.avg_score_per_round))
            .collect()
    }

    /// Mean final score and cooperation percentage of the row strategy
    /// against the column strategy, over every recorded game.
    ///
    /// Games involving names outside `names` are ignored; pairs that never
    /// met stay at zero.
    pub fn historical_matrices(&self, names: &[String]) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        let n = names.len();
        let mut score_matrix = vec![vec![0.0; n]; n];
        let mut cooperation_matrix = vec![vec![0.0; n]; n];
        let mut counts = vec![vec![0u32; n]; n];

        for game in &self.games {
            let row = names.iter().position(|name| *name == game.strategy1_name);
            let column = names.iter().position(|name| *name == game.strategy2_name);
            if let (Some(a), Some(b)) = (row, column) {
                score_matrix[a][b] += game.score1 as f64;
                cooperation_matrix[a][b] += game.cooperation_rate1 * 100.0;
                counts[a][b] += 1;
            }
        }

        for a in 0..n {
            for b in 0..n {
                if counts[a][b] > 0 {
                    score_matrix[a][b] /= counts[a][b] as f64;
                    cooperation_matrix[a][b] /= counts[a][b] as f64;
                }
            }
        }
        (score_matrix, cooperation_matrix)
    }

    pub fn performance(&self, strategy_name: &str) -> Option<&StrategyPerformance> {
        self.performance.get(strategy_name)
    }

    pub fn performances(&self) -> impl Iterator<Item = &StrategyPerformance> {
        self.performance.values()
    }

    pub fn games(&self) -> &[GameRecord] {
        &self.games
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty() && self.performance.is_empty()
    }

    /// Forget every game and every aggregate
    pub fn clear(&mut self) {
        self.games.clear();
        self.performance.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(final_score1: u32, final_score2: u32, total_rounds: u32, rate1: f64, rate2: f64) -> TournamentResult {
        TournamentResult {
            scores1: vec![final_score1; total_rounds as usize],
            scores2: vec![final_score2; total_rounds as usize],
            final_score1,
            final_score2,
            cooperation_rate1: rate1,
            cooperation_rate2: rate2,
            total_rounds,
        }
    }

    #[test]
    fn test_update_stats_normalizes_to_100_rounds() {
        let mut stats = StatsStore::default();

        let p = stats.update_stats("Tit for Tat", 150, 50, 1.0).unwrap();
        assert_eq!(p.total_games, 1);
        assert_eq!(p.avg_score_per_round, 300.0);

        let p = stats.update_stats("Tit for Tat", 100, 100, 0.5).unwrap();
        assert_eq!(p.total_games, 2);
        assert_eq!(p.total_score, 400.0);
        assert_eq!(p.avg_score_per_round, 200.0);
        assert_eq!(p.avg_cooperation_rate, 0.75);
    }

    #[test]
    fn test_update_stats_rejects_zero_rounds() {
        let mut stats = StatsStore::default();
        assert_eq!(
            stats.update_stats("Random", 0, 0, 0.0).unwrap_err(),
            StatsError::NoRounds("Random".to_string())
        );
        assert!(stats.is_empty());
    }

    #[test]
    fn test_record_outcome() {
        let mut stats = StatsStore::default();
        stats.record_outcome(&result(0, 50, 10, 1.0, 0.0), "Always Cooperate", "Always Defect");

        let games = stats.games();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].strategy1_name, "Always Cooperate");
        assert_eq!(games[0].score2, 50);
        assert_eq!(games[0].total_rounds, 10);

        let averages = stats.average_scores();
        assert_eq!(averages.get("Always Cooperate"), Some(&0.0));
        assert_eq!(averages.get("Always Defect"), Some(&500.0));
    }

    #[test]
    fn test_self_play_counts_twice() {
        let mut stats = StatsStore::default();
        stats.record_outcome(&result(30, 30, 10, 1.0, 1.0), "Tit for Tat", "Tit for Tat");

        assert_eq!(stats.performance("Tit for Tat").map(|p| p.total_games), Some(2));
        assert_eq!(stats.games().len(), 1);
    }

    #[test]
    fn test_historical_matrices() {
        let mut stats = StatsStore::default();
        stats.record_game(&result(0, 50, 10, 1.0, 0.0), "Always Cooperate", "Always Defect");
        stats.record_game(&result(10, 60, 20, 0.5, 0.0), "Always Cooperate", "Always Defect");
        stats.record_game(&result(30, 30, 10, 1.0, 1.0), "Tit for Tat", "Tit for Tat");
        stats.record_game(&result(9, 9, 3, 1.0, 1.0), "Retired", "Tit for Tat");

        let names = vec!["Always Cooperate".to_string(), "Always Defect".to_string(), "Tit for Tat".to_string()];
        let (scores, cooperation) = stats.historical_matrices(&names);

        assert_eq!(scores[0][1], 5.0);
        assert_eq!(cooperation[0][1], 75.0);
        assert_eq!(scores[2][2], 30.0);
        assert_eq!(cooperation[2][2], 100.0);
        // Only the row side of a game is counted
        assert_eq!(scores[1][0], 0.0);
        assert_eq!(cooperation[1][0], 0.0);
        assert_eq!(scores.iter().flatten().filter(|v| **v != 0.0).count(), 2);
    }

    #[test]
    fn test_clear() {
        let mut stats = StatsStore::default();
        stats.record_outcome(&result(3, 3, 1, 1.0, 1.0), "A", "B");
        assert!(!stats.is_empty());

        stats.clear();
        assert!(stats.is_empty());
        assert!(stats.average_scores().is_empty());
    }

    #[test]
    fn test_store_serializes() {
        let mut stats = StatsStore::default();
        stats.record_outcome(&result(5, 0, 1, 0.0, 1.0), "A", "B");

        let json = serde_json::to_string(&stats).unwrap();
        let back: StatsStore = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stats);

        let empty: StatsStore = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }
}
