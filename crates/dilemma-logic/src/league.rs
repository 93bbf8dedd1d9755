//! All-pairs leagues: every strategy plays every strategy, itself included.
//!
//! Each game gets its own generator derived from the league seed and the
//! game's index, so a league is reproducible game by game.

use serde::{Deserialize, Serialize};

use crate::game::{run_match, GameError, GameLength};
use crate::random::SeededRng;
use crate::stats::StatsStore;
use crate::strategy::StrategySpec;

/// Games each ordered pairing plays by default
pub const DEFAULT_GAMES_PER_PAIR: u32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeagueConfig {
    pub games_per_pair: u32,
    pub length: GameLength,
}

impl LeagueConfig {
    pub fn new(games_per_pair: u32, length: GameLength) -> Result<Self, GameError> {
        if games_per_pair == 0 {
            return Err(GameError::NoGames);
        }
        Ok(Self { games_per_pair, length })
    }
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self {
            games_per_pair: DEFAULT_GAMES_PER_PAIR,
            length: GameLength::default(),
        }
    }
}

/// Averages per ordered pairing, indexed `[row][column]` by roster position
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeagueReport {
    pub names: Vec<String>,
    /// Mean final score of the row strategy against the column strategy
    pub score_matrix: Vec<Vec<f64>>,
    /// Mean cooperation rate of the row strategy, in percent
    pub cooperation_matrix: Vec<Vec<f64>>,
    pub games_played: u32,
}

impl LeagueReport {
    /// Row means of the score matrix, best first
    pub fn ranking(&self) -> Vec<(String, f64)> {
        let mut ranking: Vec<(String, f64)> = self
            .names
            .iter()
            .zip(&self.score_matrix)
            .map(|(name, row)| (name.clone(), row.iter().sum::<f64>() / row.len().max(1) as f64))
            .collect();
        ranking.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranking
    }
}

/// Every ordered pairing of `n` entries, self-pairings included
pub fn generate_all_pairings(n: usize) -> Vec<(usize, usize)> {
    (0..n).flat_map(|a| (0..n).map(move |b| (a, b))).collect()
}

/// Pick a uniformly random opponent
pub fn pick_opponent<'a>(roster: &'a [StrategySpec], rng: &mut SeededRng) -> Option<&'a StrategySpec> {
    rng.pick(roster)
}

/// Play the full league, recording every game in `stats`
pub fn run_league(
    roster: &[StrategySpec],
    config: &LeagueConfig,
    rng: &SeededRng,
    stats: &mut StatsStore,
) -> Result<LeagueReport, GameError> {
    if roster.is_empty() {
        return Err(GameError::EmptyRoster);
    }
    if config.games_per_pair == 0 {
        return Err(GameError::NoGames);
    }

    let n = roster.len();
    let mut score_matrix = vec![vec![0.0; n]; n];
    let mut cooperation_matrix = vec![vec![0.0; n]; n];
    let mut match_index = 0u32;
    let pairings = generate_all_pairings(n);

    for (done, (a, b)) in pairings.iter().copied().enumerate() {
        let (spec_a, spec_b) = (&roster[a], &roster[b]);
        log::info!(
            "[{}/{}] {} vs {} ({} games)",
            done + 1,
            pairings.len(),
            spec_a.name(),
            spec_b.name(),
            config.games_per_pair
        );

        let mut total_score = 0u64;
        let mut total_cooperation = 0.0;
        for _ in 0..config.games_per_pair {
            let mut game_rng = SeededRng::new(rng.seed(), match_index);
            match_index = match_index.wrapping_add(1);

            let result = run_match(spec_a, spec_b, config.length, &mut game_rng);
            total_score += result.final_score1 as u64;
            total_cooperation += result.cooperation_rate1;
            stats.record_outcome(&result, spec_a.name(), spec_b.name());
        }

        let games = config.games_per_pair as f64;
        score_matrix[a][b] = total_score as f64 / games;
        cooperation_matrix[a][b] = total_cooperation / games * 100.0;
    }

    Ok(LeagueReport {
        names: roster.iter().map(|s| s.name().to_string()).collect(),
        score_matrix,
        cooperation_matrix,
        games_played: match_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::StrategyBase;

    fn roster() -> Vec<StrategySpec> {
        vec![
            StrategyBase::AlwaysCooperate.into(),
            StrategyBase::AlwaysDefect.into(),
            StrategyBase::TitForTat.into(),
        ]
    }

    #[test]
    fn test_generate_all_pairings() {
        let pairings = generate_all_pairings(3);
        assert_eq!(pairings.len(), 9);
        assert!(pairings.contains(&(0, 0)));
        assert!(pairings.contains(&(2, 1)));
        assert!(generate_all_pairings(0).is_empty());
    }

    #[test]
    fn test_league_fixed_length_matrices() {
        let mut stats = StatsStore::default();
        let config = LeagueConfig::new(4, GameLength::fixed(10).unwrap()).unwrap();
        let rng = SeededRng::new(&[42u8; 32], 0);

        let report = run_league(&roster(), &config, &rng, &mut stats).unwrap();

        assert_eq!(report.games_played, 36);
        assert_eq!(report.names, vec!["Always Cooperate", "Always Defect", "Tit for Tat"]);
        // Cooperator vs defector: 0 each round
        assert_eq!(report.score_matrix[0][1], 0.0);
        assert_eq!(report.score_matrix[1][0], 50.0);
        // Tit for Tat vs defector: suckered once, then mutual defection
        assert_eq!(report.score_matrix[2][1], 9.0);
        assert_eq!(report.cooperation_matrix[2][1], 10.0);
        assert_eq!(report.cooperation_matrix[0][0], 100.0);
        assert_eq!(report.cooperation_matrix[1][2], 0.0);

        assert_eq!(stats.games().len(), 36);
        assert_eq!(stats.performance("Always Defect").map(|p| p.total_games), Some(24));
    }

    #[test]
    fn test_league_ranking() {
        let mut stats = StatsStore::default();
        let config = LeagueConfig::new(1, GameLength::fixed(10).unwrap()).unwrap();
        let report = run_league(&roster(), &config, &SeededRng::new(&[1u8; 32], 0), &mut stats).unwrap();

        let ranking = report.ranking();
        // Defector: (50 + 10 + 14) / 3, Tit for Tat: (30 + 9 + 30) / 3, Cooperator: (30 + 0 + 30) / 3
        assert_eq!(ranking[0].0, "Always Defect");
        assert_eq!(ranking[1].0, "Tit for Tat");
        assert_eq!(ranking[2].0, "Always Cooperate");
    }

    #[test]
    fn test_league_rejects_empty_input() {
        let mut stats = StatsStore::default();
        let rng = SeededRng::new(&[1u8; 32], 0);
        assert_eq!(
            run_league(&[], &LeagueConfig::default(), &rng, &mut stats),
            Err(GameError::EmptyRoster)
        );
        let config = LeagueConfig { games_per_pair: 0, length: GameLength::default() };
        assert_eq!(run_league(&roster(), &config, &rng, &mut stats), Err(GameError::NoGames));
        assert_eq!(LeagueConfig::new(0, GameLength::default()), Err(GameError::NoGames));
    }

    #[test]
    fn test_league_is_reproducible() {
        let roster = vec![StrategyBase::Random.into(), StrategyBase::TitForTat.into()];
        let config = LeagueConfig::new(3, GameLength::default()).unwrap();
        let rng = SeededRng::new(&[9u8; 32], 0);

        let first = run_league(&roster, &config, &rng, &mut StatsStore::default()).unwrap();
        let second = run_league(&roster, &config, &rng, &mut StatsStore::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_pick_opponent() {
        let mut rng = SeededRng::new(&[5u8; 32], 0);
        assert!(pick_opponent(&[], &mut rng).is_none());
        let roster = roster();
        for _ in 0..20 {
            assert!(roster.contains(pick_opponent(&roster, &mut rng).unwrap()));
        }
    }
}
