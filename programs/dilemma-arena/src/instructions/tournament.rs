//! League instructions

use std::fmt::Write as _;

use dilemma_logic::{run_league, GameError, LeagueConfig, LeagueReport, SeededRng, StatsStore};

use crate::state::ArenaState;

/// Play every registered strategy against every other, itself included
pub fn run_full_league(
    state: &mut ArenaState,
    config: &LeagueConfig,
    rng: &SeededRng,
) -> Result<LeagueReport, GameError> {
    let roster = state.roster();
    log::info!(
        "league of {} strategies, {} games per pairing",
        roster.len(),
        config.games_per_pair
    );
    run_league(&roster, config, rng, &mut state.stats)
}

fn render_matrix(out: &mut String, title: &str, names: &[String], matrix: &[Vec<f64>]) {
    let width = names.iter().map(|n| n.len()).max().unwrap_or(0).max(8);
    let _ = writeln!(out, "{}", title);
    let _ = write!(out, "{:<width$}", "", width = width);
    for name in names {
        let _ = write!(out, " {:>width$}", name, width = width);
    }
    let _ = writeln!(out);
    for (name, row) in names.iter().zip(matrix) {
        let _ = write!(out, "{:<width$}", name, width = width);
        for value in row {
            let _ = write!(out, " {:>width$.1}", value, width = width);
        }
        let _ = writeln!(out);
    }
}

pub fn render_league(report: &LeagueReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} games played", report.games_played);
    let _ = writeln!(out);
    render_matrix(&mut out, "Average score (row vs column)", &report.names, &report.score_matrix);
    let _ = writeln!(out);
    render_matrix(&mut out, "Cooperation % (row vs column)", &report.names, &report.cooperation_matrix);
    let _ = writeln!(out);
    let _ = writeln!(out, "Ranking");
    for (place, (name, score)) in report.ranking().iter().enumerate() {
        let _ = writeln!(out, "{:>3}. {:<20} {:.1}", place + 1, name, score);
    }
    out
}

/// Historical averages per 100 rounds, best first, then the per-pairing
/// matrices over every recorded game between strategies in `names`
pub fn render_stats(stats: &StatsStore, names: &[String]) -> String {
    if stats.is_empty() {
        return "No games recorded yet\n".to_string();
    }

    let mut performances: Vec<_> = stats.performances().collect();
    performances.sort_by(|a, b| b.avg_score_per_round.total_cmp(&a.avg_score_per_round));

    let mut out = String::new();
    let _ = writeln!(out, "{} games recorded", stats.games().len());
    let _ = writeln!(out, "{:<20} {:>7} {:>12} {:>12}", "Strategy", "Games", "Score/100", "Cooperation");
    for p in performances {
        let _ = writeln!(
            out,
            "{:<20} {:>7} {:>12.1} {:>11.1}%",
            p.strategy_name,
            p.total_games,
            p.avg_score_per_round,
            p.avg_cooperation_rate * 100.0
        );
    }

    let (scores, cooperation) = stats.historical_matrices(names);
    let _ = writeln!(out);
    render_matrix(&mut out, "Historical average score (row vs column)", names, &scores);
    let _ = writeln!(out);
    render_matrix(&mut out, "Historical cooperation % (row vs column)", names, &cooperation);
    out
}
