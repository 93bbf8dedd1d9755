//! Player instructions

use std::fmt::Write as _;
use std::mem;

use dilemma_logic::{
    describe_strategy, pick_opponent, run_match, templates, CachedInterpreter, CustomStrategy, GameLength,
    InterpretError, Interpreter, JsonInterpreter, RuleInterpreter, SeededRng, StrategyBase, StrategyPattern,
    TournamentResult,
};

use crate::error::ArenaError;
use crate::state::ArenaState;

/// Reads pattern JSON verbatim and anything else through the keyword rules
#[derive(Clone, Copy, Debug, Default)]
pub struct TextInterpreter;

impl Interpreter for TextInterpreter {
    fn interpret(&mut self, text: &str) -> Result<StrategyPattern, InterpretError> {
        if text.trim_start().starts_with('{') {
            JsonInterpreter.interpret(text)
        } else {
            RuleInterpreter.interpret(text)
        }
    }
}

/// Register a custom strategy, interpreting its logic once
pub fn add_strategy(
    state: &mut ArenaState,
    name: &str,
    description: &str,
    logic: &str,
) -> Result<CustomStrategy, ArenaError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ArenaError::EmptyName);
    }
    if logic.trim().is_empty() {
        return Err(ArenaError::EmptyLogic);
    }
    if let Some(base) = StrategyBase::from_name(name) {
        return Err(ArenaError::BuiltinStrategy(base.name().to_string()));
    }
    if state.custom_position(name).is_some() {
        return Err(ArenaError::DuplicateStrategy(name.to_string()));
    }

    let mut interpreter = CachedInterpreter::with_cache(TextInterpreter, mem::take(&mut state.pattern_cache));
    let pattern = interpreter.resolve(logic);
    state.pattern_cache = interpreter.into_cache();

    let custom = CustomStrategy::new(name, description.trim(), pattern).with_logic(logic.trim());
    log::info!("registered '{}' as {}", custom.name, custom.pattern.summary());
    state.custom_strategies.push(custom.clone());
    Ok(custom)
}

/// A finished single game
#[derive(Clone, Debug, PartialEq)]
pub struct PlayOutcome {
    pub strategy: String,
    pub opponent: String,
    pub opponent_description: String,
    pub result: TournamentResult,
}

/// Play one game and record it. A missing opponent is drawn from the whole roster.
pub fn play_game(
    state: &mut ArenaState,
    strategy: &str,
    opponent: Option<&str>,
    length: GameLength,
    rng: &mut SeededRng,
) -> Result<PlayOutcome, ArenaError> {
    let spec = state
        .find(strategy)
        .ok_or_else(|| ArenaError::UnknownStrategy(strategy.trim().to_string()))?;
    let opponent_spec = match opponent {
        Some(name) => state
            .find(name)
            .ok_or_else(|| ArenaError::UnknownStrategy(name.trim().to_string()))?,
        None => {
            let roster = state.roster();
            pick_opponent(&roster, rng).cloned().ok_or(ArenaError::NoOpponent)?
        }
    };

    log::info!("{} vs {}", spec.name(), opponent_spec.name());
    let result = run_match(&spec, &opponent_spec, length, rng);
    state.stats.record_outcome(&result, spec.name(), opponent_spec.name());

    Ok(PlayOutcome {
        strategy: spec.name().to_string(),
        opponent: opponent_spec.name().to_string(),
        opponent_description: describe_strategy(&opponent_spec),
        result,
    })
}

pub fn render_outcome(outcome: &PlayOutcome) -> String {
    let result = &outcome.result;
    let (avg1, avg2) = result.average_scores();
    let winner = match result.winner() {
        Some(0) => outcome.strategy.as_str(),
        Some(_) => outcome.opponent.as_str(),
        None => "tie",
    };

    let mut out = String::new();
    let _ = writeln!(out, "You played against: {}", outcome.opponent);
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", outcome.opponent_description);
    let _ = writeln!(out);
    let _ = writeln!(out, "Rounds played: {}", result.total_rounds);
    let _ = writeln!(out, "Final score:   {} - {}", result.final_score1, result.final_score2);
    let _ = writeln!(out, "Winner:        {}", winner);
    let _ = writeln!(out, "Avg per round: {:.2} - {:.2}", avg1, avg2);
    let _ = writeln!(
        out,
        "Cooperation:   {:.1}% - {:.1}%",
        result.cooperation_rate1 * 100.0,
        result.cooperation_rate2 * 100.0
    );
    out
}

/// Built-in and custom strategies with their descriptions
pub fn render_strategies(state: &ArenaState) -> String {
    let mut out = String::new();
    for spec in state.roster() {
        let _ = writeln!(out, "{:<20} {}", spec.name(), describe_strategy(&spec));
    }
    out
}

pub fn render_templates() -> String {
    let mut out = String::new();
    for template in templates::all() {
        let _ = writeln!(out, "{} ({:?}, {})", template.name, template.complexity, template.category);
        let _ = writeln!(out, "    {}", template.description);
        let _ = writeln!(out, "    logic: \"{}\"", template.logic);
    }
    out
}
