//! Maintenance instructions

use dilemma_logic::{CustomStrategy, StrategyBase};

use crate::error::ArenaError;
use crate::state::ArenaState;

/// Forget every recorded game and aggregate, returning how many games were dropped
pub fn clear_history(state: &mut ArenaState) -> usize {
    let dropped = state.stats.games().len();
    state.stats.clear();
    log::info!("cleared {} recorded games", dropped);
    dropped
}

/// Remove a custom strategy. Its recorded games are kept.
pub fn remove_strategy(state: &mut ArenaState, name: &str) -> Result<CustomStrategy, ArenaError> {
    if let Some(base) = StrategyBase::from_name(name) {
        return Err(ArenaError::BuiltinStrategy(base.name().to_string()));
    }
    let index = state
        .custom_position(name)
        .ok_or_else(|| ArenaError::UnknownStrategy(name.trim().to_string()))?;

    let removed = state.custom_strategies.remove(index);
    log::info!("removed custom strategy '{}'", removed.name);
    Ok(removed)
}
