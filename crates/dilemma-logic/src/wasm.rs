//! WASM bindings for browser replay and charts

#![cfg(feature = "wasm")]

use wasm_bindgen::prelude::*;
use crate::{
    describe_strategy, run_match, templates, CachedInterpreter, CustomStrategy, GameLength, RoundConfig,
    RuleInterpreter, SeededRng, StrategyBase, StrategyPattern, StrategySpec,
};

/// Parse a strategy JSON string into a StrategySpec.
///
/// Accepts three formats:
/// - Full:    `{"Builtin": "TitForTat"}` or `{"Custom": {...}}` (StrategySpec JSON)
/// - Custom:  `{"name": "...", "description": "...", "pattern": {...}}`
/// - Builtin: `"TitForTat"` or `"Tit for Tat"`
fn parse_strategy_spec(json: &str) -> Result<StrategySpec, String> {
    if let Ok(spec) = serde_json::from_str::<StrategySpec>(json) {
        return Ok(spec);
    }
    if let Ok(custom) = serde_json::from_str::<CustomStrategy>(json) {
        return Ok(StrategySpec::Custom(custom));
    }
    let name: String = serde_json::from_str(json).unwrap_or_else(|_| json.to_string());
    StrategyBase::from_name(&name)
        .map(StrategySpec::Builtin)
        .ok_or_else(|| format!("Invalid strategy: {}", json))
}

/// Replay a game with its cumulative score series
///
/// # Arguments
/// * `strategy_a_json` - JSON serialized StrategySpec for player A
/// * `strategy_b_json` - JSON serialized StrategySpec for player B
/// * `seed` - 32-byte randomness seed
/// * `match_index` - Index of this game
/// * `rounds` - Fixed round count, or stochastic length when absent
///
/// # Returns
/// JSON serialized TournamentResult
#[wasm_bindgen]
pub fn replay_game(
    strategy_a_json: &str,
    strategy_b_json: &str,
    seed: &[u8],
    match_index: u32,
    rounds: Option<u32>,
) -> Result<JsValue, JsError> {
    let spec_a = parse_strategy_spec(strategy_a_json)
        .map_err(|e| JsError::new(&format!("Invalid strategy A: {}", e)))?;
    let spec_b = parse_strategy_spec(strategy_b_json)
        .map_err(|e| JsError::new(&format!("Invalid strategy B: {}", e)))?;

    let seed_arr: [u8; 32] = seed.try_into()
        .map_err(|_| JsError::new("Seed must be exactly 32 bytes"))?;
    let length = GameLength::from_rounds(rounds)
        .map_err(|e| JsError::new(&e.to_string()))?;

    let mut rng = SeededRng::new(&seed_arr, match_index);
    let result = run_match(&spec_a, &spec_b, length, &mut rng);

    serde_wasm_bindgen::to_value(&result)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Get human-readable description of a strategy
#[wasm_bindgen]
pub fn get_strategy_description(strategy_json: &str) -> Result<String, JsError> {
    let spec = parse_strategy_spec(strategy_json).map_err(|e| JsError::new(&e))?;
    Ok(describe_strategy(&spec))
}

#[derive(serde::Serialize)]
struct StrategyInfo {
    id: String,
    name: String,
    description: String,
}

/// Get all built-in strategy types
#[wasm_bindgen]
pub fn get_strategy_types() -> Result<JsValue, JsError> {
    let types: Vec<StrategyInfo> = StrategyBase::ALL
        .into_iter()
        .map(|base| StrategyInfo {
            id: format!("{:?}", base),
            name: base.name().to_string(),
            description: describe_strategy(&StrategySpec::Builtin(base)),
        })
        .collect();

    serde_wasm_bindgen::to_value(&types)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Create a strategy JSON from base type
#[wasm_bindgen]
pub fn create_strategy(base: &str) -> Result<String, JsError> {
    let base = StrategyBase::from_name(base)
        .ok_or_else(|| JsError::new(&format!("Unknown strategy: {}", base)))?;

    serde_json::to_string(&StrategySpec::Builtin(base))
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Create a custom strategy JSON from a name, description and strategy text
///
/// Unrecognized text yields the always-cooperate pattern.
#[wasm_bindgen]
pub fn create_custom_strategy(name: &str, description: &str, logic: &str) -> Result<String, JsError> {
    let pattern = CachedInterpreter::new(RuleInterpreter).resolve(logic);
    let spec = StrategySpec::Custom(CustomStrategy::new(name, description, pattern).with_logic(logic));

    serde_json::to_string(&spec)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

#[derive(serde::Serialize)]
struct ValidationResult {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Validate a strategy pattern
///
/// Returns `{valid: true}` or `{valid: false, error: "..."}`.
/// Never throws; validation errors are returned as structured data.
#[wasm_bindgen]
pub fn validate_pattern(pattern_json: &str) -> JsValue {
    let result = match StrategyPattern::from_json(pattern_json) {
        Ok(_) => ValidationResult { valid: true, error: None },
        Err(e) => ValidationResult { valid: false, error: Some(e.to_string()) },
    };
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

/// Get the strategy template catalog
#[wasm_bindgen]
pub fn get_templates() -> Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(&templates::all())
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

#[derive(serde::Serialize)]
struct RoundStats {
    max_rounds: u32,
    end_probability: f64,
    avg_rounds: f64,
}

/// Get the stochastic stopping rule and its expected game length
#[wasm_bindgen]
pub fn get_round_stats() -> Result<JsValue, JsError> {
    let config = RoundConfig::standard();
    let stats = RoundStats {
        max_rounds: config.max_rounds,
        end_probability: config.end_probability,
        avg_rounds: config.expected_rounds(),
    };

    serde_wasm_bindgen::to_value(&stats)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}
