//! Pattern-driven strategies.
//!
//! A [`StrategyPattern`] is the structured form of a strategy rule. It is
//! produced once, by an interpreter or by hand, and then played by a
//! [`PatternStrategy`]. Playing a pattern never fails: anything the
//! strategy cannot make sense of falls back to Cooperate.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::random::SeededRng;
use crate::strategy::{History, Move, Strategy};

/// Condition a conditional pattern reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    LastOpponentMove,
}

/// Fixed action of a simple pattern
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimpleAction {
    Cooperate,
    Defect,
    Random,
}

/// Structured strategy rule.
///
/// Serialized as `{"type": "sequence", "pattern": {"cooperate_count": 5, "defect_count": 5}}`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "pattern", rename_all = "lowercase")]
pub enum StrategyPattern {
    /// `cooperate_count` cooperations then `defect_count` defections, repeating
    Sequence {
        #[serde(deserialize_with = "deserialize_count")]
        cooperate_count: u32,
        #[serde(deserialize_with = "deserialize_count")]
        defect_count: u32,
    },
    /// Cooperate for `initial_cooperation` moves, then react to `condition`
    Conditional {
        condition: Condition,
        #[serde(default, deserialize_with = "deserialize_count")]
        initial_cooperation: u32,
    },
    Simple { action: SimpleAction },
}

impl Default for StrategyPattern {
    fn default() -> Self {
        StrategyPattern::Simple { action: SimpleAction::Cooperate }
    }
}

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("unknown pattern type `{0}`")]
    UnknownType(String),
    #[error("unsupported conditional pattern `{0}`")]
    UnsupportedCondition(String),
    #[error("unsupported simple action `{0}`")]
    UnsupportedAction(String),
    #[error("sequence counts must be positive (got {cooperate_count} cooperate, {defect_count} defect)")]
    ZeroCount { cooperate_count: u32, defect_count: u32 },
    #[error("malformed pattern: {0}")]
    Json(#[from] serde_json::Error),
}

impl StrategyPattern {
    /// Parse and validate an interpreter response.
    ///
    /// Accepts counts given as numeric strings. Unknown simple actions and
    /// conditions are rejected rather than rewritten.
    pub fn from_json(json: &str) -> Result<Self, PatternError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, PatternError> {
        let kind = value
            .get("type")
            .ok_or(PatternError::MissingField("type"))?
            .as_str()
            .map(str::to_owned)
            .ok_or(PatternError::MissingField("type"))?;
        let body = value.get("pattern").ok_or(PatternError::MissingField("pattern"))?;

        match kind.as_str() {
            "sequence" => {}
            "conditional" => {
                let condition = body.get("condition").and_then(Value::as_str).unwrap_or_default();
                if condition != "last_opponent_move" {
                    return Err(PatternError::UnsupportedCondition(condition.to_string()));
                }
            }
            "simple" => {
                let action = body.get("action").and_then(Value::as_str).unwrap_or_default();
                if !matches!(action, "cooperate" | "defect" | "random") {
                    return Err(PatternError::UnsupportedAction(action.to_string()));
                }
            }
            other => return Err(PatternError::UnknownType(other.to_string())),
        }

        let pattern: StrategyPattern = serde_json::from_value(value)?;
        pattern.validate()?;
        Ok(pattern)
    }

    /// Check the invariants a producer must uphold
    pub fn validate(&self) -> Result<(), PatternError> {
        match *self {
            StrategyPattern::Sequence { cooperate_count, defect_count }
                if cooperate_count == 0 || defect_count == 0 =>
            {
                Err(PatternError::ZeroCount { cooperate_count, defect_count })
            }
            _ => Ok(()),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// One-sentence English rendering of the rule
    pub fn summary(&self) -> String {
        fn moves(n: u32) -> &'static str {
            if n == 1 { "move" } else { "moves" }
        }
        match *self {
            StrategyPattern::Sequence { cooperate_count, defect_count } => format!(
                "Cooperates {} {}, then defects {} {}, repeating.",
                cooperate_count,
                moves(cooperate_count),
                defect_count,
                moves(defect_count)
            ),
            StrategyPattern::Conditional { initial_cooperation: 0, .. } => {
                "Copies opponent's last move.".to_string()
            }
            StrategyPattern::Conditional { initial_cooperation, .. } => format!(
                "Cooperates {} {}, then copies opponent's last move.",
                initial_cooperation,
                moves(initial_cooperation)
            ),
            StrategyPattern::Simple { action: SimpleAction::Cooperate } => "Always cooperates.".to_string(),
            StrategyPattern::Simple { action: SimpleAction::Defect } => "Always defects.".to_string(),
            StrategyPattern::Simple { action: SimpleAction::Random } => {
                "Randomly cooperates or defects each round.".to_string()
            }
        }
    }
}

fn deserialize_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u32),
        Text(String),
    }

    match Count::deserialize(deserializer)? {
        Count::Number(n) => Ok(n),
        Count::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid count `{}`", s))),
    }
}

/// Strategy that plays a [`StrategyPattern`].
///
/// Keeps a move counter advanced once per `make_choice` call, so it stays
/// in lockstep with the history as long as the game calls each exactly
/// once per round.
#[derive(Clone, Debug)]
pub struct PatternStrategy {
    name: String,
    description: String,
    pattern: StrategyPattern,
    move_counter: u32,
    history: History,
}

impl PatternStrategy {
    pub fn new(name: impl Into<String>, description: impl Into<String>, pattern: StrategyPattern) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            pattern,
            move_counter: 0,
            history: History::default(),
        }
    }

    pub fn pattern(&self) -> &StrategyPattern {
        &self.pattern
    }

    pub fn move_counter(&self) -> u32 {
        self.move_counter
    }

    fn decide(&self, rng: &mut SeededRng) -> Move {
        match self.pattern {
            StrategyPattern::Sequence { cooperate_count, defect_count } => {
                let total = cooperate_count as u64 + defect_count as u64;
                if total == 0 {
                    return Move::Cooperate;
                }
                let position = self.move_counter as u64 % total;
                log::debug!(
                    "[{}] sequence position {} of {} (cooperate for {})",
                    self.name,
                    position,
                    total,
                    cooperate_count
                );
                Move::from(position < cooperate_count as u64)
            }
            StrategyPattern::Conditional { condition, initial_cooperation } => {
                if self.move_counter < initial_cooperation {
                    log::debug!(
                        "[{}] initial cooperation {} of {}",
                        self.name,
                        self.move_counter + 1,
                        initial_cooperation
                    );
                    return Move::Cooperate;
                }
                match condition {
                    Condition::LastOpponentMove => {
                        self.history.opponent().last().copied().unwrap_or(Move::Cooperate)
                    }
                }
            }
            StrategyPattern::Simple { action } => match action {
                SimpleAction::Cooperate => Move::Cooperate,
                SimpleAction::Defect => Move::Defect,
                SimpleAction::Random => Move::from(rng.next_bool()),
            },
        }
    }
}

impl Strategy for PatternStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn make_choice(&mut self, rng: &mut SeededRng) -> Move {
        let choice = self.decide(rng);
        log::debug!("[{}] move {}: {:?}", self.name, self.move_counter + 1, choice);
        self.move_counter = self.move_counter.saturating_add(1);
        choice
    }

    fn update_history(&mut self, own: Move, opponent: Move) {
        self.history.push(own, opponent);
    }

    fn history(&self) -> &[Move] {
        self.history.own()
    }

    fn opponent_history(&self) -> &[Move] {
        self.history.opponent()
    }
}
