//! Strategy definitions and execution

use serde::{Deserialize, Serialize};
use crate::pattern::{PatternStrategy, StrategyPattern};
use crate::random::SeededRng;

/// A move in the Prisoner's Dilemma
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Cooperate,
    Defect,
}

impl Move {
    pub fn is_cooperate(self) -> bool {
        self == Move::Cooperate
    }
}

impl From<bool> for Move {
    fn from(cooperate: bool) -> Self {
        if cooperate {
            Move::Cooperate
        } else {
            Move::Defect
        }
    }
}

impl From<Move> for bool {
    fn from(m: Move) -> Self {
        m.is_cooperate()
    }
}

/// Own and observed moves, one entry per round played
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct History {
    own: Vec<Move>,
    opponent: Vec<Move>,
}

impl History {
    pub fn push(&mut self, own: Move, opponent: Move) {
        self.own.push(own);
        self.opponent.push(opponent);
    }

    pub fn own(&self) -> &[Move] {
        &self.own
    }

    pub fn opponent(&self) -> &[Move] {
        &self.opponent
    }

    pub fn len(&self) -> usize {
        self.own.len()
    }

    pub fn is_empty(&self) -> bool {
        self.own.is_empty()
    }
}

/// Fraction of `moves` that were cooperation, `None` before the first round
pub fn cooperation_rate(moves: &[Move]) -> Option<f64> {
    if moves.is_empty() {
        return None;
    }
    let cooperations = moves.iter().filter(|m| m.is_cooperate()).count();
    Some(cooperations as f64 / moves.len() as f64)
}

/// A decision-maker playing one side of a game.
///
/// `make_choice` must not look at or modify the histories beyond reading
/// them; they change only through `update_history`, which the game calls
/// once per round after both sides have committed.
pub trait Strategy {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Choose this round's move from the history as it stood before the round
    fn make_choice(&mut self, rng: &mut SeededRng) -> Move;

    /// Record the round's outcome
    fn update_history(&mut self, own: Move, opponent: Move);

    fn history(&self) -> &[Move];

    fn opponent_history(&self) -> &[Move];
}

macro_rules! builtin_strategy {
    ($ty:ident, $name:literal, $desc:literal) => {
        #[derive(Clone, Debug, Default)]
        pub struct $ty {
            history: History,
        }

        impl $ty {
            pub fn new() -> Self {
                Self::default()
            }
        }

        impl Strategy for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn description(&self) -> &str {
                $desc
            }

            fn make_choice(&mut self, rng: &mut SeededRng) -> Move {
                self.decide(rng)
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
    };
}

builtin_strategy!(
    TitForTat,
    "Tit for Tat",
    "Cooperates on first move, then copies opponent's last move"
);
builtin_strategy!(AlwaysCooperate, "Always Cooperate", "Always chooses to cooperate");
builtin_strategy!(AlwaysDefect, "Always Defect", "Always chooses to defect");
builtin_strategy!(RandomStrategy, "Random", "Randomly chooses to cooperate or defect");

impl TitForTat {
    fn decide(&self, _rng: &mut SeededRng) -> Move {
        self.history.opponent().last().copied().unwrap_or(Move::Cooperate)
    }
}

impl AlwaysCooperate {
    fn decide(&self, _rng: &mut SeededRng) -> Move {
        Move::Cooperate
    }
}

impl AlwaysDefect {
    fn decide(&self, _rng: &mut SeededRng) -> Move {
        Move::Defect
    }
}

impl RandomStrategy {
    fn decide(&self, rng: &mut SeededRng) -> Move {
        Move::from(rng.next_bool())
    }
}

/// Base strategy type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyBase {
    /// Copy opponent's last move. Start with cooperate.
    TitForTat,
    /// Always cooperate, never defect.
    AlwaysCooperate,
    /// Always defect, never cooperate.
    AlwaysDefect,
    /// Random choice each round.
    Random,
}

impl StrategyBase {
    pub const ALL: [StrategyBase; 4] = [
        StrategyBase::TitForTat,
        StrategyBase::AlwaysCooperate,
        StrategyBase::AlwaysDefect,
        StrategyBase::Random,
    ];

    /// Display name, as reported by the spawned strategy
    pub fn name(self) -> &'static str {
        match self {
            StrategyBase::TitForTat => "Tit for Tat",
            StrategyBase::AlwaysCooperate => "Always Cooperate",
            StrategyBase::AlwaysDefect => "Always Defect",
            StrategyBase::Random => "Random",
        }
    }

    /// Look up a built-in by display name or identifier, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim();
        Self::ALL.into_iter().find(|base| {
            base.name().eq_ignore_ascii_case(wanted)
                || format!("{:?}", base).eq_ignore_ascii_case(wanted)
        })
    }

    pub fn spawn(self) -> Box<dyn Strategy> {
        match self {
            StrategyBase::TitForTat => Box::new(TitForTat::new()),
            StrategyBase::AlwaysCooperate => Box::new(AlwaysCooperate::new()),
            StrategyBase::AlwaysDefect => Box::new(AlwaysDefect::new()),
            StrategyBase::Random => Box::new(RandomStrategy::new()),
        }
    }
}

/// A user-defined strategy: identity plus the pattern it plays.
///
/// `logic` keeps the text the pattern was interpreted from, if any.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomStrategy {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logic: Option<String>,
    #[serde(default)]
    pub pattern: StrategyPattern,
}

impl CustomStrategy {
    pub fn new(name: impl Into<String>, description: impl Into<String>, pattern: StrategyPattern) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            logic: None,
            pattern,
        }
    }

    pub fn with_logic(mut self, logic: impl Into<String>) -> Self {
        self.logic = Some(logic.into());
        self
    }
}

/// Recipe for a strategy; spawn a fresh instance for every game
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategySpec {
    Builtin(StrategyBase),
    Custom(CustomStrategy),
}

impl StrategySpec {
    pub fn name(&self) -> &str {
        match self {
            StrategySpec::Builtin(base) => base.name(),
            StrategySpec::Custom(custom) => &custom.name,
        }
    }

    pub fn spawn(&self) -> Box<dyn Strategy> {
        match self {
            StrategySpec::Builtin(base) => base.spawn(),
            StrategySpec::Custom(custom) => Box::new(PatternStrategy::new(
                custom.name.clone(),
                custom.description.clone(),
                custom.pattern.clone(),
            )),
        }
    }

    /// The four built-in strategies, in catalog order
    pub fn builtins() -> Vec<StrategySpec> {
        StrategyBase::ALL.into_iter().map(StrategySpec::Builtin).collect()
    }
}

impl From<StrategyBase> for StrategySpec {
    fn from(base: StrategyBase) -> Self {
        StrategySpec::Builtin(base)
    }
}

impl From<CustomStrategy> for StrategySpec {
    fn from(custom: CustomStrategy) -> Self {
        StrategySpec::Custom(custom)
    }
}

/// Get a human-readable description of a strategy
pub fn describe_strategy(spec: &StrategySpec) -> String {
    match spec {
        StrategySpec::Builtin(_) => spec.spawn().description().to_string(),
        StrategySpec::Custom(custom) => {
            let mut desc = custom.description.clone();
            if !desc.is_empty() && !desc.ends_with('.') {
                desc.push('.');
            }
            if !desc.is_empty() {
                desc.push(' ');
            }
            desc.push_str(&custom.pattern.summary());
            desc
        }
    }
}
