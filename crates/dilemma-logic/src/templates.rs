//! Ready-made strategy descriptions to start custom strategies from.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Complexity {
    Basic,
    Intermediate,
    Advanced,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StrategyTemplate {
    pub name: &'static str,
    pub description: &'static str,
    /// Strategy text handed to the interpreter
    pub logic: &'static str,
    pub category: &'static str,
    pub complexity: Complexity,
    pub example_usage: &'static str,
}

pub fn basic() -> Vec<StrategyTemplate> {
    vec![
        StrategyTemplate {
            name: "Alternating Pattern",
            description: "Alternates between cooperation and defection in a fixed pattern",
            logic: "cooperate 10 moves then defect 10 moves",
            category: "Pattern-based",
            complexity: Complexity::Basic,
            example_usage: "Cooperates for 10 moves, then defects for 10 moves",
        },
        StrategyTemplate {
            name: "Gradual Trust Builder",
            description: "Starts cooperative and gradually becomes more cautious",
            logic: "cooperate first 3 moves then copy opponent",
            category: "Adaptive",
            complexity: Complexity::Basic,
            example_usage: "Builds initial trust through cooperation",
        },
        StrategyTemplate {
            name: "Forgiveness Strategy",
            description: "Copies opponent but occasionally forgives defection",
            logic: "copy opponent but cooperate every 3rd move",
            category: "Psychological",
            complexity: Complexity::Basic,
            example_usage: "Balance between retaliation and forgiveness",
        },
    ]
}

pub fn intermediate() -> Vec<StrategyTemplate> {
    vec![
        StrategyTemplate {
            name: "Majority Rule",
            description: "Bases decisions on opponent's most common choice",
            logic: "choose what opponent chose most often",
            category: "Statistical",
            complexity: Complexity::Intermediate,
            example_usage: "Adapts to opponent's dominant strategy",
        },
        StrategyTemplate {
            name: "Pattern Detector",
            description: "Tries to detect and exploit patterns in opponent's moves",
            logic: "detect opponent pattern and counter",
            category: "Analytical",
            complexity: Complexity::Intermediate,
            example_usage: "Good against predictable strategies",
        },
    ]
}

pub fn advanced() -> Vec<StrategyTemplate> {
    vec![
        StrategyTemplate {
            name: "Learning Algorithm",
            description: "Adjusts strategy based on success of previous moves",
            logic: "learn from past interactions and optimize",
            category: "Machine Learning",
            complexity: Complexity::Advanced,
            example_usage: "Evolves strategy throughout the game",
        },
        StrategyTemplate {
            name: "Game Theory Optimal",
            description: "Implements optimal strategy based on game theory principles",
            logic: "calculate nash equilibrium and play accordingly",
            category: "Theoretical",
            complexity: Complexity::Advanced,
            example_usage: "Maximizes expected value against rational opponents",
        },
    ]
}

pub fn all() -> Vec<StrategyTemplate> {
    let mut templates = basic();
    templates.extend(intermediate());
    templates.extend(advanced());
    templates
}

pub fn by_name(name: &str) -> Option<StrategyTemplate> {
    all().into_iter().find(|t| t.name == name)
}
