//! Turning strategy text into a [`StrategyPattern`].
//!
//! The [`Interpreter`] trait is the seam for whatever produces patterns
//! from free-form text. [`CachedInterpreter`] wraps one with an explicit
//! [`PatternCache`] and guarantees a usable pattern: any failure resolves
//! to `simple{cooperate}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pattern::{Condition, PatternError, SimpleAction, StrategyPattern};

#[derive(Debug, Error)]
pub enum InterpretError {
    #[error("strategy text is empty")]
    Empty,
    #[error("could not interpret strategy `{0}`")]
    Unrecognized(String),
    #[error("invalid pattern: {0}")]
    Pattern(#[from] PatternError),
    #[error("interpretation service failed: {0}")]
    Service(String),
}

/// Produces a pattern from strategy text
pub trait Interpreter {
    fn interpret(&mut self, text: &str) -> Result<StrategyPattern, InterpretError>;
}

/// Cache key for strategy text: trimmed and lowercased
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Interpreted patterns keyed by normalized text
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternCache {
    entries: BTreeMap<String, StrategyPattern>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, text: &str) -> Option<&StrategyPattern> {
        self.entries.get(&normalize(text))
    }

    pub fn insert(&mut self, text: &str, pattern: StrategyPattern) {
        self.entries.insert(normalize(text), pattern);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// An interpreter behind a cache, with the cooperate fallback
#[derive(Clone, Debug, Default)]
pub struct CachedInterpreter<I> {
    interpreter: I,
    cache: PatternCache,
}

impl<I: Interpreter> CachedInterpreter<I> {
    pub fn new(interpreter: I) -> Self {
        Self::with_cache(interpreter, PatternCache::default())
    }

    pub fn with_cache(interpreter: I, cache: PatternCache) -> Self {
        Self { interpreter, cache }
    }

    /// Resolve text to a pattern; never fails.
    ///
    /// Cache hits are returned as-is. Otherwise the text is interpreted and
    /// validated; successes are cached, failures yield the default pattern
    /// and are not cached.
    pub fn resolve(&mut self, text: &str) -> StrategyPattern {
        if let Some(cached) = self.cache.get(text) {
            log::debug!("using cached interpretation for '{}'", text.trim());
            return cached.clone();
        }

        let key = normalize(text);
        log::info!("interpreting new strategy '{}'", key);
        let interpreted = self
            .interpreter
            .interpret(&key)
            .and_then(|pattern| pattern.validate().map(|()| pattern).map_err(InterpretError::from));

        match interpreted {
            Ok(pattern) => {
                self.cache.insert(&key, pattern.clone());
                pattern
            }
            Err(e) => {
                log::warn!("falling back to cooperation for '{}': {}", key, e);
                StrategyPattern::default()
            }
        }
    }

    pub fn cache(&self) -> &PatternCache {
        &self.cache
    }

    pub fn interpreter(&self) -> &I {
        &self.interpreter
    }

    pub fn into_cache(self) -> PatternCache {
        self.cache
    }
}

/// Treats the text as an interpreter response in the pattern JSON shape
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonInterpreter;

impl Interpreter for JsonInterpreter {
    fn interpret(&mut self, text: &str) -> Result<StrategyPattern, InterpretError> {
        if text.trim().is_empty() {
            return Err(InterpretError::Empty);
        }
        Ok(StrategyPattern::from_json(text)?)
    }
}

/// Keyword rules for hand-written strategy text.
///
/// Understands phrases such as "always defect", "random",
/// "cooperate 10 moves then defect 10 moves",
/// "cooperate first 3 moves then copy opponent" and "tit for tat".
/// Numbers may be digits or words up to ninety.
#[derive(Clone, Copy, Debug, Default)]
pub struct RuleInterpreter;

impl Interpreter for RuleInterpreter {
    fn interpret(&mut self, text: &str) -> Result<StrategyPattern, InterpretError> {
        let text = normalize(text);
        let tokens: Vec<&str> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.is_empty() {
            return Err(InterpretError::Empty);
        }

        let copies = contains_any(&tokens, &["copy", "copies", "copying", "mirror", "mirrors"])
            || text.contains("tit for tat")
            || text.contains("same as opponent");
        let cooperate_count = count_after(&tokens, "cooperat");
        let defect_count = count_after(&tokens, "defect");

        if !copies {
            if let (Some(cooperate_count), Some(defect_count)) = (cooperate_count, defect_count) {
                let pattern = StrategyPattern::Sequence { cooperate_count, defect_count };
                pattern.validate()?;
                return Ok(pattern);
            }
            if tokens.iter().any(|t| t.starts_with("alternat")) {
                return Ok(StrategyPattern::Sequence { cooperate_count: 1, defect_count: 1 });
            }
        }

        if copies {
            return Ok(StrategyPattern::Conditional {
                condition: Condition::LastOpponentMove,
                initial_cooperation: cooperate_count.unwrap_or(0),
            });
        }

        if tokens.iter().any(|t| t.starts_with("random")) {
            return Ok(StrategyPattern::Simple { action: SimpleAction::Random });
        }

        // "never cooperate" asks for defection and "don't defect" for cooperation
        let wants_defect = mentions(&tokens, "defect", false) || mentions(&tokens, "cooperat", true);
        let wants_cooperate = mentions(&tokens, "cooperat", false) || mentions(&tokens, "defect", true);
        match (wants_cooperate, wants_defect) {
            (false, true) => Ok(StrategyPattern::Simple { action: SimpleAction::Defect }),
            (true, false) => Ok(StrategyPattern::Simple { action: SimpleAction::Cooperate }),
            _ => Err(InterpretError::Unrecognized(text)),
        }
    }
}

fn contains_any(tokens: &[&str], words: &[&str]) -> bool {
    tokens.iter().any(|t| words.contains(t))
}

const NEGATIONS: [&str; 7] = ["never", "not", "no", "dont", "don", "doesn", "won"];

/// Whether a word starting with `stem` occurs with the given polarity.
/// A negation in either of the two preceding tokens flips it, which also
/// covers "don't" split into "don" and "t".
fn mentions(tokens: &[&str], stem: &str, negated: bool) -> bool {
    tokens.iter().enumerate().any(|(i, t)| {
        t.starts_with(stem) && tokens[i.saturating_sub(2)..i].iter().any(|p| NEGATIONS.contains(p)) == negated
    })
}

/// First number within three tokens after a word starting with `stem`
fn count_after(tokens: &[&str], stem: &str) -> Option<u32> {
    let start = tokens.iter().position(|t| t.starts_with(stem))?;
    tokens[start + 1..]
        .iter()
        .take(3)
        .find_map(|t| parse_number(t))
}

fn parse_number(token: &str) -> Option<u32> {
    if let Ok(n) = token.parse() {
        return Some(n);
    }
    const WORDS: [&str; 21] = [
        "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
        "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
        "nineteen", "twenty",
    ];
    const TENS: [(&str, u32); 7] = [
        ("thirty", 30),
        ("forty", 40),
        ("fifty", 50),
        ("sixty", 60),
        ("seventy", 70),
        ("eighty", 80),
        ("ninety", 90),
    ];
    WORDS
        .iter()
        .position(|w| *w == token)
        .map(|n| n as u32)
        .or_else(|| TENS.iter().find(|(w, _)| *w == token).map(|(_, n)| *n))
}
