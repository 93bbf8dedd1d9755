//! Persistent arena state

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use dilemma_logic::{CustomStrategy, PatternCache, StatsStore, StrategyBase, StrategySpec};
use serde::{Deserialize, Serialize};

/// Data file used when neither `--data` nor `DILEMMA_DATA` is given
pub const DEFAULT_DATA_PATH: &str = "dilemma_arena.json";

/// Everything the arena remembers between runs
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArenaState {
    /// Game history and per-strategy performance
    #[serde(default)]
    pub stats: StatsStore,
    /// Registered custom strategies, in registration order
    #[serde(default)]
    pub custom_strategies: Vec<CustomStrategy>,
    /// Interpreted strategy text, keyed by normalized text
    #[serde(default)]
    pub pattern_cache: PatternCache,
}

impl ArenaState {
    /// Load state from `path`; a missing file is an empty arena
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text)
                .with_context(|| format!("parsing arena data {}", path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("no arena data at {}, starting fresh", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("reading arena data {}", path.display())),
        }
    }

    /// Write state to `path` through a temporary file
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).context("serializing arena data")?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, text).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
        log::debug!("saved arena data to {}", path.display());
        Ok(())
    }

    /// Built-ins followed by custom strategies
    pub fn roster(&self) -> Vec<StrategySpec> {
        StrategySpec::builtins()
            .into_iter()
            .chain(self.custom_strategies.iter().cloned().map(StrategySpec::Custom))
            .collect()
    }

    /// Find a strategy by name, ignoring case
    pub fn find(&self, name: &str) -> Option<StrategySpec> {
        if let Some(base) = StrategyBase::from_name(name) {
            return Some(StrategySpec::Builtin(base));
        }
        self.custom_position(name)
            .map(|i| StrategySpec::Custom(self.custom_strategies[i].clone()))
    }

    pub fn custom_position(&self, name: &str) -> Option<usize> {
        let wanted = name.trim();
        self.custom_strategies
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(wanted))
    }
}
