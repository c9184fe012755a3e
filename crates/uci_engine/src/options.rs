//! Engine configuration, loaded from an optional TOML file at startup.
//!
//! ```toml
//! hash_mb = 128
//! move_overhead_ms = 100
//! max_time_s = 20
//!
//! [evaluation.modifiers]
//! tempo = 12
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use chess_core::TimeSettings;
use classical_engine::{EvaluationWeights, WeightsConfig, DEFAULT_HASH_MB, MAX_HASH_MB, MIN_HASH_MB};
use serde::Deserialize;

pub const DEFAULT_MOVE_OVERHEAD_MS: u64 = 200;
pub const MIN_MOVE_OVERHEAD_MS: u64 = 1;
pub const MAX_MOVE_OVERHEAD_MS: u64 = 1000;

pub const DEFAULT_MAX_TIME_S: u64 = 30;
pub const MIN_MAX_TIME_S: u64 = 2;
pub const MAX_MAX_TIME_S: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOptions {
    pub hash_mb: usize,
    pub move_overhead_ms: u64,
    pub max_time_s: u64,
    pub evaluation: WeightsConfig,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            hash_mb: DEFAULT_HASH_MB,
            move_overhead_ms: DEFAULT_MOVE_OVERHEAD_MS,
            max_time_s: DEFAULT_MAX_TIME_S,
            evaluation: WeightsConfig::default(),
        }
    }
}

impl EngineOptions {
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        let options: Self = toml::from_str(text).context("parsing engine options")?;
        Ok(options.clamped())
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text =
            std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("in config {}", path.display()))
    }

    /// Pull every numeric option into the range advertised by `uci`.
    pub fn clamped(mut self) -> Self {
        self.hash_mb = self.hash_mb.clamp(MIN_HASH_MB, MAX_HASH_MB);
        self.move_overhead_ms = self.move_overhead_ms.clamp(MIN_MOVE_OVERHEAD_MS, MAX_MOVE_OVERHEAD_MS);
        self.max_time_s = self.max_time_s.clamp(MIN_MAX_TIME_S, MAX_MAX_TIME_S);
        self
    }

    pub fn weights(&self) -> anyhow::Result<EvaluationWeights> {
        EvaluationWeights::try_from_config(self.evaluation).context("invalid evaluation weights")
    }

    pub fn time_settings(&self) -> TimeSettings {
        TimeSettings {
            move_overhead: Duration::from_millis(self.move_overhead_ms),
            max_time: Duration::from_secs(self.max_time_s),
        }
    }
}

#[cfg(test)]
#[path = "options_tests.rs"]
mod options_tests;
