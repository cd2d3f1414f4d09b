use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::runtime::collation::CaseSense;

pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Runtime settings. Every field has a default, so a config file may name
/// only the fields it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Mode for `=`, `!=` and ordering comparisons of strings.
    pub case_sense: CaseSense,
    pub max_call_depth: usize,
    /// Emit a `trace` event per executed instruction.
    pub trace: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            case_sense: CaseSense::Insensitive,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            trace: false,
        }
    }
}

impl RuntimeConfig {
    pub fn with_case_sense(mut self, case_sense: CaseSense) -> Self {
        self.case_sense = case_sense;
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json(&source)
    }
}
