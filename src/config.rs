//! Runtime configuration: engines, broadcasting, and display.

use std::path::{Path};
use std::sync::{Arc};

use serde::{Deserialize, Serialize};

use super::{EngineKind, EngineRef, Error, Fill, ProcessEngine, Result, SerialEngine, ThreadEngine};

/// Global configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which engine tabularized calls use.
    pub engine: EngineConfig,
    /// How plain arguments are broadcast.
    pub broadcast: BroadcastConfig,
    /// How tables are rendered.
    pub display: DisplayConfig,
}

impl Config {
    /// Parse a JSON document. Missing fields take their defaults.
    ///
    /// ```
    /// use ntable::{Config, EngineKind, Fill};
    /// let config = Config::from_json(r#"{"engine": {"kind": "thread", "workers": 4}, "broadcast": {"fill": "full"}}"#).unwrap();
    /// assert_eq!(config.engine.kind, EngineKind::Thread);
    /// assert_eq!(config.broadcast.fill, Fill::Full);
    /// assert_eq!(config.display.max_rows, 125);
    /// ```
    pub fn from_json(text: &str) -> Result<Self> { Ok(serde_json::from_str(text)?) }

    /// Read and parse a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "loaded configuration");
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String> { Ok(serde_json::to_string_pretty(self)?) }
}

/// Engine selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub kind: EngineKind,
    /// Workers for the thread and process engines.
    pub workers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: EngineKind::Serial,
            workers: rayon::current_num_threads(),
        }
    }
}

impl EngineConfig {
    /// Construct the configured engine.
    pub fn build(&self) -> Result<EngineRef> {
        Ok(match self.kind {
            EngineKind::Serial => Arc::new(SerialEngine),
            EngineKind::Thread => Arc::new(ThreadEngine::new(self.workers)),
            EngineKind::Process => Arc::new(ProcessEngine::new(self.workers)),
            EngineKind::Custom => return Err(Error::engine("a custom engine cannot be built from configuration")),
        })
    }
}

/// Broadcasting policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastConfig {
    /// How plain arguments of tabularized calls become tables.
    pub fill: Fill,
}

/// Pagination thresholds and truncation rules for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// The first dimension is cut when longer than this...
    pub max_rows: usize,
    /// ...to this many labels at each end.
    pub row_edge: usize,
    pub max_cols: usize,
    pub col_edge: usize,
    /// Dimensions beyond the second, each rendered as pages.
    pub max_other: usize,
    pub other_edge: usize,
    /// Strings at least this long are shortened.
    pub max_str: usize,
    pub str_edge: usize,
    /// Lists and tuples at least this long are shortened.
    pub max_seq: usize,
    pub seq_edge: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_rows: 125,
            row_edge: 50,
            max_cols: 25,
            col_edge: 10,
            max_other: 13,
            other_edge: 5,
            max_str: 15,
            str_edge: 5,
            max_seq: 5,
            seq_edge: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip() {
        let config = Config::default();
        assert_eq!(Config::from_json(&config.to_json().unwrap()).unwrap(), config);
        assert_eq!(Config::from_json("{}").unwrap(), config);
        assert_eq!(config.engine.build().unwrap().kind(), EngineKind::Serial);
    }

    #[test]
    fn building_engines() {
        let config = Config::from_json(r#"{"engine": {"kind": "process", "workers": 3}}"#).unwrap();
        let engine = config.engine.build().unwrap();
        assert_eq!(engine.kind(), EngineKind::Process);
        assert_eq!(engine.workers(), 3);
        let custom = EngineConfig {kind: EngineKind::Custom, workers: 1};
        assert!(matches!(custom.build(), Err(Error::Engine(_))));
        assert!(matches!(Config::from_json("{"), Err(Error::Json(_))));
        assert!(matches!(Config::from_path("/nonexistent/ntable.json"), Err(Error::Io(_))));
    }
}
