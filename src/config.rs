//! Pool construction options.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::planner::Strategy;

/// Pool construction options (spec §6): worker count, queue capacity,
/// planning strategy, and the per-job timeout.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Fixed worker count; must be > 0.
    pub max_current_jobs: usize,
    /// Bounded queue capacity; must be > 0.
    pub max_queued_jobs: usize,
    /// The planning strategy used to expand a `Check` into jobs.
    pub strategy: Strategy,
    /// Per-job timeout.
    pub check_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_current_jobs: 4,
            max_queued_jobs: 64,
            strategy: Strategy::DocumentPerCategory,
            check_timeout: Duration::from_secs(5),
        }
    }
}

impl PoolConfig {
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::default()
    }

    /// Load from a TOML document shaped like [`PoolConfigFile`].
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        let file: PoolConfigFile = toml::from_str(s)?;
        Ok(file.into())
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigLoadError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigLoadError::Io)?;
        Self::from_toml_str(&contents).map_err(ConfigLoadError::Parse)
    }
}

/// Error loading a `PoolConfig` from disk.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    Io(std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(toml::de::Error),
}

/// The serde-facing shape of a TOML config file; kept separate from
/// `PoolConfig` so the wire/file representation (strings for the strategy,
/// milliseconds for the timeout) can evolve independently of the in-memory
/// type, mirroring the teacher's config module convention.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct PoolConfigFile {
    #[serde(default = "default_max_current_jobs")]
    max_current_jobs: usize,
    #[serde(default = "default_max_queued_jobs")]
    max_queued_jobs: usize,
    #[serde(default)]
    strategy: StrategyFile,
    #[serde(default = "default_check_timeout_ms")]
    check_timeout_ms: u64,
}

fn default_max_current_jobs() -> usize {
    PoolConfig::default().max_current_jobs
}
fn default_max_queued_jobs() -> usize {
    PoolConfig::default().max_queued_jobs
}
fn default_check_timeout_ms() -> u64 {
    PoolConfig::default().check_timeout.as_millis() as u64
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum StrategyFile {
    #[default]
    DocumentPerCategory,
    BlockLevel,
}

impl From<PoolConfigFile> for PoolConfig {
    fn from(file: PoolConfigFile) -> Self {
        Self {
            max_current_jobs: file.max_current_jobs,
            max_queued_jobs: file.max_queued_jobs,
            strategy: match file.strategy {
                StrategyFile::DocumentPerCategory => Strategy::DocumentPerCategory,
                StrategyFile::BlockLevel => Strategy::BlockLevel,
            },
            check_timeout: Duration::from_millis(file.check_timeout_ms),
        }
    }
}

/// Fluent builder mirroring the teacher's config construction style.
#[derive(Debug, Default)]
pub struct PoolConfigBuilder {
    inner: Option<PoolConfig>,
}

impl PoolConfigBuilder {
    fn base(&mut self) -> &mut PoolConfig {
        self.inner.get_or_insert_with(PoolConfig::default)
    }

    pub fn max_current_jobs(mut self, n: usize) -> Self {
        self.base().max_current_jobs = n;
        self
    }

    pub fn max_queued_jobs(mut self, n: usize) -> Self {
        self.base().max_queued_jobs = n;
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.base().strategy = strategy;
        self
    }

    pub fn check_timeout(mut self, duration: Duration) -> Self {
        self.base().check_timeout = duration;
        self
    }

    pub fn build(self) -> PoolConfig {
        self.inner.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = PoolConfig::builder()
            .max_current_jobs(8)
            .max_queued_jobs(256)
            .strategy(Strategy::BlockLevel)
            .check_timeout(Duration::from_millis(250))
            .build();
        assert_eq!(config.max_current_jobs, 8);
        assert_eq!(config.max_queued_jobs, 256);
        assert_eq!(config.strategy, Strategy::BlockLevel);
        assert_eq!(config.check_timeout, Duration::from_millis(250));
    }

    #[test]
    fn toml_round_trip() {
        let toml = r#"
            max-current-jobs = 2
            max-queued-jobs = 10
            strategy = "block-level"
            check-timeout-ms = 500
        "#;
        let config = PoolConfig::from_toml_str(toml).expect("valid toml");
        assert_eq!(config.max_current_jobs, 2);
        assert_eq!(config.max_queued_jobs, 10);
        assert_eq!(config.strategy, Strategy::BlockLevel);
        assert_eq!(config.check_timeout, Duration::from_millis(500));
    }
}
