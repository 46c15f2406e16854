//! Configuration management for the Abraham indexer

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

use crate::projector::MissingAggregatePolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    pub feed: FeedConfig,
    pub storage: StorageConfig,
    pub monitoring: MonitoringConfig,
    pub projector: ProjectorSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// JSON-lines file of decoded event envelopes, in on-chain order.
    pub events_path: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub rocksdb: RocksDbConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RocksDbConfig {
    pub path: PathBuf,
    pub enable_compression: bool,
    #[validate(range(min = 100, max = 10000))]
    pub max_open_files: i32,
    #[validate(range(min = 4, max = 2048))]
    pub write_buffer_size_mb: usize,
    #[validate(range(min = 2, max = 16))]
    pub max_write_buffer_number: i32,
    #[validate(range(min = 8, max = 4096))]
    pub block_cache_size_mb: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Port for the /metrics endpoint; 0 disables the metrics server.
    pub metrics_port: u16,
    pub log_level: String,
    pub structured_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ProjectorSettings {
    pub missing_aggregate_policy: MissingAggregatePolicy,
    #[validate(range(min = 1, max = 1000000))]
    pub progress_log_interval: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            events_path: "./data/events.jsonl".into(),
        }
    }
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: "./data/rocksdb".into(),
            enable_compression: true,
            max_open_files: 1000,
            write_buffer_size_mb: 64,
            max_write_buffer_number: 4,
            block_cache_size_mb: 256,
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            metrics_port: 9090,
            log_level: "info".to_string(),
            structured_logging: false,
        }
    }
}

impl Default for ProjectorSettings {
    fn default() -> Self {
        Self {
            missing_aggregate_policy: MissingAggregatePolicy::Skip,
            progress_log_interval: 1000,
        }
    }
}

impl IndexerConfig {
    /// Load configuration from file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Ensure required directories exist
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.storage.rocksdb.path)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.storage.rocksdb.validate()?;
        self.monitoring.validate()?;
        self.projector.validate()?;
        if self.feed.events_path.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("Event feed path cannot be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        IndexerConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_out_of_range_rocksdb_settings() {
        let mut config = IndexerConfig::default();
        config.storage.rocksdb.max_open_files = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_policy_from_toml() {
        let toml = r#"
            [feed]
            events_path = "./events.jsonl"

            [projector]
            missing_aggregate_policy = "strict"
            progress_log_interval = 500
        "#;
        let config: IndexerConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            config.projector.missing_aggregate_policy,
            MissingAggregatePolicy::Strict
        );
        assert_eq!(config.projector.progress_log_interval, 500);
    }
}
