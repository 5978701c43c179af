//! Configuration for ledger history

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// History configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// RocksDB configuration
    pub rocksdb: RocksDBConfig,

    /// Write fan-out configuration
    pub writes: WriteConfig,

    /// Read configuration
    pub reads: ReadConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/history"),
            service_name: "ledger-history".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            rocksdb: RocksDBConfig::default(),
            writes: WriteConfig::default(),
            reads: ReadConfig::default(),
        }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RocksDBConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Target file size (MB)
    pub target_file_size_mb: u64,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,

    /// Level 0 file num compaction trigger
    pub level0_file_num_compaction_trigger: i32,

    /// Enable statistics
    pub enable_statistics: bool,
}

impl Default for RocksDBConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_write_buffer_number: 4,
            target_file_size_mb: 64,
            max_background_jobs: 4,
            level0_file_num_compaction_trigger: 4,
            enable_statistics: false,
        }
    }
}

/// Write fan-out configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteConfig {
    /// Per-table batches in flight at once; `None` dispatches every table
    pub max_concurrent_tables: Option<usize>,
}

/// Read configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadConfig {
    /// Page limit for time-range queries that set none
    pub default_scan_limit: Option<usize>,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            default_scan_limit: Some(200),
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse TOML
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("HISTORY_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(limit) = std::env::var("HISTORY_MAX_CONCURRENT_TABLES") {
            config.writes.max_concurrent_tables = Some(parse_env("HISTORY_MAX_CONCURRENT_TABLES", &limit)?);
        }

        if let Ok(limit) = std::env::var("HISTORY_SCAN_LIMIT") {
            config.reads.default_scan_limit = Some(parse_env("HISTORY_SCAN_LIMIT", &limit)?);
        }

        Ok(config)
    }
}

fn parse_env(name: &str, value: &str) -> crate::Result<usize> {
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(crate::Error::Config(format!(
            "{} must be a positive integer, got {:?}",
            name, value
        ))),
    }
}
