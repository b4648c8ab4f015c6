//! Cluster configuration.
//!
//! Describes which store nodes form the cluster and how node handles connect
//! to them. Loaded from JSON; every field has a default so a partial file is
//! enough.

use crate::error::{Result, ShardError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Port used by `RegistryBuilder::add_node` when none is given.
pub const DEFAULT_PORT: u16 = 6379;

/// One node entry in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub host: String,
    /// Falls back to `ClusterConfig::default_port`.
    #[serde(default)]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub default_port: u16,
    /// Timeout for establishing one connection attempt (ms).
    pub connect_timeout_ms: u64,
    /// Deadline applied to every command sent to a node (ms).
    pub response_timeout_ms: u64,
    /// Connection attempts before a node is reported unreachable.
    pub connect_attempts: usize,
    pub nodes: Vec<NodeSpec>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            default_port: DEFAULT_PORT,
            connect_timeout_ms: 2000,
            response_timeout_ms: 5000,
            connect_attempts: 3,
            nodes: Vec::new(),
        }
    }
}

impl ClusterConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ShardError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: ClusterConfig = serde_json::from_str(raw)
            .map_err(|e| ShardError::Configuration(format!("invalid cluster config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_port == 0 {
            return Err(ShardError::Configuration("default_port must be > 0".into()));
        }
        if self.connect_attempts == 0 {
            return Err(ShardError::Configuration(
                "connect_attempts must be at least 1".into(),
            ));
        }
        if self.connect_timeout_ms == 0 || self.response_timeout_ms == 0 {
            return Err(ShardError::Configuration("timeouts must be > 0".into()));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}
