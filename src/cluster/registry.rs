use super::hasher::hash;
use super::router::Router;
use crate::config::{ClusterConfig, DEFAULT_PORT};
use crate::error::{Result, ShardError};
use crate::map::sharded::ShardedMap;
use crate::node::redis_node::{RedisConnector, RedisOptions};
use crate::node::transport::{NodeConnector, NodeTransport};
use crate::node::types::NodeAddr;

use std::fmt;
use std::sync::Arc;

/// One registered node: its partition hash, address and handle.
#[derive(Clone)]
pub struct NodeEntry {
    partition_hash: u32,
    addr: NodeAddr,
    transport: Arc<dyn NodeTransport>,
}

impl NodeEntry {
    /// Hash of `host:port`. Orders the registry; plays no part in routing.
    pub fn partition_hash(&self) -> u32 {
        self.partition_hash
    }

    pub fn addr(&self) -> &NodeAddr {
        &self.addr
    }

    pub fn transport(&self) -> &Arc<dyn NodeTransport> {
        &self.transport
    }
}

impl fmt::Debug for NodeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeEntry")
            .field("partition_hash", &self.partition_hash)
            .field("addr", &self.addr)
            .finish()
    }
}

/// Collects nodes before the registry is frozen.
///
/// Adding an address whose partition hash is already present is a no-op and
/// does not open a second connection.
pub struct RegistryBuilder {
    connector: Arc<dyn NodeConnector>,
    default_port: u16,
    entries: Vec<NodeEntry>,
}

impl RegistryBuilder {
    /// Builder connecting to Redis nodes with default options.
    pub fn new() -> Self {
        Self::with_connector(Arc::new(RedisConnector::default()))
    }

    pub fn with_connector(connector: Arc<dyn NodeConnector>) -> Self {
        Self {
            connector,
            default_port: DEFAULT_PORT,
            entries: Vec::new(),
        }
    }

    /// Builder for Redis nodes with every node listed in `config` added.
    pub fn from_config(config: &ClusterConfig) -> Result<Self> {
        let connector = Arc::new(RedisConnector::new(RedisOptions::from(config)));
        Self::from_config_with_connector(config, connector)
    }

    pub fn from_config_with_connector(
        config: &ClusterConfig,
        connector: Arc<dyn NodeConnector>,
    ) -> Result<Self> {
        config.validate()?;
        let mut builder = Self::with_connector(connector);
        builder.default_port = config.default_port;

        for node in &config.nodes {
            let port = node.port.unwrap_or(config.default_port);
            builder = builder.add_node_at(&node.host, port)?;
        }
        Ok(builder)
    }

    /// Adds `host` on the default port (6379 unless configured otherwise).
    pub fn add_node(self, host: &str) -> Result<Self> {
        let port = self.default_port;
        self.add_node_at(host, port)
    }

    pub fn add_node_at(mut self, host: &str, port: u16) -> Result<Self> {
        let host = host.trim();
        if host.is_empty() {
            return Err(ShardError::Configuration("node host must not be empty".into()));
        }
        if port == 0 {
            return Err(ShardError::Configuration(format!(
                "invalid port 0 for node {}",
                host
            )));
        }

        let addr = NodeAddr::new(host, port);
        let partition_hash = hash(&addr.to_string());

        if self
            .entries
            .iter()
            .any(|entry| entry.partition_hash == partition_hash)
        {
            tracing::debug!("Node {} already registered, ignoring", addr);
            return Ok(self);
        }

        let transport = self.connector.connect(&addr).map_err(|e| {
            ShardError::Configuration(format!("cannot create handle for {}: {}", addr, e))
        })?;

        tracing::info!("Registered node {} (partition hash {})", addr, partition_hash);
        self.entries.push(NodeEntry {
            partition_hash,
            addr,
            transport,
        });
        self.entries.sort_by_key(|entry| entry.partition_hash);

        Ok(self)
    }

    /// Freezes the node list. Fails on an empty list.
    pub fn build(self) -> Result<Registry> {
        let router = Router::new(self.entries.len())?;

        tracing::info!(
            "Cluster registry built with {} node(s): {}",
            self.entries.len(),
            self.entries
                .iter()
                .map(|entry| entry.addr.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Registry {
            entries: self.entries.into(),
            router,
        })
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Frozen node list, ordered by ascending partition hash.
///
/// Cloning is cheap and every clone sees the same nodes.
#[derive(Clone, Debug)]
pub struct Registry {
    entries: Arc<[NodeEntry]>,
    router: Router,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn node_count(&self) -> usize {
        self.entries.len()
    }

    /// Entry at `index` in partition-hash order.
    pub fn node_at(&self, index: usize) -> Option<&NodeEntry> {
        self.entries.get(index)
    }

    pub fn all_nodes(&self) -> &[NodeEntry] {
        &self.entries
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// View of the logical map `hash_key` over these nodes.
    pub fn map_named(&self, hash_key: &str) -> ShardedMap {
        ShardedMap::new(hash_key, self.clone())
    }
}
