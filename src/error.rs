//! Error types for the sharded map layer.
//!
//! Two levels are kept apart: `TransportError` is what a single node handle
//! reports, `ShardError` is what callers of the map see, always carrying the
//! identity of the node that failed.

use crate::node::types::NodeAddr;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by one node transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("node {addr} did not answer within {after:?}")]
    Timeout { addr: NodeAddr, after: Duration },

    #[error("node {addr} is unavailable")]
    Unavailable { addr: NodeAddr },
}

#[derive(Debug, Error)]
pub enum ShardError {
    /// Empty registry, bad host/port or an unusable configuration file.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("remote store {node} failed: {source}")]
    RemoteStore {
        node: NodeAddr,
        #[source]
        source: TransportError,
    },

    /// Some per-node batches of a `put_all` were applied, others were not.
    #[error(
        "batch write failed on {} node(s) [{}], applied on [{}]",
        .failed.len(),
        join_failed(.failed),
        join_addrs(.succeeded)
    )]
    PartialBatch {
        succeeded: Vec<NodeAddr>,
        failed: Vec<(NodeAddr, TransportError)>,
    },

    #[error("field count reported by {node} overflows the map size")]
    CountOverflow { node: NodeAddr },
}

impl ShardError {
    pub(crate) fn remote(node: &NodeAddr, source: TransportError) -> Self {
        Self::RemoteStore {
            node: node.clone(),
            source,
        }
    }

    /// Nodes whose batch failed, in registry order. Empty for other variants.
    pub fn failed_nodes(&self) -> Vec<&NodeAddr> {
        match self {
            Self::PartialBatch { failed, .. } => failed.iter().map(|(addr, _)| addr).collect(),
            _ => Vec::new(),
        }
    }
}

fn join_addrs(addrs: &[NodeAddr]) -> String {
    addrs
        .iter()
        .map(|addr| addr.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_failed(failed: &[(NodeAddr, TransportError)]) -> String {
    failed
        .iter()
        .map(|(addr, e)| format!("{}: {}", addr, e))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, ShardError>;
