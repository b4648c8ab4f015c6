use serde::{Deserialize, Serialize};
use std::fmt;

/// Network identity of one store node.
///
/// Two registrations with the same host and port are the same node; the
/// `host:port` rendering is what the partition hash is computed from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeAddr {
    pub host: String,
    pub port: u16,
}

impl NodeAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `redis://host:port/` form understood by the Redis client. IPv6 hosts
    /// are bracketed there; `Display` keeps the bare host since the
    /// partition hash is computed from it.
    pub fn redis_url(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("redis://[{}]:{}/", self.host, self.port)
        } else {
            format!("redis://{}:{}/", self.host, self.port)
        }
    }
}

impl fmt::Display for NodeAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
