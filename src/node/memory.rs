use super::transport::{NodeConnector, NodeTransport, TransportResult};
use super::types::NodeAddr;
use crate::error::TransportError;

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// In-process store node.
///
/// Keeps every hash-field-space in a `DashMap` keyed by space name. Meant for
/// tests and for embedding the map in a single process; `set_available(false)`
/// makes every call fail as if the node had gone away.
pub struct MemoryNode {
    addr: NodeAddr,
    spaces: DashMap<String, DashMap<String, String>>,
    available: AtomicBool,
    calls: AtomicU64,
}

impl MemoryNode {
    pub fn new(addr: NodeAddr) -> Self {
        Self {
            addr,
            spaces: DashMap::new(),
            available: AtomicBool::new(true),
            calls: AtomicU64::new(0),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of transport calls served so far, failed ones included.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Fields stored in `space` on this node, without going through the
    /// transport (no availability check, not counted).
    pub fn local_entry_count(&self, space: &str) -> usize {
        self.spaces.get(space).map(|map| map.len()).unwrap_or(0)
    }

    pub fn local_get(&self, space: &str, field: &str) -> Option<String> {
        let map = self.spaces.get(space)?;
        let value = map.get(field)?.clone();
        Some(value)
    }

    fn check(&self) -> TransportResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(TransportError::Unavailable {
                addr: self.addr.clone(),
            })
        }
    }

    fn collect<T>(&self, space: &str, f: impl Fn(&String, &String) -> T) -> Vec<T> {
        let Some(map) = self.spaces.get(space) else {
            return Vec::new();
        };
        map.iter().map(|entry| f(entry.key(), entry.value())).collect()
    }
}

#[async_trait]
impl NodeTransport for MemoryNode {
    fn addr(&self) -> &NodeAddr {
        &self.addr
    }

    async fn hash_field_count(&self, space: &str) -> TransportResult<u64> {
        self.check()?;
        Ok(self.local_entry_count(space) as u64)
    }

    async fn field_exists(&self, space: &str, field: &str) -> TransportResult<bool> {
        self.check()?;
        Ok(self
            .spaces
            .get(space)
            .map(|map| map.contains_key(field))
            .unwrap_or(false))
    }

    async fn get_field(&self, space: &str, field: &str) -> TransportResult<Option<String>> {
        self.check()?;
        Ok(self.local_get(space, field))
    }

    async fn get_all_values(&self, space: &str) -> TransportResult<Vec<String>> {
        self.check()?;
        Ok(self.collect(space, |_, value| value.clone()))
    }

    async fn get_all_fields(&self, space: &str) -> TransportResult<Vec<String>> {
        self.check()?;
        Ok(self.collect(space, |field, _| field.clone()))
    }

    async fn get_all_entries(&self, space: &str) -> TransportResult<Vec<(String, String)>> {
        self.check()?;
        Ok(self.collect(space, |field, value| (field.clone(), value.clone())))
    }

    async fn delete_space(&self, space: &str) -> TransportResult<()> {
        self.check()?;
        self.spaces.remove(space);
        Ok(())
    }

    async fn atomic_read_then_set(
        &self,
        space: &str,
        field: &str,
        value: &str,
    ) -> TransportResult<Option<String>> {
        self.check()?;
        // The outer entry guard is held across the insert, so no other call
        // can observe or replace the space in between.
        let space_map = self.spaces.entry(space.to_string()).or_default();
        Ok(space_map.insert(field.to_string(), value.to_string()))
    }

    async fn atomic_read_then_delete(
        &self,
        space: &str,
        field: &str,
    ) -> TransportResult<Option<String>> {
        self.check()?;
        let Some(space_map) = self.spaces.get_mut(space) else {
            return Ok(None);
        };
        let prev = space_map.remove(field).map(|(_, value)| value);
        let now_empty = space_map.is_empty();
        drop(space_map);

        // Like Redis, a space whose last field is gone stops existing.
        if now_empty {
            self.spaces.remove_if(space, |_, map| map.is_empty());
        }
        Ok(prev)
    }

    async fn batch_set(&self, space: &str, entries: Vec<(String, String)>) -> TransportResult<()> {
        self.check()?;
        if entries.is_empty() {
            return Ok(());
        }
        let space_map = self.spaces.entry(space.to_string()).or_default();
        for (field, value) in entries {
            space_map.insert(field, value);
        }
        Ok(())
    }
}

/// Connector handing out `MemoryNode`s, remembering each one by address so a
/// test can reach a node directly (inspect it, take it offline).
#[derive(Default)]
pub struct MemoryConnector {
    nodes: DashMap<NodeAddr, Arc<MemoryNode>>,
}

impl MemoryConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn node(&self, addr: &NodeAddr) -> Option<Arc<MemoryNode>> {
        self.nodes.get(addr).map(|node| node.value().clone())
    }

    pub fn connected_count(&self) -> usize {
        self.nodes.len()
    }
}

impl NodeConnector for MemoryConnector {
    fn connect(&self, addr: &NodeAddr) -> TransportResult<Arc<dyn NodeTransport>> {
        let node: Arc<dyn NodeTransport> = self
            .nodes
            .entry(addr.clone())
            .or_insert_with(|| Arc::new(MemoryNode::new(addr.clone())))
            .value()
            .clone();
        Ok(node)
    }
}
