use super::hasher::hash;
use crate::error::{Result, ShardError};
use std::collections::BTreeMap;

/// Routing string for a field of the logical map `hash_key`.
///
/// The map name takes part in the hash, so the same field name in two
/// logical maps may live on different nodes.
pub fn routing_key(field: &str, hash_key: &str) -> String {
    format!("{}_{}", field, hash_key)
}

/// Maps routing strings to node indexes over a fixed node count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Router {
    node_count: usize,
}

impl Router {
    pub fn new(node_count: usize) -> Result<Self> {
        if node_count == 0 {
            return Err(ShardError::Configuration(
                "cannot route over zero nodes".into(),
            ));
        }
        Ok(Self { node_count })
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Index in `[0, node_count)` of the node owning `key`.
    pub fn index_for(&self, key: &str) -> usize {
        hash(key) as usize % self.node_count
    }

    /// Buckets `items` by owning node. Items keep their relative order inside
    /// each bucket; only non-empty buckets are present.
    pub fn group_by_index<T, I, F>(&self, items: I, routing_string_of: F) -> BTreeMap<usize, Vec<T>>
    where
        I: IntoIterator<Item = T>,
        F: Fn(&T) -> String,
    {
        let mut groups: BTreeMap<usize, Vec<T>> = BTreeMap::new();
        for item in items {
            let index = self.index_for(&routing_string_of(&item));
            groups.entry(index).or_default().push(item);
        }
        groups
    }
}
