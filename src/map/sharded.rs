use crate::cluster::registry::{NodeEntry, Registry};
use crate::cluster::router::routing_key;
use crate::error::{Result, ShardError, TransportError};
use crate::node::transport::{NodeTransport, TransportResult};

use futures::future::join_all;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

/// One logical map spread over every node of a registry.
///
/// Each field lives on the node chosen by hashing `field + "_" + hash_key`;
/// on that node it is stored in the hash-field-space named `hash_key`.
/// Operations touching one field go to one node, whole-map operations go to
/// all nodes concurrently and merge the answers.
#[derive(Clone, Debug)]
pub struct ShardedMap {
    hash_key: String,
    registry: Registry,
}

impl ShardedMap {
    pub fn new(hash_key: &str, registry: Registry) -> Self {
        Self {
            hash_key: hash_key.to_string(),
            registry,
        }
    }

    pub fn hash_key(&self) -> &str {
        &self.hash_key
    }

    /// Registry entry owning `field`.
    pub fn node_for(&self, field: &str) -> &NodeEntry {
        let index = self
            .registry
            .router()
            .index_for(&routing_key(field, &self.hash_key));
        // Router and registry are built from the same entry list.
        &self.registry.all_nodes()[index]
    }

    /// Total number of fields across all nodes.
    pub async fn size(&self) -> Result<usize> {
        let space = self.hash_key.as_str();
        let counts = self
            .scatter(|node| async move { node.hash_field_count(space).await })
            .await?;

        let mut total: usize = 0;
        for (entry, count) in self.registry.all_nodes().iter().zip(counts) {
            total = usize::try_from(count)
                .ok()
                .and_then(|count| total.checked_add(count))
                .ok_or_else(|| ShardError::CountOverflow {
                    node: entry.addr().clone(),
                })?;
        }
        Ok(total)
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.size().await? == 0)
    }

    pub async fn contains_field(&self, field: &str) -> Result<bool> {
        let entry = self.node_for(field);
        entry
            .transport()
            .field_exists(&self.hash_key, field)
            .await
            .map_err(|e| ShardError::remote(entry.addr(), e))
    }

    /// Linear scan of every node's values.
    pub async fn contains_value(&self, value: &str) -> Result<bool> {
        let space = self.hash_key.as_str();
        let per_node = self
            .scatter(|node| async move { node.get_all_values(space).await })
            .await?;
        Ok(per_node.iter().flatten().any(|v| v == value))
    }

    /// `None` when the field is absent; an empty string is a present value.
    pub async fn get(&self, field: &str) -> Result<Option<String>> {
        let entry = self.node_for(field);
        tracing::debug!("GET {}/{} -> {}", self.hash_key, field, entry.addr());
        entry
            .transport()
            .get_field(&self.hash_key, field)
            .await
            .map_err(|e| ShardError::remote(entry.addr(), e))
    }

    /// Sets `field` and returns the value it held just before, read and
    /// written in one transaction on the owning node.
    pub async fn put(&self, field: &str, value: &str) -> Result<Option<String>> {
        let entry = self.node_for(field);
        tracing::debug!("PUT {}/{} -> {}", self.hash_key, field, entry.addr());
        entry
            .transport()
            .atomic_read_then_set(&self.hash_key, field, value)
            .await
            .map_err(|e| ShardError::remote(entry.addr(), e))
    }

    /// Deletes `field` and returns the value it held. Routed exactly like
    /// `get` and `put`.
    pub async fn remove(&self, field: &str) -> Result<Option<String>> {
        let entry = self.node_for(field);
        tracing::debug!("REMOVE {}/{} -> {}", self.hash_key, field, entry.addr());
        entry
            .transport()
            .atomic_read_then_delete(&self.hash_key, field)
            .await
            .map_err(|e| ShardError::remote(entry.addr(), e))
    }

    /// Writes all `entries`, one batch per owning node, batches in parallel.
    ///
    /// Each node applies its batch on its own; there is no cross-node
    /// atomicity. If any batch fails the error lists which nodes applied
    /// theirs and which did not, so the caller can retry just the missing
    /// part.
    pub async fn put_all<I>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let groups = self
            .registry
            .router()
            .group_by_index(entries, |(field, _)| routing_key(field, &self.hash_key));
        if groups.is_empty() {
            return Ok(());
        }

        let space = self.hash_key.as_str();
        let nodes = self.registry.all_nodes();
        let batches = groups.into_iter().map(|(index, batch)| {
            let entry = &nodes[index];
            async move {
                tracing::debug!(
                    "PUT_ALL {} field(s) of {} -> {}",
                    batch.len(),
                    space,
                    entry.addr()
                );
                (entry, entry.transport().batch_set(space, batch).await)
            }
        });

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for (entry, outcome) in join_all(batches).await {
            match outcome {
                Ok(()) => succeeded.push(entry.addr().clone()),
                Err(e) => failed.push((entry.addr().clone(), e)),
            }
        }

        if failed.is_empty() {
            return Ok(());
        }
        tracing::warn!(
            "PUT_ALL on {}: {} node batch(es) failed, {} applied",
            self.hash_key,
            failed.len(),
            succeeded.len()
        );
        Err(ShardError::PartialBatch { succeeded, failed })
    }

    /// Drops this logical map on every node. On error, nodes that answered
    /// have already dropped their part.
    pub async fn clear(&self) -> Result<()> {
        let space = self.hash_key.as_str();
        self.scatter(|node| async move { node.delete_space(space).await })
            .await?;
        Ok(())
    }

    pub async fn keys(&self) -> Result<HashSet<String>> {
        let space = self.hash_key.as_str();
        let per_node = self
            .scatter(|node| async move { node.get_all_fields(space).await })
            .await?;
        Ok(per_node.into_iter().flatten().collect())
    }

    /// Distinct values; two fields holding the same value count once.
    pub async fn values(&self) -> Result<HashSet<String>> {
        let space = self.hash_key.as_str();
        let per_node = self
            .scatter(|node| async move { node.get_all_values(space).await })
            .await?;
        Ok(per_node.into_iter().flatten().collect())
    }

    pub async fn entries(&self) -> Result<HashSet<(String, String)>> {
        let space = self.hash_key.as_str();
        let per_node = self
            .scatter(|node| async move { node.get_all_entries(space).await })
            .await?;
        Ok(per_node.into_iter().flatten().collect())
    }

    /// Runs `call` against every node at once and returns the answers in
    /// registry order. The first failure in registry order is returned; any
    /// other failures are logged.
    async fn scatter<'a, T, F, Fut>(&'a self, call: F) -> Result<Vec<T>>
    where
        F: Fn(&'a Arc<dyn NodeTransport>) -> Fut,
        Fut: Future<Output = TransportResult<T>> + 'a,
    {
        let nodes = self.registry.all_nodes();
        let outcomes = join_all(nodes.iter().map(|entry| call(entry.transport()))).await;

        let mut values = Vec::with_capacity(nodes.len());
        let mut first_error: Option<(&NodeEntry, TransportError)> = None;

        for (entry, outcome) in nodes.iter().zip(outcomes) {
            match outcome {
                Ok(value) => values.push(value),
                Err(e) if first_error.is_none() => first_error = Some((entry, e)),
                Err(e) => {
                    tracing::warn!(
                        "Fan-out on {}: node {} also failed: {}",
                        self.hash_key,
                        entry.addr(),
                        e
                    );
                }
            }
        }

        match first_error {
            Some((entry, e)) => {
                tracing::warn!("Fan-out on {}: node {} failed: {}", self.hash_key, entry.addr(), e);
                Err(ShardError::remote(entry.addr(), e))
            }
            None => Ok(values),
        }
    }
}
