//! Node Transport Contract
//!
//! Everything the routing layer asks of a single store node. Each method
//! addresses one hash-field-space (`space`) on that node. Implementations own
//! their retry and deadline policy; the routing layer never retries.

use super::types::NodeAddr;
use crate::error::TransportError;

use async_trait::async_trait;
use std::sync::Arc;

/// Result type returned by every transport call.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Handle to one remote store node.
///
/// Implementations must be safe to share across tasks (`Send + Sync`); a
/// transport that cannot guarantee this internally has to serialize access
/// itself.
#[async_trait]
pub trait NodeTransport: Send + Sync {
    fn addr(&self) -> &NodeAddr;

    /// Number of fields in `space` (0 when the space does not exist).
    async fn hash_field_count(&self, space: &str) -> TransportResult<u64>;

    async fn field_exists(&self, space: &str, field: &str) -> TransportResult<bool>;

    async fn get_field(&self, space: &str, field: &str) -> TransportResult<Option<String>>;

    async fn get_all_values(&self, space: &str) -> TransportResult<Vec<String>>;

    async fn get_all_fields(&self, space: &str) -> TransportResult<Vec<String>>;

    async fn get_all_entries(&self, space: &str) -> TransportResult<Vec<(String, String)>>;

    /// Drops the whole space.
    async fn delete_space(&self, space: &str) -> TransportResult<()>;

    /// Reads the current value of `field` and sets it to `value` as one
    /// indivisible step on this node. Returns the value read.
    async fn atomic_read_then_set(
        &self,
        space: &str,
        field: &str,
        value: &str,
    ) -> TransportResult<Option<String>>;

    /// Reads the current value of `field` and deletes it as one indivisible
    /// step on this node. Returns the value read.
    async fn atomic_read_then_delete(
        &self,
        space: &str,
        field: &str,
    ) -> TransportResult<Option<String>>;

    /// Applies all `entries` to `space` as one batch on this node.
    async fn batch_set(&self, space: &str, entries: Vec<(String, String)>) -> TransportResult<()>;
}

/// Produces node handles for the registry builder.
///
/// Called once per distinct node address; duplicates never reach it.
pub trait NodeConnector: Send + Sync {
    fn connect(&self, addr: &NodeAddr) -> TransportResult<Arc<dyn NodeTransport>>;
}
