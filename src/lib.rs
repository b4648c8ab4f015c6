//! Sharded Key-Value Map Library
//!
//! Presents one logical string map on top of a fixed set of independent
//! key-value store nodes. Fields are spread over the nodes by hash; whole-map
//! operations query every node and merge the answers.
//!
//! ## Architecture Modules
//! - **`cluster`**: The hash function, the frozen node registry and the router
//!   deciding which node owns a field.
//! - **`map`**: `ShardedMap`, the caller-facing map. Single-field operations go to
//!   one node, whole-map operations fan out to all of them concurrently.
//! - **`node`**: The transport contract a store node must satisfy, with a Redis
//!   implementation and an in-process one.
//! - **`config`**: Cluster configuration (node list, timeouts, connection retries).
//! - **`error`**: Error taxonomy separating configuration problems, remote
//!   failures and partially applied batches.
//!
//! ```no_run
//! # async fn demo() -> shard_cluster::error::Result<()> {
//! use shard_cluster::cluster::registry::RegistryBuilder;
//!
//! let registry = RegistryBuilder::new()
//!     .add_node("10.0.0.1")?
//!     .add_node_at("10.0.0.2", 6380)?
//!     .build()?;
//!
//! let books = registry.map_named("books");
//! let previous = books.put("isbn-1", "Dune").await?;
//! assert_eq!(previous, None);
//! # Ok(())
//! # }
//! ```

pub mod cluster;
pub mod config;
pub mod error;
pub mod map;
pub mod node;
