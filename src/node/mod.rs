//! Node Transport Module
//!
//! A node is one independent key-value store instance holding named
//! hash-field-spaces (one per logical map). This module defines what the
//! routing layer needs from a node and ships two implementations.
//!
//! ## Submodules
//! - **`types`**: Node identity (`NodeAddr`).
//! - **`transport`**: The `NodeTransport` / `NodeConnector` contract.
//! - **`redis_node`**: Transport speaking the Redis protocol (HLEN, HGET, MULTI/EXEC, ...).
//! - **`memory`**: In-process transport backed by `DashMap`, with fault injection.

pub mod memory;
pub mod redis_node;
pub mod transport;
pub mod types;
