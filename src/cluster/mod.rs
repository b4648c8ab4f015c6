//! Cluster Topology Module
//!
//! Decides which node owns a field. The node set is fixed once built; there is
//! no rebalancing, so adding a node changes where every future lookup goes.
//!
//! ## Core Concepts
//! - **Hashing**: `hasher::hash` maps a string to a non-negative integer, stable across processes.
//! - **Registry**: `Registry` is the frozen, hash-ordered list of node handles, built with `RegistryBuilder`.
//! - **Routing**: `Router` turns a routing string into a node index (`hash mod node_count`)
//!   and groups batch entries per node.

pub mod hasher;
pub mod registry;
pub mod router;

#[cfg(test)]
mod tests;
