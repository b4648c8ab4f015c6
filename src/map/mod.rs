//! Sharded Map Module
//!
//! The caller-facing map. A `ShardedMap` is a named view over a `Registry`:
//! it holds no data, only the logical map name, and resolves every call to
//! one node (single-field operations) or to all nodes (whole-map operations).
//!
//! ## Consistency
//! - `put` / `remove` read the old value and write in one transaction on the owning node.
//! - `put_all` is atomic per node batch only; partial application is reported, never hidden.
//! - Whole-map reads are not snapshots: nodes are queried concurrently and independently.

pub mod sharded;
