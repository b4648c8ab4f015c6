//! Cluster Module Tests
//!
//! Validates node registration and the routing function.
//!
//! ## Test Scopes
//! - **Registry**: Deduplication, hash ordering, fail-fast configuration errors.
//! - **Router**: Index range, stability, per-node grouping for batch writes.

#[cfg(test)]
mod tests {
    use crate::cluster::hasher::hash;
    use crate::cluster::registry::RegistryBuilder;
    use crate::cluster::router::{Router, routing_key};
    use crate::config::{ClusterConfig, NodeSpec};
    use crate::error::ShardError;
    use crate::node::memory::MemoryConnector;
    use crate::node::types::NodeAddr;
    use std::sync::Arc;

    fn memory_builder() -> (RegistryBuilder, Arc<MemoryConnector>) {
        let connector = MemoryConnector::new();
        (RegistryBuilder::with_connector(connector.clone()), connector)
    }

    // ============================================================
    // REGISTRY TESTS
    // ============================================================

    #[test]
    fn test_duplicate_node_registered_once() {
        let (builder, connector) = memory_builder();
        let registry = builder
            .add_node_at("10.0.0.1", 6379)
            .unwrap()
            .add_node_at("10.0.0.1", 6379)
            .unwrap()
            .add_node("10.0.0.1") // default port, same node again
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(registry.node_count(), 1);
        assert_eq!(connector.connected_count(), 1);
    }

    #[test]
    fn test_same_host_other_port_is_another_node() {
        let (builder, _) = memory_builder();
        let registry = builder
            .add_node_at("10.0.0.1", 6379)
            .unwrap()
            .add_node_at("10.0.0.1", 6380)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(registry.node_count(), 2);
    }

    #[test]
    fn test_nodes_sorted_by_partition_hash() {
        let (builder, _) = memory_builder();
        let registry = builder
            .add_node("10.0.0.1")
            .unwrap()
            .add_node("10.0.0.2")
            .unwrap()
            .add_node("10.0.0.3")
            .unwrap()
            .build()
            .unwrap();

        // hash("10.0.0.2:6379") = 3116 < hash("10.0.0.3:6379") = 17585 < hash("10.0.0.1:6379") = 44728
        let order: Vec<String> = registry
            .all_nodes()
            .iter()
            .map(|entry| entry.addr().to_string())
            .collect();
        assert_eq!(order, vec!["10.0.0.2:6379", "10.0.0.3:6379", "10.0.0.1:6379"]);

        let hashes: Vec<u32> = registry
            .all_nodes()
            .iter()
            .map(|entry| entry.partition_hash())
            .collect();
        assert!(hashes.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(hashes[0], hash("10.0.0.2:6379"));

        assert_eq!(registry.node_at(0).unwrap().addr(), &NodeAddr::new("10.0.0.2", 6379));
        assert!(registry.node_at(3).is_none());
    }

    #[test]
    fn test_empty_registry_rejected() {
        let (builder, _) = memory_builder();
        assert!(matches!(builder.build(), Err(ShardError::Configuration(_))));
    }

    #[test]
    fn test_invalid_host_or_port_rejected() {
        let (builder, _) = memory_builder();
        assert!(matches!(
            builder.add_node("  "),
            Err(ShardError::Configuration(_))
        ));

        let (builder, _) = memory_builder();
        assert!(matches!(
            builder.add_node_at("10.0.0.1", 0),
            Err(ShardError::Configuration(_))
        ));
    }

    #[test]
    fn test_from_config_applies_default_port() {
        let config = ClusterConfig {
            default_port: 7000,
            nodes: vec![
                NodeSpec {
                    host: "10.0.0.1".into(),
                    port: None,
                },
                NodeSpec {
                    host: "10.0.0.2".into(),
                    port: Some(7001),
                },
            ],
            ..ClusterConfig::default()
        };
        let connector = MemoryConnector::new();

        let registry = RegistryBuilder::from_config_with_connector(&config, connector.clone())
            .unwrap()
            .add_node("10.0.0.3")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(registry.node_count(), 3);
        assert!(connector.node(&NodeAddr::new("10.0.0.1", 7000)).is_some());
        assert!(connector.node(&NodeAddr::new("10.0.0.2", 7001)).is_some());
        assert!(connector.node(&NodeAddr::new("10.0.0.3", 7000)).is_some());
    }

    #[test]
    fn test_map_named_keeps_name() {
        let (builder, _) = memory_builder();
        let registry = builder.add_node("localhost").unwrap().build().unwrap();

        let map = registry.map_named("books");
        assert_eq!(map.hash_key(), "books");
    }

    // ============================================================
    // ROUTER TESTS
    // ============================================================

    #[test]
    fn test_index_within_range() {
        for node_count in 1..=7 {
            let router = Router::new(node_count).unwrap();
            for i in 0..1000 {
                let index = router.index_for(&routing_key(&format!("field{}", i), "key"));
                assert!(index < node_count, "{} >= {}", index, node_count);
            }
        }
    }

    #[test]
    fn test_index_is_stable() {
        let router = Router::new(3).unwrap();
        for i in 0..100 {
            let key = routing_key(&format!("field{}", i), "key");
            let first = router.index_for(&key);
            for _ in 0..10 {
                assert_eq!(router.index_for(&key), first);
            }
            assert_eq!(first, hash(&key) as usize % 3);
        }
    }

    #[test]
    fn test_index_spreads_keys() {
        let router = Router::new(4).unwrap();
        let mut counts = [0usize; 4];
        for i in 0..2000 {
            counts[router.index_for(&routing_key(&format!("field{}", i), "key"))] += 1;
        }
        assert!(counts.iter().all(|&c| c > 300), "{:?}", counts);
    }

    #[test]
    fn test_group_by_index_covers_all_and_keeps_order() {
        let router = Router::new(3).unwrap();
        let fields: Vec<String> = (0..200).map(|i| format!("field{}", i)).collect();

        let groups = router.group_by_index(fields.clone(), |field| routing_key(field, "key"));

        let total: usize = groups.values().map(Vec::len).sum();
        assert_eq!(total, fields.len());

        for (index, group) in &groups {
            assert!(!group.is_empty());
            for field in group {
                assert_eq!(router.index_for(&routing_key(field, "key")), *index);
            }
            // Relative order inside a group follows the input order.
            let positions: Vec<usize> = group
                .iter()
                .map(|field| fields.iter().position(|f| f == field).unwrap())
                .collect();
            assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
