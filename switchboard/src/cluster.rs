//! Cluster collaborator interface.
//!
//! The clustering backend is an external collaborator; the runtime only
//! consumes its lookup surface. Implementations live with the backend, not
//! here — tests use a trivial in-memory one.

use crate::error::ClusterError;
use async_trait::async_trait;

/// A member node of the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterNode {
    /// Stable node identifier.
    pub id: String,

    /// Network address of the node.
    pub address: String,
}

impl ClusterNode {
    /// Describe a node.
    pub fn new(id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
        }
    }
}

/// Lookup operations the cluster backend provides.
#[async_trait]
pub trait ClusterDelegate: Send + Sync {
    /// Find a node by its identifier.
    async fn lookup_node_by_id(&self, id: &str) -> Result<Option<ClusterNode>, ClusterError>;

    /// List all known nodes.
    async fn list_nodes(&self) -> Result<Vec<ClusterNode>, ClusterError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct InMemoryCluster {
        nodes: HashMap<String, ClusterNode>,
    }

    impl InMemoryCluster {
        fn new(nodes: Vec<ClusterNode>) -> Self {
            Self {
                nodes: nodes.into_iter().map(|n| (n.id.clone(), n)).collect(),
            }
        }
    }

    #[async_trait]
    impl ClusterDelegate for InMemoryCluster {
        async fn lookup_node_by_id(
            &self,
            id: &str,
        ) -> Result<Option<ClusterNode>, ClusterError> {
            Ok(self.nodes.get(id).cloned())
        }

        async fn list_nodes(&self) -> Result<Vec<ClusterNode>, ClusterError> {
            Ok(self.nodes.values().cloned().collect())
        }
    }

    #[tokio::test]
    async fn test_lookup_node_by_id() {
        let cluster = InMemoryCluster::new(vec![
            ClusterNode::new("n1", "10.0.0.1:5000"),
            ClusterNode::new("n2", "10.0.0.2:5000"),
        ]);

        let node = cluster.lookup_node_by_id("n1").await.unwrap();
        assert_eq!(node, Some(ClusterNode::new("n1", "10.0.0.1:5000")));

        let missing = cluster.lookup_node_by_id("n9").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_list_nodes() {
        let cluster = InMemoryCluster::new(vec![ClusterNode::new("n1", "10.0.0.1:5000")]);
        assert_eq!(cluster.list_nodes().await.unwrap().len(), 1);
    }
}
