//! NodeRanking — provider of the ordered best-first node list.
//!
//! Placement always takes the first element of the ranking; the order is an
//! opaque total preference computed by the provider. [`TableRanking`] is the
//! in-process implementation backed by a [`NodeTable`]; a remote provider
//! would answer over the internal `GetNodesRanking` RPC instead.

use async_trait::async_trait;

use crate::{ClusterError, NodeTable, ServerNode};

/// Source of the ordered list of live server nodes, best candidate first.
///
/// An empty ranking is a valid answer (no live node exists); callers decide
/// how to surface it.
#[async_trait]
pub trait NodeRanking: Send + Sync {
    async fn nodes_ranking(&self) -> Result<Vec<ServerNode>, ClusterError>;
}

// ─────────────────────────────────────────────
// TableRanking
// ─────────────────────────────────────────────

/// Ranking backed by the local [`NodeTable`]: healthy members ordered by
/// ascending node id.
///
/// The id order is deliberately simple and deterministic; smarter policies
/// (load, locality) slot in behind the same trait without touching any
/// consumer.
#[derive(Clone, Debug)]
pub struct TableRanking {
    table: NodeTable,
}

impl TableRanking {
    pub fn new(table: NodeTable) -> Self {
        Self { table }
    }
}

#[async_trait]
impl NodeRanking for TableRanking {
    async fn nodes_ranking(&self) -> Result<Vec<ServerNode>, ClusterError> {
        Ok(self.table.healthy_nodes())
    }
}
