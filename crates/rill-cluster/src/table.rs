//! NodeTable — in-memory table of known cluster members.

use std::sync::Arc;

use dashmap::DashMap;

use crate::{ClusterError, NodeHealth, ServerNode};

/// Live bookkeeping for one cluster member.
#[derive(Debug, Clone)]
pub struct NodeEntry {
    pub node: ServerNode,
    pub health: NodeHealth,
    /// Unix timestamp (milliseconds) of the last successful heartbeat.
    pub last_seen_ms: u64,
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

// ─────────────────────────────────────────────
// NodeTable
// ─────────────────────────────────────────────

/// Thread-safe table of every known cluster member.
///
/// The table is the single in-process source of membership state: server
/// startup registers the local node and any seeds, the heartbeat task calls
/// [`NodeTable::touch`], and failed peer probes call
/// [`NodeTable::mark_health`].
///
/// Cloning the table is cheap — it shares the same underlying `DashMap`
/// via `Arc`.
#[derive(Clone, Debug)]
pub struct NodeTable {
    entries: Arc<DashMap<u32, NodeEntry>>,
    /// Id of this process — kept so consumers can distinguish self.
    local_id: u32,
}

impl NodeTable {
    /// Create a new, empty table for this node.
    pub fn new(local_id: u32) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            local_id,
        }
    }

    // ── Registration ─────────────────────────────────────────

    /// Register or fully replace a member entry, marked healthy as of now.
    pub fn register(&self, node: ServerNode) {
        let id = node.id;
        self.entries.insert(
            id,
            NodeEntry {
                node,
                health: NodeHealth::Healthy,
                last_seen_ms: now_ms(),
            },
        );
    }

    /// Remove a member from the table entirely.
    pub fn remove(&self, id: u32) -> Option<ServerNode> {
        self.entries.remove(&id).map(|(_, e)| e.node)
    }

    // ── Health updates ───────────────────────────────────────

    /// Refresh `last_seen_ms` on a successful heartbeat and mark healthy.
    pub fn touch(&self, id: u32) -> Result<(), ClusterError> {
        match self.entries.get_mut(&id) {
            Some(mut entry) => {
                entry.health = NodeHealth::Healthy;
                entry.last_seen_ms = now_ms();
                Ok(())
            }
            None => Err(ClusterError::NodeNotFound(id)),
        }
    }

    /// Update the health of a specific member.
    pub fn mark_health(&self, id: u32, health: NodeHealth) -> Result<(), ClusterError> {
        match self.entries.get_mut(&id) {
            Some(mut entry) => {
                entry.health = health;
                Ok(())
            }
            None => Err(ClusterError::NodeNotFound(id)),
        }
    }

    // ── Queries ──────────────────────────────────────────────

    /// Snapshot of a single member (cloned).
    pub fn get(&self, id: u32) -> Option<NodeEntry> {
        self.entries.get(&id).map(|r| r.clone())
    }

    /// Snapshot of all members (cloned), sorted by id for stability.
    pub fn all_entries(&self) -> Vec<NodeEntry> {
        let mut entries: Vec<NodeEntry> = self.entries.iter().map(|r| r.clone()).collect();
        entries.sort_by_key(|e| e.node.id);
        entries
    }

    /// All healthy members, sorted by id.
    pub fn healthy_nodes(&self) -> Vec<ServerNode> {
        self.all_entries()
            .into_iter()
            .filter(|e| e.health == NodeHealth::Healthy)
            .map(|e| e.node)
            .collect()
    }

    /// Total member count (including local, including unhealthy).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The id this table considers its local identity.
    pub fn local_id(&self) -> u32 {
        self.local_id
    }
}
