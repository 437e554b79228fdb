//! ServerNode — identity of a single rill cluster member.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// NodeHealth
// ─────────────────────────────────────────────

/// Coarse-grained health status of a cluster member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeHealth {
    /// Node responded to the last heartbeat within the deadline.
    Healthy,
    /// Node missed its heartbeat deadline and is excluded from rankings.
    Unreachable,
}

impl std::fmt::Display for NodeHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeHealth::Healthy     => write!(f, "healthy"),
            NodeHealth::Unreachable => write!(f, "unreachable"),
        }
    }
}

// ─────────────────────────────────────────────
// ServerNode
// ─────────────────────────────────────────────

/// Identity of a single rill server process as advertised to clients.
///
/// Immutable once created: a node's id and addresses never change for the
/// lifetime of the process. Instances are produced by the ranking provider
/// or read back from the placement store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerNode {
    /// Stable numeric identifier, unique cluster-wide. Never changes.
    pub id: u32,

    /// Advertised host, e.g. `"10.0.1.42"`.
    pub host: String,

    /// Client-facing gRPC port.
    pub port: u16,

    /// Node-to-node (internal) gRPC port.
    pub internal_port: u16,
}

impl ServerNode {
    pub fn new(id: u32, host: impl Into<String>, port: u16, internal_port: u16) -> Self {
        Self {
            id,
            host: host.into(),
            port,
            internal_port,
        }
    }

    /// Client-facing address, `"host:port"`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Internal (node-to-node) address, `"host:internal_port"`.
    pub fn internal_addr(&self) -> String {
        format!("{}:{}", self.host, self.internal_port)
    }
}

impl std::fmt::Display for ServerNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node-{}@{}", self.id, self.addr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addr_formatting() {
        let n = ServerNode::new(3, "10.0.0.7", 6700, 6701);
        assert_eq!(n.addr(), "10.0.0.7:6700");
        assert_eq!(n.internal_addr(), "10.0.0.7:6701");
        assert_eq!(n.to_string(), "node-3@10.0.0.7:6700");
    }

    #[test]
    fn serde_roundtrip() {
        let n = ServerNode::new(1, "localhost", 6700, 6701);
        let json = serde_json::to_string(&n).unwrap();
        let back: ServerNode = serde_json::from_str(&json).unwrap();
        assert_eq!(n, back);
    }
}
