//! Placement records — the durable binding of a resource to its owner.

use serde::{Deserialize, Serialize};

use rill_cluster::ServerNode;

/// Stream placement record.
///
/// Created exactly once, at first lookup, by whichever server wins the
/// assignment race; never mutated afterward. A stream's owner is fixed for
/// its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerContext {
    pub stream_name: String,
    /// Owning node as it was at assignment time. Not revised on node loss.
    pub node: ServerNode,
}

/// Subscription placement record.
///
/// Mirrors [`ProducerContext`] but stores only the owning node id; the
/// address is resolved through the `nodes/` reverse-lookup namespace at
/// read time. Created only when the subscription definition already exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionContext {
    pub subscription_id: String,
    pub node_id: u32,
}
