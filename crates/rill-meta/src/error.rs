//! Error taxonomy for the placement subsystem.
//!
//! [`MetaError`] covers faults of the durable store itself; store faults are
//! surfaced to the caller, never retried here (retries belong to the
//! client-side failover router). [`PlacementError`] is the full set of
//! domain errors a lookup can produce — the gRPC layer translates each
//! variant to a status in exactly one place.
//!
//! A lost creation race is deliberately NOT in this taxonomy: it is a
//! success-path signal modeled by [`CreateOutcome`](crate::CreateOutcome).

use thiserror::Error;

use rill_cluster::ClusterError;

/// Fault of the durable coordination store.
#[derive(Debug, Error)]
pub enum MetaError {
    #[error("coordination store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt record at '{key}': {reason}")]
    Corrupt { key: String, reason: String },

    #[error("record missing at '{0}' after a lost creation race")]
    Missing(String),
}

/// Domain errors of the lookup-and-assign protocol.
#[derive(Debug, Error)]
pub enum PlacementError {
    /// The node ranking was empty — no live node exists to assign.
    #[error("no available server node to assign")]
    NoAvailableNode,

    /// The subscription id is unknown to the subscription-definition store.
    #[error("subscription '{0}' does not exist")]
    SubscriptionNotFound(String),

    /// A placement record references a node id with no reverse-lookup entry.
    #[error("node {0} recorded in placement but not registered")]
    NodeNotFound(u32),

    #[error("ranking provider failed: {0}")]
    Ranking(#[from] ClusterError),

    #[error(transparent)]
    Meta(#[from] MetaError),
}
