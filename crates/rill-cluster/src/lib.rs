//! # rill-cluster
//!
//! Cluster membership primitives shared by every rill component:
//!
//! - [`ServerNode`] — identity of a single rill server process
//! - [`NodeTable`] — live view of all known cluster members
//! - [`NodeRanking`] — provider of the ordered best-first node list used
//!   for new placement assignments
//!
//! ## Design principles
//!
//! - **Ranking is opaque**: consumers treat the ranking as a total
//!   preference order and always take the first element. The policy that
//!   produces the order is swappable behind the [`NodeRanking`] trait.
//! - **Membership is advisory**: the table is refreshed by heartbeats and
//!   seeds; placement records remain valid even when the recorded node
//!   later drops out of the table.

pub mod error;
pub mod node;
pub mod ranking;
pub mod table;

pub use error::ClusterError;
pub use node::{NodeHealth, ServerNode};
pub use ranking::{NodeRanking, TableRanking};
pub use table::{NodeEntry, NodeTable};
