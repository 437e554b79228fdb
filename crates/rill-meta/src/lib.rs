//! # rill-meta
//!
//! Durable placement state for the rill cluster:
//!
//! - [`MetaStore`] — the consumed capability over a strongly-consistent
//!   hierarchical store (exists / get / put-if-absent / list), with an
//!   in-memory backend for tests and single-node runs and an etcd backend
//!   for real clusters
//! - [`ProducerContext`] / [`SubscriptionContext`] — the one-time binding
//!   of a stream or subscription to its owning node
//! - [`PlacementRegistry`] — the lookup-or-assign protocol, including the
//!   first-writer-wins creation race
//!
//! ## Design principles
//!
//! - **The store decides races**: `put_if_absent` is a true atomic
//!   create-if-absent returning [`CreateOutcome`]. A lost race is a normal
//!   outcome, never an error — the loser re-reads and returns the winner.
//! - **Durable state is ground truth**: the in-process subscription cache
//!   is a best-effort optimization, safe to drop at any time.

pub mod context;
pub mod error;
pub mod etcd;
pub mod keys;
pub mod memory;
pub mod placement;
pub mod store;

pub use context::{ProducerContext, SubscriptionContext};
pub use error::{MetaError, PlacementError};
pub use etcd::EtcdMetaStore;
pub use keys::{MetaKey, MetaNamespace};
pub use memory::MemoryMetaStore;
pub use placement::PlacementRegistry;
pub use store::{CreateOutcome, MetaStore};
