//! # rill-sdk
//!
//! Async client for the rill lookup API:
//!
//! - [`RillClient`] — typed wrapper over the tonic-generated client,
//!   bound to one server address
//! - [`ServerList`] / [`FailoverRouter`] — process-local cache of reachable
//!   server addresses and the linear walk that retries a request across
//!   them until one answers or all fail
//! - [`ClusterClient`] — the two combined: lookups with failover plus
//!   opportunistic cluster-view refresh via DescribeCluster
//!
//! ## Example
//!
//! ```rust,ignore
//! use rill_sdk::ClusterClient;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = ClusterClient::new(vec!["127.0.0.1:6700".into()]);
//!     client.refresh_cluster_view().await;
//!
//!     match client.lookup_stream("orders").await {
//!         Some(node) => println!("orders lives on {node}"),
//!         None => println!("no server answered"),
//!     }
//! }
//! ```

pub mod client;
pub mod cluster;
pub mod failover;

pub use client::RillClient;
pub use cluster::ClusterClient;
pub use failover::{FailoverRouter, ServerList, TransportError};
