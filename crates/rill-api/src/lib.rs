//! # rill-api
//!
//! gRPC surface of the rill placement subsystem, defined in
//! `proto/rill.proto` and served by [`LookupService`].
//!
//! | RPC                | Description                                       |
//! |--------------------|---------------------------------------------------|
//! | DescribeCluster    | protocol/server versions + current node ranking   |
//! | LookupStream       | owning node for a stream (assigns on first call)  |
//! | LookupSubscription | owning node for a subscription (gated on existence) |
//! | GetNodesRanking    | raw ranking — the node-to-node provider contract  |

// Generated protobuf / tonic code (compiled by build.rs)
#[allow(clippy::all)]
#[allow(clippy::pedantic)]
pub mod proto {
    pub mod rill {
        tonic::include_proto!("rill");
    }
}

pub mod convert;
pub mod metrics;
pub mod server;
pub mod validation;

pub use metrics::OperationMetrics;
pub use proto::rill as pb;
pub use server::{LookupService, PROTOCOL_VERSION};
pub use validation::{validate_stream_name, validate_subscription_id};

/// File descriptor set for gRPC reflection.
pub const RILL_DESCRIPTOR: &[u8] = tonic::include_file_descriptor_set!("rill_descriptor");
