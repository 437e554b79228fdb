//! Typed gRPC client bound to a single server address.
//!
//! Wraps the tonic-generated `RillLookupClient` with ergonomic methods and
//! a per-request deadline, so a hung server surfaces as `DeadlineExceeded`
//! (a transport fault for failover purposes) instead of blocking forever.

use std::time::Duration;

use tonic::transport::{Channel, Endpoint};

use rill_api::pb::{
    self, rill_lookup_client::RillLookupClient, DescribeClusterResponse, GetNodesRankingResponse,
    LookupStreamResponse, LookupSubscriptionResponse,
};

/// Deadline for establishing a TCP/HTTP2 connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Overall per-request deadline.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Async gRPC client for one rill server.
pub struct RillClient {
    inner: RillLookupClient<Channel>,
}

impl RillClient {
    /// Connect to a rill lookup endpoint, e.g. `"http://127.0.0.1:6700"`.
    pub async fn connect(uri: impl AsRef<str>) -> Result<Self, tonic::transport::Error> {
        let endpoint = Endpoint::from_shared(uri.as_ref().to_string())?
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT);
        let channel = endpoint.connect().await?;
        Ok(Self {
            inner: RillLookupClient::new(channel),
        })
    }

    /// Cluster versions plus the current node ranking.
    pub async fn describe_cluster(&mut self) -> Result<DescribeClusterResponse, tonic::Status> {
        self.inner
            .describe_cluster(pb::Empty {})
            .await
            .map(|r| r.into_inner())
    }

    /// Owning node for a stream; assigns on first lookup.
    pub async fn lookup_stream(
        &mut self,
        stream_name: &str,
    ) -> Result<LookupStreamResponse, tonic::Status> {
        let req = pb::LookupStreamRequest {
            stream_name: stream_name.to_string(),
        };
        self.inner.lookup_stream(req).await.map(|r| r.into_inner())
    }

    /// Owning node for a subscription; assigns on first lookup of a known
    /// subscription.
    pub async fn lookup_subscription(
        &mut self,
        subscription_id: &str,
    ) -> Result<LookupSubscriptionResponse, tonic::Status> {
        let req = pb::LookupSubscriptionRequest {
            subscription_id: subscription_id.to_string(),
        };
        self.inner
            .lookup_subscription(req)
            .await
            .map(|r| r.into_inner())
    }

    /// Raw node ranking (node-to-node contract).
    pub async fn get_nodes_ranking(&mut self) -> Result<GetNodesRankingResponse, tonic::Status> {
        self.inner
            .get_nodes_ranking(pb::Empty {})
            .await
            .map(|r| r.into_inner())
    }
}
