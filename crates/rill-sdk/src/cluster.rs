//! ClusterClient — lookups with failover plus cluster-view refresh.
//!
//! Each call walks the candidate address list through the
//! [`FailoverRouter`]; any server that answers (even with an application
//! error) ends the walk. The candidate list is repopulated only by
//! [`ClusterClient::refresh_cluster_view`], which callers invoke
//! opportunistically.

use std::future::Future;

use tonic::Status;
use tracing::warn;

use rill_api::convert::node_from_proto;
use rill_api::pb::DescribeClusterResponse;
use rill_cluster::ServerNode;

use crate::client::RillClient;
use crate::failover::{is_transport_code, FailoverRouter, TransportError};

pub struct ClusterClient {
    router: FailoverRouter,
}

impl ClusterClient {
    /// Create a client seeded with `host:port` addresses of any reachable
    /// cluster members.
    pub fn new(seed_addrs: Vec<String>) -> Self {
        Self {
            router: FailoverRouter::new(seed_addrs),
        }
    }

    /// The underlying router (for inspection in callers and tests).
    pub fn router(&self) -> &FailoverRouter {
        &self.router
    }

    // ── Lookups ──────────────────────────────────────────────

    /// Owning node for a stream.
    ///
    /// `None` means no answer was obtained: either every candidate failed
    /// at the transport level, or the answering server reported an error
    /// (logged here).
    pub async fn lookup_stream(&self, stream_name: &str) -> Option<ServerNode> {
        let answer = self
            .call(
                |mut client, name: String| async move { client.lookup_stream(&name).await },
                stream_name.to_string(),
            )
            .await?;

        match answer {
            Ok(resp) => resp.server_node.as_ref().map(node_from_proto),
            Err(status) => {
                warn!(stream = stream_name, error = %status, "stream lookup failed");
                None
            }
        }
    }

    /// Owning node for a subscription.
    pub async fn lookup_subscription(&self, subscription_id: &str) -> Option<ServerNode> {
        let answer = self
            .call(
                |mut client, id: String| async move { client.lookup_subscription(&id).await },
                subscription_id.to_string(),
            )
            .await?;

        match answer {
            Ok(resp) => resp.server_node.as_ref().map(node_from_proto),
            Err(status) => {
                warn!(subscription = subscription_id, error = %status, "subscription lookup failed");
                None
            }
        }
    }

    // ── Cluster view ─────────────────────────────────────────

    /// Issue DescribeCluster through the router and replace the candidate
    /// list with the advertised members. Returns the raw response when a
    /// server answered successfully.
    pub async fn refresh_cluster_view(&self) -> Option<DescribeClusterResponse> {
        let answer = self
            .call(
                |mut client, _: ()| async move { client.describe_cluster().await },
                (),
            )
            .await?;

        match answer {
            Ok(resp) => {
                let addrs: Vec<String> = resp
                    .nodes
                    .iter()
                    .map(|n| node_from_proto(n).addr())
                    .collect();
                self.router.servers().replace_all(addrs);
                Some(resp)
            }
            Err(status) => {
                warn!(error = %status, "describe cluster failed");
                None
            }
        }
    }

    // ── Internals ────────────────────────────────────────────

    /// Run one RPC through the failover walk.
    ///
    /// Transport classification: connect errors and `Unavailable` /
    /// `DeadlineExceeded` statuses trigger failover; every other status is
    /// an application answer and is returned as `Ok(Err(status))`.
    async fn call<A, T, F, Fut>(&self, rpc: F, arg: A) -> Option<Result<T, Status>>
    where
        A: Clone,
        F: Fn(RillClient, A) -> Fut + Copy,
        Fut: Future<Output = Result<T, Status>>,
    {
        self.router
            .request(move |addr| {
                let arg = arg.clone();
                async move {
                    let client = RillClient::connect(format!("http://{addr}"))
                        .await
                        .map_err(|e| TransportError::Connect(e.to_string()))?;
                    match rpc(client, arg).await {
                        Ok(resp) => Ok(Ok(resp)),
                        Err(status) if is_transport_code(status.code()) => {
                            Err(TransportError::Rpc(status.code()))
                        }
                        Err(status) => Ok(Err(status)),
                    }
                }
            })
            .await
    }
}
