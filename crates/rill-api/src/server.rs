//! gRPC lookup service implementation.
//!
//! [`LookupService`] is thin orchestration: every data-plane RPC delegates
//! to the [`PlacementRegistry`] and every fault funnels through one
//! translator, [`placement_status`], so a downstream failure always becomes
//! a well-formed status response instead of a crash.

use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::{debug, error, warn};

use rill_cluster::NodeRanking;
use rill_meta::{PlacementError, PlacementRegistry};

use crate::convert::node_to_proto;
use crate::metrics::OperationMetrics;
use crate::proto::rill::{
    self,
    rill_lookup_server::{RillLookup, RillLookupServer},
};
use crate::validation::{validate_stream_name, validate_subscription_id};

pub use rill::rill_lookup_server::RillLookupServer as TonicServer;

/// Version of the lookup wire protocol, reported by DescribeCluster.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ── Error translation ─────────────────────────────────────────────────────────

/// Single source of truth for mapping domain errors to gRPC statuses.
///
/// Every lookup-path fault goes through here: the distinction between the
/// error kinds lives in the message, the status code is uniformly
/// `internal` (clients must not retry server-side placement decisions).
pub fn placement_status(e: PlacementError) -> Status {
    match &e {
        PlacementError::NoAvailableNode => Status::internal("no available server node"),
        PlacementError::SubscriptionNotFound(id) => {
            Status::internal(format!("subscription '{id}' does not exist"))
        }
        PlacementError::NodeNotFound(id) => {
            Status::internal(format!("placement references unregistered node {id}"))
        }
        PlacementError::Ranking(inner) => {
            warn!(error = %inner, "ranking provider failed");
            Status::internal(format!("ranking provider failed: {inner}"))
        }
        PlacementError::Meta(inner) => {
            // Store faults are the one class that can indicate local I/O
            // trouble; log loudly before surfacing.
            error!(error = %inner, "coordination store fault");
            Status::internal(format!("placement store fault: {inner}"))
        }
    }
}

// ── LookupService ─────────────────────────────────────────────────────────────

pub struct LookupService {
    registry: Arc<PlacementRegistry>,
    ranking: Arc<dyn NodeRanking>,
    metrics: Arc<OperationMetrics>,
}

impl LookupService {
    pub fn new(
        registry: Arc<PlacementRegistry>,
        ranking: Arc<dyn NodeRanking>,
        metrics: Arc<OperationMetrics>,
    ) -> Self {
        Self {
            registry,
            ranking,
            metrics,
        }
    }

    /// Wrap into the tonic service type for `Server::add_service`.
    pub fn into_service(self) -> RillLookupServer<Self> {
        RillLookupServer::new(self)
    }

    async fn current_ranking_protos(&self) -> Result<Vec<rill::ServerNodeProto>, Status> {
        let nodes = self.ranking.nodes_ranking().await.map_err(|e| {
            self.metrics.inc(&self.metrics.error_count);
            Status::internal(format!("ranking provider failed: {e}"))
        })?;
        Ok(nodes.iter().map(node_to_proto).collect())
    }
}

#[tonic::async_trait]
impl RillLookup for LookupService {
    async fn describe_cluster(
        &self,
        _request: Request<rill::Empty>,
    ) -> Result<Response<rill::DescribeClusterResponse>, Status> {
        self.metrics.inc(&self.metrics.describe_cluster_count);

        let nodes = self.current_ranking_protos().await?;
        debug!(nodes = nodes.len(), "describe cluster");

        Ok(Response::new(rill::DescribeClusterResponse {
            protocol_version: PROTOCOL_VERSION.to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            nodes,
        }))
    }

    async fn lookup_stream(
        &self,
        request: Request<rill::LookupStreamRequest>,
    ) -> Result<Response<rill::LookupStreamResponse>, Status> {
        self.metrics.inc(&self.metrics.lookup_stream_count);
        let req = request.into_inner();
        validate_stream_name(&req.stream_name)?;

        let node = self
            .registry
            .lookup_or_assign_stream(&req.stream_name)
            .await
            .map_err(|e| {
                self.metrics.inc(&self.metrics.error_count);
                placement_status(e)
            })?;

        debug!(stream = %req.stream_name, node = node.id, "stream lookup");
        Ok(Response::new(rill::LookupStreamResponse {
            stream_name: req.stream_name,
            server_node: Some(node_to_proto(&node)),
        }))
    }

    async fn lookup_subscription(
        &self,
        request: Request<rill::LookupSubscriptionRequest>,
    ) -> Result<Response<rill::LookupSubscriptionResponse>, Status> {
        self.metrics.inc(&self.metrics.lookup_subscription_count);
        let req = request.into_inner();
        validate_subscription_id(&req.subscription_id)?;

        let node = self
            .registry
            .lookup_or_assign_subscription(&req.subscription_id)
            .await
            .map_err(|e| {
                self.metrics.inc(&self.metrics.error_count);
                placement_status(e)
            })?;

        debug!(subscription = %req.subscription_id, node = node.id, "subscription lookup");
        Ok(Response::new(rill::LookupSubscriptionResponse {
            subscription_id: req.subscription_id,
            server_node: Some(node_to_proto(&node)),
        }))
    }

    async fn get_nodes_ranking(
        &self,
        _request: Request<rill::Empty>,
    ) -> Result<Response<rill::GetNodesRankingResponse>, Status> {
        self.metrics.inc(&self.metrics.nodes_ranking_count);
        let nodes = self.current_ranking_protos().await?;
        Ok(Response::new(rill::GetNodesRankingResponse { nodes }))
    }
}
