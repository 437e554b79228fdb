//! rill production lookup server.
//!
//! Reads configuration from environment variables (see [`config::Config`]),
//! selects a durable placement backend (in-memory or etcd), registers the
//! local node and any seed peers, then serves the gRPC lookup API and the
//! HTTP admin endpoint until SIGINT.
//!
//! ## Quick start
//!
//! ```bash
//! # Development (single node, in-memory placement, port 6700)
//! cargo run --bin rill-server --release
//!
//! # Three-node cluster against etcd
//! RILL_NODE_ID=2 \
//! RILL_PORT=6700 \
//! RILL_META_BACKEND=etcd \
//! RILL_ETCD_ENDPOINTS=http://etcd-0:2379,http://etcd-1:2379 \
//! RILL_SEEDS=1@node-a:6700:6701,3@node-c:6700:6701 \
//!   cargo run --bin rill-server --release
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use rill_api::{LookupService, OperationMetrics, RILL_DESCRIPTOR};
use rill_cluster::{ServerNode, TableRanking};
use rill_meta::{EtcdMetaStore, MemoryMetaStore, MetaStore, PlacementRegistry};

mod admin;
mod bootstrap;
mod config;
use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Tracing ───────────────────────────────────────────────────────────────
    let config = Config::from_env();

    let filter = EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .compact()
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        node_id = config.node_id,
        port    = config.port,
        backend = %config.meta_backend,
        "rill server starting"
    );

    // ── Durable placement backend ─────────────────────────────────────────────
    let meta: Arc<dyn MetaStore> = match config.meta_backend.as_str() {
        "etcd" => {
            let endpoints: Vec<String> = config
                .etcd_endpoints
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            let store = EtcdMetaStore::connect(endpoints.clone())
                .await
                .map_err(|e| anyhow::anyhow!("etcd connect failed ({endpoints:?}): {e}"))?;
            info!(endpoints = ?endpoints, "placement backend: etcd");
            Arc::new(store)
        }
        "memory" => {
            info!("placement backend: in-memory (single-node / development)");
            Arc::new(MemoryMetaStore::new())
        }
        other => {
            anyhow::bail!("unknown RILL_META_BACKEND '{other}' (expected 'memory' or 'etcd')")
        }
    };

    // ── Cluster membership ────────────────────────────────────────────────────
    let local = ServerNode::new(
        config.node_id,
        &config.host,
        config.port,
        config.internal_port,
    );
    let table = bootstrap::build_table(local, &config.seeds);
    bootstrap::start_heartbeat(table.clone(), config.heartbeat_secs);
    bootstrap::start_peer_probe(table.clone(), config.heartbeat_secs);

    let ranking = Arc::new(TableRanking::new(table.clone()));
    let registry = Arc::new(PlacementRegistry::new(meta, ranking.clone()));

    // Record every known member durably so placements taken on other nodes
    // can be resolved back to an address here.
    for entry in table.all_entries() {
        registry.record_node(&entry.node).await?;
    }
    let recorded = registry.recorded_node_ids().await?;
    info!(nodes = ?recorded, "cluster members recorded");

    // ── Metrics + HTTP admin endpoint ─────────────────────────────────────────
    let metrics = Arc::new(OperationMetrics::new());

    if config.admin_port > 0 {
        let metrics_admin = Arc::clone(&metrics);
        let table_admin = table.clone();
        let port = config.admin_port;
        tokio::spawn(async move { admin::serve(metrics_admin, table_admin, port).await });
    } else {
        info!("admin endpoint disabled (RILL_ADMIN_PORT=0)");
    }

    // ── gRPC server ───────────────────────────────────────────────────────────
    let addr: SocketAddr = format!("[::]:{}", config.port).parse()?;
    let service = LookupService::new(registry, ranking, Arc::clone(&metrics));

    let reflection = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(RILL_DESCRIPTOR)
        .build_v1()
        .map_err(|e| anyhow::anyhow!("failed to build gRPC reflection service: {e}"))?;

    info!(%addr, "gRPC lookup server listening");

    tokio::select! {
        result = tonic::transport::Server::builder()
            .add_service(reflection)
            .add_service(service.into_service())
            .serve(addr) =>
        {
            if let Err(e) = result {
                error!(error = %e, "gRPC server error");
                return Err(anyhow::anyhow!("{}", e));
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("received SIGINT — shutting down gracefully");
        }
    }

    info!("rill server shutdown complete");
    Ok(())
}
