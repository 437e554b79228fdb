//! HTTP admin endpoint: liveness probe and Prometheus metrics.
//!
//! Served on `RILL_ADMIN_PORT`, separate from the gRPC listener so
//! scrapers and load-balancer probes never touch the data plane.
//!
//!   GET /health  → `{"status":"ok", ...}`
//!   GET /metrics → Prometheus text exposition

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::{error, info};

use rill_api::OperationMetrics;
use rill_cluster::NodeTable;

#[derive(Clone)]
struct AdminState {
    metrics: Arc<OperationMetrics>,
    table: NodeTable,
}

async fn health_handler(State(state): State<AdminState>) -> Json<Value> {
    let members: Vec<Value> = state
        .table
        .all_entries()
        .iter()
        .map(|e| {
            json!({
                "id":           e.node.id,
                "addr":         e.node.addr(),
                "health":       e.health.to_string(),
                "last_seen_ms": e.last_seen_ms,
            })
        })
        .collect();

    Json(json!({
        "status":  "ok",
        "node_id": state.table.local_id(),
        "healthy": state.table.healthy_nodes().len(),
        "members": members,
    }))
}

async fn metrics_handler(State(state): State<AdminState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.to_prometheus(),
    )
}

/// Serve the admin router until the process exits.
pub async fn serve(metrics: Arc<OperationMetrics>, table: NodeTable, port: u16) {
    let state = AdminState { metrics, table };
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(%addr, error = %e, "admin endpoint failed to bind");
            return;
        }
    };

    info!(%addr, "admin endpoint listening");
    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "admin endpoint terminated");
    }
}
