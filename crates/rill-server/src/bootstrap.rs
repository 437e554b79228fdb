//! Cluster bootstrapping, heartbeat and peer probing for the rill server.
//!
//! Wraps `rill-cluster` with startup wiring:
//!   - registers the local node in a fresh [`NodeTable`]
//!   - parses seed peers from `RILL_SEEDS`
//!   - starts a tokio heartbeat task that keeps `last_seen_ms` fresh
//!   - starts a probe loop that checks each remote member over gRPC and
//!     demotes unreachable peers out of the ranking

use std::time::Duration;

use tonic::transport::Endpoint;
use tracing::{debug, info, warn};

use rill_api::pb::{self, rill_lookup_client::RillLookupClient};
use rill_cluster::{NodeHealth, NodeTable, ServerNode};

/// Parse a single seed entry.
///
/// Accepted formats:
///   `"id@host:port:internal_port"`
///   `"id@host:port"` (internal port defaults to port + 1)
pub fn parse_seed(s: &str) -> Option<ServerNode> {
    let (id_str, addr) = s.split_once('@')?;
    let id: u32 = id_str.trim().parse().ok()?;

    let mut parts = addr.split(':');
    let host = parts.next()?.trim();
    if host.is_empty() {
        return None;
    }
    let port: u16 = parts.next()?.trim().parse().ok()?;
    let internal_port: u16 = match parts.next() {
        Some(p) => p.trim().parse().ok()?,
        None => port.checked_add(1)?,
    };
    if parts.next().is_some() {
        return None;
    }

    Some(ServerNode::new(id, host, port, internal_port))
}

/// Build a [`NodeTable`] pre-populated with the local node and any seeds.
pub fn build_table(local: ServerNode, seeds_csv: &str) -> NodeTable {
    let table = NodeTable::new(local.id);

    info!(
        id   = local.id,
        addr = %local.addr(),
        "cluster: local node registered"
    );
    table.register(local);

    for raw in seeds_csv.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match parse_seed(raw) {
            Some(seed) => {
                info!(id = seed.id, addr = %seed.addr(), "cluster: seed peer registered");
                table.register(seed);
            }
            None => warn!(entry = raw, "cluster: malformed seed entry skipped"),
        }
    }

    table
}

/// Spawn a background task that refreshes `last_seen_ms` of the local node
/// every `interval_secs`, keeping it visibly alive in the table.
pub fn start_heartbeat(table: NodeTable, interval_secs: u64) {
    let interval = Duration::from_secs(interval_secs);
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            if let Err(e) = table.touch(table.local_id()) {
                warn!(error = %e, "cluster heartbeat: failed to touch local node");
            }
        }
    });
}

/// Deadline for a single peer probe connection.
const PROBE_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// One probe pass over every remote member: ask each peer for its ranking,
/// refresh it on an answer, mark it unreachable on transport failure so it
/// drops out of the ranking until a later probe succeeds.
pub async fn probe_peers(table: &NodeTable) {
    for entry in table.all_entries() {
        if entry.node.id == table.local_id() {
            continue;
        }
        match probe_one(&entry.node).await {
            Ok(()) => {
                debug!(peer = %entry.node, "peer probe ok");
                let _ = table.touch(entry.node.id);
            }
            Err(e) => {
                warn!(peer = %entry.node, error = %e, "peer probe failed — marking unreachable");
                let _ = table.mark_health(entry.node.id, NodeHealth::Unreachable);
            }
        }
    }
}

async fn probe_one(node: &ServerNode) -> Result<(), tonic::Status> {
    let endpoint = Endpoint::from_shared(format!("http://{}", node.addr()))
        .map_err(|e| tonic::Status::unavailable(e.to_string()))?
        .connect_timeout(PROBE_CONNECT_TIMEOUT);
    let channel = endpoint
        .connect()
        .await
        .map_err(|e| tonic::Status::unavailable(e.to_string()))?;
    let mut client = RillLookupClient::new(channel);
    client.get_nodes_ranking(pb::Empty {}).await?;
    Ok(())
}

/// Spawn the background probe loop.
pub fn start_peer_probe(table: NodeTable, interval_secs: u64) {
    let interval = Duration::from_secs(interval_secs);
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            probe_peers(&table).await;
        }
    });
}
