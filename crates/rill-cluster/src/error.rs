//! Error types for the cluster layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("node {0} not found in the member table")]
    NodeNotFound(u32),

    #[error("ranking provider unavailable: {0}")]
    RankingUnavailable(String),
}
