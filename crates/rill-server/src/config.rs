//! Server configuration loaded from environment variables.
//!
//! All settings have production-safe defaults. Override any variable at
//! container / process startup — no config file required.
//!
//! | Variable              | Default                 | Description                                  |
//! |-----------------------|-------------------------|----------------------------------------------|
//! | `RILL_NODE_ID`        | `1`                     | Numeric node id, unique cluster-wide         |
//! | `RILL_HOST`           | `127.0.0.1`             | Advertised host                              |
//! | `RILL_PORT`           | `6700`                  | Client-facing gRPC listen port               |
//! | `RILL_INTERNAL_PORT`  | `6701`                  | Node-to-node gRPC port                       |
//! | `RILL_ADMIN_PORT`     | `6780`                  | HTTP admin port for /health + /metrics (0 = off) |
//! | `RILL_LOG_LEVEL`      | `info`                  | tracing filter (trace/debug/info/warn/error) |
//! | `RILL_META_BACKEND`   | `memory`                | `memory` or `etcd`                           |
//! | `RILL_ETCD_ENDPOINTS` | `http://127.0.0.1:2379` | Comma-separated etcd endpoints               |
//! | `RILL_SEEDS`          | (empty)                 | Seed peers: `id@host:port:internal_port,...` |
//! | `RILL_HEARTBEAT_SECS` | `30`                    | Heartbeat and peer-probe interval in seconds |

/// Runtime configuration for the rill server process.
#[derive(Debug)]
pub struct Config {
    /// Numeric node id, unique cluster-wide.
    pub node_id: u32,

    /// Advertised host.
    pub host: String,

    /// Client-facing gRPC listen port.
    pub port: u16,

    /// Node-to-node gRPC port.
    pub internal_port: u16,

    /// HTTP admin listen port (0 = disabled).
    pub admin_port: u16,

    /// Tracing filter string, e.g. `"rill_api=debug,info"`.
    pub log_level: String,

    /// Durable store backend: `"memory"` or `"etcd"`.
    pub meta_backend: String,

    /// Comma-separated etcd endpoints.
    pub etcd_endpoints: String,

    /// Comma-separated seed peers: `id@host:port:internal_port`.
    pub seeds: String,

    /// Seconds between local heartbeats and remote peer probes.
    pub heartbeat_secs: u64,
}

impl Config {
    /// Load configuration from environment variables, applying defaults
    /// where a variable is absent or unparseable.
    pub fn from_env() -> Self {
        Self {
            node_id:        env_parse("RILL_NODE_ID", 1),
            host:           env_str("RILL_HOST", "127.0.0.1"),
            port:           env_parse("RILL_PORT", 6700),
            internal_port:  env_parse("RILL_INTERNAL_PORT", 6701),
            admin_port:     env_parse("RILL_ADMIN_PORT", 6780_u16),
            log_level:      env_str("RILL_LOG_LEVEL", "info"),
            meta_backend:   env_str("RILL_META_BACKEND", "memory"),
            etcd_endpoints: env_str("RILL_ETCD_ENDPOINTS", "http://127.0.0.1:2379"),
            seeds:          env_str("RILL_SEEDS", ""),
            heartbeat_secs: env_parse("RILL_HEARTBEAT_SECS", 30),
        }
    }
}

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
