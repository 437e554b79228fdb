//! Prometheus-compatible operation metrics for the lookup service.
//!
//! Lock-free `AtomicU64` counters (no mutex contention on the hot path);
//! the server's `/metrics` endpoint calls [`OperationMetrics::to_prometheus`]
//! to emit Prometheus text exposition format.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Lock-free operation counters for the rill gRPC server.
pub struct OperationMetrics {
    pub describe_cluster_count:    AtomicU64,
    pub lookup_stream_count:       AtomicU64,
    pub lookup_subscription_count: AtomicU64,
    pub nodes_ranking_count:       AtomicU64,
    pub error_count:               AtomicU64,
    pub start_time:                Instant,
}

impl Default for OperationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationMetrics {
    pub fn new() -> Self {
        Self {
            describe_cluster_count:    AtomicU64::new(0),
            lookup_stream_count:       AtomicU64::new(0),
            lookup_subscription_count: AtomicU64::new(0),
            nodes_ranking_count:       AtomicU64::new(0),
            error_count:               AtomicU64::new(0),
            start_time:                Instant::now(),
        }
    }

    /// Increment a counter by 1.
    #[inline]
    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Format all metrics as Prometheus text exposition.
    pub fn to_prometheus(&self) -> String {
        let uptime = self.start_time.elapsed().as_secs();
        format!(
            "\
# HELP rill_describe_cluster_total Total DescribeCluster operations
# TYPE rill_describe_cluster_total counter
rill_describe_cluster_total {describe}
# HELP rill_lookup_stream_total Total LookupStream operations
# TYPE rill_lookup_stream_total counter
rill_lookup_stream_total {stream}
# HELP rill_lookup_subscription_total Total LookupSubscription operations
# TYPE rill_lookup_subscription_total counter
rill_lookup_subscription_total {subscription}
# HELP rill_nodes_ranking_total Total GetNodesRanking operations
# TYPE rill_nodes_ranking_total counter
rill_nodes_ranking_total {ranking}
# HELP rill_error_total Total gRPC errors
# TYPE rill_error_total counter
rill_error_total {errors}
# HELP rill_uptime_seconds Server uptime in seconds
# TYPE rill_uptime_seconds gauge
rill_uptime_seconds {uptime}
",
            describe = self.describe_cluster_count.load(Ordering::Relaxed),
            stream = self.lookup_stream_count.load(Ordering::Relaxed),
            subscription = self.lookup_subscription_count.load(Ordering::Relaxed),
            ranking = self.nodes_ranking_count.load(Ordering::Relaxed),
            errors = self.error_count.load(Ordering::Relaxed),
            uptime = uptime,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_appear_in_exposition() {
        let m = OperationMetrics::new();
        m.inc(&m.lookup_stream_count);
        m.inc(&m.lookup_stream_count);
        m.inc(&m.error_count);

        let text = m.to_prometheus();
        assert!(text.contains("rill_lookup_stream_total 2"));
        assert!(text.contains("rill_error_total 1"));
        assert!(text.contains("rill_uptime_seconds"));
    }
}
