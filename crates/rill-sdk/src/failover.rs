//! Client-side failover across a shrinking set of candidate servers.
//!
//! [`ServerList`] owns the process-local view: the "current" server and an
//! ordered list of known-available addresses, refreshed wholesale from
//! DescribeCluster responses and pruned entry-by-entry on transport
//! failure. [`FailoverRouter::request`] is the retry walk itself: try the
//! current/first candidate, drop it on transport failure, stop when a
//! server answers or the list is empty.
//!
//! This is deliberately a linear "try all known-live seeds once" walk with
//! no backoff — repopulating the candidate list is the caller's job, via
//! opportunistic DescribeCluster calls.

use std::future::Future;
use std::sync::Mutex;

use thiserror::Error;
use tonic::Code;
use tracing::{debug, warn};

/// A connection/transport-level fault — the signal to fail over.
///
/// Application-level error statuses are NOT transport errors; they count as
/// answers and end the walk.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("transport-level rpc failure: {0:?}")]
    Rpc(Code),
}

/// True when a gRPC status code represents a transport fault rather than an
/// application response. `DeadlineExceeded` is included because the SDK
/// applies its own per-request deadline — a hung node must trigger
/// failover, not hang the caller.
pub fn is_transport_code(code: Code) -> bool {
    matches!(code, Code::Unavailable | Code::DeadlineExceeded)
}

// ─────────────────────────────────────────────
// ServerList
// ─────────────────────────────────────────────

/// Process-local cache of {current server, ordered candidate addresses}.
///
/// The two slots are independent mutexes read and swapped atomically;
/// consistency across the whole list under concurrent removals is not
/// assumed (worst case an address is tried one extra time), which matches
/// the tolerance of the retry walk.
#[derive(Debug, Default)]
pub struct ServerList {
    current: Mutex<Option<String>>,
    available: Mutex<Vec<String>>,
}

impl ServerList {
    pub fn seed(addrs: Vec<String>) -> Self {
        Self {
            current: Mutex::new(None),
            available: Mutex::new(addrs),
        }
    }

    /// The address the next attempt should use: the current server while it
    /// is still listed, otherwise the head of the candidate list.
    pub fn first_candidate(&self) -> Option<String> {
        // Snapshot "current" before taking the list lock; the two locks are
        // never held together, so removals racing this read only cost one
        // extra attempt.
        let current = self.lock_current().clone();
        let available = self.lock_available();
        if let Some(cur) = current {
            if available.iter().any(|a| a == &cur) {
                return Some(cur);
            }
        }
        available.first().cloned()
    }

    /// Compare-and-remove a failed address; clears "current" when it
    /// matched.
    pub fn remove(&self, addr: &str) {
        self.lock_available().retain(|a| a != addr);
        let mut current = self.lock_current();
        if current.as_deref() == Some(addr) {
            *current = None;
        }
    }

    /// Mark the address that answered as the current server.
    pub fn promote(&self, addr: &str) {
        *self.lock_current() = Some(addr.to_string());
        // A server that answered belongs in the candidate list even if a
        // concurrent removal dropped it.
        let mut available = self.lock_available();
        if !available.iter().any(|a| a == addr) {
            available.insert(0, addr.to_string());
        }
    }

    /// Wholesale refresh from a DescribeCluster response. Keeps "current"
    /// only when it is still a member.
    pub fn replace_all(&self, addrs: Vec<String>) {
        let mut current = self.lock_current();
        if let Some(cur) = current.as_ref() {
            if !addrs.iter().any(|a| a == cur) {
                *current = None;
            }
        }
        *self.lock_available() = addrs;
    }

    pub fn current(&self) -> Option<String> {
        self.lock_current().clone()
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.lock_available().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_available().is_empty()
    }

    fn lock_current(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.current.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn lock_available(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.available.lock().unwrap_or_else(|p| p.into_inner())
    }
}

// ─────────────────────────────────────────────
// FailoverRouter
// ─────────────────────────────────────────────

/// Linear retry of one request across the candidate list.
#[derive(Debug, Default)]
pub struct FailoverRouter {
    servers: ServerList,
}

impl FailoverRouter {
    pub fn new(seed_addrs: Vec<String>) -> Self {
        Self {
            servers: ServerList::seed(seed_addrs),
        }
    }

    /// Borrow the underlying server list (for refresh and inspection).
    pub fn servers(&self) -> &ServerList {
        &self.servers
    }

    /// Issue `call` against successive candidate addresses until one
    /// answers or the candidate set is exhausted.
    ///
    /// Any non-transport response (including an application-level error the
    /// caller packed into `T`) ends the walk: the answering address becomes
    /// the current server and the raw response is returned. Exhaustion
    /// yields `None` — absence of an answer, not an error.
    ///
    /// Terminates because every transport failure removes one address and
    /// the list is never repopulated mid-walk by this router itself.
    pub async fn request<T, F, Fut>(&self, mut call: F) -> Option<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        loop {
            let addr = self.servers.first_candidate()?;
            match call(addr.clone()).await {
                Ok(response) => {
                    debug!(addr = %addr, "request answered");
                    self.servers.promote(&addr);
                    return Some(response);
                }
                Err(e) => {
                    warn!(addr = %addr, error = %e, "transport failure — dropping candidate");
                    self.servers.remove(&addr);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn seeds(addrs: &[&str]) -> Vec<String> {
        addrs.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn converges_on_first_reachable_candidate() {
        let router = FailoverRouter::new(seeds(&["a", "b", "c"]));
        let attempts = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&attempts);
        let out = router
            .request(move |addr| {
                let log = Arc::clone(&log);
                async move {
                    log.lock().unwrap().push(addr.clone());
                    if addr == "c" {
                        Ok(addr)
                    } else {
                        Err(TransportError::Connect("refused".into()))
                    }
                }
            })
            .await;

        assert_eq!(out.as_deref(), Some("c"));
        assert_eq!(*attempts.lock().unwrap(), seeds(&["a", "b", "c"]));
        assert_eq!(router.servers().current().as_deref(), Some("c"));
        assert_eq!(router.servers().snapshot(), seeds(&["c"]));
    }

    #[tokio::test]
    async fn exhaustion_returns_none_and_empties_list() {
        let router = FailoverRouter::new(seeds(&["a", "b"]));

        let out: Option<()> = router
            .request(|_addr| async { Err(TransportError::Rpc(Code::Unavailable)) })
            .await;

        assert!(out.is_none());
        assert!(router.servers().is_empty());
        assert_eq!(router.servers().current(), None);
    }

    #[tokio::test]
    async fn application_error_counts_as_an_answer() {
        let router = FailoverRouter::new(seeds(&["a", "b"]));

        // "a" answers with an application-level error; the walk must stop
        // there instead of failing over to "b".
        let out = router
            .request(|addr| async move {
                Ok::<_, TransportError>(Err::<String, String>(format!("app error from {addr}")))
            })
            .await;

        assert_eq!(out, Some(Err("app error from a".into())));
        assert_eq!(router.servers().current().as_deref(), Some("a"));
        assert_eq!(router.servers().snapshot(), seeds(&["a", "b"]));
    }

    #[tokio::test]
    async fn current_server_is_tried_first() {
        let router = FailoverRouter::new(seeds(&["a", "b"]));
        router.servers().promote("b");

        let attempts = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&attempts);
        let _ = router
            .request(move |addr| {
                let log = Arc::clone(&log);
                async move {
                    log.lock().unwrap().push(addr.clone());
                    Ok::<_, TransportError>(addr)
                }
            })
            .await;

        assert_eq!(*attempts.lock().unwrap(), seeds(&["b"]));
    }

    #[test]
    fn replace_all_keeps_current_only_when_listed() {
        let list = ServerList::seed(seeds(&["a", "b"]));
        list.promote("a");

        list.replace_all(seeds(&["a", "c"]));
        assert_eq!(list.current().as_deref(), Some("a"));

        list.replace_all(seeds(&["d"]));
        assert_eq!(list.current(), None);
        assert_eq!(list.snapshot(), seeds(&["d"]));
    }

    #[test]
    fn remove_clears_matching_current() {
        let list = ServerList::seed(seeds(&["a", "b"]));
        list.promote("a");
        list.remove("a");
        assert_eq!(list.current(), None);
        assert_eq!(list.snapshot(), seeds(&["b"]));
    }

    #[test]
    fn transport_code_classification() {
        assert!(is_transport_code(Code::Unavailable));
        assert!(is_transport_code(Code::DeadlineExceeded));
        assert!(!is_transport_code(Code::Internal));
        assert!(!is_transport_code(Code::InvalidArgument));
    }
}
