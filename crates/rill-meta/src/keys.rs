//! Typed hierarchical key namespaces in the coordination store.
//!
//! All rill state lives under the `/rill` root:
//!
//! | Namespace                      | Value                                 |
//! |--------------------------------|---------------------------------------|
//! | `/rill/streams/{name}`         | [`ProducerContext`] — stream owner    |
//! | `/rill/sub-placements/{id}`    | [`SubscriptionContext`] — sub owner   |
//! | `/rill/subscriptions/{id}`     | subscription definition (externally owned; only read for existence) |
//! | `/rill/nodes/{id}`             | [`ServerNode`] — id → address reverse lookup |
//!
//! [`ProducerContext`]: crate::ProducerContext
//! [`SubscriptionContext`]: crate::SubscriptionContext
//! [`ServerNode`]: rill_cluster::ServerNode

/// Root prefix for all rill keys.
pub const ROOT: &str = "/rill";

/// A namespace under the rill root, used for `list_children`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaNamespace {
    StreamPlacements,
    SubscriptionPlacements,
    SubscriptionDefs,
    Nodes,
}

impl MetaNamespace {
    /// Key prefix for the namespace, trailing slash included.
    pub fn prefix(&self) -> String {
        match self {
            MetaNamespace::StreamPlacements       => format!("{ROOT}/streams/"),
            MetaNamespace::SubscriptionPlacements => format!("{ROOT}/sub-placements/"),
            MetaNamespace::SubscriptionDefs       => format!("{ROOT}/subscriptions/"),
            MetaNamespace::Nodes                  => format!("{ROOT}/nodes/"),
        }
    }
}

/// A fully-qualified typed key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetaKey {
    /// Stream → owning-node placement record.
    StreamPlacement(String),
    /// Subscription → owning-node placement record.
    SubscriptionPlacement(String),
    /// Subscription definition. Created elsewhere; this subsystem only
    /// checks existence.
    SubscriptionDef(String),
    /// Node id → `ServerNode` reverse lookup.
    Node(u32),
}

impl MetaKey {
    /// The namespace this key lives in.
    pub fn namespace(&self) -> MetaNamespace {
        match self {
            MetaKey::StreamPlacement(_)       => MetaNamespace::StreamPlacements,
            MetaKey::SubscriptionPlacement(_) => MetaNamespace::SubscriptionPlacements,
            MetaKey::SubscriptionDef(_)       => MetaNamespace::SubscriptionDefs,
            MetaKey::Node(_)                  => MetaNamespace::Nodes,
        }
    }

    /// Absolute store path for this key.
    pub fn path(&self) -> String {
        let leaf = match self {
            MetaKey::StreamPlacement(name)      => name.clone(),
            MetaKey::SubscriptionPlacement(id)  => id.clone(),
            MetaKey::SubscriptionDef(id)        => id.clone(),
            MetaKey::Node(id)                   => id.to_string(),
        };
        format!("{}{}", self.namespace().prefix(), leaf)
    }
}

impl std::fmt::Display for MetaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_namespaced() {
        assert_eq!(
            MetaKey::StreamPlacement("orders".into()).path(),
            "/rill/streams/orders"
        );
        assert_eq!(
            MetaKey::SubscriptionPlacement("sub-1".into()).path(),
            "/rill/sub-placements/sub-1"
        );
        assert_eq!(
            MetaKey::SubscriptionDef("sub-1".into()).path(),
            "/rill/subscriptions/sub-1"
        );
        assert_eq!(MetaKey::Node(7).path(), "/rill/nodes/7");
    }

    #[test]
    fn namespace_prefixes_end_with_slash() {
        for ns in [
            MetaNamespace::StreamPlacements,
            MetaNamespace::SubscriptionPlacements,
            MetaNamespace::SubscriptionDefs,
            MetaNamespace::Nodes,
        ] {
            assert!(ns.prefix().ends_with('/'));
        }
    }
}
