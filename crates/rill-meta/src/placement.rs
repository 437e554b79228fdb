//! PlacementRegistry — the lookup-or-assign protocol.
//!
//! Maps stream names and subscription ids to owning nodes, backed by the
//! [`MetaStore`]. First lookup of a resource assigns it to the best-ranked
//! node via an atomic create-if-absent; every later lookup (from any server
//! in the cluster) returns the recorded owner.
//!
//! Race handling: concurrent first lookups for the same resource all call
//! `put_if_absent`; the store admits exactly one record. Losers re-read the
//! durable value, so every caller converges on the winner's node — never
//! its own candidate.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use rill_cluster::{NodeRanking, ServerNode};

use crate::store::{self, CreateOutcome};
use crate::{
    MetaError, MetaKey, MetaNamespace, MetaStore, PlacementError, ProducerContext,
    SubscriptionContext,
};

pub struct PlacementRegistry {
    meta: Arc<dyn MetaStore>,
    ranking: Arc<dyn NodeRanking>,
    /// In-process read-through cache for subscription placements. The lock
    /// covers read-then-insert; the durable store stays authoritative, so
    /// this map can be dropped at any time without correctness loss.
    sub_cache: Mutex<HashMap<String, SubscriptionContext>>,
}

impl PlacementRegistry {
    pub fn new(meta: Arc<dyn MetaStore>, ranking: Arc<dyn NodeRanking>) -> Self {
        Self {
            meta,
            ranking,
            sub_cache: Mutex::new(HashMap::new()),
        }
    }

    // ── Stream placement ─────────────────────────────────────

    /// Return the owning node for `stream_name`, assigning one on first
    /// lookup.
    pub async fn lookup_or_assign_stream(
        &self,
        stream_name: &str,
    ) -> Result<ServerNode, PlacementError> {
        let key = MetaKey::StreamPlacement(stream_name.to_string());

        if let Some(ctx) = store::get_typed::<ProducerContext>(self.meta.as_ref(), &key).await? {
            debug!(stream = stream_name, node = ctx.node.id, "stream placement hit");
            return Ok(ctx.node);
        }

        let candidate = self.best_ranked_node().await?;
        let ctx = ProducerContext {
            stream_name: stream_name.to_string(),
            node: candidate,
        };

        match store::put_if_absent(self.meta.as_ref(), &key, &ctx).await? {
            CreateOutcome::Created => {
                info!(stream = stream_name, node = ctx.node.id, "stream assigned");
                Ok(ctx.node)
            }
            CreateOutcome::AlreadyExists => {
                // Lost the creation race: converge on the winner's record.
                let winner = store::get_typed::<ProducerContext>(self.meta.as_ref(), &key)
                    .await?
                    .ok_or_else(|| MetaError::Missing(key.path()))?;
                debug!(stream = stream_name, node = winner.node.id, "lost assignment race");
                Ok(winner.node)
            }
        }
    }

    // ── Subscription placement ───────────────────────────────

    /// Return the owning node for `subscription_id`, assigning one on first
    /// lookup. Fails with [`PlacementError::SubscriptionNotFound`] when no
    /// subscription definition exists.
    pub async fn lookup_or_assign_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<ServerNode, PlacementError> {
        if let Some(ctx) = self.cached_subscription(subscription_id) {
            debug!(subscription = subscription_id, node = ctx.node_id, "subscription cache hit");
            return self.resolve_node(ctx.node_id).await;
        }

        let key = MetaKey::SubscriptionPlacement(subscription_id.to_string());
        if let Some(ctx) =
            store::get_typed::<SubscriptionContext>(self.meta.as_ref(), &key).await?
        {
            let node = self.resolve_node(ctx.node_id).await?;
            self.cache_subscription(ctx);
            return Ok(node);
        }

        // First lookup: the definition must already exist elsewhere.
        let def_key = MetaKey::SubscriptionDef(subscription_id.to_string());
        if !self.meta.exists(&def_key).await? {
            return Err(PlacementError::SubscriptionNotFound(
                subscription_id.to_string(),
            ));
        }

        let candidate = self.best_ranked_node().await?;
        let ctx = SubscriptionContext {
            subscription_id: subscription_id.to_string(),
            node_id: candidate.id,
        };

        // Cache only once the durable outcome is known. A speculative entry
        // inserted before the write would survive a store fault and keep
        // answering from a record that was never persisted.
        match store::put_if_absent(self.meta.as_ref(), &key, &ctx).await? {
            CreateOutcome::Created => {
                self.cache_subscription(ctx);
                info!(subscription = subscription_id, node = candidate.id, "subscription assigned");
                Ok(candidate)
            }
            CreateOutcome::AlreadyExists => {
                let winner = store::get_typed::<SubscriptionContext>(self.meta.as_ref(), &key)
                    .await?
                    .ok_or_else(|| MetaError::Missing(key.path()))?;
                debug!(
                    subscription = subscription_id,
                    node = winner.node_id,
                    "lost assignment race"
                );
                let node = self.resolve_node(winner.node_id).await?;
                // Replace the losing candidate so the cache matches the
                // durable record.
                self.cache_subscription_overwrite(winner);
                Ok(node)
            }
        }
    }

    // ── Node bookkeeping ─────────────────────────────────────

    /// Record a node in the `nodes/` reverse-lookup namespace.
    /// Last-write-wins: a restarting node refreshes its own record.
    pub async fn record_node(&self, node: &ServerNode) -> Result<(), PlacementError> {
        store::put_typed(self.meta.as_ref(), &MetaKey::Node(node.id), node).await?;
        Ok(())
    }

    /// Ids of every node ever recorded in the store.
    pub async fn recorded_node_ids(&self) -> Result<Vec<u32>, PlacementError> {
        let children = self.meta.list_children(MetaNamespace::Nodes).await?;
        Ok(children.iter().filter_map(|s| s.parse().ok()).collect())
    }

    /// Resolve a node id to its recorded address.
    async fn resolve_node(&self, node_id: u32) -> Result<ServerNode, PlacementError> {
        store::get_typed::<ServerNode>(self.meta.as_ref(), &MetaKey::Node(node_id))
            .await?
            .ok_or(PlacementError::NodeNotFound(node_id))
    }

    // ── Internals ────────────────────────────────────────────

    /// First element of the ranking, or `NoAvailableNode`.
    async fn best_ranked_node(&self) -> Result<ServerNode, PlacementError> {
        let ranking = self.ranking.nodes_ranking().await?;
        ranking
            .into_iter()
            .next()
            .ok_or(PlacementError::NoAvailableNode)
    }

    fn cached_subscription(&self, subscription_id: &str) -> Option<SubscriptionContext> {
        self.lock_cache().get(subscription_id).cloned()
    }

    /// Insert if absent — concurrent first lookups for the same id in this
    /// process leave a single entry.
    fn cache_subscription(&self, ctx: SubscriptionContext) {
        self.lock_cache()
            .entry(ctx.subscription_id.clone())
            .or_insert(ctx);
    }

    fn cache_subscription_overwrite(&self, ctx: SubscriptionContext) {
        self.lock_cache().insert(ctx.subscription_id.clone(), ctx);
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<String, SubscriptionContext>> {
        // The guard never crosses an await and the critical sections cannot
        // panic, but recover from poisoning anyway rather than unwinding.
        self.sub_cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryMetaStore;
    use rill_cluster::{NodeHealth, NodeTable, TableRanking};

    fn node(id: u32) -> ServerNode {
        ServerNode::new(id, "127.0.0.1", 6700 + id as u16, 6800 + id as u16)
    }

    async fn registry_with_nodes(ids: &[u32]) -> (PlacementRegistry, NodeTable, MemoryMetaStore) {
        let table = NodeTable::new(ids.first().copied().unwrap_or(0));
        for &id in ids {
            table.register(node(id));
        }
        let meta = MemoryMetaStore::new();
        let registry = PlacementRegistry::new(
            Arc::new(meta.clone()),
            Arc::new(TableRanking::new(table.clone())),
        );
        for &id in ids {
            registry.record_node(&node(id)).await.unwrap();
        }
        (registry, table, meta)
    }

    #[tokio::test]
    async fn stream_assignment_takes_best_ranked() {
        let (registry, _, _) = registry_with_nodes(&[2, 1, 3]).await;
        let owner = registry.lookup_or_assign_stream("orders").await.unwrap();
        assert_eq!(owner.id, 1);
    }

    #[tokio::test]
    async fn stream_assignment_is_sticky_across_ranking_change() {
        let (registry, table, _) = registry_with_nodes(&[1, 2]).await;
        let first = registry.lookup_or_assign_stream("orders").await.unwrap();
        assert_eq!(first.id, 1);

        // Node 1 drops out of the ranking; the placement must not move.
        table.mark_health(1, NodeHealth::Unreachable).unwrap();
        let second = registry.lookup_or_assign_stream("orders").await.unwrap();
        assert_eq!(second.id, 1);
    }

    #[tokio::test]
    async fn empty_ranking_fails_without_persisting() {
        let (registry, _, meta) = registry_with_nodes(&[1]).await;
        let before = meta.len();

        let table = NodeTable::new(9);
        let empty_registry = PlacementRegistry::new(
            Arc::new(meta.clone()),
            Arc::new(TableRanking::new(table)),
        );

        let err = empty_registry
            .lookup_or_assign_stream("ghost")
            .await
            .unwrap_err();
        assert!(matches!(err, PlacementError::NoAvailableNode));
        assert_eq!(meta.len(), before);

        let err = empty_registry
            .lookup_or_assign_subscription("ghost-sub")
            .await
            .unwrap_err();
        // Unknown subscription is reported before node availability.
        assert!(matches!(err, PlacementError::SubscriptionNotFound(_)));
    }

    #[tokio::test]
    async fn unknown_subscription_fails_regardless_of_nodes() {
        let (registry, _, _) = registry_with_nodes(&[1, 2, 3]).await;
        let err = registry
            .lookup_or_assign_subscription("never-created")
            .await
            .unwrap_err();
        assert!(matches!(err, PlacementError::SubscriptionNotFound(id) if id == "never-created"));
    }

    #[tokio::test]
    async fn known_subscription_gets_assigned_and_cached() {
        let (registry, _, meta) = registry_with_nodes(&[1, 2]).await;
        meta.put_raw(&MetaKey::SubscriptionDef("sub-1".into()), b"{}".to_vec())
            .await
            .unwrap();

        let owner = registry.lookup_or_assign_subscription("sub-1").await.unwrap();
        assert_eq!(owner.id, 1);

        // Second lookup is served from the in-process cache; the answer is
        // identical either way.
        let again = registry.lookup_or_assign_subscription("sub-1").await.unwrap();
        assert_eq!(again, owner);
    }

    #[tokio::test]
    async fn subscription_survives_cache_loss() {
        let (registry, table, meta) = registry_with_nodes(&[1, 2]).await;
        meta.put_raw(&MetaKey::SubscriptionDef("sub-1".into()), b"{}".to_vec())
            .await
            .unwrap();
        let owner = registry.lookup_or_assign_subscription("sub-1").await.unwrap();

        // A fresh registry (fresh process) has an empty cache but reads the
        // same durable record.
        let fresh = PlacementRegistry::new(
            Arc::new(meta.clone()),
            Arc::new(TableRanking::new(table)),
        );
        let resolved = fresh.lookup_or_assign_subscription("sub-1").await.unwrap();
        assert_eq!(resolved, owner);
    }

    #[tokio::test]
    async fn concurrent_stream_lookups_converge_on_one_owner() {
        let (registry, _, meta) = registry_with_nodes(&[1, 2, 3]).await;
        let registry = Arc::new(registry);

        let mut handles = Vec::new();
        for _ in 0..32 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry.lookup_or_assign_stream("hot-stream").await.unwrap()
            }));
        }

        let mut owners = Vec::new();
        for h in handles {
            owners.push(h.await.unwrap());
        }
        assert!(owners.windows(2).all(|w| w[0] == w[1]));

        // Exactly one durable record was created.
        let streams = meta
            .list_children(MetaNamespace::StreamPlacements)
            .await
            .unwrap();
        assert_eq!(streams, vec!["hot-stream".to_string()]);
    }

    #[tokio::test]
    async fn recorded_node_ids_roundtrip() {
        let (registry, _, _) = registry_with_nodes(&[1, 5, 9]).await;
        let mut ids = registry.recorded_node_ids().await.unwrap();
        ids.sort();
        assert_eq!(ids, vec![1, 5, 9]);
    }

    #[tokio::test]
    async fn missing_reverse_lookup_is_node_not_found() {
        let table = NodeTable::new(1);
        table.register(node(1));
        let meta = MemoryMetaStore::new();
        let registry = PlacementRegistry::new(
            Arc::new(meta.clone()),
            Arc::new(TableRanking::new(table)),
        );
        meta.put_raw(&MetaKey::SubscriptionDef("sub-1".into()), b"{}".to_vec())
            .await
            .unwrap();
        // Placement exists but node 8 was never recorded.
        store::put_typed(
            &meta,
            &MetaKey::SubscriptionPlacement("sub-1".into()),
            &SubscriptionContext {
                subscription_id: "sub-1".into(),
                node_id: 8,
            },
        )
        .await
        .unwrap();

        let err = registry
            .lookup_or_assign_subscription("sub-1")
            .await
            .unwrap_err();
        assert!(matches!(err, PlacementError::NodeNotFound(8)));
    }

    /// Store wrapper that fails the next create-if-absent, then heals.
    struct FailingOnceStore {
        inner: MemoryMetaStore,
        fail_next: std::sync::atomic::AtomicBool,
    }

    #[async_trait::async_trait]
    impl MetaStore for FailingOnceStore {
        async fn exists(&self, key: &MetaKey) -> Result<bool, MetaError> {
            self.inner.exists(key).await
        }

        async fn get_raw(&self, key: &MetaKey) -> Result<Option<Vec<u8>>, MetaError> {
            self.inner.get_raw(key).await
        }

        async fn put_raw(&self, key: &MetaKey, value: Vec<u8>) -> Result<(), MetaError> {
            self.inner.put_raw(key, value).await
        }

        async fn put_if_absent_raw(
            &self,
            key: &MetaKey,
            value: Vec<u8>,
        ) -> Result<CreateOutcome, MetaError> {
            if self.fail_next.swap(false, std::sync::atomic::Ordering::SeqCst) {
                return Err(MetaError::Unavailable("injected store fault".into()));
            }
            self.inner.put_if_absent_raw(key, value).await
        }

        async fn list_children(&self, ns: MetaNamespace) -> Result<Vec<String>, MetaError> {
            self.inner.list_children(ns).await
        }
    }

    /// Store wrapper that sneaks a rival record under the key right before
    /// delegating the create, forcing the caller to lose the race.
    struct RacingStore {
        inner: MemoryMetaStore,
        rival: SubscriptionContext,
    }

    #[async_trait::async_trait]
    impl MetaStore for RacingStore {
        async fn exists(&self, key: &MetaKey) -> Result<bool, MetaError> {
            self.inner.exists(key).await
        }

        async fn get_raw(&self, key: &MetaKey) -> Result<Option<Vec<u8>>, MetaError> {
            self.inner.get_raw(key).await
        }

        async fn put_raw(&self, key: &MetaKey, value: Vec<u8>) -> Result<(), MetaError> {
            self.inner.put_raw(key, value).await
        }

        async fn put_if_absent_raw(
            &self,
            key: &MetaKey,
            value: Vec<u8>,
        ) -> Result<CreateOutcome, MetaError> {
            let rival = serde_json::to_vec(&self.rival).unwrap();
            self.inner.put_raw(key, rival).await?;
            self.inner.put_if_absent_raw(key, value).await
        }

        async fn list_children(&self, ns: MetaNamespace) -> Result<Vec<String>, MetaError> {
            self.inner.list_children(ns).await
        }
    }

    #[tokio::test]
    async fn failed_durable_write_leaves_no_cached_placement() {
        let table = NodeTable::new(1);
        table.register(node(1));

        let inner = MemoryMetaStore::new();
        let registry = PlacementRegistry::new(
            Arc::new(FailingOnceStore {
                inner: inner.clone(),
                fail_next: std::sync::atomic::AtomicBool::new(true),
            }),
            Arc::new(TableRanking::new(table)),
        );
        registry.record_node(&node(1)).await.unwrap();
        registry.record_node(&node(2)).await.unwrap();
        inner
            .put_raw(&MetaKey::SubscriptionDef("sub-1".into()), b"{}".to_vec())
            .await
            .unwrap();

        let err = registry
            .lookup_or_assign_subscription("sub-1")
            .await
            .unwrap_err();
        assert!(matches!(err, PlacementError::Meta(_)));

        // While this process was failing, another one durably assigned
        // node 2.
        store::put_typed(
            &inner,
            &MetaKey::SubscriptionPlacement("sub-1".into()),
            &SubscriptionContext {
                subscription_id: "sub-1".into(),
                node_id: 2,
            },
        )
        .await
        .unwrap();

        // The store has healed; the durable record must win. A cache entry
        // left behind by the failed attempt would answer node 1 here.
        let owner = registry.lookup_or_assign_subscription("sub-1").await.unwrap();
        assert_eq!(owner.id, 2);
    }

    #[tokio::test]
    async fn subscription_lost_race_converges_on_winner() {
        let table = NodeTable::new(1);
        table.register(node(1));
        table.register(node(2));

        let inner = MemoryMetaStore::new();
        let registry = PlacementRegistry::new(
            Arc::new(RacingStore {
                inner: inner.clone(),
                rival: SubscriptionContext {
                    subscription_id: "sub-1".into(),
                    node_id: 2,
                },
            }),
            Arc::new(TableRanking::new(table)),
        );
        registry.record_node(&node(1)).await.unwrap();
        registry.record_node(&node(2)).await.unwrap();
        inner
            .put_raw(&MetaKey::SubscriptionDef("sub-1".into()), b"{}".to_vec())
            .await
            .unwrap();

        // The caller's candidate is node 1 (best-ranked) but node 2 wins the
        // durable race; the caller must return the winner.
        let owner = registry.lookup_or_assign_subscription("sub-1").await.unwrap();
        assert_eq!(owner.id, 2);

        // The cache holds the winner too: overwrite the durable record and
        // confirm the next lookup still answers from the cached winner.
        store::put_typed(
            &inner,
            &MetaKey::SubscriptionPlacement("sub-1".into()),
            &SubscriptionContext {
                subscription_id: "sub-1".into(),
                node_id: 1,
            },
        )
        .await
        .unwrap();
        let again = registry.lookup_or_assign_subscription("sub-1").await.unwrap();
        assert_eq!(again.id, 2);
    }
}
