//! In-memory MetaStore backend.
//!
//! Backed by a `DashMap`; the map's `entry()` API decides the
//! create-if-absent race, so concurrent writers see exactly one
//! [`CreateOutcome::Created`]. Used by tests and single-node deployments
//! (`RILL_META_BACKEND=memory`), where durability across restarts is not
//! required.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::store::CreateOutcome;
use crate::{MetaError, MetaKey, MetaNamespace, MetaStore};

#[derive(Clone, Debug, Default)]
pub struct MemoryMetaStore {
    entries: Arc<DashMap<String, Vec<u8>>>,
}

impl MemoryMetaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records (all namespaces).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl MetaStore for MemoryMetaStore {
    async fn exists(&self, key: &MetaKey) -> Result<bool, MetaError> {
        Ok(self.entries.contains_key(&key.path()))
    }

    async fn get_raw(&self, key: &MetaKey) -> Result<Option<Vec<u8>>, MetaError> {
        Ok(self.entries.get(&key.path()).map(|r| r.clone()))
    }

    async fn put_raw(&self, key: &MetaKey, value: Vec<u8>) -> Result<(), MetaError> {
        self.entries.insert(key.path(), value);
        Ok(())
    }

    async fn put_if_absent_raw(
        &self,
        key: &MetaKey,
        value: Vec<u8>,
    ) -> Result<CreateOutcome, MetaError> {
        match self.entries.entry(key.path()) {
            Entry::Occupied(_) => Ok(CreateOutcome::AlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(CreateOutcome::Created)
            }
        }
    }

    async fn list_children(&self, ns: MetaNamespace) -> Result<Vec<String>, MetaError> {
        let prefix = ns.prefix();
        let mut children: Vec<String> = self
            .entries
            .iter()
            .filter_map(|r| r.key().strip_prefix(&prefix).map(str::to_string))
            .collect();
        children.sort();
        Ok(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> MetaKey {
        MetaKey::StreamPlacement(name.to_string())
    }

    #[tokio::test]
    async fn put_if_absent_is_first_writer_wins() {
        let store = MemoryMetaStore::new();
        let k = key("s1");

        let first = store.put_if_absent_raw(&k, b"a".to_vec()).await.unwrap();
        let second = store.put_if_absent_raw(&k, b"b".to_vec()).await.unwrap();

        assert_eq!(first, CreateOutcome::Created);
        assert_eq!(second, CreateOutcome::AlreadyExists);
        assert_eq!(store.get_raw(&k).await.unwrap(), Some(b"a".to_vec()));
    }

    #[tokio::test]
    async fn concurrent_creates_yield_exactly_one_winner() {
        let store = MemoryMetaStore::new();
        let mut handles = Vec::new();
        for i in 0..16u8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .put_if_absent_raw(&key("contested"), vec![i])
                    .await
                    .unwrap()
            }));
        }

        let mut created = 0;
        for h in handles {
            if h.await.unwrap() == CreateOutcome::Created {
                created += 1;
            }
        }
        assert_eq!(created, 1);
    }

    #[tokio::test]
    async fn list_children_strips_namespace_prefix() {
        let store = MemoryMetaStore::new();
        store.put_raw(&key("b"), vec![]).await.unwrap();
        store.put_raw(&key("a"), vec![]).await.unwrap();
        store
            .put_raw(&MetaKey::Node(3), b"{}".to_vec())
            .await
            .unwrap();

        let streams = store
            .list_children(MetaNamespace::StreamPlacements)
            .await
            .unwrap();
        assert_eq!(streams, vec!["a".to_string(), "b".to_string()]);

        let nodes = store.list_children(MetaNamespace::Nodes).await.unwrap();
        assert_eq!(nodes, vec!["3".to_string()]);
    }

    #[tokio::test]
    async fn exists_and_missing_get() {
        let store = MemoryMetaStore::new();
        assert!(!store.exists(&key("nope")).await.unwrap());
        assert_eq!(store.get_raw(&key("nope")).await.unwrap(), None);
    }
}
