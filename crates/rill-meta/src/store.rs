//! MetaStore — the consumed capability over a strongly-consistent store.
//!
//! The placement registry never talks to a concrete backend directly; it
//! sees only this trait. Two implementations ship with rill:
//! [`MemoryMetaStore`](crate::MemoryMetaStore) (tests, single-node) and
//! [`EtcdMetaStore`](crate::EtcdMetaStore) (real clusters).

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{MetaError, MetaKey, MetaNamespace};

/// Tagged result of an atomic create-if-absent.
///
/// `AlreadyExists` is the lost-race signal: the caller must re-read the key
/// and converge on the winner's value. It is never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

/// Capability over a hierarchical strongly-consistent key-value store.
///
/// `put_if_absent` is the sole serialization point for a given key: the
/// backend must decide the create race atomically. All raw values are
/// opaque bytes; typed access goes through the free functions below.
#[async_trait]
pub trait MetaStore: Send + Sync {
    async fn exists(&self, key: &MetaKey) -> Result<bool, MetaError>;

    async fn get_raw(&self, key: &MetaKey) -> Result<Option<Vec<u8>>, MetaError>;

    /// Unconditional write. Used only for namespaces where last-write-wins
    /// is correct (node reverse-lookup records).
    async fn put_raw(&self, key: &MetaKey, value: Vec<u8>) -> Result<(), MetaError>;

    /// Atomic create-if-absent. Never overwrites.
    async fn put_if_absent_raw(&self, key: &MetaKey, value: Vec<u8>)
        -> Result<CreateOutcome, MetaError>;

    /// Leaf names (namespace prefix stripped) of all keys in a namespace.
    async fn list_children(&self, ns: MetaNamespace) -> Result<Vec<String>, MetaError>;
}

// ── Typed access ──────────────────────────────────────────────────────────────

/// Read and decode a JSON record.
pub async fn get_typed<T: DeserializeOwned>(
    store: &dyn MetaStore,
    key: &MetaKey,
) -> Result<Option<T>, MetaError> {
    match store.get_raw(key).await? {
        None => Ok(None),
        Some(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            MetaError::Corrupt {
                key: key.path(),
                reason: e.to_string(),
            }
        }),
    }
}

/// Encode and write a JSON record unconditionally.
pub async fn put_typed<T: Serialize>(
    store: &dyn MetaStore,
    key: &MetaKey,
    value: &T,
) -> Result<(), MetaError> {
    store.put_raw(key, encode(key, value)?).await
}

/// Encode and atomically create a JSON record if the key is absent.
pub async fn put_if_absent<T: Serialize>(
    store: &dyn MetaStore,
    key: &MetaKey,
    value: &T,
) -> Result<CreateOutcome, MetaError> {
    store.put_if_absent_raw(key, encode(key, value)?).await
}

fn encode<T: Serialize>(key: &MetaKey, value: &T) -> Result<Vec<u8>, MetaError> {
    serde_json::to_vec(value).map_err(|e| MetaError::Corrupt {
        key: key.path(),
        reason: e.to_string(),
    })
}
