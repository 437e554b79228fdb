//! etcd MetaStore backend.
//!
//! Maps the [`MetaStore`] capability onto etcd's KV API. Create-if-absent
//! is an etcd transaction guarded by `create_revision == 0`, the idiomatic
//! etcd compare-and-create: the guard holds only while the key has never
//! been created, so exactly one concurrent writer observes
//! [`CreateOutcome::Created`].
//!
//! Selected with `RILL_META_BACKEND=etcd` and `RILL_ETCD_ENDPOINTS`.

use async_trait::async_trait;
use etcd_client::{Client, Compare, CompareOp, GetOptions, Txn, TxnOp};
use tracing::debug;

use crate::store::CreateOutcome;
use crate::{MetaError, MetaKey, MetaNamespace, MetaStore};

#[derive(Clone)]
pub struct EtcdMetaStore {
    client: Client,
}

impl EtcdMetaStore {
    /// Connect to an etcd cluster.
    pub async fn connect(endpoints: Vec<String>) -> Result<Self, MetaError> {
        let client = Client::connect(&endpoints, None)
            .await
            .map_err(store_err)?;
        debug!(endpoints = ?endpoints, "connected to etcd");
        Ok(Self { client })
    }
}

fn store_err(e: etcd_client::Error) -> MetaError {
    MetaError::Unavailable(e.to_string())
}

#[async_trait]
impl MetaStore for EtcdMetaStore {
    async fn exists(&self, key: &MetaKey) -> Result<bool, MetaError> {
        let mut client = self.client.clone();
        let resp = client
            .get(key.path(), Some(GetOptions::new().with_count_only()))
            .await
            .map_err(store_err)?;
        Ok(resp.count() > 0)
    }

    async fn get_raw(&self, key: &MetaKey) -> Result<Option<Vec<u8>>, MetaError> {
        let mut client = self.client.clone();
        let resp = client.get(key.path(), None).await.map_err(store_err)?;
        Ok(resp.kvs().first().map(|kv| kv.value().to_vec()))
    }

    async fn put_raw(&self, key: &MetaKey, value: Vec<u8>) -> Result<(), MetaError> {
        let mut client = self.client.clone();
        client.put(key.path(), value, None).await.map_err(store_err)?;
        Ok(())
    }

    async fn put_if_absent_raw(
        &self,
        key: &MetaKey,
        value: Vec<u8>,
    ) -> Result<CreateOutcome, MetaError> {
        let path = key.path();
        let txn = Txn::new()
            .when(vec![Compare::create_revision(
                path.as_str(),
                CompareOp::Equal,
                0,
            )])
            .and_then(vec![TxnOp::put(path.as_str(), value, None)]);

        let mut client = self.client.clone();
        let resp = client.txn(txn).await.map_err(store_err)?;
        if resp.succeeded() {
            Ok(CreateOutcome::Created)
        } else {
            Ok(CreateOutcome::AlreadyExists)
        }
    }

    async fn list_children(&self, ns: MetaNamespace) -> Result<Vec<String>, MetaError> {
        let prefix = ns.prefix();
        let mut client = self.client.clone();
        let resp = client
            .get(prefix.as_str(), Some(GetOptions::new().with_prefix()))
            .await
            .map_err(store_err)?;

        let mut children = Vec::with_capacity(resp.kvs().len());
        for kv in resp.kvs() {
            let full = kv.key_str().map_err(|e| MetaError::Corrupt {
                key: prefix.clone(),
                reason: format!("non-utf8 key: {e}"),
            })?;
            if let Some(leaf) = full.strip_prefix(&prefix) {
                children.push(leaf.to_string());
            }
        }
        Ok(children)
    }
}
