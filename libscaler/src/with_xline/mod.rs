use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use etcd_client::{
    Client, Compare, CompareOp, GetOptions, Txn, TxnOp, WatchOptions, WatchStream, Watcher,
};
use tokio::sync::RwLock;

use common::CacheRuntime;

use crate::error::ScaleError;
use crate::store::{RuntimeSnapshot, RuntimeStore};

/// like etcd, k:/registry/cacheruntimes/runtime_name v:json of the runtime
pub const RUNTIME_PREFIX: &str = "/registry/cacheruntimes/";

/// Runtime registry backed by an xline/etcd cluster.
///
/// Runtimes are stored as JSON values; a value's `mod_revision` is the
/// version that conditional status writes are scoped to.
#[derive(Clone)]
pub struct XlineRuntimeStore {
    client: Arc<RwLock<Client>>,
}

impl XlineRuntimeStore {
    pub async fn new(endpoints: &[&str]) -> Result<Self, ScaleError> {
        let client = Client::connect(endpoints, None).await?;
        Ok(Self {
            client: Arc::new(RwLock::new(client)),
        })
    }

    /// Shared client handle for callers that need raw watch/txn access.
    pub async fn client(&self) -> tokio::sync::RwLockReadGuard<'_, Client> {
        self.client.read().await
    }

    fn runtime_key(name: &str) -> String {
        format!("{RUNTIME_PREFIX}{name}")
    }

    pub async fn insert_runtime(&self, runtime: &CacheRuntime) -> Result<(), ScaleError> {
        let key = Self::runtime_key(&runtime.metadata.name);
        let value = serde_json::to_vec(runtime)?;
        let mut client = self.client.write().await;
        client.put(key, value, None).await?;
        Ok(())
    }

    pub async fn delete_runtime(&self, name: &str) -> Result<(), ScaleError> {
        let key = Self::runtime_key(name);
        let mut client = self.client.write().await;
        client.delete(key, None).await?;
        Ok(())
    }

    /// Names of every stored runtime plus the revision the listing was read at.
    pub async fn runtimes_snapshot_with_rev(&self) -> Result<(Vec<String>, i64), ScaleError> {
        let mut client = self.client.write().await;
        let resp = client
            .get(
                RUNTIME_PREFIX,
                Some(GetOptions::new().with_prefix().with_keys_only()),
            )
            .await?;
        let rev = resp.header().map(|h| h.revision()).unwrap_or(0);
        let names = resp
            .kvs()
            .iter()
            .map(|kv| String::from_utf8_lossy(kv.key()).replace(RUNTIME_PREFIX, ""))
            .collect();
        Ok((names, rev))
    }

    /// Prefix watch over stored runtimes starting at `start_rev`.
    pub async fn watch_runtimes(
        &self,
        start_rev: i64,
    ) -> Result<(Watcher, WatchStream), ScaleError> {
        let opts = WatchOptions::new()
            .with_prefix()
            .with_start_revision(start_rev);
        let mut client = self.client.write().await;
        let (watcher, stream) = client.watch(RUNTIME_PREFIX, Some(opts)).await?;
        Ok((watcher, stream))
    }
}

#[async_trait]
impl RuntimeStore for XlineRuntimeStore {
    async fn get_runtime(&self, name: &str) -> Result<RuntimeSnapshot, ScaleError> {
        let key = Self::runtime_key(name);
        let mut client = self.client.write().await;
        let resp = client.get(key, None).await?;
        let kv = match resp.kvs().first() {
            Some(kv) => kv,
            None => return Err(ScaleError::NotFound(name.to_string())),
        };
        let runtime: CacheRuntime = serde_json::from_slice(kv.value())
            .with_context(|| format!("malformed runtime value for {name}"))?;
        Ok(RuntimeSnapshot {
            runtime,
            revision: kv.mod_revision(),
        })
    }

    async fn update_runtime_status(
        &self,
        runtime: &CacheRuntime,
        revision: i64,
    ) -> Result<(), ScaleError> {
        let key = Self::runtime_key(&runtime.metadata.name);
        let value = serde_json::to_vec(runtime)?;

        let cmp = Compare::mod_revision(key.clone(), CompareOp::Equal, revision);
        let txn = Txn::new().when([cmp]).and_then([TxnOp::put(key, value, None)]);

        let mut client = self.client.write().await;
        let resp = client.txn(txn).await?;
        if !resp.succeeded() {
            return Err(ScaleError::Conflict);
        }
        Ok(())
    }
}
