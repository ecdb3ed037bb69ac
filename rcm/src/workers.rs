use std::sync::Arc;

use async_trait::async_trait;
use etcd_client::{Compare, CompareOp, GetOptions, Txn, TxnOp};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use common::CacheRuntime;
use libscaler::backoff::Backoff;
use libscaler::error::ScaleError;
use libscaler::status::publish_status;
use libscaler::with_xline::XlineRuntimeStore;
use libscaler::workers::WorkerLifecycle;

/// k:/registry/cacheworkers/runtime_name/worker-N v:json worker record
const WORKER_PREFIX: &str = "/registry/cacheworkers/";

/// One provisioned worker process.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WorkerRecord {
    pub name: String,
    pub runtime: String,
    /// Workers with live cache clients cannot be destroyed.
    #[serde(rename = "inUse", default)]
    pub in_use: bool,
}

/// Worker fleet management on top of the runtime store.
pub struct XlineWorkerLifecycle {
    store: Arc<XlineRuntimeStore>,
    backoff: Backoff,
}

impl XlineWorkerLifecycle {
    pub fn new(store: Arc<XlineRuntimeStore>) -> Self {
        Self {
            store,
            backoff: Backoff::default(),
        }
    }

    fn worker_key(runtime: &str, index: i32) -> String {
        format!("{WORKER_PREFIX}{runtime}/worker-{index}")
    }

    fn runtime_prefix(runtime: &str) -> String {
        format!("{WORKER_PREFIX}{runtime}/")
    }

    /// All worker records of one runtime, sorted by worker index.
    async fn list_workers(&self, runtime: &str) -> Result<Vec<(i32, WorkerRecord)>, ScaleError> {
        let prefix = Self::runtime_prefix(runtime);
        let mut kv = self.store.client().await.kv_client();
        let resp = kv
            .get(prefix, Some(GetOptions::new().with_prefix()))
            .await?;

        let mut workers = Vec::new();
        for kv in resp.kvs() {
            let key = String::from_utf8_lossy(kv.key()).to_string();
            let index = match key.rsplit('-').next().and_then(|s| s.parse::<i32>().ok()) {
                Some(index) => index,
                None => {
                    warn!("ignoring worker record with a malformed key: {key}");
                    continue;
                }
            };
            let record: WorkerRecord = serde_json::from_slice(kv.value())?;
            workers.push((index, record));
        }
        workers.sort_by_key(|(index, _)| *index);
        Ok(workers)
    }
}

/// Indexes to delete to shrink toward `target`: highest first, skipping
/// workers that are still in use.
fn prune_candidates(workers: &[(i32, WorkerRecord)], target: i32) -> Vec<i32> {
    let mut remaining = workers.len() as i32;
    let mut doomed = Vec::new();
    for (index, record) in workers.iter().rev() {
        if remaining <= target {
            break;
        }
        if record.in_use {
            continue;
        }
        doomed.push(*index);
        remaining -= 1;
    }
    doomed
}

#[async_trait]
impl WorkerLifecycle for XlineWorkerLifecycle {
    async fn setup_workers(&self, runtime: &CacheRuntime) -> Result<(), ScaleError> {
        let name = &runtime.metadata.name;
        let desired = runtime.replicas();

        for index in 0..desired {
            let key = Self::worker_key(name, index);
            let record = WorkerRecord {
                name: format!("{name}-worker-{index}"),
                runtime: name.clone(),
                in_use: false,
            };
            let value = serde_json::to_vec(&record)?;

            // Create-if-absent keeps re-provisioning safe when some of the
            // workers already exist.
            let cmp = Compare::version(key.clone(), CompareOp::Equal, 0);
            let txn = Txn::new().when([cmp]).and_then([TxnOp::put(key, value, None)]);
            let mut kv = self.store.client().await.kv_client();
            let resp = kv
                .txn(txn)
                .await
                .map_err(|e| ScaleError::Provision(e.to_string()))?;
            if resp.succeeded() {
                debug!("runtime {name}: provisioned worker {index}");
            }
        }
        Ok(())
    }

    async fn check_workers_ready(&self, runtime: &CacheRuntime) -> Result<bool, ScaleError> {
        let name = &runtime.metadata.name;
        let desired = runtime.replicas();
        let workers = self
            .list_workers(name)
            .await
            .map_err(|e| ScaleError::NotReady(e.to_string()))?;
        let current = workers.len() as i32;

        // The readiness check owns the observed counts; the scaling paths
        // only ever read them back.
        publish_status(self.store.as_ref(), &self.backoff, name, |_, status| {
            status.desired_worker_number_scheduled = desired;
            status.current_worker_number_scheduled = current;
        })
        .await?;

        Ok(current >= desired)
    }

    async fn destroy_workers(&self, runtime: &CacheRuntime, target: i32) -> Result<i32, ScaleError> {
        let name = &runtime.metadata.name;
        let workers = self
            .list_workers(name)
            .await
            .map_err(|e| ScaleError::Destroy(e.to_string()))?;

        let doomed = prune_candidates(&workers, target);
        let mut kv = self.store.client().await.kv_client();
        for index in &doomed {
            let key = Self::worker_key(name, *index);
            kv.delete(key, None)
                .await
                .map_err(|e| ScaleError::Destroy(e.to_string()))?;
        }

        let achieved = workers.len() as i32 - doomed.len() as i32;
        if achieved > target {
            info!("runtime {name}: {} workers are in use, stopping at {achieved}", achieved - target);
        }
        Ok(achieved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(runtime: &str, index: i32, in_use: bool) -> (i32, WorkerRecord) {
        (
            index,
            WorkerRecord {
                name: format!("{runtime}-worker-{index}"),
                runtime: runtime.to_string(),
                in_use,
            },
        )
    }

    #[test]
    fn prune_takes_highest_indexes_first() {
        let workers: Vec<_> = (0..5).map(|i| record("rt", i, false)).collect();
        assert_eq!(prune_candidates(&workers, 2), vec![4, 3, 2]);
    }

    #[test]
    fn prune_skips_workers_in_use() {
        let workers = vec![
            record("rt", 0, false),
            record("rt", 1, true),
            record("rt", 2, true),
            record("rt", 3, true),
            record("rt", 4, false),
        ];
        // Three workers are pinned by clients, so the fleet stops above target.
        assert_eq!(prune_candidates(&workers, 2), vec![4, 0]);
    }

    #[test]
    fn prune_is_empty_at_or_below_target() {
        let workers: Vec<_> = (0..2).map(|i| record("rt", i, false)).collect();
        assert!(prune_candidates(&workers, 2).is_empty());
        assert!(prune_candidates(&workers, 5).is_empty());
    }
}
