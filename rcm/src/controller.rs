use std::sync::Arc;
use std::time::Duration;

use etcd_client::EventType;
use log::{debug, error, info, warn};
use tokio::select;
use tokio::time::{interval, sleep};

use libscaler::error::ScaleError;
use libscaler::reconciler::ReplicaScaler;
use libscaler::with_xline::{RUNTIME_PREFIX, XlineRuntimeStore};

/// Watch-driven reconcile loop over every stored runtime.
///
/// Cycles run sequentially from this task, so no runtime ever sees two
/// concurrent reconciliations.
pub struct Controller {
    store: Arc<XlineRuntimeStore>,
    scaler: Arc<ReplicaScaler>,
    resync_period: Duration,
}

impl Controller {
    pub fn new(
        store: Arc<XlineRuntimeStore>,
        scaler: Arc<ReplicaScaler>,
        resync_period: Duration,
    ) -> Self {
        Self {
            store,
            scaler,
            resync_period,
        }
    }

    pub async fn run(self) -> Result<(), ScaleError> {
        let mut backoff = Duration::from_millis(100);
        let max_backoff = Duration::from_secs(5);

        loop {
            let rev = match self.resync_all().await {
                Ok(rev) => rev,
                Err(err) => {
                    error!("initial runtime sync failed: {err}");
                    sleep(backoff).await;
                    backoff = std::cmp::min(backoff * 2, max_backoff);
                    continue;
                }
            };

            let (mut _watcher, mut stream) = match self.store.watch_runtimes(rev + 1).await {
                Ok(pair) => pair,
                Err(err) => {
                    error!("failed to establish runtime watch: {err}");
                    sleep(backoff).await;
                    backoff = std::cmp::min(backoff * 2, max_backoff);
                    continue;
                }
            };
            backoff = Duration::from_millis(100); // reset backoff on success

            info!("watching runtimes starting from rev {rev}");
            let mut resync = interval(self.resync_period);
            resync.reset();

            loop {
                select! {
                    _ = resync.tick() => {
                        if let Err(err) = self.resync_all().await {
                            warn!("periodic resync failed: {err}");
                        }
                    }
                    msg = stream.message() => {
                        match msg {
                            Ok(Some(resp)) => {
                                if resp.canceled() {
                                    warn!("runtime watch canceled, reconnecting");
                                    break;
                                }
                                for event in resp.events() {
                                    if event.event_type() != EventType::Put {
                                        continue;
                                    }
                                    if let Some(kv) = event.kv() {
                                        let name = String::from_utf8_lossy(kv.key())
                                            .replace(RUNTIME_PREFIX, "");
                                        self.reconcile_logged(&name).await;
                                    }
                                }
                            }
                            Ok(None) => {
                                warn!("runtime watch stream closed, reconnecting");
                                break;
                            }
                            Err(err) => {
                                error!("runtime watch stream error: {err}");
                                break;
                            }
                        }
                    }
                }
            }
        }
    }

    /// Reconcile every stored runtime once; returns the listing's revision.
    async fn resync_all(&self) -> Result<i64, ScaleError> {
        let (names, rev) = self.store.runtimes_snapshot_with_rev().await?;
        debug!("resyncing {} runtimes", names.len());
        for name in names {
            self.reconcile_logged(&name).await;
        }
        Ok(rev)
    }

    // Status writes come back through the watch; the publisher's no-op guard
    // keeps that from looping.
    async fn reconcile_logged(&self, name: &str) {
        if let Err(err) = self.scaler.sync_replicas(name).await {
            // The next watch event or resync retries from the last durable state.
            error!("reconcile of runtime {name} failed: {err}");
        }
    }
}
