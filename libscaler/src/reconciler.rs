use std::sync::Arc;

use common::{CacheRuntime, ConditionStatus, RuntimeCondition, RuntimeConditionType};
use log::{debug, error, info};

use crate::backoff::Backoff;
use crate::error::ScaleError;
use crate::events::{self, EventKind, EventRecorder};
use crate::status::publish_status;
use crate::store::RuntimeStore;
use crate::workers::WorkerLifecycle;

/// Drives one runtime's worker fleet toward its spec'd replica count.
pub struct ReplicaScaler {
    store: Arc<dyn RuntimeStore>,
    workers: Arc<dyn WorkerLifecycle>,
    recorder: Arc<dyn EventRecorder>,
    backoff: Backoff,
}

impl ReplicaScaler {
    pub fn new(
        store: Arc<dyn RuntimeStore>,
        workers: Arc<dyn WorkerLifecycle>,
        recorder: Arc<dyn EventRecorder>,
    ) -> Self {
        Self {
            store,
            workers,
            recorder,
            backoff: Backoff::default(),
        }
    }

    /// Replace the conflict-retry budget used for status writes.
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// One reconciliation cycle: compare the desired replica count against
    /// the last observed one and run the matching scaling path. The first
    /// unrecovered error ends the cycle; the caller schedules the retry.
    pub async fn sync_replicas(&self, name: &str) -> Result<(), ScaleError> {
        let snapshot = self.store.get_runtime(name).await?;
        let runtime = snapshot.runtime;

        let desired = runtime.replicas();
        let current = runtime.status.current_worker_number_scheduled;

        if desired > current {
            self.scale_out(&runtime).await
        } else if desired < current {
            self.scale_in(&runtime).await
        } else {
            debug!("runtime {name}: {current} workers already match the spec");
            Ok(())
        }
    }

    async fn scale_out(&self, runtime: &CacheRuntime) -> Result<(), ScaleError> {
        let name = &runtime.metadata.name;

        self.workers.setup_workers(runtime).await?;
        if let Err(err) = self.workers.check_workers_ready(runtime).await {
            error!("runtime {name}: workers failed the readiness check: {err}");
            return Err(err);
        }

        publish_status(self.store.as_ref(), &self.backoff, name, |_, status| {
            status.conditions.upsert(RuntimeCondition::new(
                RuntimeConditionType::WorkersScaledOut,
                ConditionStatus::True,
                "WorkersScaledOut",
                "The workers are scaled out.",
            ));
        })
        .await?;

        // Report counts from a fresh read so the event reflects what actually
        // got committed, not the pre-update snapshot.
        let snapshot = self.store.get_runtime(name).await?;
        let status = &snapshot.runtime.status;
        self.recorder.event(
            &snapshot.runtime,
            EventKind::Normal,
            events::REASON_SUCCEED,
            format!(
                "Workers scaled out. current replicas: {}, desired replicas: {}.",
                status.current_worker_number_scheduled, status.desired_worker_number_scheduled
            ),
        );
        Ok(())
    }

    async fn scale_in(&self, runtime: &CacheRuntime) -> Result<(), ScaleError> {
        let name = &runtime.metadata.name;
        let target = runtime.replicas();
        info!("runtime {name}: scaling in workers to {target}");

        let achieved = self.workers.destroy_workers(runtime, target).await?;

        if achieved > target {
            self.recorder.event(
                runtime,
                EventKind::Warning,
                events::REASON_SCALE_IN_FAILED,
                format!(
                    "Workers are still in use, can't scale in \
                     (expected replicas: {target}, current replicas: {achieved})"
                ),
            );
        } else {
            self.recorder.event(
                runtime,
                EventKind::Normal,
                events::REASON_SUCCEED,
                format!(
                    "Workers scaled in. current replicas: {achieved}, desired replicas: {target}."
                ),
            );
        }

        // The achieved count is published even when it misses the target, so
        // the next cycle picks the scale-in back up from true state.
        publish_status(
            self.store.as_ref(),
            &self.backoff,
            name,
            move |fetched, status| {
                status.desired_worker_number_scheduled = target;
                status.current_worker_number_scheduled = achieved;
                status.conditions.upsert(RuntimeCondition::new(
                    RuntimeConditionType::WorkersScaledIn,
                    ConditionStatus::True,
                    "WorkersScaledIn",
                    "The workers are scaled in.",
                ));

                if !fetched.spec.fuse.global {
                    // Non-global fuse fleets shrink in lockstep with the workers.
                    status.desired_fuse_number_scheduled = target;
                    status.conditions.upsert(RuntimeCondition::new(
                        RuntimeConditionType::FusesScaledIn,
                        ConditionStatus::True,
                        "FusesScaledIn",
                        "The fuses are scaled in.",
                    ));
                }
            },
        )
        .await
    }
}
