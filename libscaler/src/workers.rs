use async_trait::async_trait;
use common::CacheRuntime;

use crate::error::ScaleError;

/// Worker fleet operations the reconciler drives.
#[async_trait]
pub trait WorkerLifecycle: Send + Sync {
    /// Bring the fleet up to `runtime.spec.replicas` workers. Safe to call
    /// when some of them already exist.
    async fn setup_workers(&self, runtime: &CacheRuntime) -> Result<(), ScaleError>;

    /// Whether the provisioned workers are serving.
    async fn check_workers_ready(&self, runtime: &CacheRuntime) -> Result<bool, ScaleError>;

    /// Shrink the fleet toward `target` workers, leaving workers that are
    /// still in use alone. Returns the worker count left after destruction,
    /// which may stay above `target`.
    async fn destroy_workers(
        &self,
        runtime: &CacheRuntime,
        target: i32,
    ) -> Result<i32, ScaleError>;
}
