use async_trait::async_trait;
use common::CacheRuntime;

use crate::error::ScaleError;

/// A runtime together with the store revision it was read at.
#[derive(Debug, Clone)]
pub struct RuntimeSnapshot {
    pub runtime: CacheRuntime,
    pub revision: i64,
}

/// Versioned access to stored runtimes.
#[async_trait]
pub trait RuntimeStore: Send + Sync {
    async fn get_runtime(&self, name: &str) -> Result<RuntimeSnapshot, ScaleError>;

    /// Commit `runtime` only if the stored object is still at `revision`;
    /// a lost race is reported as [`ScaleError::Conflict`].
    async fn update_runtime_status(
        &self,
        runtime: &CacheRuntime,
        revision: i64,
    ) -> Result<(), ScaleError>;
}
