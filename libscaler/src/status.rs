use common::{CacheRuntime, CacheRuntimeStatus};
use log::debug;
use tokio::time::sleep;

use crate::backoff::Backoff;
use crate::error::ScaleError;
use crate::store::RuntimeStore;

/// Commit a status mutation under optimistic concurrency.
///
/// Each attempt re-fetches the runtime, applies `mutate` to a copy of its
/// status and writes the result back scoped to the fetched revision. A
/// mutation that leaves the status deeply equal is skipped without writing,
/// so a repeated sync neither dirties the object nor re-triggers watchers.
/// Lost races retry under `backoff`; once the budget is spent the write
/// surfaces as [`ScaleError::RetriesExhausted`]. Any other store error aborts
/// immediately.
pub async fn publish_status<F>(
    store: &dyn RuntimeStore,
    backoff: &Backoff,
    name: &str,
    mutate: F,
) -> Result<(), ScaleError>
where
    F: Fn(&CacheRuntime, &mut CacheRuntimeStatus) + Send + Sync,
{
    let mut attempt = 0u32;
    loop {
        let snapshot = store.get_runtime(name).await?;
        let mut to_update = snapshot.runtime.clone();
        mutate(&snapshot.runtime, &mut to_update.status);

        if to_update.status == snapshot.runtime.status {
            debug!("runtime {name}: status unchanged, skipping write");
            return Ok(());
        }

        match store
            .update_runtime_status(&to_update, snapshot.revision)
            .await
        {
            Ok(()) => return Ok(()),
            Err(ScaleError::Conflict) => {
                attempt += 1;
                match backoff.delay(attempt) {
                    Some(delay) => {
                        debug!("runtime {name}: status write lost a race, retry {attempt}");
                        sleep(delay).await;
                    }
                    None => return Err(ScaleError::RetriesExhausted),
                }
            }
            Err(err) => return Err(err),
        }
    }
}
