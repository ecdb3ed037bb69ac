use common::CacheRuntime;
use log::{info, warn};

/// Event severity, mirroring the normal/warning split operators expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Normal,
    Warning,
}

pub const REASON_SUCCEED: &str = "Succeed";
pub const REASON_SCALE_IN_FAILED: &str = "ScaleInFailed";

/// Operator-facing notifications. Recording is best-effort and never fails
/// the reconciliation that emits it.
pub trait EventRecorder: Send + Sync {
    fn event(&self, runtime: &CacheRuntime, kind: EventKind, reason: &str, message: String);
}

/// Recorder backed by the process log.
pub struct LogEventRecorder;

impl EventRecorder for LogEventRecorder {
    fn event(&self, runtime: &CacheRuntime, kind: EventKind, reason: &str, message: String) {
        let name = &runtime.metadata.name;
        match kind {
            EventKind::Normal => info!("runtime {name}: {reason}: {message}"),
            EventKind::Warning => warn!("runtime {name}: {reason}: {message}"),
        }
    }
}
