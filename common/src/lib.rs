pub mod condition;

pub use condition::{ConditionStatus, Conditions, RuntimeCondition, RuntimeConditionType};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

fn default_namespace() -> String {
    "default".to_string()
}

/// CacheRuntime spec
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CacheRuntimeSpec {
    /// Desired worker replica count, supplied by the scaling policy.
    pub replicas: i32,
    #[serde(default)]
    pub fuse: FuseSpec,
}

/// Fuse fleet settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct FuseSpec {
    /// When true the fuse fleet runs cluster-wide with its own lifecycle;
    /// worker scaling then leaves the fuse accounting alone.
    #[serde(default)]
    pub global: bool,
}

/// CacheRuntime status
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct CacheRuntimeStatus {
    #[serde(rename = "desiredWorkerNumberScheduled", default)]
    pub desired_worker_number_scheduled: i32,
    #[serde(rename = "currentWorkerNumberScheduled", default)]
    pub current_worker_number_scheduled: i32,
    #[serde(rename = "desiredFuseNumberScheduled", default)]
    pub desired_fuse_number_scheduled: i32,
    #[serde(rename = "currentFuseNumberScheduled", default)]
    pub current_fuse_number_scheduled: i32,
    #[serde(default)]
    pub conditions: Conditions,
}

/// A managed fleet of cache worker processes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CacheRuntime {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    #[serde(rename = "kind")]
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: CacheRuntimeSpec,
    #[serde(default)]
    pub status: CacheRuntimeStatus,
}

impl CacheRuntime {
    /// Desired worker replica count from the spec.
    pub fn replicas(&self) -> i32 {
        self.spec.replicas
    }
}
