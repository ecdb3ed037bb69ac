use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Condition categories published on a runtime's status.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeConditionType {
    WorkersScaledOut,
    WorkersScaledIn,
    FusesScaledIn,
}

/// "True" | "False" | "Unknown"
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// Runtime condition entry
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RuntimeCondition {
    #[serde(rename = "type")]
    pub condition_type: RuntimeConditionType,
    pub status: ConditionStatus,
    pub reason: String,
    pub message: String,
    #[serde(rename = "lastUpdateTime")]
    pub last_update_time: DateTime<Utc>,
}

impl RuntimeCondition {
    pub fn new(
        condition_type: RuntimeConditionType,
        status: ConditionStatus,
        reason: &str,
        message: &str,
    ) -> Self {
        Self {
            condition_type,
            status,
            reason: reason.to_string(),
            message: message.to_string(),
            last_update_time: Utc::now(),
        }
    }
}

/// Ordered condition list holding at most one entry per condition type.
///
/// Serializes as a plain array.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct Conditions(Vec<RuntimeCondition>);

impl Conditions {
    /// Insert `cond`, replacing an existing entry of the same type in place.
    /// An entry that matches the replacement in everything but its timestamp
    /// is kept as-is, so re-publishing it leaves the status deeply equal.
    pub fn upsert(&mut self, cond: RuntimeCondition) {
        match self
            .0
            .iter_mut()
            .find(|c| c.condition_type == cond.condition_type)
        {
            Some(existing) => {
                if existing.status != cond.status
                    || existing.reason != cond.reason
                    || existing.message != cond.message
                {
                    *existing = cond;
                }
            }
            None => self.0.push(cond),
        }
    }

    pub fn get(&self, condition_type: RuntimeConditionType) -> Option<&RuntimeCondition> {
        self.0.iter().find(|c| c.condition_type == condition_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuntimeCondition> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
