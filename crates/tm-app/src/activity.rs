//! Activity log events.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::backend::ActivityLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Intake,
    Run,
    Tydex,
    Project,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub kind: ActivityKind,
    pub action: String,
    pub description: String,
    pub status: ActivityStatus,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl ActivityEvent {
    pub fn new(kind: ActivityKind, action: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind,
            action: action.into(),
            description: description.into(),
            status: ActivityStatus::Success,
            metadata: BTreeMap::new(),
        }
    }

    pub fn failed(mut self) -> Self {
        self.status = ActivityStatus::Failure;
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.metadata.insert(key.into(), value.to_string());
        self
    }
}

/// Record `event`; a failing log is reported and otherwise ignored.
pub async fn log_activity<L: ActivityLog>(log: &L, event: ActivityEvent) {
    if let Err(e) = log.record(&event).await {
        warn!(action = %event.action, error = %e, "Failed to record activity");
    }
}
