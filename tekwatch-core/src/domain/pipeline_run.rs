//! Pipeline run domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ObjectMeta, null_as_default};

/// Response of a pipeline run label-selector query
///
/// The watcher treats the whole list as "the run": it is complete only when
/// every item has finished.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineRunList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<PipelineRun>,
}

/// A single pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub status: PipelineRunStatus,
}

/// Observed state of a pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRunStatus {
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    /// Absent while the run is still executing
    #[serde(default)]
    pub completion_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub conditions: Vec<Condition>,
}

/// Knative-style status condition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub last_transition_time: Option<DateTime<Utc>>,
}

impl PipelineRunList {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Name of the run being followed (the first item)
    pub fn name(&self) -> Option<&str> {
        self.items.first().map(|run| run.metadata.name.as_str())
    }

    /// True iff every item has a completion timestamp
    ///
    /// Vacuously true for an empty list; callers must treat an empty list
    /// as "not found yet" before relying on this.
    pub fn is_complete(&self) -> bool {
        self.items.iter().all(PipelineRun::is_complete)
    }

    /// `Succeeded` condition of the followed run, if reported yet
    pub fn outcome(&self) -> Option<&Condition> {
        self.items.first().and_then(PipelineRun::succeeded_condition)
    }
}

impl PipelineRun {
    pub fn is_complete(&self) -> bool {
        self.status.completion_time.is_some()
    }

    pub fn succeeded_condition(&self) -> Option<&Condition> {
        self.status.conditions.iter().find(|c| c.kind == "Succeeded")
    }
}

impl Condition {
    pub fn is_true(&self) -> bool {
        self.status.eq_ignore_ascii_case("true")
    }
}
