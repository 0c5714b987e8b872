//! Task run domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ObjectMeta, null_as_default};

/// Response of a task run label-selector query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRunList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<TaskRun>,
}

/// One execution of a task within a pipeline run; owns one pod
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRun {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub status: TaskRunStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRunStatus {
    /// Empty until the pod has been created
    #[serde(default)]
    pub pod_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub completion_time: Option<DateTime<Utc>>,
}

/// One container execution within a task run's pod
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub name: String,
    /// Container name inside the pod (e.g. "step-build")
    #[serde(default)]
    pub container: String,
    /// Present once the step container has exited
    #[serde(default)]
    pub terminated: Option<Terminated>,
}

/// Termination record of a finished step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Terminated {
    #[serde(default)]
    pub exit_code: i32,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Steps of a task run grouped under the pod that executes them
#[derive(Debug, Clone, PartialEq)]
pub struct PodSteps {
    pub pod_name: String,
    pub steps: Vec<Step>,
}

/// First failing step found while scanning a pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub pod_name: String,
    pub container: String,
    pub exit_code: i32,
}

impl TaskRunList {
    /// Flattens task runs into (pod, ordered steps) pairs, in task run order
    pub fn pod_steps(&self) -> Vec<PodSteps> {
        self.items
            .iter()
            .map(|task_run| PodSteps {
                pod_name: task_run.status.pod_name.clone(),
                steps: task_run.status.steps.clone(),
            })
            .collect()
    }

    /// First step, in pod/step discovery order, with a positive exit code
    pub fn first_failure(&self) -> Option<StepFailure> {
        self.items.iter().find_map(|task_run| {
            task_run
                .status
                .steps
                .iter()
                .find(|step| step.failed())
                .map(|step| StepFailure {
                    pod_name: task_run.status.pod_name.clone(),
                    container: step.container.clone(),
                    exit_code: step.exit_code().unwrap_or_default(),
                })
        })
    }
}

impl Step {
    /// Exit code of the step, `None` while it is still running
    pub fn exit_code(&self) -> Option<i32> {
        self.terminated.as_ref().map(|t| t.exit_code)
    }

    pub fn failed(&self) -> bool {
        self.exit_code().is_some_and(|code| code > 0)
    }
}
