//! Log tailer
//!
//! Every poll re-fetches the complete log of each step container and
//! emits only what was not shown before. Emission happens per container,
//! in pod/step order, as soon as its log has been fetched.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tekwatch_client::{ClientError, PipelineApi};
use tekwatch_core::domain::endpoint::Endpoint;
use tekwatch_core::domain::log::{ContainerKey, ContainerLogState, LogDiffMode};
use tekwatch_core::domain::task_run::TaskRunList;
use tracing::debug;

use crate::sink::LogSink;

/// Tails every step container of a pipeline run
///
/// Owns the per-container log state for the lifetime of the watch; entries
/// are created on first sight and never removed.
pub struct LogTailer<S: LogSink> {
    api: Arc<dyn PipelineApi>,
    sink: S,
    diff_mode: LogDiffMode,
    states: HashMap<ContainerKey, ContainerLogState>,
    task_runs: Option<TaskRunList>,
}

impl<S: LogSink> LogTailer<S> {
    pub fn new(api: Arc<dyn PipelineApi>, sink: S, diff_mode: LogDiffMode) -> Self {
        Self {
            api,
            sink,
            diff_mode,
            states: HashMap::new(),
            task_runs: None,
        }
    }

    /// Task runs seen by the most recent successful lookup
    pub fn task_runs(&self) -> Option<&TaskRunList> {
        self.task_runs.as_ref()
    }

    /// Number of containers seen so far
    pub fn tracked_containers(&self) -> usize {
        self.states.len()
    }

    /// Re-reads the task runs of `pipeline_run`
    ///
    /// On failure the previous snapshot is kept.
    pub async fn refresh_task_runs(
        &mut self,
        endpoint: &Endpoint,
        pipeline_run: &str,
    ) -> Result<(), ClientError> {
        let task_runs = self.api.list_task_runs(endpoint, pipeline_run).await?;
        debug!(
            "Pipeline run {} has {} task run(s)",
            pipeline_run,
            task_runs.items.len()
        );
        self.task_runs = Some(task_runs);
        Ok(())
    }

    /// Runs one tail cycle over every step of `pipeline_run`
    ///
    /// The first failing request ends the cycle; chunks already emitted in
    /// this cycle stay emitted and the next cycle starts over.
    pub async fn tail(
        &mut self,
        endpoint: &Endpoint,
        pipeline_run: &str,
    ) -> Result<(), ClientError> {
        self.refresh_task_runs(endpoint, pipeline_run).await?;

        let pod_steps = self
            .task_runs
            .as_ref()
            .map(TaskRunList::pod_steps)
            .unwrap_or_default();

        for pod in pod_steps {
            if pod.pod_name.is_empty() {
                debug!("Skipping task run without a pod yet");
                continue;
            }

            for step in &pod.steps {
                if step.container.is_empty() {
                    continue;
                }

                let logs = self
                    .api
                    .container_log(endpoint, &pod.pod_name, &step.container)
                    .await?;

                self.observe(ContainerKey::new(&pod.pod_name, &step.container), logs);
            }
        }

        Ok(())
    }

    /// Records a full log fetch and emits the new part, if any
    fn observe(&mut self, key: ContainerKey, logs: String) {
        let state = match self.states.entry(key.clone()) {
            Entry::Occupied(entry) => {
                let state = entry.into_mut();
                state.append(logs, self.diff_mode);
                state
            }
            Entry::Vacant(entry) => {
                debug!("Tailing new container {}", key);
                entry.insert(ContainerLogState::new(logs))
            }
        };

        if state.has_output() {
            self.sink.write(&key, state.tail());
        }
    }
}
