//! Test doubles for the watcher components

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tekwatch_client::{ClientError, PipelineApi};
use tekwatch_core::domain::ObjectMeta;
use tekwatch_core::domain::endpoint::Endpoint;
use tekwatch_core::domain::log::ContainerKey;
use tekwatch_core::domain::pipeline_run::{PipelineRun, PipelineRunList, PipelineRunStatus};
use tekwatch_core::domain::task_run::{Step, TaskRun, TaskRunList, TaskRunStatus, Terminated};

use crate::sink::LogSink;

/// Scripted reply; `Err` carries the HTTP status to fail with
pub type Reply<T> = Result<T, u16>;

/// A request the fake has served
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    PipelineRuns(Endpoint),
    TaskRuns(Endpoint, String),
    Log(ContainerKey),
}

/// In-memory `PipelineApi`
///
/// Replies are queued per endpoint / container; the last queued reply keeps
/// being served once the queue is down to one entry. Nothing queued means
/// an empty list (or empty log).
#[derive(Default)]
pub struct FakeApi {
    runs: Mutex<HashMap<Endpoint, VecDeque<Reply<PipelineRunList>>>>,
    task_runs: Mutex<VecDeque<Reply<TaskRunList>>>,
    logs: Mutex<HashMap<ContainerKey, VecDeque<Reply<String>>>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_runs(&self, endpoint: &str, reply: Reply<PipelineRunList>) {
        self.runs
            .lock()
            .unwrap()
            .entry(Endpoint::new(endpoint))
            .or_default()
            .push_back(reply);
    }

    pub fn push_task_runs(&self, reply: Reply<TaskRunList>) {
        self.task_runs.lock().unwrap().push_back(reply);
    }

    pub fn push_log(&self, pod: &str, container: &str, reply: Reply<&str>) {
        self.logs
            .lock()
            .unwrap()
            .entry(ContainerKey::new(pod, container))
            .or_default()
            .push_back(reply.map(str::to_string));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Endpoints queried for pipeline runs, in order
    pub fn run_queries(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::PipelineRuns(endpoint) => Some(endpoint.to_string()),
                _ => None,
            })
            .collect()
    }

    pub fn log_fetches(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Log(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn next<T: Clone + Default>(queue: Option<&mut VecDeque<Reply<T>>>) -> Result<T, ClientError> {
    let reply = match queue {
        Some(queue) if queue.len() > 1 => queue.pop_front(),
        Some(queue) => queue.front().cloned(),
        None => None,
    };

    reply
        .unwrap_or_else(|| Ok(T::default()))
        .map_err(|status| ClientError::http(status, "scripted failure"))
}

#[async_trait]
impl PipelineApi for FakeApi {
    async fn list_pipeline_runs(
        &self,
        endpoint: &Endpoint,
        _trigger_id: &str,
    ) -> tekwatch_client::Result<PipelineRunList> {
        self.record(Call::PipelineRuns(endpoint.clone()));
        next(self.runs.lock().unwrap().get_mut(endpoint))
    }

    async fn list_task_runs(
        &self,
        endpoint: &Endpoint,
        pipeline_run: &str,
    ) -> tekwatch_client::Result<TaskRunList> {
        self.record(Call::TaskRuns(endpoint.clone(), pipeline_run.to_string()));
        let mut queue = self.task_runs.lock().unwrap();
        next(Some(&mut *queue))
    }

    async fn container_log(
        &self,
        _endpoint: &Endpoint,
        pod: &str,
        container: &str,
    ) -> tekwatch_client::Result<String> {
        let key = ContainerKey::new(pod, container);
        self.record(Call::Log(key.clone()));
        next(self.logs.lock().unwrap().get_mut(&key))
    }
}

/// Collects emitted chunks; clones share the same buffer
#[derive(Clone, Default)]
pub struct MemorySink {
    chunks: Arc<Mutex<Vec<(ContainerKey, String)>>>,
}

impl MemorySink {
    pub fn chunks(&self) -> Vec<(ContainerKey, String)> {
        self.chunks.lock().unwrap().clone()
    }

    /// Everything emitted for one container, concatenated
    pub fn text_for(&self, pod: &str, container: &str) -> String {
        let key = ContainerKey::new(pod, container);
        self.chunks()
            .into_iter()
            .filter(|(k, _)| *k == key)
            .map(|(_, chunk)| chunk)
            .collect()
    }
}

impl LogSink for MemorySink {
    fn write(&mut self, key: &ContainerKey, chunk: &str) {
        self.chunks
            .lock()
            .unwrap()
            .push((key.clone(), chunk.to_string()));
    }
}

/// Pipeline run list with a single run
pub fn run_list(name: &str, complete: bool) -> PipelineRunList {
    PipelineRunList {
        items: vec![PipelineRun {
            metadata: ObjectMeta {
                name: name.to_string(),
                ..Default::default()
            },
            status: PipelineRunStatus {
                completion_time: complete.then(chrono::Utc::now),
                ..Default::default()
            },
        }],
    }
}

/// Task run owning `pod`, with (container, exit code) steps
pub fn task_run(pod: &str, steps: &[(&str, Option<i32>)]) -> TaskRun {
    TaskRun {
        metadata: ObjectMeta::default(),
        status: TaskRunStatus {
            pod_name: pod.to_string(),
            steps: steps
                .iter()
                .map(|(container, code)| Step {
                    name: container.to_string(),
                    container: container.to_string(),
                    terminated: code.map(|exit_code| Terminated {
                        exit_code,
                        ..Default::default()
                    }),
                })
                .collect(),
            completion_time: None,
        },
    }
}

pub fn task_runs(items: Vec<TaskRun>) -> TaskRunList {
    TaskRunList { items }
}
