//! Trait seam over the Tekton API
//!
//! The watcher only depends on this trait, so its resolution, retry and
//! tailing logic can be driven by an in-memory implementation in tests.

use async_trait::async_trait;
use tekwatch_core::domain::endpoint::Endpoint;
use tekwatch_core::domain::pipeline_run::PipelineRunList;
use tekwatch_core::domain::task_run::TaskRunList;

use crate::TektonClient;
use crate::error::Result;

/// Read-only queries the watcher issues against an API server
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// Lists pipeline runs labelled with a trigger event id
    ///
    /// # Arguments
    /// * `endpoint` - API server to query
    /// * `trigger_id` - Value of the trigger event id label
    async fn list_pipeline_runs(
        &self,
        endpoint: &Endpoint,
        trigger_id: &str,
    ) -> Result<PipelineRunList>;

    /// Lists task runs of a pipeline run
    ///
    /// # Arguments
    /// * `endpoint` - API server to query
    /// * `pipeline_run` - Name of the pipeline run
    async fn list_task_runs(&self, endpoint: &Endpoint, pipeline_run: &str) -> Result<TaskRunList>;

    /// Fetches the complete log of a container
    ///
    /// # Arguments
    /// * `endpoint` - API server to query
    /// * `pod` - Pod name
    /// * `container` - Container name inside the pod
    async fn container_log(
        &self,
        endpoint: &Endpoint,
        pod: &str,
        container: &str,
    ) -> Result<String>;
}

#[async_trait]
impl PipelineApi for TektonClient {
    async fn list_pipeline_runs(
        &self,
        endpoint: &Endpoint,
        trigger_id: &str,
    ) -> Result<PipelineRunList> {
        self.get_pipeline_runs(endpoint, trigger_id).await
    }

    async fn list_task_runs(&self, endpoint: &Endpoint, pipeline_run: &str) -> Result<TaskRunList> {
        self.get_task_runs(endpoint, pipeline_run).await
    }

    async fn container_log(
        &self,
        endpoint: &Endpoint,
        pod: &str,
        container: &str,
    ) -> Result<String> {
        self.get_container_log(endpoint, pod, container).await
    }
}
