//! Task run endpoints

use reqwest::RequestBuilder;
use tekwatch_core::domain::endpoint::Endpoint;
use tekwatch_core::domain::task_run::TaskRunList;
use tracing::debug;

use crate::TektonClient;
use crate::error::Result;

/// Label Tekton puts on every task run of a pipeline run
pub const PIPELINE_RUN_LABEL: &str = "tekton.dev/pipelineRun";

impl TektonClient {
    /// List the task runs belonging to a pipeline run
    pub async fn get_task_runs(
        &self,
        endpoint: &Endpoint,
        pipeline_run: &str,
    ) -> Result<TaskRunList> {
        debug!("Listing task runs of {}", pipeline_run);

        let response = self
            .task_runs_request(endpoint, pipeline_run)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    fn task_runs_request(&self, endpoint: &Endpoint, pipeline_run: &str) -> RequestBuilder {
        let url = self.tekton_collection_url(endpoint, "taskruns");
        let selector = format!("{}={}", PIPELINE_RUN_LABEL, pipeline_run);

        self.get(&url).query(&[("labelSelector", selector)])
    }
}
