//! Pipeline run endpoints

use reqwest::RequestBuilder;
use tekwatch_core::domain::endpoint::Endpoint;
use tekwatch_core::domain::pipeline_run::PipelineRunList;
use tracing::debug;

use crate::TektonClient;
use crate::error::Result;

/// Label Tekton Triggers puts on every resource created for an event
pub const TRIGGER_EVENT_LABEL: &str = "triggers.tekton.dev/triggers-eventid";

impl TektonClient {
    /// List the pipeline runs created for a trigger event
    ///
    /// An empty list is a valid answer: the event listener may not have
    /// created the run yet.
    pub async fn get_pipeline_runs(
        &self,
        endpoint: &Endpoint,
        trigger_id: &str,
    ) -> Result<PipelineRunList> {
        debug!("Querying {} for trigger event {}", endpoint, trigger_id);

        let response = self
            .pipeline_runs_request(endpoint, trigger_id)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    fn pipeline_runs_request(&self, endpoint: &Endpoint, trigger_id: &str) -> RequestBuilder {
        let url = self.tekton_collection_url(endpoint, "pipelineruns");
        let selector = format!("{}={}", TRIGGER_EVENT_LABEL, trigger_id);

        self.get(&url).query(&[("labelSelector", selector)])
    }
}
