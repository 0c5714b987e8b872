//! Run locator
//!
//! Looks up the pipeline run of the followed trigger event, first through
//! endpoint resolution, then directly on the endpoint that hosts it.

use std::sync::Arc;
use tekwatch_client::{ClientError, PipelineApi};
use tekwatch_core::domain::endpoint::Endpoint;
use tekwatch_core::domain::pipeline_run::PipelineRunList;
use tracing::debug;

use crate::error::ResolveError;
use crate::service::resolver::{EndpointResolver, LocatedRun};

pub struct RunLocator {
    api: Arc<dyn PipelineApi>,
    resolver: EndpointResolver,
    trigger_id: String,
}

impl RunLocator {
    pub fn new(api: Arc<dyn PipelineApi>, resolver: EndpointResolver, trigger_id: String) -> Self {
        Self {
            api,
            resolver,
            trigger_id,
        }
    }

    pub fn trigger_id(&self) -> &str {
        &self.trigger_id
    }

    /// Resolves the endpoint hosting the run and returns the run from it
    pub async fn locate(&mut self) -> Result<LocatedRun, ResolveError> {
        self.resolver
            .resolve(self.api.as_ref(), &self.trigger_id)
            .await
    }

    /// Fetches a fresh snapshot of the run from a known endpoint
    ///
    /// An empty list is returned as-is; the caller decides what that means.
    pub async fn find_run(&self, endpoint: &Endpoint) -> Result<PipelineRunList, ClientError> {
        let runs = self
            .api
            .list_pipeline_runs(endpoint, &self.trigger_id)
            .await?;

        debug!(
            "Pipeline run {} has {} item(s), complete: {}",
            runs.name().unwrap_or("<none>"),
            runs.len(),
            runs.is_complete()
        );

        Ok(runs)
    }
}
