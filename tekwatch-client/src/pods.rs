//! Pod log endpoint (core Kubernetes API)

use reqwest::RequestBuilder;
use tekwatch_core::domain::endpoint::Endpoint;
use tracing::debug;

use crate::TektonClient;
use crate::error::{ClientError, Result};

impl TektonClient {
    /// Fetch the complete current log of one container
    ///
    /// The API has no offset or "since" support for this use, so the whole
    /// log from the start is returned on every call.
    pub async fn get_container_log(
        &self,
        endpoint: &Endpoint,
        pod: &str,
        container: &str,
    ) -> Result<String> {
        if pod.is_empty() || container.is_empty() {
            return Err(ClientError::InvalidRequest(format!(
                "pod and container are required (pod='{}', container='{}')",
                pod, container
            )));
        }

        debug!("Fetching log of {}/{}", pod, container);

        let response = self
            .container_log_request(endpoint, pod, container)
            .send()
            .await?;

        Self::handle_text_response(response).await
    }

    fn container_log_request(
        &self,
        endpoint: &Endpoint,
        pod: &str,
        container: &str,
    ) -> RequestBuilder {
        let url = format!(
            "{}/api/v1/namespaces/{}/pods/{}/log",
            endpoint, self.namespace, pod
        );

        self.get(&url).query(&[("container", container)])
    }
}
