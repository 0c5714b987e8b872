//! Tekwatch HTTP Client
//!
//! A small, type-safe client for the parts of the Tekton and Kubernetes REST
//! APIs needed to follow a pipeline run: pipeline runs by trigger event id,
//! task runs by pipeline run, and container logs.
//!
//! Requests are issued against an explicit [`Endpoint`] rather than a fixed
//! base URL, because the watcher may have to probe several API servers
//! before it knows which one hosts the run.
//!
//! # Example
//!
//! ```no_run
//! use tekwatch_client::{PipelineApi, TektonClient};
//! use tekwatch_core::domain::endpoint::Endpoint;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = TektonClient::new("tekton-pipelines");
//!     let endpoint = Endpoint::new("http://tekton-dashboard.tekton-pipelines:9097");
//!
//!     let runs = client.list_pipeline_runs(&endpoint, "0f3c9e2a").await?;
//!     println!("Found {} pipeline run(s)", runs.len());
//!     Ok(())
//! }
//! ```

mod api;
pub mod error;
mod pipeline_runs;
mod pods;
mod task_runs;

// Re-export commonly used types
pub use api::PipelineApi;
pub use error::{ClientError, Result};

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tekwatch_core::domain::endpoint::Endpoint;

/// Tekton API group and version the watcher talks to
pub const TEKTON_API_PATH: &str = "apis/tekton.dev/v1beta1";

/// Header carrying the token for the SSO proxy in front of the dashboard
pub const SSO_HEADER: &str = "x-mesh-sso";

/// Highest status code treated as success
const MAX_SUCCESS_STATUS: u16 = 202;

/// HTTP client for the Tekton API
///
/// Holds what is constant for the process (namespace, token, connection
/// pool); the endpoint is passed per call.
#[derive(Debug, Clone)]
pub struct TektonClient {
    /// Namespace every query is scoped to
    namespace: String,
    /// Bearer token; requests are unauthenticated when absent
    token: Option<String>,
    /// HTTP client instance
    client: Client,
}

impl TektonClient {
    /// Create a new client for a namespace
    ///
    /// # Example
    /// ```
    /// use tekwatch_client::TektonClient;
    ///
    /// let client = TektonClient::new("tekton-pipelines");
    /// assert_eq!(client.namespace(), "tekton-pipelines");
    /// ```
    pub fn new(namespace: impl Into<String>) -> Self {
        Self::with_client(namespace, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use tekwatch_client::TektonClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = TektonClient::with_client("tekton-pipelines", http_client);
    /// ```
    pub fn with_client(namespace: impl Into<String>, client: Client) -> Self {
        Self {
            namespace: namespace.into(),
            token: None,
            client,
        }
    }

    /// Attach a bearer token to every request
    ///
    /// An empty token is treated as no token.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    // =============================================================================
    // Request Building
    // =============================================================================

    /// Start a GET request with authentication headers applied
    fn get(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url);

        match &self.token {
            Some(token) => request
                .header(SSO_HEADER, token)
                .header(reqwest::header::AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    /// URL of a Tekton resource collection in the configured namespace
    fn tekton_collection_url(&self, endpoint: &Endpoint, resource: &str) -> String {
        format!(
            "{}/{}/namespaces/{}/{}/",
            endpoint, TEKTON_API_PATH, self.namespace, resource
        )
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Reject responses above the success threshold, keeping the body as message
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if status.as_u16() > MAX_SUCCESS_STATUS {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("Unknown error").to_string()
            } else {
                body
            };
            return Err(ClientError::http(status.as_u16(), message));
        }

        Ok(response)
    }

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::Decode(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response with a plain-text body
    async fn handle_text_response(response: reqwest::Response) -> Result<String> {
        let response = Self::check_status(response).await?;

        response
            .text()
            .await
            .map_err(|e| ClientError::Decode(format!("Failed to read response body: {}", e)))
    }
}
