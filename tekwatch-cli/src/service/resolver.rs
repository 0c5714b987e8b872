//! Endpoint resolution
//!
//! Several API servers may be configured (one per cluster, for instance).
//! Only one of them hosts the run for a given trigger event; the first one
//! found to do so is remembered for the rest of the process.

use tekwatch_client::PipelineApi;
use tekwatch_core::domain::endpoint::Endpoint;
use tekwatch_core::domain::pipeline_run::PipelineRunList;
use tracing::{debug, info, warn};

use crate::error::ResolveError;

/// A pipeline run together with the endpoint that reported it
#[derive(Debug, Clone)]
pub struct LocatedRun {
    pub endpoint: Endpoint,
    pub runs: PipelineRunList,
}

/// Picks the endpoint that hosts the run and caches it
pub struct EndpointResolver {
    candidates: Vec<Endpoint>,
    active: Option<Endpoint>,
}

impl EndpointResolver {
    pub fn new(candidates: Vec<Endpoint>) -> Self {
        Self {
            candidates,
            active: None,
        }
    }

    /// Finds the run for `trigger_id`
    ///
    /// With a cached winner or a single configured endpoint, that endpoint is
    /// queried directly and its errors are returned as-is. Otherwise the
    /// candidates are probed in order: empty answers and failing candidates
    /// are skipped, and the first candidate with a matching run wins.
    ///
    /// # Errors
    /// - `ResolveError::NotFound` if no candidate has the run (yet)
    /// - `ResolveError::Client` if every candidate request failed
    pub async fn resolve(
        &mut self,
        api: &dyn PipelineApi,
        trigger_id: &str,
    ) -> Result<LocatedRun, ResolveError> {
        let fixed = match (&self.active, self.candidates.as_slice()) {
            (Some(active), _) => Some(active.clone()),
            (None, [only]) => Some(only.clone()),
            _ => None,
        };

        if let Some(endpoint) = fixed {
            let runs = api.list_pipeline_runs(&endpoint, trigger_id).await?;
            if runs.is_empty() {
                return Err(ResolveError::NotFound {
                    trigger_id: trigger_id.to_string(),
                });
            }
            self.active = Some(endpoint.clone());
            return Ok(LocatedRun { endpoint, runs });
        }

        let mut answered = false;
        let mut last_error = None;

        for candidate in &self.candidates {
            match api.list_pipeline_runs(candidate, trigger_id).await {
                Ok(runs) if !runs.is_empty() => {
                    info!(
                        "Endpoint {} hosts the pipeline run for trigger event {}",
                        candidate, trigger_id
                    );
                    self.active = Some(candidate.clone());
                    return Ok(LocatedRun {
                        endpoint: candidate.clone(),
                        runs,
                    });
                }
                Ok(_) => {
                    debug!("No pipeline run for {} on {}", trigger_id, candidate);
                    answered = true;
                }
                Err(e) => {
                    warn!("Skipping endpoint {}: {}", candidate, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !answered => Err(ResolveError::Client(e)),
            _ => Err(ResolveError::NotFound {
                trigger_id: trigger_id.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeApi, run_list};

    fn endpoints(urls: &[&str]) -> Vec<Endpoint> {
        urls.iter().map(|u| Endpoint::new(*u)).collect()
    }

    #[tokio::test]
    async fn test_picks_first_candidate_with_run_and_caches_it() {
        let api = FakeApi::new();
        api.push_runs("http://b", Ok(run_list("build-1", false)));

        let mut resolver =
            EndpointResolver::new(endpoints(&["http://a", "http://b", "http://c"]));

        let located = resolver.resolve(&*api, "evt").await.unwrap();
        assert_eq!(located.endpoint, Endpoint::new("http://b"));
        assert_eq!(located.runs.name(), Some("build-1"));
        assert_eq!(api.run_queries(), vec!["http://a", "http://b"]);

        resolver.resolve(&*api, "evt").await.unwrap();
        resolver.resolve(&*api, "evt").await.unwrap();
        assert_eq!(
            api.run_queries(),
            vec!["http://a", "http://b", "http://b", "http://b"]
        );
    }

    #[tokio::test]
    async fn test_failing_candidate_is_skipped() {
        let api = FakeApi::new();
        api.push_runs("http://a", Err(503));
        api.push_runs("http://b", Ok(run_list("build-1", false)));

        let mut resolver = EndpointResolver::new(endpoints(&["http://a", "http://b"]));

        let located = resolver.resolve(&*api, "evt").await.unwrap();
        assert_eq!(located.endpoint, Endpoint::new("http://b"));
    }

    #[tokio::test]
    async fn test_not_found_when_all_candidates_empty() {
        let api = FakeApi::new();
        let mut resolver = EndpointResolver::new(endpoints(&["http://a", "http://b"]));

        let result = resolver.resolve(&*api, "evt").await;
        assert!(matches!(result, Err(ResolveError::NotFound { .. })));

        // nothing cached, every candidate is probed again
        let _ = resolver.resolve(&*api, "evt").await;
        assert_eq!(api.run_queries().len(), 4);
    }

    #[tokio::test]
    async fn test_not_found_when_some_candidates_fail() {
        let api = FakeApi::new();
        api.push_runs("http://a", Err(500));

        let mut resolver = EndpointResolver::new(endpoints(&["http://a", "http://b"]));

        let result = resolver.resolve(&*api, "evt").await;
        assert!(matches!(result, Err(ResolveError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_client_error_when_every_candidate_fails() {
        let api = FakeApi::new();
        api.push_runs("http://a", Err(500));
        api.push_runs("http://b", Err(502));

        let mut resolver = EndpointResolver::new(endpoints(&["http://a", "http://b"]));

        match resolver.resolve(&*api, "evt").await {
            Err(ResolveError::Client(e)) => assert_eq!(e.status(), Some(502)),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_single_endpoint_errors_are_returned() {
        let api = FakeApi::new();
        api.push_runs("http://only", Err(401));

        let mut resolver = EndpointResolver::new(endpoints(&["http://only"]));

        let result = resolver.resolve(&*api, "evt").await;
        assert!(matches!(result, Err(ResolveError::Client(_))));
    }

    #[tokio::test]
    async fn test_not_found_keeps_cached_endpoint() {
        let api = FakeApi::new();
        api.push_runs("http://b", Ok(run_list("build-1", false)));
        api.push_runs("http://b", Ok(PipelineRunList::default()));

        let mut resolver = EndpointResolver::new(endpoints(&["http://a", "http://b"]));

        resolver.resolve(&*api, "evt").await.unwrap();
        let result = resolver.resolve(&*api, "evt").await;
        assert!(matches!(result, Err(ResolveError::NotFound { .. })));
        assert_eq!(api.run_queries(), vec!["http://a", "http://b", "http://b"]);
    }
}
