//! Run watcher
//!
//! Drives one watch session from trigger event to exit status:
//! locate the pipeline run (retrying until it shows up), stream the logs of
//! its steps on every poll, and report the first failing step once the run
//! has completed.

use std::future::Future;
use tekwatch_core::domain::endpoint::Endpoint;
use tekwatch_core::domain::pipeline_run::PipelineRunList;
use tekwatch_core::domain::task_run::{StepFailure, TaskRunList};
use tokio::time::{self, Duration};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{ResolveError, WatchError};
use crate::service::{LogTailer, RunLocator};
use crate::sink::LogSink;

/// Cadence and limits of a watch session
#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub retry_max: u32,
    pub retry_interval: Duration,
    pub poll_interval: Duration,
    pub watch_timeout: Option<Duration>,
    pub fail_fast: bool,
}

impl From<&Config> for WatchSettings {
    fn from(config: &Config) -> Self {
        Self {
            retry_max: config.retry_max,
            retry_interval: config.retry_interval,
            poll_interval: config.poll_interval,
            watch_timeout: config.watch_timeout,
            fail_fast: config.fail_fast,
        }
    }
}

/// How a watched run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// Run completed without a failing step
    Succeeded { run: String },

    /// A step exited with a nonzero code
    StepFailed { run: String, failure: StepFailure },
}

impl WatchOutcome {
    /// Process exit status for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            WatchOutcome::Succeeded { .. } => 0,
            WatchOutcome::StepFailed { failure, .. } => failure.exit_code,
        }
    }
}

/// Run being streamed from the endpoint that hosts it
struct Streaming {
    endpoint: Endpoint,
    runs: PipelineRunList,
    /// Consecutive re-fetches that failed or came back empty
    failures: u32,
}

enum WatchState {
    Locating { attempts: u32 },
    Streaming(Streaming),
    Done(WatchOutcome),
}

/// One watch session
///
/// Owns the locator (and through it the cached endpoint) and the tailer
/// (and through it the per-container log state).
pub struct RunWatcher<S: LogSink> {
    settings: WatchSettings,
    locator: RunLocator,
    tailer: LogTailer<S>,
}

impl<S: LogSink> RunWatcher<S> {
    pub fn new(settings: WatchSettings, locator: RunLocator, tailer: LogTailer<S>) -> Self {
        Self {
            settings,
            locator,
            tailer,
        }
    }

    /// Watches until the run is done, or `shutdown` resolves first
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<WatchOutcome, WatchError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = self.run() => result,
            _ = shutdown => {
                warn!("Watch cancelled");
                Err(WatchError::Cancelled)
            }
        }
    }

    /// Watches until the run is done, bounded by the configured watch timeout
    pub async fn run(&mut self) -> Result<WatchOutcome, WatchError> {
        match self.settings.watch_timeout {
            Some(limit) => time::timeout(limit, self.watch())
                .await
                .map_err(|_| WatchError::WatchTimeout(limit))?,
            None => self.watch().await,
        }
    }

    async fn watch(&mut self) -> Result<WatchOutcome, WatchError> {
        info!(
            "Watching pipeline run for trigger event {} (retry interval: {:?}, poll interval: {:?})",
            self.locator.trigger_id(),
            self.settings.retry_interval,
            self.settings.poll_interval
        );

        let mut state = WatchState::Locating { attempts: 0 };

        loop {
            state = match state {
                WatchState::Locating { attempts } => self.locate(attempts).await?,
                WatchState::Streaming(streaming) => self.stream(streaming).await?,
                WatchState::Done(outcome) => return Ok(outcome),
            };
        }
    }

    /// One lookup of the run
    async fn locate(&mut self, attempts: u32) -> Result<WatchState, WatchError> {
        let err = match self.locator.locate().await {
            Ok(located) => {
                info!(
                    "Found pipeline run {} on {}",
                    located.runs.name().unwrap_or_default(),
                    located.endpoint
                );
                return Ok(WatchState::Streaming(Streaming {
                    endpoint: located.endpoint,
                    runs: located.runs,
                    failures: 0,
                }));
            }
            Err(e) => e,
        };

        let attempts = attempts + 1;
        if attempts > self.settings.retry_max {
            error!("Giving up after {} attempt(s): {}", attempts, err);
            return Err(WatchError::RetryBudgetExhausted { attempts });
        }

        match &err {
            ResolveError::NotFound { .. } => debug!("{} (attempt {})", err, attempts),
            ResolveError::Client(e) => warn!("Lookup failed (attempt {}): {}", attempts, e),
        }

        time::sleep(self.settings.retry_interval).await;
        Ok(WatchState::Locating { attempts })
    }

    /// One poll cycle of a located run
    ///
    /// Logs are tailed before the completion check so the cycle that sees
    /// the run complete still prints the last lines.
    async fn stream(&mut self, mut streaming: Streaming) -> Result<WatchState, WatchError> {
        let run = streaming.runs.name().unwrap_or_default().to_string();

        let tailed = match self.tailer.tail(&streaming.endpoint, &run).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to tail pipeline run {}: {}", run, e);
                false
            }
        };

        if self.settings.fail_fast {
            if let Some(failure) = self.tailer.task_runs().and_then(TaskRunList::first_failure) {
                warn!(
                    "Step {}/{} failed with exit code {}, not waiting for the run to finish",
                    failure.pod_name, failure.container, failure.exit_code
                );
                return Ok(WatchState::Done(WatchOutcome::StepFailed { run, failure }));
            }
        }

        if streaming.runs.is_complete() {
            let tailed = tailed || self.tail_again(&streaming.endpoint, &run).await;

            // No step has been seen yet, so there is no exit status to report
            if self.tailer.task_runs().is_none() {
                warn!("Pipeline run {} is complete but its task runs are unreadable", run);
                self.record_failure(&mut streaming, &run)?;
                time::sleep(self.settings.retry_interval).await;
                return Ok(WatchState::Streaming(streaming));
            }

            let outcome = self.finish(&streaming, run, tailed);
            return Ok(WatchState::Done(outcome));
        }

        time::sleep(self.settings.poll_interval).await;

        match self.locator.find_run(&streaming.endpoint).await {
            Ok(runs) if !runs.is_empty() => {
                streaming.runs = runs;
                streaming.failures = 0;
            }
            Ok(_) => {
                warn!("Pipeline run {} is no longer listed", run);
                self.record_failure(&mut streaming, &run)?;
            }
            Err(e) => {
                warn!("Failed to refresh pipeline run {}: {}", run, e);
                self.record_failure(&mut streaming, &run)?;
            }
        }

        Ok(WatchState::Streaming(streaming))
    }

    fn record_failure(&self, streaming: &mut Streaming, run: &str) -> Result<(), WatchError> {
        streaming.failures += 1;
        if streaming.failures > self.settings.retry_max {
            error!(
                "Pipeline run {} did not answer for {} poll(s)",
                run, streaming.failures
            );
            return Err(WatchError::RunVanished {
                run: run.to_string(),
                attempts: streaming.failures,
            });
        }
        Ok(())
    }

    /// Second tail pass for a completed run whose last pass failed
    async fn tail_again(&mut self, endpoint: &Endpoint, run: &str) -> bool {
        match self.tailer.tail(endpoint, run).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to tail completed pipeline run {} again: {}", run, e);
                false
            }
        }
    }

    /// Builds the outcome of a completed run from its step exit codes
    ///
    /// Expects at least one task run snapshot to have been fetched.
    fn finish(&self, streaming: &Streaming, run: String, tailed: bool) -> WatchOutcome {
        if !tailed {
            warn!(
                "Output of pipeline run {} may be incomplete, using the last task run snapshot",
                run
            );
        }

        if let Some(condition) = streaming.runs.outcome() {
            info!(
                "Pipeline run {} finished: {} {}",
                run,
                condition.reason.as_deref().unwrap_or(&condition.status),
                condition.message.as_deref().unwrap_or_default()
            );
        }

        match self.tailer.task_runs().and_then(TaskRunList::first_failure) {
            Some(failure) => {
                error!(
                    "Step {}/{} of pipeline run {} failed with exit code {}",
                    failure.pod_name, failure.container, run, failure.exit_code
                );
                WatchOutcome::StepFailed { run, failure }
            }
            None => {
                info!(
                    "Pipeline run {} completed successfully ({} container(s) tailed)",
                    run,
                    self.tailer.tracked_containers()
                );
                WatchOutcome::Succeeded { run }
            }
        }
    }
}
