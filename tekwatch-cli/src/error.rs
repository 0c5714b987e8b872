//! Error types for locating and watching a pipeline run

use std::time::Duration;
use tekwatch_client::ClientError;
use thiserror::Error;

/// Exit status when the run never shows up
pub const EXIT_RETRY_EXHAUSTED: i32 = 2;

/// Exit status when a located run disappears or stops answering
pub const EXIT_RUN_VANISHED: i32 = 3;

/// Exit status when the total watch duration is exceeded (as `timeout(1)`)
pub const EXIT_WATCH_TIMEOUT: i32 = 124;

/// Exit status after ctrl-c (128 + SIGINT)
pub const EXIT_CANCELLED: i32 = 130;

/// Failure to find the pipeline run for a trigger event
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Every queried endpoint answered, none has a matching run (yet)
    #[error("no pipeline run found for trigger event {trigger_id}")]
    NotFound { trigger_id: String },

    /// Every queried endpoint failed
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Fatal watch outcomes
///
/// A failed pipeline step is not one of them: that is reported through
/// `WatchOutcome::StepFailed`.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("gave up locating the pipeline run after {attempts} attempt(s)")]
    RetryBudgetExhausted { attempts: u32 },

    #[error("pipeline run {run} stopped answering after {attempts} attempt(s)")]
    RunVanished { run: String, attempts: u32 },

    #[error("watch did not finish within {0:?}")]
    WatchTimeout(Duration),

    #[error("watch cancelled")]
    Cancelled,
}

impl WatchError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            WatchError::RetryBudgetExhausted { .. } => EXIT_RETRY_EXHAUSTED,
            WatchError::RunVanished { .. } => EXIT_RUN_VANISHED,
            WatchError::WatchTimeout(_) => EXIT_WATCH_TIMEOUT,
            WatchError::Cancelled => EXIT_CANCELLED,
        }
    }
}
