//! Container log state
//!
//! The pod log endpoint only ever returns the whole log from the start, so
//! each poll re-fetches everything and subtracts what was already shown.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies one container log stream
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerKey {
    pub pod: String,
    pub container: String,
}

impl ContainerKey {
    pub fn new(pod: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            pod: pod.into(),
            container: container.into(),
        }
    }
}

impl fmt::Display for ContainerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.pod, self.container)
    }
}

/// How the newly appended part of a log is computed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogDiffMode {
    /// Remove every occurrence of the previous text from the new text.
    ///
    /// Repeated content that matches the whole previous log is suppressed too.
    #[default]
    Substring,
    /// Keep the part of the new text beyond the previous text's length.
    ///
    /// If the new text does not start with the previous text (container
    /// restarted) the whole new text is kept.
    Prefix,
}

impl LogDiffMode {
    pub fn diff(self, previous: &str, current: &str) -> String {
        if previous.is_empty() {
            return current.to_string();
        }

        match self {
            LogDiffMode::Substring => current.replace(previous, ""),
            LogDiffMode::Prefix => current
                .strip_prefix(previous)
                .unwrap_or(current)
                .to_string(),
        }
    }
}

impl FromStr for LogDiffMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "substring" => Ok(LogDiffMode::Substring),
            "prefix" => Ok(LogDiffMode::Prefix),
            other => Err(format!(
                "unknown log diff mode '{}' (expected 'substring' or 'prefix')",
                other
            )),
        }
    }
}

impl fmt::Display for LogDiffMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogDiffMode::Substring => f.write_str("substring"),
            LogDiffMode::Prefix => f.write_str("prefix"),
        }
    }
}

/// Everything seen so far for one container, plus the latest tail
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerLogState {
    logs: String,
    tail: String,
}

impl ContainerLogState {
    /// State for a container seen for the first time; the tail is the whole text
    pub fn new(logs: impl Into<String>) -> Self {
        let logs = logs.into();
        Self {
            tail: logs.clone(),
            logs,
        }
    }

    /// Records a fresh full fetch and recomputes the tail against the previous one
    pub fn append(&mut self, logs: impl Into<String>, mode: LogDiffMode) {
        let logs = logs.into();
        self.tail = mode.diff(&self.logs, &logs);
        self.logs = logs;
    }

    pub fn logs(&self) -> &str {
        &self.logs
    }

    pub fn tail(&self) -> &str {
        &self.tail
    }

    /// True if the tail has something other than whitespace to show
    pub fn has_output(&self) -> bool {
        !self.tail.trim().is_empty()
    }
}
