//! Endpoint domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Base address of an upstream Tekton API (e.g. "http://tekton-dashboard:9097")
///
/// Trailing slashes are trimmed so paths can be appended with `format!`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint(String);

impl Endpoint {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self(base_url.trim().trim_end_matches('/').to_string())
    }

    /// Parses a comma-separated list of addresses
    ///
    /// Entries are whitespace-trimmed and empty entries are discarded,
    /// so `"a, ,b,"` yields two endpoints.
    pub fn parse_list(raw: &str) -> Vec<Endpoint> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Endpoint::new)
            .collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Endpoint {
    fn from(s: &str) -> Self {
        Endpoint::new(s)
    }
}
