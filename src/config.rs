//! Endpoint and deadline for the single request.

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://162.105.151.213:2000";
pub const PROBLEM_PATH: &str = "/api/problem/getProblem";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const CONTENT_TYPE_JSON: &str = "application/json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Full URL of the `getProblem` endpoint.
    pub url: String,
    /// Deadline for the whole round trip.
    pub timeout: Duration,
}

impl RunnerConfig {
    /// Targets `PROBLEM_PATH` on another host, e.g. `http://127.0.0.1:8080`.
    pub fn for_base_url(base_url: &str) -> Self {
        Self {
            url: format!("{}{}", base_url.trim_end_matches('/'), PROBLEM_PATH),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::for_base_url(DEFAULT_BASE_URL)
    }
}

