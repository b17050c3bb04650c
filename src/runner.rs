//! Build the query, send it once, classify what came back.

use std::fmt;

use reqwest::header::CONTENT_TYPE;
use sonic_rs::Value;
use tracing::{debug, info, warn};

use crate::adapter::{Client, RestError, RestErrorKind, RestRequest, RestResult};
use crate::config::{CONTENT_TYPE_JSON, RunnerConfig};
use crate::payload::ProblemQuery;

pub const TIMEOUT_MESSAGE: &str = "请求超时";
pub const REQUEST_ERROR_PREFIX: &str = "请求错误: ";
pub const DECODE_ERROR_PREFIX: &str = "响应解析错误: ";

/// Result of one round trip. `Display` renders the line written to stdout.
#[derive(Debug)]
pub enum Outcome {
    Success { status: u16, body: Value },
    Timeout,
    RequestFailed(RestError),
    Undecodable(RestError),
}

impl Outcome {
    fn classify(err: RestError) -> Self {
        match err.kind() {
            RestErrorKind::Timeout => Self::Timeout,
            RestErrorKind::Parse => Self::Undecodable(err),
            RestErrorKind::Connect
            | RestErrorKind::Send
            | RestErrorKind::Receive
            | RestErrorKind::Internal => Self::RequestFailed(err),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Success { body, .. } => Some(body),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { body, .. } => {
                let text = sonic_rs::to_string(body).map_err(|_| fmt::Error)?;
                f.write_str(&text)
            }
            Self::Timeout => f.write_str(TIMEOUT_MESSAGE),
            Self::RequestFailed(err) => write!(f, "{REQUEST_ERROR_PREFIX}{err}"),
            Self::Undecodable(err) => write!(f, "{DECODE_ERROR_PREFIX}{err}"),
        }
    }
}

pub struct Runner {
    client: Client,
    config: RunnerConfig,
    query: ProblemQuery,
}

impl Runner {
    pub fn new(config: RunnerConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: RunnerConfig) -> Self {
        Self {
            client,
            config,
            query: ProblemQuery::fixed(),
        }
    }

    pub fn request(&self) -> RestResult<RestRequest> {
        let body = self.query.to_body()?;
        Ok(RestRequest::post(self.config.url.as_str())
            .with_header(CONTENT_TYPE.as_str(), CONTENT_TYPE_JSON)
            .with_body(body)
            .with_timeout(self.config.timeout))
    }

    async fn round_trip(&self) -> RestResult<(u16, Value)> {
        let request = self.request()?;
        let response = self.client.execute(request).await?;
        if !response.is_success() {
            // The body is still decoded and printed; only logged here.
            debug!(status = response.status(), "non-success status");
        }
        let body = response.json::<Value>()?;
        Ok((response.status(), body))
    }

    /// Never fails: every error ends up as an `Outcome` variant.
    pub async fn run(&self) -> Outcome {
        info!(
            url = %self.config.url,
            display_id = self.query.display_id(),
            timeout = ?self.config.timeout,
            "fetching problem"
        );
        match self.round_trip().await {
            Ok((status, body)) => Outcome::Success { status, body },
            Err(err) => {
                warn!(kind = ?err.kind(), status = ?err.status(), error = %err, "request failed");
                Outcome::classify(err)
            }
        }
    }
}

