use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use bytes::Bytes;
use reqwest::Method;
use serde::Serialize;
use sonic_rs::to_vec;

use super::adapter::{
    RestBytes, RestError, RestErrorKind, RestFuture, RestRequest, RestResponse, RestResult,
    RestTransport,
};

#[derive(Clone, Debug, Default)]
pub enum MockBehavior {
    #[default]
    Pass,
    Delay(Duration),
    ConnectError {
        reason: String,
    },
    SendError {
        reason: String,
    },
    ReceiveError {
        status: Option<u16>,
        reason: String,
    },
    TimeoutError {
        reason: String,
    },
    InternalError {
        reason: String,
    },
}

impl MockBehavior {
    pub fn pass() -> Self {
        Self::Pass
    }

    pub fn delay(ms: u64) -> Self {
        Self::Delay(Duration::from_millis(ms))
    }

    pub fn connect_error(reason: impl Into<String>) -> Self {
        Self::ConnectError {
            reason: reason.into(),
        }
    }

    pub fn send_error(reason: impl Into<String>) -> Self {
        Self::SendError {
            reason: reason.into(),
        }
    }

    pub fn receive_error(reason: impl Into<String>, status: Option<u16>) -> Self {
        Self::ReceiveError {
            status,
            reason: reason.into(),
        }
    }

    pub fn timeout_error(reason: impl Into<String>) -> Self {
        Self::TimeoutError {
            reason: reason.into(),
        }
    }

    pub fn internal_error(reason: impl Into<String>) -> Self {
        Self::InternalError {
            reason: reason.into(),
        }
    }
}

/// FIFO of behaviors applied one per request; an empty plan passes.
#[derive(Clone, Debug, Default)]
pub struct MockBehaviorPlan {
    request: VecDeque<MockBehavior>,
}

impl MockBehaviorPlan {
    pub fn push(&mut self, behavior: MockBehavior) -> &mut Self {
        self.request.push_back(behavior);
        self
    }

    pub fn pop(&mut self) -> MockBehavior {
        self.request.pop_front().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.request.len()
    }

    pub fn is_empty(&self) -> bool {
        self.request.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, RestBytes)>,
    pub body: RestBytes,
}

impl MockResponse {
    pub fn new(status: u16, body: impl Into<RestBytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<RestBytes>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, body.into())
    }

    pub fn json<T: Serialize>(status: u16, payload: &T) -> RestResult<Self> {
        let body = to_vec(payload).map_err(RestError::from)?;
        Ok(Self::new(status, body).with_header("content-type", "application/json"))
    }
}

#[derive(Clone, Debug)]
pub struct MockRestStateSnapshot {
    pub request_count: usize,
    pub last_url: Option<String>,
    pub last_status: Option<u16>,
    pub behavior_remaining: usize,
    pub response_queue_len: usize,
    pub outbound_count: usize,
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct MockRestAdapterState {
    request_count: usize,
    last_url: Option<String>,
    last_status: Option<u16>,
    behavior_plan: MockBehaviorPlan,
    route_response_queues: HashMap<(Method, String), VecDeque<MockResponse>>,
    outbound_log: Vec<RestRequest>,
    last_error: Option<String>,
}

impl MockRestAdapterState {
    fn snapshot(&self) -> MockRestStateSnapshot {
        MockRestStateSnapshot {
            request_count: self.request_count,
            last_url: self.last_url.clone(),
            last_status: self.last_status,
            behavior_remaining: self.behavior_plan.len(),
            response_queue_len: self
                .route_response_queues
                .values()
                .map(VecDeque::len)
                .sum(),
            outbound_count: self.outbound_log.len(),
            last_error: self.last_error.clone(),
        }
    }
}

/// In-memory transport. Clones share state, so a test can keep one handle
/// for inspection and hand another to the `Client`.
#[derive(Clone, Debug, Default)]
pub struct MockRestAdapter {
    state: Arc<Mutex<MockRestAdapterState>>,
}

impl MockRestAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior_plan(behavior_plan: MockBehaviorPlan) -> Self {
        let state = MockRestAdapterState {
            behavior_plan,
            ..MockRestAdapterState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockRestAdapterState> {
        // A panicking test thread must not hide the log from the others.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> MockRestStateSnapshot {
        self.lock().snapshot()
    }

    pub fn queue_response_for(
        &self,
        method: Method,
        url: impl Into<String>,
        response: MockResponse,
    ) {
        self.lock()
            .route_response_queues
            .entry((method, url.into()))
            .or_default()
            .push_back(response);
    }

    pub fn queue_post_response(&self, url: impl Into<String>, response: MockResponse) {
        self.queue_response_for(Method::POST, url, response);
    }

    pub fn outbound(&self) -> Vec<RestRequest> {
        self.lock().outbound_log.clone()
    }

    pub fn last_request(&self) -> Option<RestRequest> {
        self.lock().outbound_log.last().cloned()
    }

    fn next_response(&self, request: &RestRequest) -> Option<MockResponse> {
        let route_key = (request.method.clone(), request.url.clone());
        self.lock()
            .route_response_queues
            .get_mut(&route_key)
            .and_then(VecDeque::pop_front)
    }

    fn fail(&self, kind: RestErrorKind, status: Option<u16>, message: String) -> RestError {
        let mut state = self.lock();
        state.last_error = Some(message.clone());
        state.last_status = status;
        RestError::new(kind, status, message)
    }
}

impl RestTransport for MockRestAdapter {
    fn execute(&self, request: RestRequest) -> RestFuture<RestResult<RestResponse>> {
        let adapter = self.clone();
        Box::pin(async move {
            let start = Instant::now();
            let behavior = {
                let mut state = adapter.lock();
                state.request_count += 1;
                state.last_url = Some(request.url.clone());
                state.last_error = None;
                state.outbound_log.push(request.clone());
                state.behavior_plan.pop()
            };

            match behavior {
                MockBehavior::Pass => {}
                MockBehavior::Delay(delay) => match request.timeout {
                    Some(timeout) if delay > timeout => {
                        tokio::time::sleep(timeout).await;
                        return Err(adapter.fail(
                            RestErrorKind::Timeout,
                            None,
                            format!("mock transport exceeded deadline of {timeout:?}"),
                        ));
                    }
                    _ => tokio::time::sleep(delay).await,
                },
                MockBehavior::ConnectError { reason } => {
                    return Err(adapter.fail(RestErrorKind::Connect, None, reason));
                }
                MockBehavior::SendError { reason } => {
                    return Err(adapter.fail(RestErrorKind::Send, None, reason));
                }
                MockBehavior::ReceiveError { status, reason } => {
                    return Err(adapter.fail(RestErrorKind::Receive, status, reason));
                }
                MockBehavior::TimeoutError { reason } => {
                    return Err(adapter.fail(RestErrorKind::Timeout, None, reason));
                }
                MockBehavior::InternalError { reason } => {
                    return Err(adapter.fail(RestErrorKind::Internal, None, reason));
                }
            }

            let response = adapter
                .next_response(&request)
                .unwrap_or_else(|| MockResponse::new(200, Bytes::new()));
            adapter.lock().last_status = Some(response.status);

            Ok(RestResponse {
                status: response.status,
                headers: response.headers,
                body: response.body,
                elapsed: start.elapsed(),
            })
        })
    }
}
