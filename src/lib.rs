//! One-shot client for the `getProblem` endpoint: post the fixed query,
//! print the JSON reply or the reason there is none.

pub mod adapter;
pub mod config;
pub mod logging;
pub mod mock;
pub mod payload;
pub mod runner;

pub use reqwest::Method;

pub use adapter::{
    Client, ReqwestTransport, RestBytes, RestError, RestErrorKind, RestFuture, RestRequest,
    RestResponse, RestResult, RestTransport,
};
pub use config::RunnerConfig;
pub use mock::{
    MockBehavior, MockBehaviorPlan, MockResponse, MockRestAdapter, MockRestStateSnapshot,
};
pub use payload::ProblemQuery;
pub use runner::{Outcome, Runner};
