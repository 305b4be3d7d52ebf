use std::time::{Duration, Instant};

use async_trait::async_trait;
use breeze_core::prelude::{RequestError, RequestErrorKind};
use serde_json::Value;

use crate::scenario::Method;

/// A request with every placeholder filled, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

/// What came back from the target for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResponse {
    status: u16,
    body: String,
    elapsed: Duration,
}

impl StepResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            elapsed: Duration::ZERO,
        }
    }

    /// Set the time it took to receive the full response.
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// The body parsed as JSON, if it is JSON.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Sends requests on behalf of virtual users.
///
/// Implementations must only suspend the calling virtual user while waiting, and must report the
/// time taken to receive the response through [StepResponse::elapsed].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: PreparedRequest) -> Result<StepResponse, RequestError>;
}

/// [Transport] over HTTP(S) using a pooled `reqwest` client shared by all virtual users.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(request_timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("breeze/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: PreparedRequest) -> Result<StepResponse, RequestError> {
        let mut builder = self.client.request(request.method.into(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let started = Instant::now();
        let response = builder.send().await.map_err(request_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(request_error)?;

        Ok(StepResponse::new(status, body).with_elapsed(started.elapsed()))
    }
}

fn request_error(e: reqwest::Error) -> RequestError {
    let kind = if e.is_timeout() {
        RequestErrorKind::Timeout
    } else if e.is_connect() {
        RequestErrorKind::Connect
    } else {
        RequestErrorKind::Other
    };

    RequestError::new(kind, e.to_string())
}
