use std::time::Duration;

use serde_json::Value;

use crate::transport::StepResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
            Method::Head => reqwest::Method::HEAD,
        }
    }
}

pub type CheckFn = fn(&StepResponse) -> bool;

/// A named assertion about a response, counted as a pass or a fail every time it is evaluated.
#[derive(Clone)]
pub struct Check {
    name: String,
    predicate: CheckFn,
}

impl Check {
    pub fn new(name: impl Into<String>, predicate: CheckFn) -> Self {
        Self {
            name: name.into(),
            predicate,
        }
    }

    /// Passes for any 2xx status.
    pub fn status_success(name: impl Into<String>) -> Self {
        Self::new(name, |response| response.is_success())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn evaluate(&self, response: &StepResponse) -> bool {
        (self.predicate)(response)
    }
}

impl std::fmt::Debug for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Check").field("name", &self.name).finish()
    }
}

/// Copies a value out of a JSON response body into the iteration context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extractor {
    /// RFC 6901 JSON pointer into the response body, e.g. `/id`.
    pub pointer: String,
    /// The context key the value is stored under.
    pub key: String,
}

impl Extractor {
    pub fn json_pointer(pointer: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            pointer: pointer.into(),
            key: key.into(),
        }
    }
}

/// The request a step sends. The URL and string values in the body may contain `{key}`
/// placeholders that are filled from the iteration context.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestTemplate {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

/// One unit of work in a [Scenario].
#[derive(Debug, Clone)]
pub struct Step {
    name: String,
    metric_name: Option<String>,
    request: RequestTemplate,
    check: Check,
    extractors: Vec<Extractor>,
    delay: Duration,
    required: bool,
}

impl Step {
    /// A step with a 2xx status check named after the step, no pacing delay, and not required.
    pub fn new(name: impl Into<String>, method: Method, url: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            check: Check::status_success(format!("status 2xx ({})", name)),
            name,
            metric_name: None,
            request: RequestTemplate {
                method,
                url: url.into(),
                body: None,
                headers: Vec::new(),
            },
            extractors: Vec::new(),
            delay: Duration::ZERO,
            required: false,
        }
    }

    pub fn get(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(name, Method::Get, url)
    }

    pub fn post(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(name, Method::Post, url)
    }

    pub fn put(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(name, Method::Put, url)
    }

    pub fn patch(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(name, Method::Patch, url)
    }

    pub fn delete(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(name, Method::Delete, url)
    }

    pub fn with_json_body(mut self, body: Value) -> Self {
        self.request.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.headers.push((name.into(), value.into()));
        self
    }

    /// Replace the default 2xx check.
    pub fn with_check(mut self, name: impl Into<String>, predicate: CheckFn) -> Self {
        self.check = Check::new(name, predicate);
        self
    }

    pub fn extract(mut self, pointer: impl Into<String>, key: impl Into<String>) -> Self {
        self.extractors.push(Extractor::json_pointer(pointer, key));
        self
    }

    /// Pacing delay applied after the step unless the iteration aborted.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Abort the iteration if this step's check fails or its request cannot be completed.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Record durations under a different name than the step name.
    pub fn with_metric_name(mut self, metric_name: impl Into<String>) -> Self {
        self.metric_name = Some(metric_name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metric_name(&self) -> &str {
        self.metric_name.as_deref().unwrap_or(&self.name)
    }

    pub fn request(&self) -> &RequestTemplate {
        &self.request
    }

    pub fn check(&self) -> &Check {
        &self.check
    }

    pub fn extractors(&self) -> &[Extractor] {
        &self.extractors
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// An ordered list of steps. Built once, then shared read-only by every virtual user.
#[derive(Debug, Clone, Default)]
pub struct Scenario {
    name: String,
    steps: Vec<Step>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
