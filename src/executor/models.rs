use serde_json::{Map, Value};

use crate::context::DataContext;

/// Body type that switches the payload to url-encoded form parameters.
pub const FORM_DATA: &str = "form-data";

pub const AUTHORIZATION: &str = "Authorization";

/// Fully rendered request, ready to hand to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub body_type: String,
}

impl PreparedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Replaces an existing header in place, or appends it.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        set_header(&mut self.headers, name.into(), value.into());
    }

    pub fn is_form_data(&self) -> bool {
        self.body_type == FORM_DATA
    }
}

pub(crate) fn set_header(headers: &mut Vec<(String, String)>, name: String, value: String) {
    match headers
        .iter_mut()
        .find(|(key, _)| key.eq_ignore_ascii_case(&name))
    {
        Some(existing) => *existing = (name, value),
        None => headers.push((name, value)),
    }
}

/// Output of request preparation: the request plus the context it was rendered with.
#[derive(Debug, Clone)]
pub struct Preparation {
    pub request: PreparedRequest,
    pub context: DataContext,
}

#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// Skip TLS certificate verification for every call.
    pub accept_invalid_certs: bool,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            accept_invalid_certs: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestSummary {
    pub method: String,
    pub url: String,
    pub body_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct RequestOutcome {
    pub request: RequestSummary,
    pub status: u16,
    /// `{status, response, ...mapped}` as handed back to the workflow.
    pub result: Map<String, Value>,
    /// Caller's data context after outbound mapping.
    pub context: DataContext,
    pub duration_ms: f64,
}

impl RequestOutcome {
    pub fn response(&self) -> Option<&Value> {
        self.result.get("response")
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.result)
    }
}
