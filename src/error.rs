use std::fmt;

use thiserror::Error;

use crate::template::TemplateError;

#[derive(Debug, Error)]
pub enum DatasourceError {
    #[error("Unknown endpoint: {0}")]
    EndpointNotFound(String),

    #[error("Invalid datasource configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Invalid HTTP method {0:?}")]
    InvalidMethod(String),

    #[error("Invalid URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("form-data body must be a JSON object: {0}")]
    FormBody(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    HttpResponse(#[from] HttpResponseError),

    #[error("Failed to decode JSON response (status {status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
}

pub type DatasourceResult<T> = Result<T, DatasourceError>;

impl DatasourceError {
    /// Status code of the upstream response, when the failure carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            DatasourceError::HttpResponse(err) => Some(err.status),
            DatasourceError::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A response the datasource could not accept, kept whole for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponseError {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponseError {
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }
}

impl fmt::Display for HttpResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP response error: status {}", self.status)?;
        if !self.body.is_empty() {
            write!(f, ": {}", truncate(&self.body, 200))?;
        }
        Ok(())
    }
}

impl std::error::Error for HttpResponseError {}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
