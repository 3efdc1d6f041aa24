use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DatasourceError, DatasourceResult};
use crate::executor::Authorization;

fn default_method() -> String {
    "GET".to_string()
}

/// A named request template. Every string field is rendered against the data context.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Endpoint {
    #[serde(default = "default_method")]
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: Vec<HeaderTemplate>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub body_type: Option<String>,
}

impl Endpoint {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Vec::new(),
            body: None,
            body_type: None,
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(HeaderTemplate {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_body(mut self, body: impl Into<String>, body_type: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self.body_type = Some(body_type.into());
        self
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct HeaderTemplate {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct OutboundMapping {
    pub property: String,
    pub value: Value,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DataMapping {
    pub key: String,
    pub value: String,
}

/// Per-call settings supplied by the workflow step.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestConfig {
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outbound_config: Option<Vec<OutboundMapping>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_mapping: Option<Vec<DataMapping>>,
}

impl RequestConfig {
    pub fn for_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }
}

/// On-disk shape of a datasource.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DatasourceDefinition {
    pub endpoints: HashMap<String, Endpoint>,
    pub authtype: Option<String>,
    pub credentials: Option<Value>,
    #[serde(flatten)]
    pub extras: HashMap<String, Value>,
}

#[derive(Debug, Clone)]
pub struct Datasource {
    pub endpoints: HashMap<String, Endpoint>,
    pub authorization: Authorization,
}

impl Datasource {
    pub fn new(endpoints: HashMap<String, Endpoint>, authorization: Authorization) -> Self {
        Self {
            endpoints,
            authorization,
        }
    }

    pub fn from_definition(definition: DatasourceDefinition) -> DatasourceResult<Self> {
        let authorization = Authorization::resolve(
            definition.authtype.as_deref(),
            definition.credentials.as_ref(),
        )?;
        Ok(Self::new(definition.endpoints, authorization))
    }

    pub fn endpoint(&self, name: &str) -> DatasourceResult<&Endpoint> {
        self.endpoints
            .get(name)
            .ok_or_else(|| DatasourceError::EndpointNotFound(name.to_string()))
    }
}
