use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE},
    Client, Method,
};
use serde_json::{Map, Value};

use crate::error::{DatasourceError, DatasourceResult};

use super::models::{ExecutorOptions, PreparedRequest, AUTHORIZATION};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Status, headers and body of a completed call, before any interpretation.
#[derive(Debug, Clone)]
pub(crate) struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub(crate) fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub(crate) struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub(crate) fn new(options: &ExecutorOptions) -> DatasourceResult<Self> {
        if options.accept_invalid_certs {
            tracing::warn!("TLS certificate verification is disabled for datasource requests");
        }
        let client = Client::builder()
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .build()?;
        Ok(Self { client })
    }

    pub(crate) async fn send(&self, request: &PreparedRequest) -> DatasourceResult<RawResponse> {
        let method = parse_method(&request.method)?;
        let url = reqwest::Url::parse(&request.url).map_err(|source| DatasourceError::InvalidUrl {
            url: request.url.clone(),
            source,
        })?;
        let mut headers = build_headers(&request.headers)?;

        let payload = if request.is_form_data() {
            if !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
            }
            Some(encode_form_body(&request.body)?)
        } else if request.body.is_empty() {
            None
        } else {
            Some(request.body.clone())
        };

        tracing::debug!(
            method = %method,
            url = %url,
            headers = ?redacted_headers(&request.headers),
            body_type = %request.body_type,
            body_bytes = payload.as_ref().map(|body| body.len()).unwrap_or(0),
            "sending datasource request"
        );

        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(body) = payload {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let body = response.bytes().await?.to_vec();

        tracing::debug!(status, body_bytes = body.len(), "received datasource response");

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

fn parse_method(raw: &str) -> DatasourceResult<Method> {
    let normalized = raw.trim().to_ascii_uppercase();
    if normalized.is_empty() {
        return Err(DatasourceError::InvalidMethod(raw.to_string()));
    }
    Method::from_bytes(normalized.as_bytes())
        .map_err(|_| DatasourceError::InvalidMethod(raw.to_string()))
}

fn build_headers(headers: &[(String, String)]) -> DatasourceResult<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name =
            HeaderName::from_bytes(name.trim().as_bytes()).map_err(|err| {
                DatasourceError::InvalidHeader {
                    name: name.clone(),
                    reason: err.to_string(),
                }
            })?;
        let header_value =
            HeaderValue::from_str(value.trim()).map_err(|err| DatasourceError::InvalidHeader {
                name: name.clone(),
                reason: err.to_string(),
            })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// Turns a JSON object body into `application/x-www-form-urlencoded` text.
///
/// A blank or `null` body carries no form parameters.
pub(crate) fn encode_form_body(body: &str) -> DatasourceResult<String> {
    if body.trim().is_empty() {
        return Ok(String::new());
    }
    let fields = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(fields)) => fields,
        Ok(Value::Null) => return Ok(String::new()),
        Ok(other) => return Err(DatasourceError::FormBody(format!("found {other}"))),
        Err(err) => return Err(DatasourceError::FormBody(err.to_string())),
    };

    let mut pairs = Vec::new();
    flatten_object(None, &fields, &mut pairs);

    Ok(url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish())
}

fn flatten_object(prefix: Option<&str>, fields: &Map<String, Value>, out: &mut Vec<(String, String)>) {
    for (key, value) in fields {
        let name = match prefix {
            Some(prefix) => format!("{prefix}[{key}]"),
            None => key.clone(),
        };
        flatten_value(name, value, out);
    }
}

fn flatten_value(name: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(flag) => out.push((name, if *flag { "1" } else { "0" }.to_string())),
        Value::Number(number) => out.push((name, number.to_string())),
        Value::String(text) => out.push((name, text.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_value(format!("{name}[{index}]"), item, out);
            }
        }
        Value::Object(fields) => flatten_object(Some(&name), fields, out),
    }
}

fn collect_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect()
}

fn redacted_headers(headers: &[(String, String)]) -> Vec<(&str, &str)> {
    headers
        .iter()
        .map(|(name, value)| {
            if name.eq_ignore_ascii_case(AUTHORIZATION) {
                (name.as_str(), "<redacted>")
            } else {
                (name.as_str(), value.as_str())
            }
        })
        .collect()
}
