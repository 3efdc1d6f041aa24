use serde_json::{Map, Value};

use crate::context::{get_path, set_path, DataContext};
use crate::datasource::DataMapping;
use crate::error::{DatasourceError, DatasourceResult, HttpResponseError};

use super::transport::RawResponse;

/// Interprets `response` and projects it through `mappings`.
///
/// Only 2xx statuses are accepted. A 200 body is decoded as JSON, any other
/// success status yields an empty object. Mapping paths are read from the data
/// context overlaid with the decoded content.
pub(crate) fn map_response(
    response: RawResponse,
    data: &DataContext,
    mappings: &[DataMapping],
) -> DatasourceResult<Map<String, Value>> {
    let status = response.status;
    let content = match status {
        200 => decode_body(&response)?,
        201..=299 => Value::Object(Map::new()),
        _ => {
            let body = response.text();
            return Err(HttpResponseError {
                status,
                headers: response.headers,
                body,
            }
            .into());
        }
    };

    let merged = merge_content(data, &content);

    let mut result = Map::new();
    result.insert("status".to_string(), Value::from(status));
    result.insert("response".to_string(), content);

    for mapping in mappings {
        let value = merged
            .as_ref()
            .and_then(|merged| get_path(merged, &mapping.value))
            .cloned()
            .unwrap_or_else(|| Value::String(String::new()));
        set_path(&mut result, &mapping.key, value);
    }

    Ok(result)
}

fn decode_body(response: &RawResponse) -> DatasourceResult<Value> {
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&response.body).map_err(|source| DatasourceError::Decode {
        status: response.status,
        source,
    })
}

fn merge_content(data: &DataContext, content: &Value) -> Option<Map<String, Value>> {
    let mut merged = data.clone();
    match content {
        Value::Object(fields) => {
            merged.extend(fields.iter().map(|(key, value)| (key.clone(), value.clone())));
        }
        Value::Array(items) => {
            merged.extend(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, value)| (index.to_string(), value.clone())),
            );
        }
        _ => return None,
    }
    Some(merged)
}
