use std::{fs, io::Cursor, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;

use super::{set_path, DataContext};

pub fn load_data_file(path: &Path) -> Result<DataContext> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading data file {}", path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("parsing data file {}", path.display()))?;

    match value {
        Value::Object(map) => Ok(map),
        other => bail!(
            "data file {} must contain a JSON object, found {}",
            path.display(),
            json_kind(&other)
        ),
    }
}

pub fn load_env_file(path: &Path, context: &mut DataContext) -> Result<()> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading env file {}", path.display()))?;
    let iter = dotenvy::from_read_iter(Cursor::new(content));

    for item in iter {
        let (key, value) = item.with_context(|| format!("parsing env file {}", path.display()))?;
        context.insert(key, Value::String(value));
    }

    Ok(())
}

/// Applies a `path=value` assignment; the value is taken as JSON when it parses.
pub fn apply_assignment(assignment: &str, context: &mut DataContext) -> Result<()> {
    let (key, raw) = assignment
        .split_once('=')
        .ok_or_else(|| anyhow!("Invalid variable assignment (expected KEY=VALUE): {assignment}"))?;
    let key = key.trim();
    if key.is_empty() {
        bail!("Invalid variable assignment (empty key): {assignment}");
    }

    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    set_path(context, key, value);
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
