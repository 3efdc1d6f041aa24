use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};

use super::model::{DatasourceDefinition, RequestConfig};

pub const DEFINITION_FILE: &str = "datasource.json";

#[derive(Debug, Clone)]
pub struct LoadedDefinition {
    pub definition: DatasourceDefinition,
    pub path: PathBuf,
}

/// Loads a datasource definition from a file, or from `datasource.json` inside a directory.
pub fn load_definition(target: &Path) -> Result<LoadedDefinition> {
    let resolved = if target.is_absolute() {
        target.to_path_buf()
    } else {
        std::env::current_dir()?.join(target)
    };

    let file_path = if resolved.is_dir() {
        resolved.join(DEFINITION_FILE)
    } else {
        resolved
    };

    if !file_path.exists() {
        bail!("datasource definition not found: {}", file_path.display());
    }

    let contents = fs::read_to_string(&file_path)
        .with_context(|| format!("reading datasource {}", file_path.display()))?;

    let definition: DatasourceDefinition = serde_json::from_str(&contents)
        .with_context(|| format!("parsing datasource {}", file_path.display()))?;

    tracing::debug!(
        path = %file_path.display(),
        endpoints = definition.endpoints.len(),
        "loaded datasource definition"
    );

    Ok(LoadedDefinition {
        definition,
        path: file_path,
    })
}

pub fn load_request_config(path: &Path) -> Result<RequestConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading request config {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("parsing request config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn errors_when_definition_missing() -> Result<()> {
        let temp = tempdir()?;
        let err = load_definition(temp.path()).unwrap_err();
        assert!(err.to_string().contains("datasource definition not found"));
        Ok(())
    }

    #[test]
    fn loads_definition_from_directory() -> Result<()> {
        let temp = tempdir()?;
        let path = temp.path().join(DEFINITION_FILE);
        std::fs::write(
            &path,
            r#"{"endpoints":{"ping":{"method":"GET","url":"https://example.com/ping"}}}"#,
        )?;

        let loaded = load_definition(temp.path())?;
        assert_eq!(loaded.path, path);
        assert!(loaded.definition.endpoints.contains_key("ping"));
        assert!(loaded.definition.authtype.is_none());
        Ok(())
    }

    #[test]
    fn reports_parse_errors_with_path() -> Result<()> {
        let temp = tempdir()?;
        let path = temp.path().join("broken.json");
        std::fs::write(&path, "{ not json")?;

        let err = load_definition(&path).unwrap_err();
        assert!(err.to_string().contains("parsing datasource"));
        assert!(err.to_string().contains("broken.json"));
        Ok(())
    }

    #[test]
    fn loads_request_config() -> Result<()> {
        let temp = tempdir()?;
        let path = temp.path().join("config.json");
        std::fs::write(&path, r#"{"endpoint":"ping","queryString":"a=1"}"#)?;

        let config = load_request_config(&path)?;
        assert_eq!(config.endpoint, "ping");
        assert_eq!(config.query_string.as_deref(), Some("a=1"));
        Ok(())
    }
}
