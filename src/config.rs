use std::{env, path::Path};

use serde::Deserialize;

use crate::error::{DashboardError, Result};

/// Environment variable holding the serving process' base URL.
pub const URL_VAR: &str = "MODEL_API_URL";

/// Where the serving process listens when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Connection settings for the model serving process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    base_url: String,
}

impl DashboardConfig {
    /// Creates a new `DashboardConfig`.
    ///
    /// # Args
    /// * `base_url` - Root URL of the serving process, e.g. `http://host:8000`.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the URL is not an http(s) URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');

        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(DashboardError::InvalidConfig(format!(
                "base url must start with http:// or https://, got '{base_url}'"
            )));
        }

        Ok(Self {
            base_url: base_url.to_string(),
        })
    }

    /// Reads the base URL from `MODEL_API_URL`, falling back to the default.
    pub fn from_env() -> Result<Self> {
        match env::var(URL_VAR) {
            Ok(url) if !url.trim().is_empty() => Self::new(&url),
            _ => Self::new(DEFAULT_BASE_URL),
        }
    }

    /// Loads the configuration from a JSON file of the form `{ "base_url": "..." }`.
    ///
    /// # Errors
    /// Returns `Io` if the file cannot be read and `InvalidConfig` if it
    /// cannot be parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let file: ConfigFile = serde_json::from_str(&content).map_err(|e| {
            DashboardError::InvalidConfig(format!("invalid JSON in '{}': {e}", path.display()))
        })?;

        Self::new(&file.base_url)
    }

    /// Picks the configuration source from an optional command line argument.
    ///
    /// A `.json` argument is a config file, any other argument is a base URL
    /// and no argument means the environment.
    pub fn resolve(arg: Option<&str>) -> Result<Self> {
        match arg {
            Some(arg) if arg.ends_with(".json") => Self::load(arg),
            Some(url) => Self::new(url),
            None => Self::from_env(),
        }
    }

    /// Returns the base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins an endpoint path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = DashboardConfig::new("http://localhost:8000/").unwrap();
        assert_eq!(config.base_url(), "http://localhost:8000");
        assert_eq!(
            config.endpoint("/modelInfo"),
            "http://localhost:8000/modelInfo"
        );
    }

    #[test]
    fn test_rejects_non_http_url() {
        let err = DashboardConfig::new("localhost:8000").unwrap_err();
        assert!(matches!(err, DashboardError::InvalidConfig(_)));
    }

    #[test]
    fn test_load_from_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{ "base_url": "https://models.internal/api/" }}"#).unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = DashboardConfig::resolve(Some(&path)).unwrap();
        assert_eq!(config.base_url(), "https://models.internal/api");
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{ base_url: ").unwrap();

        let err = DashboardConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, DashboardError::InvalidConfig(_)));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");

        let err = DashboardConfig::resolve(path.to_str()).unwrap_err();
        match err {
            DashboardError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("expected io error, got {other}"),
        }
    }

    #[test]
    fn test_resolve_plain_argument_is_url() {
        let config = DashboardConfig::resolve(Some("http://10.0.0.7:9000")).unwrap();
        assert_eq!(config.endpoint("predict"), "http://10.0.0.7:9000/predict");
    }
}
