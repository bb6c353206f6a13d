//! On-disk settings file (`~/.casedesk/settings.toml`).
//!
//! Settings are the lowest configuration layer: environment variables override
//! them in [`crate::config::Config::resolve`]. Secrets never live here.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub server: ServerSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub libsql_path: Option<String>,
    pub libsql_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
    pub body_limit: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub json: bool,
}

impl Settings {
    /// Load settings from `path`, or from the default location when `None`.
    /// A missing file yields defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let default_path = crate::config::default_settings_path();
        let path = path.unwrap_or(&default_path);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw).map_err(|reason| ConfigError::ParseError {
            path: path.display().to_string(),
            reason,
        })
    }

    fn from_toml(raw: &str) -> Result<Self, String> {
        toml::from_str(raw).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let settings = Settings::from_toml("").expect("empty toml");
        assert_eq!(settings.server.bind, DEFAULT_BIND);
        assert_eq!(settings.server.body_limit, DEFAULT_BODY_LIMIT);
        assert!(!settings.logging.json);
        assert!(settings.database.libsql_path.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let settings = Settings::from_toml(
            r#"
[server]
bind = "0.0.0.0:9000"

[database]
libsql_path = "/var/lib/casedesk/db.sqlite"
"#,
        )
        .expect("valid toml");
        assert_eq!(settings.server.bind, "0.0.0.0:9000");
        assert_eq!(settings.server.body_limit, DEFAULT_BODY_LIMIT);
        assert_eq!(
            settings.database.libsql_path.as_deref(),
            Some("/var/lib/casedesk/db.sqlite")
        );
    }

    #[test]
    fn load_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[server\nbind = 1").expect("write");

        let err = Settings::load(Some(&path)).expect_err("malformed toml");
        let ConfigError::ParseError { path: reported, .. } = err else {
            panic!("expected ParseError");
        };
        assert!(reported.ends_with("settings.toml"));
    }

    #[test]
    fn load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = Settings::load(Some(&dir.path().join("absent.toml"))).expect("defaults");
        assert_eq!(settings.server.bind, DEFAULT_BIND);
    }
}
