//! Resolved runtime configuration.
//!
//! Layering, lowest first: built-in defaults, the settings file, then
//! environment variables (including those loaded from `.env`).

mod database;
pub(crate) mod helpers;
mod server;

use std::path::PathBuf;

pub use database::DatabaseConfig;
pub use server::{LoggingConfig, ServerConfig};

use crate::error::ConfigError;
use crate::settings::Settings;

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            database: DatabaseConfig::resolve(settings)?,
            server: ServerConfig::resolve(settings)?,
            logging: LoggingConfig::resolve(settings)?,
        })
    }
}

/// `~/.casedesk`, or `./.casedesk` when no home directory is known.
pub fn casedesk_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".casedesk")
}

pub fn default_libsql_path() -> PathBuf {
    casedesk_home().join("casedesk.db")
}

pub fn default_settings_path() -> PathBuf {
    casedesk_home().join("settings.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_defaults() {
        if std::env::vars().any(|(k, _)| k.starts_with("CASEDESK_") || k.starts_with("LIBSQL_")) {
            return;
        }
        let config = Config::resolve(&Settings::default()).expect("config");
        assert_eq!(config.server.bind.to_string(), "127.0.0.1:8000");
        assert_eq!(config.server.body_limit, 1024 * 1024);
        assert!(!config.logging.json);
        assert!(config.database.libsql_url.is_none());
    }

    #[test]
    fn default_paths_live_under_casedesk_home() {
        assert!(default_libsql_path().ends_with(".casedesk/casedesk.db"));
        assert!(default_settings_path().ends_with(".casedesk/settings.toml"));
    }
}
