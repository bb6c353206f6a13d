use std::path::PathBuf;

use secrecy::SecretString;

use crate::config::helpers::optional_env;
use crate::error::ConfigError;
use crate::settings::Settings;

/// libSQL connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Local database file (or replica file when `libsql_url` is set).
    /// `None` means [`super::default_libsql_path`].
    pub libsql_path: Option<PathBuf>,
    pub libsql_url: Option<String>,
    pub libsql_auth_token: Option<SecretString>,
}

impl DatabaseConfig {
    pub(crate) fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let libsql_path = optional_env("LIBSQL_PATH")?
            .or_else(|| settings.database.libsql_path.clone())
            .map(|raw| PathBuf::from(raw.trim()));
        let libsql_url = optional_env("LIBSQL_URL")?
            .or_else(|| settings.database.libsql_url.clone())
            .map(|raw| raw.trim().to_string())
            .filter(|url| !url.is_empty());
        let libsql_auth_token = optional_env("LIBSQL_AUTH_TOKEN")?.map(SecretString::from);

        Self::validate(libsql_path, libsql_url, libsql_auth_token)
    }

    fn validate(
        libsql_path: Option<PathBuf>,
        libsql_url: Option<String>,
        libsql_auth_token: Option<SecretString>,
    ) -> Result<Self, ConfigError> {
        if libsql_url.is_some() && libsql_auth_token.is_none() {
            return Err(ConfigError::InvalidValue {
                key: "LIBSQL_AUTH_TOKEN".to_string(),
                message: "required when LIBSQL_URL is set".to_string(),
            });
        }
        Ok(Self {
            libsql_path,
            libsql_url,
            libsql_auth_token,
        })
    }
}
