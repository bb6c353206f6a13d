use std::net::SocketAddr;

use crate::config::helpers::{parse_bool_env, parse_env, parse_string_env, parse_value};
use crate::error::ConfigError;
use crate::settings::Settings;

/// HTTP listener settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Maximum accepted request body, in bytes.
    pub body_limit: usize,
}

impl ServerConfig {
    pub(crate) fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let bind_raw = parse_string_env("CASEDESK_BIND", settings.server.bind.clone())?;
        let bind = parse_value::<SocketAddr>("CASEDESK_BIND", &bind_raw)?;
        let body_limit = parse_env("CASEDESK_BODY_LIMIT", settings.server.body_limit)?;
        validate_body_limit(body_limit)?;
        Ok(Self { bind, body_limit })
    }
}

fn validate_body_limit(limit: usize) -> Result<(), ConfigError> {
    if limit == 0 {
        return Err(ConfigError::InvalidValue {
            key: "CASEDESK_BODY_LIMIT".to_string(),
            message: "body limit must be greater than zero".to_string(),
        });
    }
    Ok(())
}

/// Log output settings. Filtering is `RUST_LOG`'s job.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub json: bool,
}

impl LoggingConfig {
    pub(crate) fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            json: parse_bool_env("CASEDESK_LOG_JSON", settings.logging.json)?,
        })
    }
}
