//! Error types shared across the crate.

use thiserror::Error;

/// Configuration resolution failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("failed to parse settings file {path}: {reason}")]
    ParseError { path: String, reason: String },

    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
}

/// Persistence-layer failures.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("connection error: {0}")]
    Pool(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("LibSQL error: {0}")]
    LibSql(#[from] libsql::Error),
}

impl DatabaseError {
    /// True when the underlying store rejected a write on a UNIQUE constraint.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::LibSql(err) => err.to_string().contains("UNIQUE constraint failed"),
            Self::Query(msg) => msg.contains("UNIQUE constraint failed"),
            _ => false,
        }
    }

    /// The column named in a UNIQUE violation, e.g. `cases.short_name`.
    pub fn unique_violation_column(&self) -> Option<String> {
        if !self.is_unique_violation() {
            return None;
        }
        let text = self.to_string();
        let (_, tail) = text.split_once("UNIQUE constraint failed: ")?;
        let column = tail
            .split(|c: char| c == ',' || c.is_whitespace())
            .next()
            .map(|column| column.trim_matches(|c: char| c == '`' || c == '\'' || c == '"'))
            .filter(|column| !column.is_empty())?;
        Some(column.to_string())
    }
}

/// HTTP server lifecycle failures.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("server failed to start: {reason}")]
    StartupFailed { reason: String },
}

/// Template rendering failures.
#[derive(Debug, Error)]
#[error("failed to render template '{template}': {source}")]
pub struct RenderError {
    pub template: String,
    #[source]
    pub source: tera::Error,
}

/// Failures of a case-work operation.
#[derive(Debug, Error)]
pub enum CaseworkError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}
