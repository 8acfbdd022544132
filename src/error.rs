//! Error taxonomy shared by every public boundary in the crate.
//!
//! Handlers and repositories return `Result<T>` from here; only truly ad-hoc
//! internal plumbing uses `anyhow::Result` directly.

use std::fmt;

pub type Result<T> = std::result::Result<T, CuratorError>;

/// Stable, machine-readable error kind. The out-of-scope REST surface maps these
/// to status codes (404/409/422/500); the job queue maps them to retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Transient,
    Permanent,
    Unknown,
}

#[derive(Debug, thiserror::Error)]
pub enum CuratorError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("validation failed: {message}")]
    Validation { message: String },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("transient error: {source}")]
    Transient { source: anyhow::Error },

    #[error("permanent error: {message}")]
    Permanent { message: String },

    #[error("unknown error: {source}")]
    Unknown { source: anyhow::Error },
}

impl CuratorError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict { message: message.into() }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self::Permanent { message: message.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Transient { .. } => ErrorKind::Transient,
            Self::Permanent { .. } => ErrorKind::Permanent,
            Self::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// Drives the job queue's retry-vs-fail branch.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::Unknown { .. })
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation => "validation",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Transient => "transient",
            ErrorKind::Permanent => "permanent",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

impl From<sqlx::Error> for CuratorError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => CuratorError::NotFound { kind: "row", id: "?".into() },
            other => CuratorError::Transient { source: other.into() },
        }
    }
}

impl From<std::io::Error> for CuratorError {
    fn from(e: std::io::Error) -> Self {
        CuratorError::Transient { source: e.into() }
    }
}

impl From<reqwest::Error> for CuratorError {
    fn from(e: reqwest::Error) -> Self {
        if e.status().map(|s| s.as_u16()) == Some(404) {
            CuratorError::NotFound { kind: "provider_resource", id: e.url().map(|u| u.to_string()).unwrap_or_default() }
        } else {
            CuratorError::Transient { source: e.into() }
        }
    }
}

impl From<sqlx::migrate::MigrateError> for CuratorError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        CuratorError::Unknown { source: e.into() }
    }
}

impl From<anyhow::Error> for CuratorError {
    fn from(e: anyhow::Error) -> Self {
        CuratorError::Unknown { source: e }
    }
}
