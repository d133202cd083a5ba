//! Unified application error type.
//! All modules (db, core, remote, cli) return AppError to keep the error
//! handling consistent and easy to manage.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Serialization
    // ---------------------------
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // ---------------------------
    // Parsing errors
    // ---------------------------
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    #[error("Invalid color '{0}': expected #RRGGBB")]
    InvalidColor(String),

    #[error("Unknown {kind} variant: '{value}'")]
    UnknownVariant { kind: &'static str, value: String },

    // ---------------------------
    // Domain / validation errors
    // ---------------------------
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Category limit reached ({limit}). Upgrade to Premium for unlimited categories")]
    CategoryLimit { limit: i32 },

    #[error("Category '{0}' is still used by time blocks")]
    CategoryInUse(String),

    // ---------------------------
    // Auth / remote
    // ---------------------------
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Remote store error: {0}")]
    Remote(String),

    // ---------------------------
    // Background jobs
    // ---------------------------
    #[error("Job error: {0}")]
    Job(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

impl AppError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        AppError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn unknown_variant(kind: &'static str, value: impl Into<String>) -> Self {
        AppError::UnknownVariant {
            kind,
            value: value.into(),
        }
    }

    /// Wrap into a rusqlite conversion failure so row mappers can bubble it up.
    pub fn into_sql(self, column: usize) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Text,
            Box::new(self),
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
