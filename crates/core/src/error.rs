// Central Error Type for the Application

use thiserror::Error;

use crate::security::{IdentifierError, VaultError};

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("credential error: {0}")]
    Vault(#[from] VaultError),

    #[error("identifier error: {0}")]
    Identifier(#[from] IdentifierError),

    #[error("database error: {0}")]
    Database(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("job {0} already has a run in progress")]
    AlreadyRunning(i64),

    #[error("run cancelled by shutdown signal")]
    Cancelled,

    #[error("invalid schedule: {0}")]
    Schedule(String),

    #[error("workbook error: {0}")]
    Workbook(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// From implementation for infra crates (to avoid circular dependency)
impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Database(err)
    }
}

// Note: sqlx::Error conversion is handled in the infra-sqlite crate
// by converting to AppError::Database(String)
