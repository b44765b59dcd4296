//! Repository Module
//!
//! SQLite data access as free async functions. Reads take any executor
//! (pool or open transaction); multi-statement writes take the caller's
//! transaction so they join its atomic unit.

pub mod member_level;
pub mod menu_item;
pub mod order;
pub mod point_transaction;
pub mod points_account;

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepoError::NotFound("row not found".into()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepoError::Duplicate(db_err.message().to_string())
            }
            other => RepoError::Database(other.to_string()),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::AlreadyExists, msg),
            RepoError::Validation(msg) => AppError::validation(msg),
            RepoError::Database(msg) => {
                tracing::error!(error = %msg, "Database error occurred");
                AppError::database(msg)
            }
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Transaction handle threaded through multi-statement writes
pub type Tx<'c> = sqlx::Transaction<'c, sqlx::Sqlite>;

/// Decimal amount -> cents column value
pub(crate) fn cents(value: rust_decimal::Decimal, field: &str) -> RepoResult<i64> {
    crate::money::to_cents(value)
        .ok_or_else(|| RepoError::Validation(format!("{field} out of range: {value}")))
}
