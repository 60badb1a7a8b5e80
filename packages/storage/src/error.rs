// ABOUTME: Storage error type shared by the repository and the services
// ABOUTME: Classifies database constraint failures into domain error variants

use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("{0}")]
    NotFound(String),
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("Reference constraint violated: {0}")]
    ReferenceViolation(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    Multiplicity(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// Map a sqlx error from a write path, recognising constraint failures
    pub fn classify(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return Self::UniqueViolation(db_err.message().to_string());
            }
            if db_err.is_foreign_key_violation() {
                return Self::ReferenceViolation(db_err.message().to_string());
            }
        }
        Self::Sqlx(err)
    }

    /// Errors caused by the caller's input rather than by the service itself
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::Sqlx(_) | Self::Migration(_) | Self::Io(_)
        )
    }
}
