use diesel::result::Error as DieselError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImportError>;

/// Custom error type for commit operations
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Integrity violation: {0}")]
    Integrity(String),
    #[error("Staged row already committed: {0}")]
    Conflict(String),
}

impl From<DieselError> for ImportError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(diesel::result::DatabaseErrorKind::UniqueViolation, info) => {
                ImportError::Integrity(info.message().to_string())
            }
            _ => ImportError::DatabaseError(err.to_string()),
        }
    }
}
