use diesel::result::Error as DieselError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StagingError>;

/// Custom error type for staging-store operations
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<DieselError> for StagingError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => StagingError::NotFound("Record not found".to_string()),
            _ => StagingError::DatabaseError(err.to_string()),
        }
    }
}
