use diesel::result::Error as DieselError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StockError>;

/// Custom error type for stock reconciliation operations
#[derive(Debug, Error)]
pub enum StockError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Unknown market key: {0}")]
    UnknownMarket(String),
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("Verification failed: {0}")]
    VerificationFailed(String),
}

impl From<DieselError> for StockError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => StockError::NotFound("Record not found".to_string()),
            _ => StockError::DatabaseError(err.to_string()),
        }
    }
}

impl From<StockError> for String {
    fn from(error: StockError) -> Self {
        error.to_string()
    }
}
