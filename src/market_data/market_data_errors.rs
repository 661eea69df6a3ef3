use thiserror::Error;

pub type Result<T> = std::result::Result<T, MarketDataError>;

#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Parsing error: {0}")]
    ParsingError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),
}

impl MarketDataError {
    /// Transient failures are worth another attempt; the rest fail fast.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MarketDataError::NetworkError(_)
                | MarketDataError::RateLimitExceeded
                | MarketDataError::Timeout(_)
        )
    }
}
