pub(crate) mod stocks_constants;
pub(crate) mod stocks_errors;
pub(crate) mod stocks_model;
pub(crate) mod stocks_repository;
pub(crate) mod stocks_service;
pub(crate) mod stocks_traits;

pub use stocks_constants::*;
pub use stocks_errors::StockError;
pub use stocks_model::{
    MarketCode, Stock, StockActionOutcome, StockAssignment, StockDB, VerificationResult,
    VerificationStatus,
};
pub use stocks_repository::StockRepository;
pub use stocks_service::StockService;
pub use stocks_traits::{StockRepositoryTrait, StockServiceTrait};
