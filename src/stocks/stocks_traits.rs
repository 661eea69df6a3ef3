use crate::errors::Result;

use super::stocks_model::{
    MarketCode, Stock, StockActionOutcome, StockAssignment, VerificationResult,
};

/// Trait defining the contract for stock reconciliation operations.
#[async_trait::async_trait]
pub trait StockServiceTrait: Send + Sync {
    fn list_markets(&self) -> Result<Vec<MarketCode>>;
    fn get_stock(&self, stock_id: &str) -> Result<Stock>;

    /// Binds an instrument code to a market, deriving the external symbol
    /// and invalidating any prior verification.
    fn assign_market(&self, instrument_code: &str, market_key: &str) -> Result<Stock>;

    /// Checks one pending stock against the market-data provider. A provider
    /// failure is recorded on the stock, not propagated.
    async fn verify(&self, instrument_code: &str) -> Result<Stock>;

    /// Fans out verification for each assignment with bounded concurrency.
    /// One failed instrument never blocks the others.
    async fn verify_batch(
        &self,
        assignments: Vec<StockAssignment>,
    ) -> Result<Vec<VerificationResult>>;

    async fn verify_all(&self, stock_ids: Vec<String>) -> Result<Vec<StockActionOutcome>>;
    fn mark_delisted(&self, instrument_code: &str) -> Result<Stock>;
    fn mark_inactive(&self, stock_ids: Vec<String>) -> Result<Vec<StockActionOutcome>>;
    fn reset_status(&self, stock_ids: Vec<String>) -> Result<Vec<StockActionOutcome>>;
}

/// Trait defining the contract for stock repository operations.
pub trait StockRepositoryTrait: Send + Sync {
    fn get_by_id(&self, stock_id: &str) -> super::stocks_errors::Result<Stock>;
    fn get_by_instrument_code(
        &self,
        instrument_code: &str,
    ) -> super::stocks_errors::Result<Option<Stock>>;
    fn get_or_create_pending(&self, instrument_code: &str)
        -> super::stocks_errors::Result<Stock>;
    fn list_by_ids(&self, stock_ids: &[String]) -> super::stocks_errors::Result<Vec<Stock>>;
    fn list_markets(&self) -> super::stocks_errors::Result<Vec<MarketCode>>;
    fn get_market(&self, market_key: &str) -> super::stocks_errors::Result<Option<MarketCode>>;
    fn apply_market_assignment(
        &self,
        stock_id: &str,
        market_key: &str,
        yahoo_symbol: &str,
    ) -> super::stocks_errors::Result<Stock>;
    fn set_verified(
        &self,
        stock_id: &str,
        name: &str,
        currency: &str,
    ) -> super::stocks_errors::Result<Stock>;
    fn set_status(
        &self,
        stock_id: &str,
        status: &str,
        verification_error: Option<String>,
    ) -> super::stocks_errors::Result<Stock>;
}

impl StockRepositoryTrait for super::stocks_repository::StockRepository {
    fn get_by_id(&self, stock_id: &str) -> super::stocks_errors::Result<Stock> {
        self.get_by_id(stock_id)
    }

    fn get_by_instrument_code(
        &self,
        instrument_code: &str,
    ) -> super::stocks_errors::Result<Option<Stock>> {
        self.get_by_instrument_code(instrument_code)
    }

    fn get_or_create_pending(
        &self,
        instrument_code: &str,
    ) -> super::stocks_errors::Result<Stock> {
        self.get_or_create_pending(instrument_code)
    }

    fn list_by_ids(&self, stock_ids: &[String]) -> super::stocks_errors::Result<Vec<Stock>> {
        self.list_by_ids(stock_ids)
    }

    fn list_markets(&self) -> super::stocks_errors::Result<Vec<MarketCode>> {
        self.list_markets()
    }

    fn get_market(&self, market_key: &str) -> super::stocks_errors::Result<Option<MarketCode>> {
        self.get_market(market_key)
    }

    fn apply_market_assignment(
        &self,
        stock_id: &str,
        market_key: &str,
        yahoo_symbol: &str,
    ) -> super::stocks_errors::Result<Stock> {
        self.apply_market_assignment(stock_id, market_key, yahoo_symbol)
    }

    fn set_verified(
        &self,
        stock_id: &str,
        name: &str,
        currency: &str,
    ) -> super::stocks_errors::Result<Stock> {
        self.set_verified(stock_id, name, currency)
    }

    fn set_status(
        &self,
        stock_id: &str,
        status: &str,
        verification_error: Option<String>,
    ) -> super::stocks_errors::Result<Stock> {
        self.set_status(stock_id, status, verification_error)
    }
}
