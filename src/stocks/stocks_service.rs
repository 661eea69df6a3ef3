use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::errors::Result;
use crate::market_data::{InstrumentProfile, MarketDataError, MarketDataProvider};
use crate::stocks::stocks_constants::*;
use crate::stocks::stocks_errors::StockError;
use crate::stocks::stocks_model::*;
use crate::stocks::{StockRepositoryTrait, StockServiceTrait};

/// Service owning the stock verification state machine and the provider
/// round-trips that drive it.
pub struct StockService {
    repository: Arc<dyn StockRepositoryTrait>,
    provider: Arc<dyn MarketDataProvider>,
    verify_concurrency: usize,
}

impl StockService {
    pub fn new(
        repository: Arc<dyn StockRepositoryTrait>,
        provider: Arc<dyn MarketDataProvider>,
    ) -> Self {
        Self {
            repository,
            provider,
            verify_concurrency: DEFAULT_VERIFY_CONCURRENCY,
        }
    }

    /// Overrides the number of provider calls in flight during batch
    /// verification.
    pub fn with_verify_concurrency(mut self, concurrency: usize) -> Self {
        self.verify_concurrency = concurrency.max(1);
        self
    }

    async fn fetch_profile_with_retry(
        &self,
        symbol: &str,
    ) -> std::result::Result<InstrumentProfile, MarketDataError> {
        let mut attempt: u32 = 0;
        loop {
            match self.provider.get_instrument_profile(symbol).await {
                Ok(profile) => return Ok(profile),
                Err(e) if e.is_retryable() && attempt + 1 < VERIFY_MAX_RETRIES => {
                    let wait = VERIFY_BACKOFF_BASE_MS * 2u64.pow(attempt);
                    debug!("Provider error for {}; retrying in {}ms: {}", symbol, wait, e);
                    sleep(Duration::from_millis(wait)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Runs one verification round-trip and records the outcome on the
    /// stock. Provider failures are demoted to FAILED, never propagated.
    async fn verify_stock(&self, stock: &Stock) -> Result<Stock> {
        let status = stock.status();
        if !status.can_transition(VerificationStatus::Verified) {
            return Err(StockError::InvalidTransition {
                from: status.as_str().to_string(),
                to: VerificationStatus::Verified.as_str().to_string(),
            }
            .into());
        }

        let symbol = stock.yahoo_symbol.clone().ok_or_else(|| {
            StockError::InvalidData(format!(
                "Stock '{}' has no market assigned",
                stock.instrument_code
            ))
        })?;

        match self.fetch_profile_with_retry(&symbol).await {
            Ok(profile) => {
                debug!(
                    "Verified {} as {} ({})",
                    stock.instrument_code, profile.name, profile.currency
                );
                Ok(self
                    .repository
                    .set_verified(&stock.id, &profile.name, &profile.currency)?)
            }
            Err(e) => {
                warn!("Verification failed for {}: {}", symbol, e);
                Ok(self.repository.set_status(
                    &stock.id,
                    VERIFICATION_STATUS_FAILED,
                    Some(e.to_string()),
                )?)
            }
        }
    }

    fn assign_market_impl(&self, instrument_code: &str, market_key: &str) -> Result<Stock> {
        let market = self
            .repository
            .get_market(market_key)?
            .ok_or_else(|| StockError::UnknownMarket(market_key.to_string()))?;

        let stock = self
            .repository
            .get_by_instrument_code(instrument_code)?
            .ok_or_else(|| {
                StockError::NotFound(format!("No stock for instrument '{}'", instrument_code))
            })?;

        // The suffix may be empty (US markets); the symbol is still rebuilt
        // and prior verification is invalidated either way.
        let yahoo_symbol = format!("{}{}", stock.instrument_code, market.suffix);
        Ok(self
            .repository
            .apply_market_assignment(&stock.id, &market.market_key, &yahoo_symbol)?)
    }

    /// Assigns then verifies one instrument, flattening the outcome into a
    /// per-item result for batch reporting.
    async fn verify_assignment(&self, assignment: &StockAssignment) -> VerificationResult {
        let assigned = self.assign_market_impl(&assignment.instrument_code, &assignment.market_key);

        let stock = match assigned {
            Ok(stock) => stock,
            Err(e) => {
                return VerificationResult {
                    instrument_code: assignment.instrument_code.clone(),
                    success: false,
                    name: None,
                    currency: None,
                    error: Some(e.to_string()),
                }
            }
        };

        match self.verify_stock(&stock).await {
            Ok(updated) => {
                let verified = updated.status() == VerificationStatus::Verified;
                VerificationResult {
                    instrument_code: updated.instrument_code.clone(),
                    success: verified,
                    name: updated.name.clone(),
                    currency: updated.currency.clone(),
                    error: updated.verification_error.clone(),
                }
            }
            Err(e) => VerificationResult {
                instrument_code: assignment.instrument_code.clone(),
                success: false,
                name: None,
                currency: None,
                error: Some(e.to_string()),
            },
        }
    }
}

#[async_trait::async_trait]
impl StockServiceTrait for StockService {
    fn list_markets(&self) -> Result<Vec<MarketCode>> {
        Ok(self.repository.list_markets()?)
    }

    fn get_stock(&self, stock_id: &str) -> Result<Stock> {
        Ok(self.repository.get_by_id(stock_id)?)
    }

    fn assign_market(&self, instrument_code: &str, market_key: &str) -> Result<Stock> {
        self.assign_market_impl(instrument_code, market_key)
    }

    async fn verify(&self, instrument_code: &str) -> Result<Stock> {
        let stock = self
            .repository
            .get_by_instrument_code(instrument_code)?
            .ok_or_else(|| {
                StockError::NotFound(format!("No stock for instrument '{}'", instrument_code))
            })?;
        self.verify_stock(&stock).await
    }

    async fn verify_batch(
        &self,
        assignments: Vec<StockAssignment>,
    ) -> Result<Vec<VerificationResult>> {
        let mut results = Vec::with_capacity(assignments.len());

        for chunk in assignments.chunks(self.verify_concurrency) {
            let futures: Vec<_> = chunk
                .iter()
                .map(|assignment| self.verify_assignment(assignment))
                .collect();
            results.extend(futures::future::join_all(futures).await);
        }

        let failed = results.iter().filter(|r| !r.success).count();
        if failed > 0 {
            warn!("Batch verification: {}/{} instruments failed", failed, results.len());
        }

        Ok(results)
    }

    async fn verify_all(&self, stock_ids: Vec<String>) -> Result<Vec<StockActionOutcome>> {
        let stocks = self.repository.list_by_ids(&stock_ids)?;
        let mut outcomes = Vec::with_capacity(stocks.len());

        for chunk in stocks.chunks(self.verify_concurrency) {
            let futures: Vec<_> = chunk
                .iter()
                .map(|stock| async move {
                    match self.verify_stock(stock).await {
                        Ok(updated) => StockActionOutcome {
                            stock_id: updated.id.clone(),
                            success: updated.status() == VerificationStatus::Verified,
                            error: updated.verification_error.clone(),
                        },
                        Err(e) => StockActionOutcome {
                            stock_id: stock.id.clone(),
                            success: false,
                            error: Some(e.to_string()),
                        },
                    }
                })
                .collect();
            outcomes.extend(futures::future::join_all(futures).await);
        }

        Ok(outcomes)
    }

    fn mark_delisted(&self, instrument_code: &str) -> Result<Stock> {
        let stock = self
            .repository
            .get_by_instrument_code(instrument_code)?
            .ok_or_else(|| {
                StockError::NotFound(format!("No stock for instrument '{}'", instrument_code))
            })?;
        // Unconditional: delisting is reachable from any state.
        Ok(self
            .repository
            .set_status(&stock.id, VERIFICATION_STATUS_DELISTED, None)?)
    }

    fn mark_inactive(&self, stock_ids: Vec<String>) -> Result<Vec<StockActionOutcome>> {
        let outcomes = stock_ids
            .into_iter()
            .map(|stock_id| {
                match self
                    .repository
                    .set_status(&stock_id, VERIFICATION_STATUS_DELISTED, None)
                {
                    Ok(_) => StockActionOutcome {
                        stock_id,
                        success: true,
                        error: None,
                    },
                    Err(e) => StockActionOutcome {
                        stock_id,
                        success: false,
                        error: Some(e.to_string()),
                    },
                }
            })
            .collect();
        Ok(outcomes)
    }

    fn reset_status(&self, stock_ids: Vec<String>) -> Result<Vec<StockActionOutcome>> {
        let outcomes = stock_ids
            .into_iter()
            .map(|stock_id| {
                // The reset action forces any state back to pending.
                match self
                    .repository
                    .set_status(&stock_id, VERIFICATION_STATUS_PENDING, None)
                {
                    Ok(_) => StockActionOutcome {
                        stock_id,
                        success: true,
                        error: None,
                    },
                    Err(e) => StockActionOutcome {
                        stock_id,
                        success: false,
                        error: Some(e.to_string()),
                    },
                }
            })
            .collect();
        Ok(outcomes)
    }
}
