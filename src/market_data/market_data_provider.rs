use async_trait::async_trait;

use super::market_data_errors::MarketDataError;
use super::market_data_model::InstrumentProfile;

/// External source of truth for instrument identity and pricing.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Resolves a fully suffixed symbol to its profile. `NotFound` means the
    /// symbol does not resolve to a priced security.
    async fn get_instrument_profile(
        &self,
        symbol: &str,
    ) -> Result<InstrumentProfile, MarketDataError>;
}
