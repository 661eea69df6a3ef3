use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::market_data::market_data_errors::MarketDataError;
use crate::market_data::market_data_model::InstrumentProfile;
use crate::market_data::market_data_provider::MarketDataProvider;

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Market-data provider backed by Yahoo Finance's chart endpoint.
pub struct YahooProvider {
    client: Client,
}

impl YahooProvider {
    pub fn new() -> Result<Self, MarketDataError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent("Mozilla/5.0 (compatible; folioflow)")
            .build()
            .map_err(MarketDataError::NetworkError)?;
        Ok(YahooProvider { client })
    }

    async fn fetch_chart_meta(&self, symbol: &str) -> Result<ChartMeta, MarketDataError> {
        let url = format!("{}/{}?interval=1d&range=1d", BASE_URL, symbol);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                MarketDataError::Timeout(REQUEST_TIMEOUT_SECS)
            } else {
                MarketDataError::NetworkError(e)
            }
        })?;

        match response.status() {
            status if status == reqwest::StatusCode::NOT_FOUND => {
                return Err(MarketDataError::NotFound(format!(
                    "No listing found for symbol '{}'",
                    symbol
                )))
            }
            status if status == reqwest::StatusCode::TOO_MANY_REQUESTS => {
                return Err(MarketDataError::RateLimitExceeded)
            }
            status if !status.is_success() => {
                return Err(MarketDataError::ProviderError(format!(
                    "HTTP {} for symbol '{}'",
                    status, symbol
                )))
            }
            _ => {}
        }

        let body: ChartResponse = response
            .json()
            .await
            .map_err(|e| MarketDataError::ParsingError(e.to_string()))?;

        if let Some(err) = body.chart.error {
            return Err(MarketDataError::NotFound(format!(
                "{}: {}",
                err.code, err.description
            )));
        }

        body.chart
            .result
            .and_then(|mut results| {
                if results.is_empty() {
                    None
                } else {
                    Some(results.remove(0).meta)
                }
            })
            .ok_or_else(|| {
                MarketDataError::NotFound(format!("Empty chart result for symbol '{}'", symbol))
            })
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooProvider {
    async fn get_instrument_profile(
        &self,
        symbol: &str,
    ) -> Result<InstrumentProfile, MarketDataError> {
        let meta = self.fetch_chart_meta(symbol).await?;

        let currency = meta.currency.ok_or_else(|| {
            MarketDataError::ParsingError(format!("No currency reported for '{}'", symbol))
        })?;

        let name = meta
            .long_name
            .or(meta.short_name)
            .unwrap_or_else(|| symbol.to_string());

        Ok(InstrumentProfile {
            symbol: meta.symbol.unwrap_or_else(|| symbol.to_string()),
            name,
            currency,
            last_price: meta.regular_market_price,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    currency: Option<String>,
    symbol: Option<String>,
    long_name: Option<String>,
    short_name: Option<String>,
    regular_market_price: Option<f64>,
}
