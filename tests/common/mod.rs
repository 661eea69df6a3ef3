#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use folioflow_core::db::{self, DbPool};
use folioflow_core::market_data::{InstrumentProfile, MarketDataError, MarketDataProvider};
use folioflow_core::validation::ColumnMapping;

/// Creates a migrated sqlite database inside a temp directory and returns
/// its pool. The TempDir must outlive the pool.
pub fn setup_pool(dir: &tempfile::TempDir) -> Arc<DbPool> {
    let data_dir = dir.path().to_str().unwrap();
    let db_path = db::init(data_dir).expect("Failed to initialize database");
    let pool = db::create_pool(&db_path).expect("Failed to create database pool");
    db::run_migrations(&pool).expect("Failed to run migrations");
    pool
}

/// Provider stub resolving only the symbols it was seeded with.
pub struct StubProvider {
    known: HashMap<String, (String, String)>,
}

impl StubProvider {
    pub fn new(known: &[(&str, &str, &str)]) -> Self {
        Self {
            known: known
                .iter()
                .map(|(symbol, name, currency)| {
                    (symbol.to_string(), (name.to_string(), currency.to_string()))
                })
                .collect(),
        }
    }
}

#[async_trait]
impl MarketDataProvider for StubProvider {
    async fn get_instrument_profile(
        &self,
        symbol: &str,
    ) -> Result<InstrumentProfile, MarketDataError> {
        match self.known.get(symbol) {
            Some((name, currency)) => Ok(InstrumentProfile {
                symbol: symbol.to_string(),
                name: name.clone(),
                currency: currency.clone(),
                last_price: Some(100.0),
            }),
            None => Err(MarketDataError::NotFound(format!(
                "No listing found for symbol '{}'",
                symbol
            ))),
        }
    }
}

/// Provider stub answering every symbol, but only after failing with a
/// transient error a fixed number of times. Counts every call it receives.
pub struct FlakyProvider {
    failures_before_success: u32,
    attempts: AtomicU32,
    name: String,
    currency: String,
}

impl FlakyProvider {
    pub fn new(failures_before_success: u32, name: &str, currency: &str) -> Self {
        Self {
            failures_before_success,
            attempts: AtomicU32::new(0),
            name: name.to_string(),
            currency: currency.to_string(),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataProvider for FlakyProvider {
    async fn get_instrument_profile(
        &self,
        symbol: &str,
    ) -> Result<InstrumentProfile, MarketDataError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures_before_success {
            return Err(MarketDataError::RateLimitExceeded);
        }
        Ok(InstrumentProfile {
            symbol: symbol.to_string(),
            name: self.name.clone(),
            currency: self.currency.clone(),
            last_price: Some(100.0),
        })
    }
}

pub fn default_mapping() -> ColumnMapping {
    ColumnMapping {
        date: "date".to_string(),
        instrument_code: "symbol".to_string(),
        transaction_type: "type".to_string(),
        quantity: "quantity".to_string(),
        price: "price".to_string(),
        total_value: None,
        fees: Some("fees".to_string()),
    }
}

/// Builds one raw source row from field pairs.
pub fn raw_row(fields: &[(&str, &str)]) -> HashMap<String, String> {
    fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
