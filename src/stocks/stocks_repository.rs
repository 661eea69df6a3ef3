use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::get_connection;
use crate::schema::{market_codes, stocks};
use crate::stocks::stocks_errors::{Result, StockError};
use crate::stocks::stocks_model::*;

/// Repository for managing stock and market reference data in the database
pub struct StockRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl StockRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<crate::db::DbConnection> {
        get_connection(&self.pool).map_err(|e| StockError::DatabaseError(e.to_string()))
    }

    pub fn get_by_id(&self, stock_id: &str) -> Result<Stock> {
        let mut conn = self.conn()?;
        stocks::table
            .find(stock_id)
            .first::<StockDB>(&mut conn)
            .map(Stock::from)
            .map_err(StockError::from)
    }

    pub fn get_by_instrument_code(&self, instrument_code: &str) -> Result<Option<Stock>> {
        let mut conn = self.conn()?;
        stocks::table
            .filter(stocks::instrument_code.eq(instrument_code))
            .first::<StockDB>(&mut conn)
            .optional()
            .map(|opt| opt.map(Stock::from))
            .map_err(StockError::from)
    }

    /// Returns the stock for an instrument code, creating a pending one on
    /// first sight.
    pub fn get_or_create_pending(&self, instrument_code: &str) -> Result<Stock> {
        if let Some(existing) = self.get_by_instrument_code(instrument_code)? {
            return Ok(existing);
        }

        let mut conn = self.conn()?;
        let new_stock = StockDB::pending(instrument_code);
        diesel::insert_into(stocks::table)
            .values(&new_stock)
            .get_result::<StockDB>(&mut conn)
            .map(Stock::from)
            .map_err(StockError::from)
    }

    pub fn list_by_ids(&self, stock_ids: &[String]) -> Result<Vec<Stock>> {
        let mut conn = self.conn()?;
        stocks::table
            .filter(stocks::id.eq_any(stock_ids))
            .load::<StockDB>(&mut conn)
            .map(|rows| rows.into_iter().map(Stock::from).collect())
            .map_err(StockError::from)
    }

    pub fn list_markets(&self) -> Result<Vec<MarketCode>> {
        let mut conn = self.conn()?;
        market_codes::table
            .order(market_codes::market_key.asc())
            .load::<MarketCode>(&mut conn)
            .map_err(StockError::from)
    }

    pub fn get_market(&self, market_key: &str) -> Result<Option<MarketCode>> {
        let mut conn = self.conn()?;
        market_codes::table
            .find(market_key)
            .first::<MarketCode>(&mut conn)
            .optional()
            .map_err(StockError::from)
    }

    /// Binds a stock to a market. Resets verification and clears the
    /// identity fields filled by a previous verification.
    pub fn apply_market_assignment(
        &self,
        stock_id: &str,
        market_key: &str,
        yahoo_symbol: &str,
    ) -> Result<Stock> {
        let mut conn = self.conn()?;
        diesel::update(stocks::table.find(stock_id))
            .set((
                stocks::market_key.eq(market_key),
                stocks::yahoo_symbol.eq(yahoo_symbol),
                stocks::verification_status.eq(crate::stocks::VERIFICATION_STATUS_PENDING),
                stocks::verification_error.eq(None::<String>),
                stocks::name.eq(None::<String>),
                stocks::currency.eq(None::<String>),
                stocks::updated_at.eq(Utc::now().naive_utc()),
            ))
            .get_result::<StockDB>(&mut conn)
            .map(Stock::from)
            .map_err(StockError::from)
    }

    /// Records a successful verification with the provider-reported identity.
    pub fn set_verified(&self, stock_id: &str, name: &str, currency: &str) -> Result<Stock> {
        let mut conn = self.conn()?;
        diesel::update(stocks::table.find(stock_id))
            .set((
                stocks::verification_status.eq(crate::stocks::VERIFICATION_STATUS_VERIFIED),
                stocks::verification_error.eq(None::<String>),
                stocks::name.eq(name),
                stocks::currency.eq(currency),
                stocks::updated_at.eq(Utc::now().naive_utc()),
            ))
            .get_result::<StockDB>(&mut conn)
            .map(Stock::from)
            .map_err(StockError::from)
    }

    /// Moves a stock to the given status, keeping any identity already on
    /// record.
    pub fn set_status(
        &self,
        stock_id: &str,
        status: &str,
        verification_error: Option<String>,
    ) -> Result<Stock> {
        let mut conn = self.conn()?;
        diesel::update(stocks::table.find(stock_id))
            .set((
                stocks::verification_status.eq(status),
                stocks::verification_error.eq(verification_error),
                stocks::updated_at.eq(Utc::now().naive_utc()),
            ))
            .get_result::<StockDB>(&mut conn)
            .map(Stock::from)
            .map_err(StockError::from)
    }
}
