use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::get_connection;
use crate::schema::{staged_transactions, stocks};
use crate::staging::staging_errors::{Result, StagingError};
use crate::staging::staging_model::*;
use crate::stocks::stocks_model::{Stock, StockDB};

/// Repository for the durable staging area between upload and commit
pub struct StagingRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl StagingRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<crate::db::DbConnection> {
        get_connection(&self.pool).map_err(|e| StagingError::DatabaseError(e.to_string()))
    }

    /// Appends one upload's rows in a single transaction. Rows from other
    /// batches are never touched; staging is append-only per batch.
    pub fn append_rows(&self, rows: Vec<NewStagedTransaction>) -> Result<usize> {
        let mut conn = self.conn()?;

        conn.transaction(|conn| {
            let rows_db: Vec<StagedTransactionDB> =
                rows.into_iter().map(StagedTransactionDB::from).collect();

            diesel::insert_into(staged_transactions::table)
                .values(rows_db)
                .execute(conn)
                .map_err(StagingError::from)
        })
    }

    /// Paginated listing for one portfolio, newest upload first, exposing
    /// the processed flag for operator visibility.
    pub fn list_staged(
        &self,
        portfolio_id: &str,
        page: i64,
        page_size: i64,
    ) -> Result<StagedSearchResponse> {
        let mut conn = self.conn()?;
        let offset = page * page_size;

        let total_row_count = staged_transactions::table
            .filter(staged_transactions::portfolio_id.eq(portfolio_id))
            .count()
            .get_result::<i64>(&mut conn)?;

        let data = staged_transactions::table
            .filter(staged_transactions::portfolio_id.eq(portfolio_id))
            .order(staged_transactions::imported_at.desc())
            .limit(page_size)
            .offset(offset)
            .load::<StagedTransactionDB>(&mut conn)?
            .into_iter()
            .map(StagedTransaction::from)
            .collect();

        Ok(StagedSearchResponse {
            data,
            meta: StagedSearchResponseMeta { total_row_count },
        })
    }

    /// Unprocessed, validation-clean rows for a portfolio joined with their
    /// stock, for the committer's eligibility check.
    pub fn get_unprocessed_with_stocks(
        &self,
        portfolio_id: &str,
    ) -> Result<Vec<(StagedTransaction, Stock)>> {
        let mut conn = self.conn()?;

        staged_transactions::table
            .inner_join(
                stocks::table
                    .on(stocks::instrument_code.eq(staged_transactions::raw_instrument_code)),
            )
            .filter(staged_transactions::portfolio_id.eq(portfolio_id))
            .filter(staged_transactions::processed.eq(false))
            .filter(staged_transactions::row_error.is_null())
            .order(staged_transactions::imported_at.asc())
            .select((StagedTransactionDB::as_select(), StockDB::as_select()))
            .load::<(StagedTransactionDB, StockDB)>(&mut conn)
            .map(|rows| {
                rows.into_iter()
                    .map(|(staged, stock)| (StagedTransaction::from(staged), Stock::from(stock)))
                    .collect()
            })
            .map_err(StagingError::from)
    }

    pub fn batch_progress(&self, import_batch_id: &str) -> Result<ImportBatchProgress> {
        let mut conn = self.conn()?;

        let total_rows = staged_transactions::table
            .filter(staged_transactions::import_batch_id.eq(import_batch_id))
            .count()
            .get_result::<i64>(&mut conn)?;

        let processed_rows = staged_transactions::table
            .filter(staged_transactions::import_batch_id.eq(import_batch_id))
            .filter(staged_transactions::processed.eq(true))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(ImportBatchProgress {
            import_batch_id: import_batch_id.to_string(),
            total_rows,
            processed_rows,
        })
    }
}
