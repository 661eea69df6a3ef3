use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::get_connection;
use crate::importer::importer_errors::{ImportError, Result};
use crate::importer::importer_model::*;
use crate::schema::{staged_transactions, transactions};
use crate::staging::StagedTransaction;
use crate::stocks::Stock;

/// Repository for the immutable transaction ledger
pub struct ImportRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl ImportRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<crate::db::DbConnection> {
        get_connection(&self.pool).map_err(|e| ImportError::DatabaseError(e.to_string()))
    }

    /// Promotes one staged row into the ledger.
    ///
    /// The processed flag is flipped with compare-and-set semantics inside
    /// the same database transaction as the ledger insert: if another commit
    /// already took the row, zero rows match the update and the row is
    /// skipped without inserting anything.
    pub fn commit_row(&self, staged: &StagedTransaction, stock: &Stock) -> Result<CommitOutcome> {
        let transaction_date = staged.transaction_date.ok_or_else(|| {
            ImportError::Integrity(format!("Staged row {} has no normalized date", staged.id))
        })?;
        let transaction_type = staged.transaction_type.clone().ok_or_else(|| {
            ImportError::Integrity(format!("Staged row {} has no normalized type", staged.id))
        })?;

        let ledger_row = TransactionDB {
            id: Uuid::new_v4().to_string(),
            portfolio_id: staged.portfolio_id.clone(),
            stock_id: stock.id.clone(),
            transaction_date,
            transaction_type,
            quantity: staged.quantity,
            price: staged.price,
            fees: staged.fees,
            currency_conversion_rate: None,
            source_staged_id: staged.id.clone(),
            created_at: Utc::now().naive_utc(),
        };

        let mut conn = self.conn()?;
        conn.transaction(|conn| {
            let claimed = diesel::update(
                staged_transactions::table
                    .filter(staged_transactions::id.eq(&staged.id))
                    .filter(staged_transactions::processed.eq(false)),
            )
            .set(staged_transactions::processed.eq(true))
            .execute(conn)?;

            if claimed == 0 {
                return Ok(CommitOutcome::AlreadyProcessed);
            }

            diesel::insert_into(transactions::table)
                .values(&ledger_row)
                .execute(conn)?;

            Ok(CommitOutcome::Imported)
        })
    }

    /// Ledger entries for one portfolio, oldest first.
    pub fn list_transactions(&self, portfolio_id: &str) -> Result<Vec<Transaction>> {
        let mut conn = self.conn()?;
        transactions::table
            .filter(transactions::portfolio_id.eq(portfolio_id))
            .order(transactions::transaction_date.asc())
            .load::<TransactionDB>(&mut conn)
            .map(|rows| rows.into_iter().map(Transaction::from).collect())
            .map_err(ImportError::from)
    }
}
