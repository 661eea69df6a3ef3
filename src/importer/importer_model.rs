use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// Domain model representing one committed, immutable ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub portfolio_id: String,
    pub stock_id: String,
    pub transaction_date: NaiveDate,
    pub transaction_type: String,
    pub quantity: f64,
    pub price: f64,
    pub fees: f64,
    pub currency_conversion_rate: Option<f64>,
    /// The staged row this entry was promoted from; exactly one ledger
    /// entry ever traces back to a given staged row.
    pub source_staged_id: String,
    pub created_at: DateTime<Utc>,
}

/// Database model for ledger transactions
#[derive(Queryable, Selectable, Identifiable, Insertable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionDB {
    pub id: String,
    pub portfolio_id: String,
    pub stock_id: String,
    pub transaction_date: NaiveDate,
    pub transaction_type: String,
    pub quantity: f64,
    pub price: f64,
    pub fees: f64,
    pub currency_conversion_rate: Option<f64>,
    pub source_staged_id: String,
    pub created_at: NaiveDateTime,
}

/// Outcome of attempting to promote one staged row
#[derive(Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    Imported,
    /// A concurrent commit took the row first; skipped, not an error.
    AlreadyProcessed,
}

/// Result of one commit invocation for a portfolio
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitSummary {
    pub verified_transactions_found: usize,
    pub transactions_imported: usize,
    pub actual_import_errors: Vec<String>,
    pub stocks_with_transactions: Vec<String>,
    pub unverified_transactions: usize,
}

impl From<TransactionDB> for Transaction {
    fn from(db: TransactionDB) -> Self {
        Self {
            id: db.id,
            portfolio_id: db.portfolio_id,
            stock_id: db.stock_id,
            transaction_date: db.transaction_date,
            transaction_type: db.transaction_type,
            quantity: db.quantity,
            price: db.price,
            fees: db.fees,
            currency_conversion_rate: db.currency_conversion_rate,
            source_staged_id: db.source_staged_id,
            created_at: DateTime::from_naive_utc_and_offset(db.created_at, Utc),
        }
    }
}
