use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// Domain model representing one raw imported row held in staging
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedTransaction {
    pub id: String,
    pub portfolio_id: String,
    pub import_batch_id: String,
    /// Source-format date text, preserved for display.
    pub raw_date: String,
    /// Calendar date after normalization; None when the row failed validation.
    pub transaction_date: Option<NaiveDate>,
    pub raw_instrument_code: String,
    pub raw_transaction_type: String,
    pub transaction_type: Option<String>,
    pub quantity: f64,
    pub price: f64,
    pub total_value: Option<f64>,
    pub fees: f64,
    pub currency: Option<String>,
    pub imported_at: DateTime<Utc>,
    pub processed: bool,
    pub row_error: Option<String>,
}

/// Database model for staged transactions
#[derive(Queryable, Selectable, Identifiable, Insertable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::staged_transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StagedTransactionDB {
    pub id: String,
    pub portfolio_id: String,
    pub import_batch_id: String,
    pub raw_date: String,
    pub transaction_date: Option<NaiveDate>,
    pub raw_instrument_code: String,
    pub raw_transaction_type: String,
    pub transaction_type: Option<String>,
    pub quantity: f64,
    pub price: f64,
    pub total_value: Option<f64>,
    pub fees: f64,
    pub currency: Option<String>,
    pub imported_at: NaiveDateTime,
    pub processed: bool,
    pub row_error: Option<String>,
}

/// Input model for one row appended to staging by the validation engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStagedTransaction {
    pub portfolio_id: String,
    pub import_batch_id: String,
    pub raw_date: String,
    pub transaction_date: Option<NaiveDate>,
    pub raw_instrument_code: String,
    pub raw_transaction_type: String,
    pub transaction_type: Option<String>,
    pub quantity: f64,
    pub price: f64,
    pub total_value: Option<f64>,
    pub fees: f64,
    pub currency: Option<String>,
    pub row_error: Option<String>,
}

/// Model for staged listing response metadata
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedSearchResponseMeta {
    pub total_row_count: i64,
}

/// Model for paginated staged listing
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedSearchResponse {
    pub data: Vec<StagedTransaction>,
    pub meta: StagedSearchResponseMeta,
}

/// Per-batch progress: how many of an upload's rows have been promoted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBatchProgress {
    pub import_batch_id: String,
    pub total_rows: i64,
    pub processed_rows: i64,
}

// Conversion implementations
impl From<StagedTransactionDB> for StagedTransaction {
    fn from(db: StagedTransactionDB) -> Self {
        Self {
            id: db.id,
            portfolio_id: db.portfolio_id,
            import_batch_id: db.import_batch_id,
            raw_date: db.raw_date,
            transaction_date: db.transaction_date,
            raw_instrument_code: db.raw_instrument_code,
            raw_transaction_type: db.raw_transaction_type,
            transaction_type: db.transaction_type,
            quantity: db.quantity,
            price: db.price,
            total_value: db.total_value,
            fees: db.fees,
            currency: db.currency,
            imported_at: DateTime::from_naive_utc_and_offset(db.imported_at, Utc),
            processed: db.processed,
            row_error: db.row_error,
        }
    }
}

impl From<NewStagedTransaction> for StagedTransactionDB {
    fn from(domain: NewStagedTransaction) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            portfolio_id: domain.portfolio_id,
            import_batch_id: domain.import_batch_id,
            raw_date: domain.raw_date,
            transaction_date: domain.transaction_date,
            raw_instrument_code: domain.raw_instrument_code,
            raw_transaction_type: domain.raw_transaction_type,
            transaction_type: domain.transaction_type,
            quantity: domain.quantity,
            price: domain.price,
            total_value: domain.total_value,
            fees: domain.fees,
            currency: domain.currency,
            imported_at: Utc::now().naive_utc(),
            processed: false,
            row_error: domain.row_error,
        }
    }
}
