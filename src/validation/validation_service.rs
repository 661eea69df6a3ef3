use log::debug;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::Result;
use crate::staging::{NewStagedTransaction, StagingRepositoryTrait};
use crate::stocks::StockRepositoryTrait;
use crate::validation::validation_constants::chrono_format;
use crate::validation::validation_errors::ValidationError;
use crate::validation::validation_model::*;
use crate::validation::ValidationServiceTrait;

/// Normalized field values for one row, alongside whatever errors the row
/// produced. Invalid rows are still staged, carrying `row_error`.
struct NormalizedRow {
    staged: NewStagedTransaction,
    errors: Vec<RowValidationError>,
}

/// Service turning raw tabular rows into staged candidate transactions
pub struct ValidationService {
    staging_repository: Arc<dyn StagingRepositoryTrait>,
    stock_repository: Arc<dyn StockRepositoryTrait>,
}

impl ValidationService {
    pub fn new(
        staging_repository: Arc<dyn StagingRepositoryTrait>,
        stock_repository: Arc<dyn StockRepositoryTrait>,
    ) -> Self {
        Self {
            staging_repository,
            stock_repository,
        }
    }

    fn normalize_row(
        portfolio_id: &str,
        import_batch_id: &str,
        row_index: usize,
        row: &HashMap<String, String>,
        mapping: &ColumnMapping,
        chrono_fmt: &str,
    ) -> NormalizedRow {
        let mut errors: Vec<RowValidationError> = Vec::new();
        let field = |column: &str| -> String {
            row.get(column).map(|v| v.trim().to_string()).unwrap_or_default()
        };
        let mut push_error = |field_name: &str, value: &str, message: String| {
            errors.push(RowValidationError {
                row_index,
                field: field_name.to_string(),
                value: value.to_string(),
                message,
            });
        };

        let raw_date = field(&mapping.date);
        let transaction_date = match parse_raw_date(&raw_date, chrono_fmt) {
            Ok(date) => Some(date),
            Err(message) => {
                push_error("date", &raw_date, message);
                None
            }
        };

        let raw_instrument_code = field(&mapping.instrument_code);
        if raw_instrument_code.is_empty() {
            push_error("instrumentCode", "", "Instrument code is missing".to_string());
        }

        let raw_transaction_type = field(&mapping.transaction_type);
        let transaction_type = match TransactionType::normalize(&raw_transaction_type) {
            Ok(normalized) => Some(normalized.as_str().to_string()),
            Err(message) => {
                push_error("transactionType", &raw_transaction_type, message);
                None
            }
        };

        let raw_quantity = field(&mapping.quantity);
        let quantity = match parse_decimal(&raw_quantity) {
            Ok(value) if value > Decimal::ZERO => Some(value),
            Ok(value) => {
                push_error(
                    "quantity",
                    &raw_quantity,
                    format!("Quantity must be positive, got {}", value),
                );
                None
            }
            Err(message) => {
                push_error("quantity", &raw_quantity, message);
                None
            }
        };

        let raw_price = field(&mapping.price);
        let price = match parse_decimal(&raw_price) {
            Ok(value) if value >= Decimal::ZERO => Some(value),
            Ok(value) => {
                push_error(
                    "price",
                    &raw_price,
                    format!("Price cannot be negative, got {}", value),
                );
                None
            }
            Err(message) => {
                push_error("price", &raw_price, message);
                None
            }
        };

        // Total is derived from quantity x price when the source omits it.
        let total_value = match &mapping.total_value {
            Some(column) => {
                let raw_total = field(column);
                if raw_total.is_empty() {
                    None
                } else {
                    match parse_decimal(&raw_total) {
                        Ok(value) => Some(value),
                        Err(message) => {
                            push_error("totalValue", &raw_total, message);
                            None
                        }
                    }
                }
            }
            None => None,
        }
        .or_else(|| match (quantity, price) {
            (Some(q), Some(p)) => Some(q * p),
            _ => None,
        });

        let fees = match &mapping.fees {
            Some(column) => {
                let raw_fees = field(column);
                if raw_fees.is_empty() {
                    Decimal::ZERO
                } else {
                    match parse_decimal(&raw_fees) {
                        Ok(value) => value,
                        Err(message) => {
                            push_error("fees", &raw_fees, message);
                            Decimal::ZERO
                        }
                    }
                }
            }
            None => Decimal::ZERO,
        };

        let row_error = if errors.is_empty() {
            None
        } else {
            Some(
                errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        };

        let staged = NewStagedTransaction {
            portfolio_id: portfolio_id.to_string(),
            import_batch_id: import_batch_id.to_string(),
            raw_date,
            transaction_date,
            raw_instrument_code,
            raw_transaction_type,
            transaction_type,
            quantity: quantity
                .and_then(|v| decimal_to_f64(v).ok())
                .unwrap_or_default(),
            price: price.and_then(|v| decimal_to_f64(v).ok()).unwrap_or_default(),
            total_value: total_value.and_then(|v| decimal_to_f64(v).ok()),
            fees: decimal_to_f64(fees).unwrap_or_default(),
            currency: None,
            row_error,
        };

        NormalizedRow { staged, errors }
    }
}

impl ValidationServiceTrait for ValidationService {
    /// Normalizes every row against the mapping and date format, persists
    /// them all to staging (invalid rows keep their error for operator
    /// visibility), and ensures a stock exists for each instrument seen.
    fn validate_and_stage(
        &self,
        portfolio_id: &str,
        rows: Vec<HashMap<String, String>>,
        mapping: &ColumnMapping,
        date_format: &str,
    ) -> Result<ValidationSummary> {
        let chrono_fmt = chrono_format(date_format)
            .ok_or_else(|| ValidationError::UnsupportedDateFormat(date_format.to_string()))?;

        if mapping.date.is_empty()
            || mapping.instrument_code.is_empty()
            || mapping.transaction_type.is_empty()
            || mapping.quantity.is_empty()
            || mapping.price.is_empty()
        {
            return Err(ValidationError::InvalidMapping(
                "All required columns must be mapped".to_string(),
            )
            .into());
        }

        let import_batch_id = Uuid::new_v4().to_string();
        let total_rows = rows.len();

        let mut staged_rows: Vec<NewStagedTransaction> = Vec::with_capacity(total_rows);
        let mut validation_errors: Vec<RowValidationError> = Vec::new();
        let mut unique_instruments: BTreeSet<String> = BTreeSet::new();
        let mut valid_rows = 0usize;

        for (row_index, row) in rows.iter().enumerate() {
            let normalized = Self::normalize_row(
                portfolio_id,
                &import_batch_id,
                row_index,
                row,
                mapping,
                chrono_fmt,
            );

            if normalized.errors.is_empty() {
                valid_rows += 1;
                unique_instruments.insert(normalized.staged.raw_instrument_code.clone());
            } else {
                validation_errors.extend(normalized.errors);
            }
            staged_rows.push(normalized.staged);
        }

        self.staging_repository.append_rows(staged_rows)?;

        // Unknown instrument codes get a pending stock now so the operator
        // can assign markets and verify before commit.
        let mut new_stock_symbols: Vec<String> = Vec::new();
        for code in &unique_instruments {
            if self.stock_repository.get_by_instrument_code(code)?.is_none() {
                self.stock_repository.get_or_create_pending(code)?;
                new_stock_symbols.push(code.clone());
            }
        }

        debug!(
            "Validated batch {}: {}/{} rows valid, {} instruments ({} new)",
            import_batch_id,
            valid_rows,
            total_rows,
            unique_instruments.len(),
            new_stock_symbols.len()
        );

        Ok(ValidationSummary {
            import_batch_id,
            total_rows,
            valid_rows,
            unique_instruments: unique_instruments.into_iter().collect(),
            new_stock_symbols,
            validation_errors,
        })
    }
}
