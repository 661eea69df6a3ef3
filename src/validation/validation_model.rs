use chrono::NaiveDate;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::validation::validation_constants::*;

/// Closed enum of transaction categories a raw row may normalize to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    Buy,
    Sell,
    Dividend,
    Split,
    Fee,
    Tax,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Buy => TRANSACTION_TYPE_BUY,
            TransactionType::Sell => TRANSACTION_TYPE_SELL,
            TransactionType::Dividend => TRANSACTION_TYPE_DIVIDEND,
            TransactionType::Split => TRANSACTION_TYPE_SPLIT,
            TransactionType::Fee => TRANSACTION_TYPE_FEE,
            TransactionType::Tax => TRANSACTION_TYPE_TAX,
        }
    }

    /// Maps raw source spellings onto the closed enum. Unrecognized values
    /// are an error for the caller to report, never a silent default.
    pub fn normalize(raw: &str) -> Result<Self, String> {
        let cleaned = raw.trim().to_uppercase();
        match cleaned.as_str() {
            TRANSACTION_TYPE_BUY | "B" | "BOUGHT" | "PURCHASE" => Ok(TransactionType::Buy),
            TRANSACTION_TYPE_SELL | "S" | "SOLD" | "SALE" => Ok(TransactionType::Sell),
            TRANSACTION_TYPE_DIVIDEND | "DIV" | "DRP" => Ok(TransactionType::Dividend),
            TRANSACTION_TYPE_SPLIT | "STOCK SPLIT" => Ok(TransactionType::Split),
            TRANSACTION_TYPE_FEE => Ok(TransactionType::Fee),
            TRANSACTION_TYPE_TAX => Ok(TransactionType::Tax),
            _ => Err(format!("Unknown transaction type: {}", raw)),
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            s if s == TRANSACTION_TYPE_BUY => Ok(TransactionType::Buy),
            s if s == TRANSACTION_TYPE_SELL => Ok(TransactionType::Sell),
            s if s == TRANSACTION_TYPE_DIVIDEND => Ok(TransactionType::Dividend),
            s if s == TRANSACTION_TYPE_SPLIT => Ok(TransactionType::Split),
            s if s == TRANSACTION_TYPE_FEE => Ok(TransactionType::Fee),
            s if s == TRANSACTION_TYPE_TAX => Ok(TransactionType::Tax),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

/// Names of the source columns each pipeline field reads from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    pub date: String,
    pub instrument_code: String,
    pub transaction_type: String,
    pub quantity: String,
    pub price: String,
    pub total_value: Option<String>,
    pub fees: Option<String>,
}

/// Output of the external file analyzer, consumed as validation input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAnalysis {
    pub filename: String,
    pub total_rows: usize,
    pub columns: Vec<String>,
    pub sample_data: Vec<HashMap<String, String>>,
    pub detected_mapping: Option<ColumnMapping>,
}

/// One recoverable row-level problem, reported in the summary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowValidationError {
    pub row_index: usize,
    pub field: String,
    pub value: String,
    pub message: String,
}

/// Result of validating and staging one upload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub import_batch_id: String,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub unique_instruments: Vec<String>,
    pub new_stock_symbols: Vec<String>,
    pub validation_errors: Vec<RowValidationError>,
}

/// Guesses a column mapping from common header spellings.
pub fn detect_mapping(columns: &[String]) -> Option<ColumnMapping> {
    let find = |candidates: &[&str]| -> Option<String> {
        columns
            .iter()
            .find(|col| {
                let lowered = col.trim().to_lowercase().replace([' ', '_'], "");
                candidates.contains(&lowered.as_str())
            })
            .cloned()
    };

    Some(ColumnMapping {
        date: find(&["date", "tradedate", "transactiondate"])?,
        instrument_code: find(&["symbol", "code", "instrument", "instrumentcode", "ticker"])?,
        transaction_type: find(&["type", "transactiontype", "activitytype", "action"])?,
        quantity: find(&["quantity", "qty", "units", "shares"])?,
        price: find(&["price", "unitprice", "shareprice"])?,
        total_value: find(&["total", "totalvalue", "value", "amount"]),
        fees: find(&["fee", "fees", "brokerage", "commission"]),
    })
}

/// Parses a raw date string against one of the supported display formats.
pub fn parse_raw_date(raw: &str, chrono_fmt: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), chrono_fmt)
        .map_err(|_| format!("Date '{}' does not match the selected format", raw))
}

/// Renders a date back into the selected display format.
pub fn render_date(date: NaiveDate, date_format: &str) -> Option<String> {
    chrono_format(date_format).map(|fmt| date.format(fmt).to_string())
}

/// Parses a decimal field, tolerating currency symbols and thousands
/// separators common in broker exports.
pub fn parse_decimal(raw: &str) -> Result<Decimal, String> {
    let cleaned = raw.trim().replace(['$', ','], "");
    if cleaned.is_empty() {
        return Err("Value is empty".to_string());
    }
    Decimal::from_str(&cleaned).map_err(|_| format!("'{}' is not a valid number", raw))
}

/// Converts a validated decimal into the storage representation.
pub fn decimal_to_f64(value: Decimal) -> Result<f64, String> {
    value
        .to_f64()
        .ok_or_else(|| format!("'{}' cannot be represented", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn compact_date_round_trips() {
        let fmt = chrono_format("YYYYMMDD").unwrap();
        let date = parse_raw_date("20231225", fmt).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2023, 12, 25).unwrap());
        assert_eq!(render_date(date, "YYYYMMDD").unwrap(), "20231225");
    }

    #[test]
    fn every_supported_format_round_trips() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 25).unwrap();
        for (key, fmt) in DATE_FORMATS {
            let rendered = date.format(fmt).to_string();
            let parsed = parse_raw_date(&rendered, fmt)
                .unwrap_or_else(|e| panic!("format {} failed: {}", key, e));
            assert_eq!(parsed, date, "format {}", key);
        }
    }

    #[test]
    fn month_name_formats_parse() {
        let fmt = chrono_format("DD-MMM-YYYY").unwrap();
        assert_eq!(
            parse_raw_date("25-Dec-2023", fmt).unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 25).unwrap()
        );

        let fmt = chrono_format("MMM DD, YYYY").unwrap();
        assert_eq!(
            parse_raw_date("Dec 25, 2023", fmt).unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 25).unwrap()
        );
    }

    #[test]
    fn mismatched_date_is_an_error() {
        let fmt = chrono_format("YYYY-MM-DD").unwrap();
        assert!(parse_raw_date("25/12/2023", fmt).is_err());
    }

    #[test]
    fn transaction_type_aliases_normalize() {
        assert_eq!(TransactionType::normalize("buy"), Ok(TransactionType::Buy));
        assert_eq!(TransactionType::normalize(" B "), Ok(TransactionType::Buy));
        assert_eq!(TransactionType::normalize("Sold"), Ok(TransactionType::Sell));
        assert_eq!(TransactionType::normalize("DIV"), Ok(TransactionType::Dividend));
        assert!(TransactionType::normalize("GIFT").is_err());
    }

    #[test]
    fn decimal_parsing_strips_broker_noise() {
        assert_eq!(parse_decimal("$1,234.56"), Ok(dec!(1234.56)));
        assert_eq!(parse_decimal(" 10 "), Ok(dec!(10)));
        assert!(parse_decimal("ten").is_err());
        assert!(parse_decimal("").is_err());
    }

    #[test]
    fn detects_mapping_from_common_headers() {
        let columns: Vec<String> = ["Trade Date", "Symbol", "Action", "Qty", "Unit Price", "Brokerage"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mapping = detect_mapping(&columns).unwrap();
        assert_eq!(mapping.date, "Trade Date");
        assert_eq!(mapping.instrument_code, "Symbol");
        assert_eq!(mapping.transaction_type, "Action");
        assert_eq!(mapping.quantity, "Qty");
        assert_eq!(mapping.price, "Unit Price");
        assert_eq!(mapping.fees.as_deref(), Some("Brokerage"));
        assert!(mapping.total_value.is_none());
    }
}
