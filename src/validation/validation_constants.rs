/// Transaction types
///
/// Closed set of ledger entry categories an imported row may normalize to.
pub const TRANSACTION_TYPE_BUY: &str = "BUY";
pub const TRANSACTION_TYPE_SELL: &str = "SELL";
pub const TRANSACTION_TYPE_DIVIDEND: &str = "DIVIDEND";
pub const TRANSACTION_TYPE_SPLIT: &str = "SPLIT";
pub const TRANSACTION_TYPE_FEE: &str = "FEE";
pub const TRANSACTION_TYPE_TAX: &str = "TAX";

/// Supported date formats, keyed by the display notation the UI offers.
/// The second element is the chrono format string; each pair must
/// round-trip (parse then re-render reproduces the raw value).
pub const DATE_FORMATS: [(&str, &str); 8] = [
    ("YYYY-MM-DD", "%Y-%m-%d"),
    ("MM/DD/YYYY", "%m/%d/%Y"),
    ("DD/MM/YYYY", "%d/%m/%Y"),
    ("DD-MM-YYYY", "%d-%m-%Y"),
    ("MM-DD-YYYY", "%m-%d-%Y"),
    ("YYYYMMDD", "%Y%m%d"),
    ("DD-MMM-YYYY", "%d-%b-%Y"),
    ("MMM DD, YYYY", "%b %d, %Y"),
];

pub fn chrono_format(date_format: &str) -> Option<&'static str> {
    DATE_FORMATS
        .iter()
        .find(|(key, _)| *key == date_format)
        .map(|(_, fmt)| *fmt)
}
