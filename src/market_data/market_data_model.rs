use serde::{Deserialize, Serialize};

/// Identity and pricing details for one instrument, as reported by the
/// external market-data provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentProfile {
    pub symbol: String,
    pub name: String,
    pub currency: String,
    pub last_price: Option<f64>,
}
