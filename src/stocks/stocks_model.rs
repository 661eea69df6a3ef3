use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::stocks::stocks_constants::*;

/// Domain model representing one tradable instrument as known to the importer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    pub id: String,
    pub instrument_code: String,
    pub market_key: Option<String>,
    pub yahoo_symbol: Option<String>,
    pub name: Option<String>,
    pub currency: Option<String>,
    pub verification_status: String,
    pub verification_error: Option<String>,
    pub drp_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Stock {
    pub fn status(&self) -> VerificationStatus {
        VerificationStatus::from_str(&self.verification_status)
            .unwrap_or(VerificationStatus::Pending)
    }
}

/// Database model for stocks
#[derive(
    Queryable, Selectable, Identifiable, Insertable, AsChangeset, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::stocks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct StockDB {
    pub id: String,
    pub instrument_code: String,
    pub market_key: Option<String>,
    pub yahoo_symbol: Option<String>,
    pub name: Option<String>,
    pub currency: Option<String>,
    pub verification_status: String,
    pub verification_error: Option<String>,
    pub drp_enabled: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Reference data: one exchange and the symbol suffix it implies
#[derive(Queryable, Selectable, Insertable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::market_codes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct MarketCode {
    pub market_key: String,
    pub suffix: String,
    pub country: String,
}

/// One (instrument_code, market_key) pair submitted for verification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAssignment {
    pub instrument_code: String,
    pub market_key: String,
}

/// Per-instrument outcome of a batch verification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub instrument_code: String,
    pub success: bool,
    pub name: Option<String>,
    pub currency: Option<String>,
    pub error: Option<String>,
}

/// Per-stock outcome of a bulk action (verify-all, mark-inactive, reset)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockActionOutcome {
    pub stock_id: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Verification state machine.
///
/// `Pending -> {Verified, Failed, Delisted}`; `Delisted` is reachable from
/// any state (mark-delisted is unconditional); `Pending` is reachable from
/// any state only through an explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerificationStatus {
    Pending,
    Verified,
    Failed,
    Delisted,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => VERIFICATION_STATUS_PENDING,
            VerificationStatus::Verified => VERIFICATION_STATUS_VERIFIED,
            VerificationStatus::Failed => VERIFICATION_STATUS_FAILED,
            VerificationStatus::Delisted => VERIFICATION_STATUS_DELISTED,
        }
    }

    /// Whether a forward transition to `to` is permitted. Resets are not
    /// forward transitions; use `Pending` only through the reset operations.
    pub fn can_transition(&self, to: VerificationStatus) -> bool {
        match to {
            // Only the explicit reset action may move a stock back to pending.
            VerificationStatus::Pending => false,
            VerificationStatus::Delisted => true,
            VerificationStatus::Verified | VerificationStatus::Failed => {
                *self == VerificationStatus::Pending
            }
        }
    }

    pub fn is_committable(&self) -> bool {
        matches!(
            self,
            VerificationStatus::Verified | VerificationStatus::Delisted
        )
    }
}

impl FromStr for VerificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            s if s == VERIFICATION_STATUS_PENDING => Ok(VerificationStatus::Pending),
            s if s == VERIFICATION_STATUS_VERIFIED => Ok(VerificationStatus::Verified),
            s if s == VERIFICATION_STATUS_FAILED => Ok(VerificationStatus::Failed),
            s if s == VERIFICATION_STATUS_DELISTED => Ok(VerificationStatus::Delisted),
            _ => Err(format!("Unknown verification status: {}", s)),
        }
    }
}

// Conversion implementations
impl From<StockDB> for Stock {
    fn from(db: StockDB) -> Self {
        Self {
            id: db.id,
            instrument_code: db.instrument_code,
            market_key: db.market_key,
            yahoo_symbol: db.yahoo_symbol,
            name: db.name,
            currency: db.currency,
            verification_status: db.verification_status,
            verification_error: db.verification_error,
            drp_enabled: db.drp_enabled,
            created_at: DateTime::from_naive_utc_and_offset(db.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(db.updated_at, Utc),
        }
    }
}

impl StockDB {
    /// A fresh, unverified stock for an instrument code first seen during
    /// validation.
    pub fn pending(instrument_code: &str) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            instrument_code: instrument_code.to_string(),
            market_key: None,
            yahoo_symbol: None,
            name: None,
            currency: None,
            verification_status: VERIFICATION_STATUS_PENDING.to_string(),
            verification_error: None,
            drp_enabled: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_move_to_every_terminal_state() {
        let pending = VerificationStatus::Pending;
        assert!(pending.can_transition(VerificationStatus::Verified));
        assert!(pending.can_transition(VerificationStatus::Failed));
        assert!(pending.can_transition(VerificationStatus::Delisted));
    }

    #[test]
    fn verified_and_failed_cannot_swap_directly() {
        assert!(!VerificationStatus::Verified.can_transition(VerificationStatus::Failed));
        assert!(!VerificationStatus::Failed.can_transition(VerificationStatus::Verified));
    }

    #[test]
    fn delisted_is_reachable_from_any_state() {
        for from in [
            VerificationStatus::Pending,
            VerificationStatus::Verified,
            VerificationStatus::Failed,
            VerificationStatus::Delisted,
        ] {
            assert!(from.can_transition(VerificationStatus::Delisted));
        }
    }

    #[test]
    fn pending_is_only_reachable_via_reset() {
        for from in [
            VerificationStatus::Verified,
            VerificationStatus::Failed,
            VerificationStatus::Delisted,
        ] {
            assert!(!from.can_transition(VerificationStatus::Pending));
        }
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            VerificationStatus::Pending,
            VerificationStatus::Verified,
            VerificationStatus::Failed,
            VerificationStatus::Delisted,
        ] {
            assert_eq!(VerificationStatus::from_str(status.as_str()), Ok(status));
        }
    }
}
