/// Verification states
///
/// A stock starts PENDING when its instrument code is first seen in an
/// import and moves forward through verification against the market-data
/// provider.
/// Newly created or reset; not yet checked against the provider.
pub const VERIFICATION_STATUS_PENDING: &str = "PENDING";

/// Provider confirmed the symbol resolves to a priced security.
pub const VERIFICATION_STATUS_VERIFIED: &str = "VERIFIED";

/// Provider lookup failed or the retry budget was exhausted. Recoverable via reset.
pub const VERIFICATION_STATUS_FAILED: &str = "FAILED";

/// Instrument no longer trades. Terminal until an explicit reset.
pub const VERIFICATION_STATUS_DELISTED: &str = "DELISTED";

/// Statuses whose staged rows are eligible for commit into the ledger.
pub const COMMITTABLE_STATUSES: [&str; 2] =
    [VERIFICATION_STATUS_VERIFIED, VERIFICATION_STATUS_DELISTED];

/// Provider calls in flight at once during a batch verification.
pub const DEFAULT_VERIFY_CONCURRENCY: usize = 10;

/// Retry budget for one provider lookup.
pub const VERIFY_MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff between retries.
pub const VERIFY_BACKOFF_BASE_MS: u64 = 500;
