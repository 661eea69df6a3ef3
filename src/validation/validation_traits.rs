use std::collections::HashMap;

use super::validation_model::{ColumnMapping, ValidationSummary};
use crate::errors::Result;

/// Trait defining the contract for the validation engine.
pub trait ValidationServiceTrait: Send + Sync {
    fn validate_and_stage(
        &self,
        portfolio_id: &str,
        rows: Vec<HashMap<String, String>>,
        mapping: &ColumnMapping,
        date_format: &str,
    ) -> Result<ValidationSummary>;
}
