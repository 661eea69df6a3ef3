pub(crate) mod validation_constants;
pub(crate) mod validation_errors;
pub(crate) mod validation_model;
pub(crate) mod validation_service;
pub(crate) mod validation_traits;

pub use validation_constants::*;
pub use validation_errors::ValidationError;
pub use validation_model::{
    detect_mapping, parse_decimal, parse_raw_date, render_date, ColumnMapping, FileAnalysis,
    RowValidationError, TransactionType, ValidationSummary,
};
pub use validation_service::ValidationService;
pub use validation_traits::ValidationServiceTrait;
