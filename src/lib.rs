pub mod db;

pub mod errors;
pub mod importer;
pub mod market_data;
pub mod schema;
pub mod staging;
pub mod stocks;
pub mod validation;

pub use errors::{Error, Result};
