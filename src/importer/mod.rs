pub(crate) mod importer_errors;
pub(crate) mod importer_model;
pub(crate) mod importer_repository;
pub(crate) mod importer_service;
pub(crate) mod importer_traits;

pub use importer_errors::ImportError;
pub use importer_model::{CommitOutcome, CommitSummary, Transaction, TransactionDB};
pub use importer_repository::ImportRepository;
pub use importer_service::ImportService;
pub use importer_traits::{ImportRepositoryTrait, ImportServiceTrait};
