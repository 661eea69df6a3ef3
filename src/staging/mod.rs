pub(crate) mod staging_errors;
pub(crate) mod staging_model;
pub(crate) mod staging_repository;
pub(crate) mod staging_traits;

pub use staging_errors::StagingError;
pub use staging_model::{
    ImportBatchProgress, NewStagedTransaction, StagedSearchResponse, StagedSearchResponseMeta,
    StagedTransaction, StagedTransactionDB,
};
pub use staging_repository::StagingRepository;
pub use staging_traits::StagingRepositoryTrait;
