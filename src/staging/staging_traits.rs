use super::staging_errors::Result;
use super::staging_model::{
    ImportBatchProgress, NewStagedTransaction, StagedSearchResponse, StagedTransaction,
};
use crate::stocks::Stock;

/// Trait defining the contract for staging-store operations.
pub trait StagingRepositoryTrait: Send + Sync {
    fn append_rows(&self, rows: Vec<NewStagedTransaction>) -> Result<usize>;
    fn list_staged(
        &self,
        portfolio_id: &str,
        page: i64,
        page_size: i64,
    ) -> Result<StagedSearchResponse>;
    fn get_unprocessed_with_stocks(
        &self,
        portfolio_id: &str,
    ) -> Result<Vec<(StagedTransaction, Stock)>>;
    fn batch_progress(&self, import_batch_id: &str) -> Result<ImportBatchProgress>;
}

impl StagingRepositoryTrait for super::staging_repository::StagingRepository {
    fn append_rows(&self, rows: Vec<NewStagedTransaction>) -> Result<usize> {
        self.append_rows(rows)
    }

    fn list_staged(
        &self,
        portfolio_id: &str,
        page: i64,
        page_size: i64,
    ) -> Result<StagedSearchResponse> {
        self.list_staged(portfolio_id, page, page_size)
    }

    fn get_unprocessed_with_stocks(
        &self,
        portfolio_id: &str,
    ) -> Result<Vec<(StagedTransaction, Stock)>> {
        self.get_unprocessed_with_stocks(portfolio_id)
    }

    fn batch_progress(&self, import_batch_id: &str) -> Result<ImportBatchProgress> {
        self.batch_progress(import_batch_id)
    }
}
