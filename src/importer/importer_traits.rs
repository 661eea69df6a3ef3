use crate::errors::Result;
use crate::staging::StagedTransaction;
use crate::stocks::Stock;

use super::importer_errors;
use super::importer_model::{CommitOutcome, CommitSummary, Transaction};

/// Trait defining the contract for the import committer.
#[async_trait::async_trait]
pub trait ImportServiceTrait: Send + Sync {
    async fn commit(&self, portfolio_id: &str) -> Result<CommitSummary>;
    fn list_transactions(&self, portfolio_id: &str) -> Result<Vec<Transaction>>;
}

/// Trait defining the contract for ledger repository operations.
pub trait ImportRepositoryTrait: Send + Sync {
    fn commit_row(
        &self,
        staged: &StagedTransaction,
        stock: &Stock,
    ) -> importer_errors::Result<CommitOutcome>;
    fn list_transactions(&self, portfolio_id: &str) -> importer_errors::Result<Vec<Transaction>>;
}

impl ImportRepositoryTrait for super::importer_repository::ImportRepository {
    fn commit_row(
        &self,
        staged: &StagedTransaction,
        stock: &Stock,
    ) -> importer_errors::Result<CommitOutcome> {
        self.commit_row(staged, stock)
    }

    fn list_transactions(&self, portfolio_id: &str) -> importer_errors::Result<Vec<Transaction>> {
        self.list_transactions(portfolio_id)
    }
}
