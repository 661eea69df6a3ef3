use dashmap::DashMap;
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::errors::Result;
use crate::importer::importer_model::{CommitOutcome, CommitSummary, Transaction};
use crate::importer::{ImportRepositoryTrait, ImportServiceTrait};
use crate::staging::StagingRepositoryTrait;

/// Service promoting eligible staged rows into the immutable ledger
pub struct ImportService {
    staging_repository: Arc<dyn StagingRepositoryTrait>,
    repository: Arc<dyn ImportRepositoryTrait>,
    /// Advisory per-portfolio locks; concurrent commits for one portfolio
    /// serialize here, the row-level compare-and-set is the backstop.
    portfolio_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ImportService {
    pub fn new(
        staging_repository: Arc<dyn StagingRepositoryTrait>,
        repository: Arc<dyn ImportRepositoryTrait>,
    ) -> Self {
        Self {
            staging_repository,
            repository,
            portfolio_locks: DashMap::new(),
        }
    }

    fn lock_for(&self, portfolio_id: &str) -> Arc<Mutex<()>> {
        self.portfolio_locks
            .entry(portfolio_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[async_trait::async_trait]
impl ImportServiceTrait for ImportService {
    /// Commits every unprocessed staged row whose stock has been verified
    /// (or delisted). Rows with pending or failed stocks are left for the
    /// next invocation; repeating the call with no staged delta is a no-op.
    async fn commit(&self, portfolio_id: &str) -> Result<CommitSummary> {
        let lock = self.lock_for(portfolio_id);
        let _guard = lock.lock().await;

        let rows = self
            .staging_repository
            .get_unprocessed_with_stocks(portfolio_id)?;

        let (eligible, held_back): (Vec<_>, Vec<_>) = rows
            .into_iter()
            .partition(|(_, stock)| stock.status().is_committable());

        let verified_transactions_found = eligible.len();
        let unverified_transactions = held_back.len();

        let mut transactions_imported = 0usize;
        let mut actual_import_errors: Vec<String> = Vec::new();
        let mut stocks_with_transactions: BTreeSet<String> = BTreeSet::new();

        for (staged, stock) in &eligible {
            match self.repository.commit_row(staged, stock) {
                Ok(CommitOutcome::Imported) => {
                    transactions_imported += 1;
                    stocks_with_transactions.insert(stock.id.clone());
                }
                Ok(CommitOutcome::AlreadyProcessed) => {
                    // Lost the race to a concurrent commit; not an error.
                    debug!("Staged row {} already committed, skipping", staged.id);
                }
                Err(e) => {
                    warn!("Failed to commit staged row {}: {}", staged.id, e);
                    actual_import_errors.push(format!("Row {}: {}", staged.id, e));
                }
            }
        }

        info!(
            "Commit for portfolio {}: {} imported, {} errors, {} awaiting verification",
            portfolio_id,
            transactions_imported,
            actual_import_errors.len(),
            unverified_transactions
        );

        Ok(CommitSummary {
            verified_transactions_found,
            transactions_imported,
            actual_import_errors,
            stocks_with_transactions: stocks_with_transactions.into_iter().collect(),
            unverified_transactions,
        })
    }

    fn list_transactions(&self, portfolio_id: &str) -> Result<Vec<Transaction>> {
        Ok(self.repository.list_transactions(portfolio_id)?)
    }
}
