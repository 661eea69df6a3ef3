mod common;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;

use folioflow_core::db::DbPool;
use folioflow_core::importer::{ImportRepository, ImportService, ImportServiceTrait};
use folioflow_core::market_data::MarketDataProvider;
use folioflow_core::staging::StagingRepository;
use folioflow_core::stocks::{
    StockAssignment, StockRepository, StockService, StockServiceTrait, VerificationStatus,
    VERIFY_MAX_RETRIES,
};
use folioflow_core::validation::{render_date, ValidationService, ValidationServiceTrait};

use common::{default_mapping, raw_row, setup_pool, FlakyProvider, StubProvider};

struct Pipeline {
    staging_repo: Arc<StagingRepository>,
    stock_repo: Arc<StockRepository>,
    validation: ValidationService,
    stocks: StockService,
    importer: Arc<ImportService>,
}

fn build_pipeline(pool: Arc<DbPool>, provider: Arc<dyn MarketDataProvider>) -> Pipeline {
    let staging_repo = Arc::new(StagingRepository::new(pool.clone()));
    let stock_repo = Arc::new(StockRepository::new(pool.clone()));
    let import_repo = Arc::new(ImportRepository::new(pool.clone()));

    let validation = ValidationService::new(staging_repo.clone(), stock_repo.clone());
    let stocks = StockService::new(stock_repo.clone(), provider);
    let importer = Arc::new(ImportService::new(staging_repo.clone(), import_repo));

    Pipeline {
        staging_repo,
        stock_repo,
        validation,
        stocks,
        importer,
    }
}

fn buy_row(date: &str, symbol: &str, quantity: &str, price: &str) -> HashMap<String, String> {
    raw_row(&[
        ("date", date),
        ("symbol", symbol),
        ("type", "BUY"),
        ("quantity", quantity),
        ("price", price),
        ("fees", "9.50"),
    ])
}

#[tokio::test]
async fn validates_and_commits_single_row() {
    let dir = tempfile::tempdir().unwrap();
    let pool = setup_pool(&dir);
    let provider = Arc::new(StubProvider::new(&[("AAPL", "Apple Inc.", "USD")]));
    let pipeline = build_pipeline(pool, provider);

    let summary = pipeline
        .validation
        .validate_and_stage(
            "portfolio-1",
            vec![buy_row("2023-12-25", "AAPL", "10", "150.00")],
            &default_mapping(),
            "YYYY-MM-DD",
        )
        .unwrap();

    assert_eq!(summary.total_rows, 1);
    assert_eq!(summary.valid_rows, 1);
    assert_eq!(summary.unique_instruments, vec!["AAPL".to_string()]);
    assert_eq!(summary.new_stock_symbols, vec!["AAPL".to_string()]);
    assert!(summary.validation_errors.is_empty());

    // NASDAQ carries no suffix; the external symbol is the bare code.
    let assigned = pipeline.stocks.assign_market("AAPL", "NASDAQ").unwrap();
    assert_eq!(assigned.yahoo_symbol.as_deref(), Some("AAPL"));
    assert_eq!(assigned.status(), VerificationStatus::Pending);

    let verified = pipeline.stocks.verify("AAPL").await.unwrap();
    assert_eq!(verified.status(), VerificationStatus::Verified);
    assert_eq!(verified.name.as_deref(), Some("Apple Inc."));
    assert_eq!(verified.currency.as_deref(), Some("USD"));

    let commit = pipeline.importer.commit("portfolio-1").await.unwrap();
    assert_eq!(commit.verified_transactions_found, 1);
    assert_eq!(commit.transactions_imported, 1);
    assert!(commit.actual_import_errors.is_empty());
    assert_eq!(commit.unverified_transactions, 0);
    assert_eq!(commit.stocks_with_transactions, vec![verified.id.clone()]);

    let ledger = pipeline.importer.list_transactions("portfolio-1").unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].quantity, 10.0);
    assert_eq!(ledger[0].price, 150.0);
    assert_eq!(
        ledger[0].transaction_date,
        NaiveDate::from_ymd_opt(2023, 12, 25).unwrap()
    );

    // Repeating the commit with no staged delta is a no-op.
    let again = pipeline.importer.commit("portfolio-1").await.unwrap();
    assert_eq!(again.transactions_imported, 0);
    assert_eq!(again.verified_transactions_found, 0);
    assert_eq!(
        pipeline.importer.list_transactions("portfolio-1").unwrap().len(),
        1
    );
}

#[tokio::test]
async fn pending_stock_rows_are_held_back_until_verified() {
    let dir = tempfile::tempdir().unwrap();
    let pool = setup_pool(&dir);
    let provider = Arc::new(StubProvider::new(&[("MSFT", "Microsoft Corp.", "USD")]));
    let pipeline = build_pipeline(pool, provider);

    pipeline
        .validation
        .validate_and_stage(
            "portfolio-1",
            vec![buy_row("2024-01-10", "MSFT", "5", "400.00")],
            &default_mapping(),
            "YYYY-MM-DD",
        )
        .unwrap();

    // The stock exists but is still pending; nothing is eligible.
    let held = pipeline.importer.commit("portfolio-1").await.unwrap();
    assert_eq!(held.transactions_imported, 0);
    assert_eq!(held.unverified_transactions, 1);
    assert!(pipeline
        .importer
        .list_transactions("portfolio-1")
        .unwrap()
        .is_empty());

    pipeline.stocks.assign_market("MSFT", "NASDAQ").unwrap();
    pipeline.stocks.verify("MSFT").await.unwrap();

    let commit = pipeline.importer.commit("portfolio-1").await.unwrap();
    assert_eq!(commit.transactions_imported, 1);
    assert_eq!(commit.unverified_transactions, 0);
}

#[tokio::test]
async fn invalid_rows_are_staged_with_errors() {
    let dir = tempfile::tempdir().unwrap();
    let pool = setup_pool(&dir);
    let provider = Arc::new(StubProvider::new(&[("AAPL", "Apple Inc.", "USD")]));
    let pipeline = build_pipeline(pool, provider);

    let rows = vec![
        buy_row("2023-12-25", "AAPL", "10", "150.00"),
        buy_row("25/12/2023", "AAPL", "10", "150.00"), // wrong date format
        raw_row(&[
            ("date", "2023-12-26"),
            ("symbol", "AAPL"),
            ("type", "GIFTED"),
            ("quantity", "-3"),
            ("price", "1.00"),
        ]),
    ];

    let summary = pipeline
        .validation
        .validate_and_stage("portfolio-1", rows, &default_mapping(), "YYYY-MM-DD")
        .unwrap();

    assert_eq!(summary.total_rows, 3);
    assert_eq!(summary.valid_rows, 1);
    assert_eq!(summary.unique_instruments, vec!["AAPL".to_string()]);

    let date_errors: Vec<_> = summary
        .validation_errors
        .iter()
        .filter(|e| e.field == "date")
        .collect();
    assert_eq!(date_errors.len(), 1);
    assert_eq!(date_errors[0].row_index, 1);
    assert_eq!(date_errors[0].value, "25/12/2023");

    assert!(summary
        .validation_errors
        .iter()
        .any(|e| e.field == "transactionType" && e.row_index == 2));
    assert!(summary
        .validation_errors
        .iter()
        .any(|e| e.field == "quantity" && e.row_index == 2));

    // All three rows are persisted; the invalid ones carry their error.
    let listing = pipeline.staging_repo.list_staged("portfolio-1", 0, 50).unwrap();
    assert_eq!(listing.meta.total_row_count, 3);
    assert_eq!(
        listing.data.iter().filter(|r| r.row_error.is_some()).count(),
        2
    );
    assert!(listing.data.iter().all(|r| !r.processed));

    // Commit promotes only the valid row; the broken ones never qualify.
    pipeline.stocks.assign_market("AAPL", "NASDAQ").unwrap();
    pipeline.stocks.verify("AAPL").await.unwrap();
    let commit = pipeline.importer.commit("portfolio-1").await.unwrap();
    assert_eq!(commit.transactions_imported, 1);

    let progress = pipeline
        .staging_repo
        .batch_progress(&summary.import_batch_id)
        .unwrap();
    assert_eq!(progress.total_rows, 3);
    assert_eq!(progress.processed_rows, 1);
}

#[tokio::test]
async fn verify_batch_isolates_failures() {
    let dir = tempfile::tempdir().unwrap();
    let pool = setup_pool(&dir);
    let provider = Arc::new(StubProvider::new(&[
        ("BHP.AX", "BHP Group", "AUD"),
        ("CBA.AX", "Commonwealth Bank", "AUD"),
        ("WES.AX", "Wesfarmers", "AUD"),
    ]));
    let pipeline = build_pipeline(pool, provider);

    let codes = ["BHP", "CBA", "WES", "XXX", "YYY"];
    for code in codes {
        pipeline.stock_repo.get_or_create_pending(code).unwrap();
    }

    let assignments = codes
        .iter()
        .map(|code| StockAssignment {
            instrument_code: code.to_string(),
            market_key: "ASX".to_string(),
        })
        .collect();

    let results = pipeline.stocks.verify_batch(assignments).await.unwrap();
    assert_eq!(results.len(), 5);
    assert_eq!(results.iter().filter(|r| r.success).count(), 3);

    for result in &results {
        let stock = pipeline
            .stock_repo
            .get_by_instrument_code(&result.instrument_code)
            .unwrap()
            .unwrap();
        if result.success {
            assert_eq!(stock.status(), VerificationStatus::Verified);
            assert!(result.name.is_some());
            assert_eq!(result.currency.as_deref(), Some("AUD"));
        } else {
            assert_eq!(stock.status(), VerificationStatus::Failed);
            assert!(result.error.is_some());
            assert!(stock.verification_error.is_some());
        }
    }
}

#[tokio::test]
async fn market_reassignment_resets_verification() {
    let dir = tempfile::tempdir().unwrap();
    let pool = setup_pool(&dir);
    let provider = Arc::new(StubProvider::new(&[("BHP.AX", "BHP Group", "AUD")]));
    let pipeline = build_pipeline(pool, provider);

    pipeline.stock_repo.get_or_create_pending("BHP").unwrap();
    pipeline.stocks.assign_market("BHP", "ASX").unwrap();
    let verified = pipeline.stocks.verify("BHP").await.unwrap();
    assert_eq!(verified.status(), VerificationStatus::Verified);
    assert_eq!(verified.yahoo_symbol.as_deref(), Some("BHP.AX"));
    assert_eq!(verified.name.as_deref(), Some("BHP Group"));

    // Moving the stock to another market invalidates everything the first
    // verification filled in.
    let reassigned = pipeline.stocks.assign_market("BHP", "NYSE").unwrap();
    assert_eq!(reassigned.status(), VerificationStatus::Pending);
    assert_eq!(reassigned.yahoo_symbol.as_deref(), Some("BHP"));
    assert!(reassigned.name.is_none());
    assert!(reassigned.currency.is_none());
    assert!(reassigned.verification_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn transient_provider_errors_are_retried() {
    let dir = tempfile::tempdir().unwrap();
    let pool = setup_pool(&dir);
    let provider = Arc::new(FlakyProvider::new(2, "Apple Inc.", "USD"));
    let pipeline = build_pipeline(pool, provider.clone());

    pipeline.stock_repo.get_or_create_pending("AAPL").unwrap();
    pipeline.stocks.assign_market("AAPL", "NASDAQ").unwrap();

    // Two rate-limit responses, then success on the final attempt.
    let stock = pipeline.stocks.verify("AAPL").await.unwrap();
    assert_eq!(stock.status(), VerificationStatus::Verified);
    assert_eq!(stock.name.as_deref(), Some("Apple Inc."));
    assert_eq!(provider.attempts(), VERIFY_MAX_RETRIES);
}

#[tokio::test(start_paused = true)]
async fn exhausted_retry_budget_demotes_to_failed() {
    let dir = tempfile::tempdir().unwrap();
    let pool = setup_pool(&dir);
    let provider = Arc::new(FlakyProvider::new(u32::MAX, "Apple Inc.", "USD"));
    let pipeline = build_pipeline(pool, provider.clone());

    pipeline.stock_repo.get_or_create_pending("AAPL").unwrap();
    pipeline.stocks.assign_market("AAPL", "NASDAQ").unwrap();

    let stock = pipeline.stocks.verify("AAPL").await.unwrap();
    assert_eq!(stock.status(), VerificationStatus::Failed);
    assert!(stock.verification_error.is_some());
    // The budget bounds the provider calls; nothing retries past it.
    assert_eq!(provider.attempts(), VERIFY_MAX_RETRIES);
}

#[tokio::test]
async fn summaries_serialize_in_camel_case() {
    let dir = tempfile::tempdir().unwrap();
    let pool = setup_pool(&dir);
    let provider = Arc::new(StubProvider::new(&[]));
    let pipeline = build_pipeline(pool, provider);

    let summary = pipeline
        .validation
        .validate_and_stage(
            "portfolio-1",
            vec![buy_row("2024-03-01", "AAPL", "1", "100.00")],
            &default_mapping(),
            "YYYY-MM-DD",
        )
        .unwrap();

    let value = serde_json::to_value(&summary).unwrap();
    assert!(value.get("importBatchId").is_some());
    assert!(value.get("validRows").is_some());
    assert!(value.get("newStockSymbols").is_some());
    assert!(value.get("validationErrors").is_some());

    let commit = pipeline.importer.commit("portfolio-1").await.unwrap();
    let value = serde_json::to_value(&commit).unwrap();
    assert!(value.get("verifiedTransactionsFound").is_some());
    assert!(value.get("transactionsImported").is_some());
    assert!(value.get("actualImportErrors").is_some());
    assert!(value.get("unverifiedTransactions").is_some());
}

#[tokio::test]
async fn unknown_market_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let pool = setup_pool(&dir);
    let provider = Arc::new(StubProvider::new(&[]));
    let pipeline = build_pipeline(pool, provider);

    pipeline.stock_repo.get_or_create_pending("BHP").unwrap();
    let result = pipeline.stocks.assign_market("BHP", "MARS");
    assert!(result.is_err());
}

#[tokio::test]
async fn delisted_stock_rows_still_commit() {
    let dir = tempfile::tempdir().unwrap();
    let pool = setup_pool(&dir);
    let provider = Arc::new(StubProvider::new(&[]));
    let pipeline = build_pipeline(pool, provider);

    pipeline
        .validation
        .validate_and_stage(
            "portfolio-1",
            vec![buy_row("2020-06-30", "OLDCO", "100", "2.50")],
            &default_mapping(),
            "YYYY-MM-DD",
        )
        .unwrap();

    pipeline.stocks.mark_delisted("OLDCO").unwrap();

    let commit = pipeline.importer.commit("portfolio-1").await.unwrap();
    assert_eq!(commit.transactions_imported, 1);
}

#[tokio::test]
async fn reset_status_forces_stocks_back_to_pending() {
    let dir = tempfile::tempdir().unwrap();
    let pool = setup_pool(&dir);
    let provider = Arc::new(StubProvider::new(&[("AAPL", "Apple Inc.", "USD")]));
    let pipeline = build_pipeline(pool, provider);

    let stock = pipeline.stock_repo.get_or_create_pending("AAPL").unwrap();
    pipeline.stocks.assign_market("AAPL", "NASDAQ").unwrap();
    pipeline.stocks.verify("AAPL").await.unwrap();

    let outcomes = pipeline
        .stocks
        .reset_status(vec![stock.id.clone(), "missing-id".to_string()])
        .unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].success);
    assert!(!outcomes[1].success);

    let reset = pipeline.stock_repo.get_by_id(&stock.id).unwrap();
    assert_eq!(reset.status(), VerificationStatus::Pending);
}

#[tokio::test]
async fn compact_date_format_round_trips_through_staging() {
    let dir = tempfile::tempdir().unwrap();
    let pool = setup_pool(&dir);
    let provider = Arc::new(StubProvider::new(&[]));
    let pipeline = build_pipeline(pool, provider);

    pipeline
        .validation
        .validate_and_stage(
            "portfolio-1",
            vec![buy_row("20231225", "AAPL", "10", "150.00")],
            &default_mapping(),
            "YYYYMMDD",
        )
        .unwrap();

    let listing = pipeline.staging_repo.list_staged("portfolio-1", 0, 10).unwrap();
    let staged = &listing.data[0];
    assert_eq!(staged.raw_date, "20231225");
    assert_eq!(
        staged.transaction_date,
        Some(NaiveDate::from_ymd_opt(2023, 12, 25).unwrap())
    );
    assert_eq!(
        render_date(staged.transaction_date.unwrap(), "YYYYMMDD").unwrap(),
        "20231225"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_commits_do_not_duplicate_rows() {
    let dir = tempfile::tempdir().unwrap();
    let pool = setup_pool(&dir);
    let provider = Arc::new(StubProvider::new(&[("AAPL", "Apple Inc.", "USD")]));
    let pipeline = build_pipeline(pool, provider);

    let rows: Vec<_> = (1..=10)
        .map(|day| buy_row(&format!("2024-01-{:02}", day), "AAPL", "1", "100.00"))
        .collect();
    pipeline
        .validation
        .validate_and_stage("portfolio-1", rows, &default_mapping(), "YYYY-MM-DD")
        .unwrap();

    pipeline.stocks.assign_market("AAPL", "NASDAQ").unwrap();
    pipeline.stocks.verify("AAPL").await.unwrap();

    let importer_a = pipeline.importer.clone();
    let importer_b = pipeline.importer.clone();
    let (first, second) = tokio::join!(
        tokio::spawn(async move { importer_a.commit("portfolio-1").await.unwrap() }),
        tokio::spawn(async move { importer_b.commit("portfolio-1").await.unwrap() }),
    );
    let first = first.unwrap();
    let second = second.unwrap();

    // Whichever call ran second saw no remaining rows; between them exactly
    // one ledger entry exists per staged row.
    assert_eq!(first.transactions_imported + second.transactions_imported, 10);
    assert!(first.actual_import_errors.is_empty());
    assert!(second.actual_import_errors.is_empty());

    let ledger = pipeline.importer.list_transactions("portfolio-1").unwrap();
    assert_eq!(ledger.len(), 10);

    let distinct_sources: std::collections::HashSet<_> =
        ledger.iter().map(|t| t.source_staged_id.clone()).collect();
    assert_eq!(distinct_sources.len(), 10);

    let unprocessed = pipeline
        .staging_repo
        .get_unprocessed_with_stocks("portfolio-1")
        .unwrap();
    assert!(unprocessed.is_empty());
}

#[tokio::test]
async fn commits_are_scoped_to_one_portfolio() {
    let dir = tempfile::tempdir().unwrap();
    let pool = setup_pool(&dir);
    let provider = Arc::new(StubProvider::new(&[("AAPL", "Apple Inc.", "USD")]));
    let pipeline = build_pipeline(pool, provider);

    for portfolio in ["portfolio-1", "portfolio-2"] {
        pipeline
            .validation
            .validate_and_stage(
                portfolio,
                vec![buy_row("2024-02-01", "AAPL", "1", "100.00")],
                &default_mapping(),
                "YYYY-MM-DD",
            )
            .unwrap();
    }

    pipeline.stocks.assign_market("AAPL", "NASDAQ").unwrap();
    pipeline.stocks.verify("AAPL").await.unwrap();

    let commit = pipeline.importer.commit("portfolio-1").await.unwrap();
    assert_eq!(commit.transactions_imported, 1);

    // The other portfolio's staged rows are untouched.
    assert!(pipeline
        .importer
        .list_transactions("portfolio-2")
        .unwrap()
        .is_empty());
    assert_eq!(
        pipeline
            .staging_repo
            .get_unprocessed_with_stocks("portfolio-2")
            .unwrap()
            .len(),
        1
    );
}
