//! # Financial Data Quality
//!
//! A library for validating periodic financial account statements for
//! internal consistency and reporting-period coverage before the data is
//! trusted downstream.
//!
//! ## Checks
//!
//! - **Balance reconciliation**: ending balance equals beginning balance
//!   plus all period deltas, within a configurable tolerance
//! - **Date-range validity**: the reporting period starts no later than
//!   it ends
//! - **Balance progression**: consecutive statements for an account chain
//!   balance-to-balance, with exact equality
//! - **Timeframe coverage**: every expected reporting month declared in
//!   the account metadata has at least one statement
//!
//! Checks never mutate the input batch and carry no state across runs.
//! Non-empty discrepancy sets are handed to a [`DiscrepancyRecorder`]
//! collaborator for structured logging.
//!
//! ## Example
//!
//! ```rust,ignore
//! use financial_data_quality::*;
//!
//! let statements = load_statements_from_path("statements.csv")?;
//! let accounts = load_account_metadata_from_path("accounts.csv")?;
//! let recorder = JsonFileRecorder::create("data_validation_logs.json")?;
//!
//! let report = validate_statements(&statements, Some(&accounts), &recorder)?;
//! if !report.is_clean() {
//!     generate_summary_report(&report, "data_quality_issues.csv")?;
//! }
//! ```

pub mod checks;
pub mod coverage;
pub mod engine;
pub mod error;
pub mod ingestion;
pub mod logger;
pub mod reports;
pub mod schema;
pub mod utils;

pub use checks::{
    check_balance_progression, check_balance_reconciliation, check_date_range_validity,
    expected_ending_balance, run_consistency_checks, BalanceDiscrepancy, ConsistencyResults,
    DateRangeDiscrepancy, ProgressionDiscrepancy, DEFAULT_TOLERANCE,
};
pub use coverage::{check_timeframe_coverage, AccountCoverage};
pub use engine::{CoverageOutcome, ValidationEngine, ValidationReport};
pub use error::{DataQualityError, Result};
pub use ingestion::{
    load_account_directory_from_path, load_account_metadata, load_account_metadata_from_path,
    load_statements, load_statements_from_path,
};
pub use logger::{
    DiscrepancyRecorder, JsonFileRecorder, LogRecorder, MemoryRecorder, RecordedEntry,
    DATA_VALIDATION_LOGGER_NAME,
};
pub use reports::{generate_summary_report, render_missing_months_chart, write_summary_csv};
pub use schema::{AccountDirectory, AccountMetadata, Month, StatementRecord};
pub use utils::{last_day_of_month, months_in_span, next_month_end, parse_statement_date};

/// Runs every check with the default tolerance. Coverage runs only when
/// account metadata is supplied.
pub fn validate_statements(
    statements: &[StatementRecord],
    metadata: Option<&[AccountMetadata]>,
    recorder: &dyn DiscrepancyRecorder,
) -> Result<ValidationReport> {
    ValidationEngine::new().run(statements, metadata, recorder)
}
