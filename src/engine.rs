use crate::checks::{
    run_consistency_checks, BalanceDiscrepancy, DateRangeDiscrepancy, ProgressionDiscrepancy,
    DEFAULT_TOLERANCE,
};
use crate::coverage::{check_timeframe_coverage, AccountCoverage};
use crate::error::{DataQualityError, Result};
use crate::logger::DiscrepancyRecorder;
use crate::schema::{AccountMetadata, StatementRecord};
use log::{debug, info, Level};
use serde::Serialize;
use serde_json::json;

/// Outcome of the coverage check as a whole. A batch-level date parse
/// failure surfaces here as a failed-check result rather than aborting
/// the consistency checks that already ran.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CoverageOutcome {
    Completed { accounts: Vec<AccountCoverage> },
    Aborted { reason: String },
}

/// Aggregated result of one validation run, keyed by rule name when
/// serialized. `coverage` is present only when account metadata was
/// supplied.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub balance_reconciliation: Vec<BalanceDiscrepancy>,
    pub date_range_validity: Vec<DateRangeDiscrepancy>,
    pub balance_progression: Vec<ProgressionDiscrepancy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<CoverageOutcome>,
}

impl ValidationReport {
    /// True when no rule produced a finding and coverage, if run, found
    /// every expected month and skipped nothing.
    pub fn is_clean(&self) -> bool {
        let coverage_clean = match &self.coverage {
            None => true,
            Some(CoverageOutcome::Aborted { .. }) => false,
            Some(CoverageOutcome::Completed { accounts }) => accounts
                .iter()
                .all(|a| matches!(a.missing_months(), Some(months) if months.is_empty())),
        };

        self.balance_reconciliation.is_empty()
            && self.date_range_validity.is_empty()
            && self.balance_progression.is_empty()
            && coverage_clean
    }

    pub fn total_discrepancies(&self) -> usize {
        let coverage_findings = match &self.coverage {
            Some(CoverageOutcome::Completed { accounts }) => accounts
                .iter()
                .filter(|a| !matches!(a.missing_months(), Some(months) if months.is_empty()))
                .count(),
            _ => 0,
        };

        self.balance_reconciliation.len()
            + self.date_range_validity.len()
            + self.balance_progression.len()
            + coverage_findings
    }
}

/// Runs every validation rule over an in-memory statement batch and
/// routes non-empty discrepancy sets to the supplied recorder.
pub struct ValidationEngine {
    tolerance: f64,
}

impl ValidationEngine {
    pub fn new() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    pub fn with_tolerance(tolerance: f64) -> Result<Self> {
        if tolerance.is_nan() || tolerance < 0.0 {
            return Err(DataQualityError::InvalidTolerance(tolerance));
        }
        Ok(Self { tolerance })
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn run(
        &self,
        statements: &[StatementRecord],
        metadata: Option<&[AccountMetadata]>,
        recorder: &dyn DiscrepancyRecorder,
    ) -> Result<ValidationReport> {
        info!(
            "Validating batch of {} statement records{}",
            statements.len(),
            if metadata.is_some() {
                " with account metadata"
            } else {
                ""
            }
        );

        let consistency = run_consistency_checks(statements, self.tolerance)?;

        if !consistency.balance_reconciliation.is_empty() {
            recorder.record(
                Level::Error,
                "Balance reconciliation discrepancies detected",
                serde_json::to_value(&consistency.balance_reconciliation)?,
            );
        }

        if !consistency.date_range_validity.is_empty() {
            recorder.record(
                Level::Error,
                "Invalid date ranges detected",
                serde_json::to_value(&consistency.date_range_validity)?,
            );
        }

        if !consistency.balance_progression.is_empty() {
            recorder.record(
                Level::Error,
                "Balance progression mismatches detected",
                serde_json::to_value(&consistency.balance_progression)?,
            );
        }

        let coverage = match metadata {
            None => None,
            Some(accounts) => Some(self.run_coverage(statements, accounts, recorder)?),
        };

        let report = ValidationReport {
            balance_reconciliation: consistency.balance_reconciliation,
            date_range_validity: consistency.date_range_validity,
            balance_progression: consistency.balance_progression,
            coverage,
        };

        debug!(
            "Validation finished with {} discrepancies",
            report.total_discrepancies()
        );

        Ok(report)
    }

    fn run_coverage(
        &self,
        statements: &[StatementRecord],
        accounts: &[AccountMetadata],
        recorder: &dyn DiscrepancyRecorder,
    ) -> Result<CoverageOutcome> {
        let results = match check_timeframe_coverage(statements, accounts) {
            Ok(results) => results,
            Err(e @ DataQualityError::DateParse { .. }) => {
                let reason = e.to_string();
                recorder.record(
                    Level::Error,
                    "Timeframe coverage aborted",
                    json!({ "reason": reason }),
                );
                return Ok(CoverageOutcome::Aborted { reason });
            }
            Err(e) => return Err(e),
        };

        for account in &results {
            match account {
                AccountCoverage::Checked {
                    account_name,
                    missing_months,
                } if !missing_months.is_empty() => {
                    recorder.record(
                        Level::Warn,
                        &format!("Missing months detected for account '{}'", account_name),
                        serde_json::to_value(account)?,
                    );
                }
                AccountCoverage::Skipped {
                    account_name,
                    reason,
                } => {
                    recorder.record(
                        Level::Error,
                        &format!(
                            "Coverage check skipped for account '{}': {}",
                            account_name, reason
                        ),
                        serde_json::to_value(account)?,
                    );
                }
                AccountCoverage::Checked { .. } => {}
            }
        }

        Ok(CoverageOutcome::Completed { accounts: results })
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}
