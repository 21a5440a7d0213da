use crate::error::{DataQualityError, Result};
use crate::schema::StatementRecord;
use crate::utils::parse_statement_date;
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_TOLERANCE: f64 = 1e-5;

/// A record whose ending balance does not reconcile against the beginning
/// balance plus the period deltas. Balances are reported as found; an
/// absent expected balance means the record had missing fields and could
/// not be reconciled at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceDiscrepancy {
    pub account_name: String,
    pub start_date: String,
    pub end_date: String,
    pub beginning_balance: Option<f64>,
    pub ending_balance: Option<f64>,
    pub expected_ending_balance: Option<f64>,
}

/// A record whose reporting period is reversed or has an unparsable date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRangeDiscrepancy {
    pub account_name: String,
    pub start_date: String,
    pub end_date: String,
}

/// An adjacent pair of statements whose balances do not chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressionDiscrepancy {
    pub account_name: String,
    pub previous_end_date: String,
    pub previous_ending_balance: Option<f64>,
    pub current_start_date: String,
    pub current_beginning_balance: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsistencyResults {
    pub balance_reconciliation: Vec<BalanceDiscrepancy>,
    pub date_range_validity: Vec<DateRangeDiscrepancy>,
    pub balance_progression: Vec<ProgressionDiscrepancy>,
}

impl ConsistencyResults {
    pub fn is_clean(&self) -> bool {
        self.balance_reconciliation.is_empty()
            && self.date_range_validity.is_empty()
            && self.balance_progression.is_empty()
    }
}

/// Beginning balance plus all period deltas, or None when any component
/// is missing.
pub fn expected_ending_balance(record: &StatementRecord) -> Option<f64> {
    Some(
        record.beginning_balance?
            + record.my_contributions?
            + record.employer_contributions?
            + record.credits?
            + record.change_in_market_value?,
    )
}

/// Flags records whose ending balance differs from the expected ending
/// balance by more than `tolerance`. Equality to the tolerance is clean
/// (strict `>`); a record with missing balance or delta fields cannot be
/// reconciled and is flagged.
pub fn check_balance_reconciliation(
    data: &[StatementRecord],
    tolerance: f64,
) -> Result<Vec<BalanceDiscrepancy>> {
    if tolerance.is_nan() || tolerance < 0.0 {
        return Err(DataQualityError::InvalidTolerance(tolerance));
    }

    debug!(
        "Running balance reconciliation over {} records (tolerance {})",
        data.len(),
        tolerance
    );

    let mut discrepancies = Vec::new();
    for record in data {
        let expected = expected_ending_balance(record);

        let discrepant = match (record.ending_balance, expected) {
            (Some(ending), Some(expected)) => {
                let difference = (ending - expected).abs();
                !difference.is_finite() || difference > tolerance
            }
            _ => true,
        };

        if discrepant {
            discrepancies.push(BalanceDiscrepancy {
                account_name: record.account_name.clone(),
                start_date: record.start_date.clone(),
                end_date: record.end_date.clone(),
                beginning_balance: record.beginning_balance,
                ending_balance: record.ending_balance,
                expected_ending_balance: expected,
            });
        }
    }

    Ok(discrepancies)
}

/// Flags records where the period start falls after the period end. A
/// record with an unparsable date cannot be validated and is flagged.
pub fn check_date_range_validity(data: &[StatementRecord]) -> Vec<DateRangeDiscrepancy> {
    debug!("Running date range validity over {} records", data.len());

    let mut discrepancies = Vec::new();
    for record in data {
        let invalid = match (
            parse_statement_date(&record.start_date),
            parse_statement_date(&record.end_date),
        ) {
            (Some(start), Some(end)) => start > end,
            _ => true,
        };

        if invalid {
            discrepancies.push(DateRangeDiscrepancy {
                account_name: record.account_name.clone(),
                start_date: record.start_date.clone(),
                end_date: record.end_date.clone(),
            });
        }
    }

    discrepancies
}

/// For each account, checks that the ending balance of one statement
/// equals the beginning balance of the next, in start-date order. The
/// comparison is exact: chaining validates bookkeeping identity, not
/// float arithmetic. Missing balances on either side of a pair count as
/// a mismatch.
pub fn check_balance_progression(data: &[StatementRecord]) -> Vec<ProgressionDiscrepancy> {
    debug!("Running balance progression over {} records", data.len());

    let mut groups: BTreeMap<&str, Vec<&StatementRecord>> = BTreeMap::new();
    for record in data {
        groups.entry(&record.account_name).or_default().push(record);
    }

    let mut discrepancies = Vec::new();
    for (account_name, mut group) in groups {
        // Stable sort: unparsable dates order first, input order preserved
        // among equal keys.
        group.sort_by_key(|r| parse_statement_date(&r.start_date));

        for pair in group.windows(2) {
            let (previous, current) = (pair[0], pair[1]);

            let mismatch = match (previous.ending_balance, current.beginning_balance) {
                (Some(prev_ending), Some(cur_beginning)) => prev_ending != cur_beginning,
                _ => true,
            };

            if mismatch {
                discrepancies.push(ProgressionDiscrepancy {
                    account_name: account_name.to_string(),
                    previous_end_date: previous.end_date.clone(),
                    previous_ending_balance: previous.ending_balance,
                    current_start_date: current.start_date.clone(),
                    current_beginning_balance: current.beginning_balance,
                });
            }
        }
    }

    discrepancies
}

/// Runs all three consistency checks over the batch.
pub fn run_consistency_checks(
    data: &[StatementRecord],
    tolerance: f64,
) -> Result<ConsistencyResults> {
    Ok(ConsistencyResults {
        balance_reconciliation: check_balance_reconciliation(data, tolerance)?,
        date_range_validity: check_date_range_validity(data),
        balance_progression: check_balance_progression(data),
    })
}
