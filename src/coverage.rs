use crate::error::{DataQualityError, Result};
use crate::schema::{AccountMetadata, Month, StatementRecord};
use crate::utils::{months_in_span, parse_statement_date};
use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Per-account coverage result. An account whose own metadata cannot be
/// parsed is skipped with a reason instead of aborting the remaining
/// accounts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AccountCoverage {
    Checked {
        account_name: String,
        missing_months: Vec<Month>,
    },
    Skipped {
        account_name: String,
        reason: String,
    },
}

impl AccountCoverage {
    pub fn account_name(&self) -> &str {
        match self {
            AccountCoverage::Checked { account_name, .. } => account_name,
            AccountCoverage::Skipped { account_name, .. } => account_name,
        }
    }

    pub fn missing_months(&self) -> Option<&[Month]> {
        match self {
            AccountCoverage::Checked { missing_months, .. } => Some(missing_months),
            AccountCoverage::Skipped { .. } => None,
        }
    }
}

/// Detects, for every account in the metadata table, which expected
/// reporting months have no statement. A month is expected when its last
/// day falls inside the account's declared span; a month is covered when
/// at least one of the account's statements starts inside it.
///
/// Any unparsable statement start date aborts the whole run: coverage
/// cannot be computed against a timeline with holes of unknown position.
pub fn check_timeframe_coverage(
    data: &[StatementRecord],
    accounts: &[AccountMetadata],
) -> Result<Vec<AccountCoverage>> {
    debug!(
        "Running timeframe coverage over {} records and {} accounts",
        data.len(),
        accounts.len()
    );

    let mut actual_months: BTreeMap<&str, BTreeSet<Month>> = BTreeMap::new();
    for record in data {
        let start = parse_statement_date(&record.start_date).ok_or_else(|| {
            DataQualityError::DateParse {
                context: format!("statement start_date for account '{}'", record.account_name),
                value: record.start_date.clone(),
            }
        })?;

        actual_months
            .entry(&record.account_name)
            .or_default()
            .insert(Month::from(start));
    }

    let mut results = Vec::with_capacity(accounts.len());
    for account in accounts {
        results.push(coverage_for_account(account, &actual_months));
    }

    Ok(results)
}

fn coverage_for_account(
    account: &AccountMetadata,
    actual_months: &BTreeMap<&str, BTreeSet<Month>>,
) -> AccountCoverage {
    let expected_start = match parse_statement_date(&account.expected_start_date) {
        Some(date) => date,
        None => {
            return AccountCoverage::Skipped {
                account_name: account.account_name.clone(),
                reason: format!(
                    "unparsable expected_start_date '{}'",
                    account.expected_start_date
                ),
            }
        }
    };

    let expected_end = match parse_statement_date(&account.expected_end_date) {
        Some(date) => date,
        None => {
            return AccountCoverage::Skipped {
                account_name: account.account_name.clone(),
                reason: format!(
                    "unparsable expected_end_date '{}'",
                    account.expected_end_date
                ),
            }
        }
    };

    let covered = actual_months.get(account.account_name.as_str());
    let missing_months = months_in_span(expected_start, expected_end)
        .into_iter()
        .filter(|month| covered.map_or(true, |set| !set.contains(month)))
        .collect();

    AccountCoverage::Checked {
        account_name: account.account_name.clone(),
        missing_months,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement(account: &str, start: &str) -> StatementRecord {
        StatementRecord {
            account_name: account.to_string(),
            start_date: start.to_string(),
            end_date: start.to_string(),
            beginning_balance: Some(0.0),
            ending_balance: Some(0.0),
            my_contributions: Some(0.0),
            employer_contributions: Some(0.0),
            credits: Some(0.0),
            change_in_market_value: Some(0.0),
        }
    }

    fn metadata(account: &str, start: &str, end: &str) -> AccountMetadata {
        AccountMetadata {
            account_name: account.to_string(),
            expected_start_date: start.to_string(),
            expected_end_date: end.to_string(),
        }
    }

    #[test]
    fn test_detects_missing_middle_month() {
        let data = vec![
            statement("A001", "2023-01-05"),
            statement("A001", "2023-03-05"),
        ];
        let accounts = vec![metadata("A001", "2023-01-01", "2023-03-31")];

        let results = check_timeframe_coverage(&data, &accounts).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0],
            AccountCoverage::Checked {
                account_name: "A001".to_string(),
                missing_months: vec![Month::new(2023, 2)],
            }
        );
    }

    #[test]
    fn test_fully_covered_account_reports_empty() {
        let data = vec![
            statement("A001", "2023-01-01"),
            statement("A001", "2023-02-01"),
        ];
        let accounts = vec![metadata("A001", "2023-01-01", "2023-02-28")];

        let results = check_timeframe_coverage(&data, &accounts).unwrap();
        assert_eq!(results[0].missing_months(), Some(&[][..]));
    }

    #[test]
    fn test_account_with_no_statements_misses_everything() {
        let accounts = vec![metadata("A001", "2023-01-01", "2023-03-31")];

        let results = check_timeframe_coverage(&[], &accounts).unwrap();
        assert_eq!(
            results[0].missing_months(),
            Some(&[Month::new(2023, 1), Month::new(2023, 2), Month::new(2023, 3)][..])
        );
    }

    #[test]
    fn test_missing_months_are_chronological() {
        let data = vec![statement("A001", "2023-06-15")];
        let accounts = vec![metadata("A001", "2023-04-01", "2023-08-31")];

        let results = check_timeframe_coverage(&data, &accounts).unwrap();
        assert_eq!(
            results[0].missing_months(),
            Some(
                &[
                    Month::new(2023, 4),
                    Month::new(2023, 5),
                    Month::new(2023, 7),
                    Month::new(2023, 8)
                ][..]
            )
        );
    }

    #[test]
    fn test_malformed_metadata_skips_only_that_account() {
        let data = vec![statement("A002", "2023-01-10")];
        let accounts = vec![
            metadata("A001", "garbage", "2023-03-31"),
            metadata("A002", "2023-01-01", "2023-01-31"),
        ];

        let results = check_timeframe_coverage(&data, &accounts).unwrap();
        assert_eq!(results.len(), 2);
        assert!(matches!(
            &results[0],
            AccountCoverage::Skipped { account_name, reason }
                if account_name == "A001" && reason.contains("expected_start_date")
        ));
        assert_eq!(results[1].missing_months(), Some(&[][..]));
    }

    #[test]
    fn test_unparsable_statement_date_aborts_run() {
        let data = vec![statement("A001", "32/32/2023")];
        let accounts = vec![metadata("A001", "2023-01-01", "2023-03-31")];

        let result = check_timeframe_coverage(&data, &accounts);
        assert!(matches!(
            result,
            Err(DataQualityError::DateParse { .. })
        ));
    }

    #[test]
    fn test_statements_outside_span_do_not_count() {
        let data = vec![statement("A001", "2022-12-15")];
        let accounts = vec![metadata("A001", "2023-01-01", "2023-01-31")];

        let results = check_timeframe_coverage(&data, &accounts).unwrap();
        assert_eq!(results[0].missing_months(), Some(&[Month::new(2023, 1)][..]));
    }

    #[test]
    fn test_empty_metadata_yields_empty_results() {
        let data = vec![statement("A001", "2023-01-01")];
        let results = check_timeframe_coverage(&data, &[]).unwrap();
        assert!(results.is_empty());
    }
}
