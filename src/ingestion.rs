use crate::error::{DataQualityError, Result};
use crate::schema::{AccountDirectory, AccountMetadata, StatementRecord};
use log::info;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const STATEMENT_COLUMNS: &[&str] = &[
    "account_name",
    "start_date",
    "end_date",
    "beginning_balance",
    "ending_balance",
    "my_contributions",
    "employer_contributions",
    "credits",
    "change_in_market_value",
];

const METADATA_COLUMNS: &[&str] = &[
    "account_name",
    "expected_start_date",
    "expected_end_date",
];

/// Statement row as it arrives from the export: amounts kept as text so a
/// malformed cell degrades to a missing value for the checks to fail
/// closed, instead of rejecting the whole file.
#[derive(Debug, Deserialize)]
struct RawStatementRow {
    account_name: String,
    start_date: String,
    end_date: String,
    beginning_balance: Option<String>,
    ending_balance: Option<String>,
    my_contributions: Option<String>,
    employer_contributions: Option<String>,
    credits: Option<String>,
    change_in_market_value: Option<String>,
}

fn parse_amount(value: &Option<String>) -> Option<f64> {
    let raw = value.as_deref()?.trim();
    if raw.is_empty() {
        return None;
    }

    // Bank exports wrap amounts in currency symbols and thousand separators.
    let cleaned = raw.trim_start_matches('$').replace(',', "");
    cleaned.parse::<f64>().ok()
}

impl From<RawStatementRow> for StatementRecord {
    fn from(row: RawStatementRow) -> Self {
        StatementRecord {
            beginning_balance: parse_amount(&row.beginning_balance),
            ending_balance: parse_amount(&row.ending_balance),
            my_contributions: parse_amount(&row.my_contributions),
            employer_contributions: parse_amount(&row.employer_contributions),
            credits: parse_amount(&row.credits),
            change_in_market_value: parse_amount(&row.change_in_market_value),
            account_name: row.account_name,
            start_date: row.start_date,
            end_date: row.end_date,
        }
    }
}

fn validate_headers(headers: &csv::StringRecord, required: &[&str], table: &str) -> Result<()> {
    for column in required {
        if !headers.iter().any(|h| h.trim() == *column) {
            return Err(DataQualityError::MissingColumn {
                table: table.to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

pub fn load_statements<R: Read>(reader: R) -> Result<Vec<StatementRecord>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    validate_headers(csv_reader.headers()?, STATEMENT_COLUMNS, "statement data")?;

    let mut records = Vec::new();
    for row in csv_reader.deserialize::<RawStatementRow>() {
        records.push(row?.into());
    }
    Ok(records)
}

pub fn load_statements_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<StatementRecord>> {
    let file = File::open(path.as_ref())?;
    let records = load_statements(file)?;
    info!(
        "Loaded {} statement records from {}",
        records.len(),
        path.as_ref().display()
    );
    Ok(records)
}

pub fn load_account_metadata<R: Read>(reader: R) -> Result<Vec<AccountMetadata>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    validate_headers(csv_reader.headers()?, METADATA_COLUMNS, "account metadata")?;

    let mut accounts = Vec::new();
    for row in csv_reader.deserialize::<AccountMetadata>() {
        accounts.push(row?);
    }
    Ok(accounts)
}

pub fn load_account_metadata_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<AccountMetadata>> {
    let file = File::open(path.as_ref())?;
    let accounts = load_account_metadata(file)?;
    info!(
        "Loaded metadata for {} accounts from {}",
        accounts.len(),
        path.as_ref().display()
    );
    Ok(accounts)
}

pub fn load_account_directory_from_path<P: AsRef<Path>>(path: P) -> Result<AccountDirectory> {
    Ok(AccountDirectory::new(load_account_metadata_from_path(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATEMENT_CSV: &str = "\
account_name,start_date,end_date,beginning_balance,ending_balance,my_contributions,employer_contributions,credits,change_in_market_value
A001,2023-01-01,2023-01-31,100.0,113.0,10.0,5.0,0.0,-2.0
A001,2023-02-01,2023-02-28,113.0,120.0,5.0,2.0,0.0,0.0
";

    #[test]
    fn test_load_statements() {
        let records = load_statements(STATEMENT_CSV.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].account_name, "A001");
        assert_eq!(records[0].beginning_balance, Some(100.0));
        assert_eq!(records[0].change_in_market_value, Some(-2.0));
    }

    #[test]
    fn test_missing_column_is_a_shape_error() {
        let csv = "\
account_name,start_date,end_date,beginning_balance,ending_balance
A001,2023-01-01,2023-01-31,100.0,113.0
";
        let result = load_statements(csv.as_bytes());
        assert!(matches!(
            result,
            Err(DataQualityError::MissingColumn { ref column, .. }) if column == "my_contributions"
        ));
    }

    #[test]
    fn test_empty_and_malformed_amounts_become_missing() {
        let csv = "\
account_name,start_date,end_date,beginning_balance,ending_balance,my_contributions,employer_contributions,credits,change_in_market_value
A001,2023-01-01,2023-01-31,,not-a-number,10.0,5.0,0.0,-2.0
";
        let records = load_statements(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].beginning_balance, None);
        assert_eq!(records[0].ending_balance, None);
        assert_eq!(records[0].my_contributions, Some(10.0));
    }

    #[test]
    fn test_currency_formatting_is_stripped() {
        let csv = "\
account_name,start_date,end_date,beginning_balance,ending_balance,my_contributions,employer_contributions,credits,change_in_market_value
A001,2023-01-01,2023-01-31,\"$1,234.50\",\"$1,300.00\",65.5,0.0,0.0,0.0
";
        let records = load_statements(csv.as_bytes()).unwrap();
        assert_eq!(records[0].beginning_balance, Some(1234.5));
        assert_eq!(records[0].ending_balance, Some(1300.0));
    }

    #[test]
    fn test_load_account_metadata() {
        let csv = "\
account_name,expected_start_date,expected_end_date
A001,2023-01-01,2023-12-31
A002,2023-06-01,2023-12-31
";
        let accounts = load_account_metadata(csv.as_bytes()).unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[1].account_name, "A002");
        assert_eq!(accounts[1].expected_start_date, "2023-06-01");
    }

    #[test]
    fn test_metadata_missing_column() {
        let csv = "account_name,expected_start_date\nA001,2023-01-01\n";
        let result = load_account_metadata(csv.as_bytes());
        assert!(matches!(
            result,
            Err(DataQualityError::MissingColumn { ref column, .. })
                if column == "expected_end_date"
        ));
    }
}
