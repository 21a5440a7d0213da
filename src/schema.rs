use chrono::{Datelike, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StatementRecord {
    #[schemars(
        description = "The account identifier as it appears on the statement. Not unique across periods; unique per (account_name, start_date)."
    )]
    pub account_name: String,

    #[schemars(
        description = "First day of the reporting period in YYYY-MM-DD or MM/DD/YYYY format. Kept as text so an unparsable value can be failed closed by the checks instead of rejecting the batch."
    )]
    pub start_date: String,

    #[schemars(description = "Last day of the reporting period, same formats as start_date")]
    pub end_date: String,

    #[schemars(description = "Balance at the start of the period. Empty cells survive ingestion as missing values.")]
    pub beginning_balance: Option<f64>,

    #[schemars(description = "Balance at the end of the period")]
    pub ending_balance: Option<f64>,

    #[schemars(description = "Contributions made by the account holder during the period")]
    pub my_contributions: Option<f64>,

    #[schemars(description = "Contributions made by the employer during the period")]
    pub employer_contributions: Option<f64>,

    #[schemars(description = "Interest, dividends, and other credits applied during the period")]
    pub credits: Option<f64>,

    #[schemars(description = "Market gain or loss over the period; negative for losses")]
    pub change_in_market_value: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AccountMetadata {
    #[schemars(description = "Account identifier, joins to StatementRecord.account_name")]
    pub account_name: String,

    #[schemars(
        description = "First date for which the account is expected to have monthly statements (YYYY-MM-DD or MM/DD/YYYY)"
    )]
    pub expected_start_date: String,

    #[schemars(description = "Last date of the expected statement span")]
    pub expected_end_date: String,
}

impl StatementRecord {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(StatementRecord)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::generate_json_schema())
    }
}

impl AccountMetadata {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AccountMetadata)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::generate_json_schema())
    }
}

/// A whole calendar month, the unit of the coverage timeline.
/// Serializes as "YYYY-MM".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }
}

impl From<NaiveDate> for Month {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for Month {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Lookup wrapper over the static per-account metadata table.
#[derive(Debug, Clone, Default)]
pub struct AccountDirectory {
    accounts: Vec<AccountMetadata>,
}

impl AccountDirectory {
    pub fn new(accounts: Vec<AccountMetadata>) -> Self {
        Self { accounts }
    }

    pub fn get(&self, account_name: &str) -> Option<&AccountMetadata> {
        self.accounts
            .iter()
            .find(|a| a.account_name == account_name)
    }

    pub fn accounts(&self) -> &[AccountMetadata] {
        &self.accounts
    }
}
