use crate::schema::Month;
use chrono::{Datelike, Days, NaiveDate};

/// Parses a statement date, accepting the two formats seen in bank exports.
pub fn parse_statement_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value.trim(), "%m/%d/%Y"))
        .ok()
}

pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .expect("month index is always 1..=12 here")
        .checked_sub_days(Days::new(1))
        .expect("first of month always has a predecessor")
}

pub fn next_month_end(date: NaiveDate) -> NaiveDate {
    let year = if date.month() == 12 {
        date.year() + 1
    } else {
        date.year()
    };

    let month = if date.month() == 12 {
        1
    } else {
        date.month() + 1
    };

    last_day_of_month(year, month)
}

/// Months whose last day falls inside `[start, end]`, in chronological
/// order. A span ending before a month's final day excludes that month.
pub fn months_in_span(start: NaiveDate, end: NaiveDate) -> Vec<Month> {
    let mut months = Vec::new();

    let mut current = last_day_of_month(start.year(), start.month());
    while current <= end {
        if current >= start {
            months.push(Month::from(current));
        }
        current = next_month_end(current);
    }

    months
}
