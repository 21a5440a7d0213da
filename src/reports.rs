use crate::coverage::AccountCoverage;
use crate::engine::{CoverageOutcome, ValidationReport};
use crate::error::Result;
use log::info;
use std::fs::File;
use std::io::Write;
use std::path::Path;

fn fmt_amount(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "n/a".to_string(),
    }
}

fn write_row<W: Write>(
    csv_writer: &mut csv::Writer<W>,
    check: &str,
    account_name: &str,
    detail: &str,
) -> Result<()> {
    csv_writer.write_record([check, account_name, detail])?;
    Ok(())
}

/// Flattens a validation report to CSV, one row per discrepancy:
/// `check, account_name, detail`.
pub fn write_summary_csv<W: Write>(report: &ValidationReport, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["check", "account_name", "detail"])?;

    for d in &report.balance_reconciliation {
        write_row(
            &mut csv_writer,
            "balance_reconciliation",
            &d.account_name,
            &format!(
                "period {}..{}: ending balance {} differs from expected {}",
                d.start_date,
                d.end_date,
                fmt_amount(d.ending_balance),
                fmt_amount(d.expected_ending_balance)
            ),
        )?;
    }

    for d in &report.date_range_validity {
        write_row(
            &mut csv_writer,
            "date_range_validity",
            &d.account_name,
            &format!("invalid period {}..{}", d.start_date, d.end_date),
        )?;
    }

    for d in &report.balance_progression {
        write_row(
            &mut csv_writer,
            "balance_progression",
            &d.account_name,
            &format!(
                "ending balance {} on {} does not chain to beginning balance {} on {}",
                fmt_amount(d.previous_ending_balance),
                d.previous_end_date,
                fmt_amount(d.current_beginning_balance),
                d.current_start_date
            ),
        )?;
    }

    match &report.coverage {
        None => {}
        Some(CoverageOutcome::Aborted { reason }) => {
            write_row(
                &mut csv_writer,
                "coverage",
                "",
                &format!("aborted: {}", reason),
            )?;
        }
        Some(CoverageOutcome::Completed { accounts }) => {
            for account in accounts {
                match account {
                    AccountCoverage::Checked {
                        account_name,
                        missing_months,
                    } if !missing_months.is_empty() => {
                        let months: Vec<String> =
                            missing_months.iter().map(|m| m.to_string()).collect();
                        write_row(
                            &mut csv_writer,
                            "coverage",
                            account_name,
                            &format!("missing months: {}", months.join(", ")),
                        )?;
                    }
                    AccountCoverage::Skipped {
                        account_name,
                        reason,
                    } => {
                        write_row(
                            &mut csv_writer,
                            "coverage",
                            account_name,
                            &format!("skipped: {}", reason),
                        )?;
                    }
                    AccountCoverage::Checked { .. } => {}
                }
            }
        }
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn generate_summary_report<P: AsRef<Path>>(report: &ValidationReport, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_summary_csv(report, file)?;
    info!("Summary report saved to {}", path.as_ref().display());
    Ok(())
}

/// Renders a text bar chart of missing-month counts per account.
/// Skipped accounts are listed without a bar.
pub fn render_missing_months_chart<W: Write>(
    accounts: &[AccountCoverage],
    mut writer: W,
) -> Result<()> {
    writeln!(writer, "Missing months by account")?;

    let name_width = accounts
        .iter()
        .map(|a| a.account_name().len())
        .max()
        .unwrap_or(0);

    for account in accounts {
        match account.missing_months() {
            Some(months) => writeln!(
                writer,
                "{:<width$} | {} {}",
                account.account_name(),
                "#".repeat(months.len()),
                months.len(),
                width = name_width
            )?,
            None => writeln!(
                writer,
                "{:<width$} | (skipped)",
                account.account_name(),
                width = name_width
            )?,
        }
    }

    Ok(())
}
