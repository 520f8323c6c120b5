//! CSV and JSON export of simulation results.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::aggregate::AnnualResult;
use crate::sim::engine::SimulationResult;
use crate::sim::types::MonthlyResult;

/// Column header for the monthly CSV.
const MONTHLY_HEADER: &str = "period,month,year,acr_per_mwh,acl_per_mwh,discount,\
                              acr_spend,acl_spend,savings";

/// Column header for the annual CSV.
const ANNUAL_HEADER: &str = "year,months,acr_spend,acl_spend,savings,discount";

/// Exports monthly rows to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_monthly_csv(monthly: &[MonthlyResult], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_monthly_csv(monthly, io::BufWriter::new(file))
}

/// Writes monthly rows as CSV to any writer.
///
/// Produces deterministic output for identical inputs.
///
/// # Arguments
///
/// * `monthly` - Monthly records in contract order
/// * `writer` - Destination implementing `Write`
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_monthly_csv(monthly: &[MonthlyResult], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(MONTHLY_HEADER.split(',').map(str::trim))?;

    for m in monthly {
        wtr.write_record(&[
            m.period.clone(),
            m.month.to_string(),
            m.year.to_string(),
            format!("{:.4}", m.acr_per_mwh),
            format!("{:.4}", m.acl_per_mwh),
            format!("{:.6}", m.discount),
            format!("{:.2}", m.acr_spend),
            format!("{:.2}", m.acl_spend),
            format!("{:.2}", m.savings),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports annual rows to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_annual_csv(annual: &[AnnualResult], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_annual_csv(annual, io::BufWriter::new(file))
}

/// Writes annual rows as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_annual_csv(annual: &[AnnualResult], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(ANNUAL_HEADER.split(','))?;

    for y in annual {
        wtr.write_record(&[
            y.year.to_string(),
            y.months.to_string(),
            format!("{:.2}", y.acr_spend),
            format!("{:.2}", y.acl_spend),
            format!("{:.2}", y.savings),
            format!("{:.6}", y.discount),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes the full result payload as pretty-printed JSON.
///
/// # Errors
///
/// Returns an `io::Error` if serialization or writing fails.
pub fn write_json(result: &SimulationResult, mut writer: impl Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, result)?;
    writeln!(writer)
}
