// src/output/mod.rs

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use csv::{QuoteStyle, WriterBuilder};
use std::path::Path;
use tracing::info;

use crate::pipeline::RankedBond;

/// Derived columns appended after the kept columns, in output order.
const DERIVED_HEADERS: [&str; 5] = [
    "TOTAL_COST",
    "YEARS",
    "INTEREST_DOLLARS",
    "AY",
    "MATURITY_YEAR",
];

/// Build the output filename from a configured base name: strip any path
/// and extension, then append `_<YYYYMMDDHHMMSS>.<extension>`.
pub fn generate_output_filename(base: &str, extension: &str, now: NaiveDateTime) -> String {
    let stem = base
        .split('.')
        .next()
        .unwrap_or(base)
        .rsplit('/')
        .next()
        .unwrap_or(base);
    format!("{}_{}.{}", stem, now.format("%Y%m%d%H%M%S"), extension)
}

/// Write the ranked table as CSV with every field quoted. The identifier
/// leads each row, followed by the kept columns, then the derived columns.
pub fn write_ranked(
    path: impl AsRef<Path>,
    index_column: &str,
    columns: &[String],
    ranked: &[RankedBond],
) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_path(path)
        .with_context(|| format!("failed to create output file {}", path.display()))?;

    let mut header: Vec<&str> = Vec::with_capacity(1 + columns.len() + DERIVED_HEADERS.len());
    header.push(index_column);
    header.extend(columns.iter().map(|c| c.as_str()));
    header.extend(DERIVED_HEADERS);
    wtr.write_record(&header).context("writing CSV header")?;

    for bond in ranked {
        let mut record: Vec<String> = Vec::with_capacity(header.len());
        record.push(bond.identifier.clone());
        record.extend(bond.cells.iter().cloned());
        record.push(bond.total_cost.to_string());
        record.push(bond.years_to_maturity.to_string());
        record.push(bond.interest_dollars.to_string());
        record.push(bond.approximate_yield.to_string());
        record.push(bond.maturity_year.to_string());
        wtr.write_record(&record)
            .with_context(|| format!("writing CSV record for {}", bond.identifier))?;
    }

    wtr.flush().context("flushing CSV output")?;
    info!(path = %path.display(), records = ranked.len(), "ranked table written");
    Ok(())
}
