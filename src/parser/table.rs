//! Conversion of raw CSV row batches into typed sample tables.

use crate::record::Sample;
use crate::transparency::ParseReport;

/// Build a typed table from raw rows.
///
/// Empty-string cells mark a missing value; rows with any missing value are
/// dropped before casting. Rows that still fail to cast, including those with
/// whitespace-only cells, are dropped afterwards. Both counts are logged and
/// recorded in the report.
pub fn build_table<S: Sample>(rows: Vec<Vec<String>>, report: &mut ParseReport) -> Vec<S> {
    let n_full = rows.len();

    let complete: Vec<Vec<String>> = rows
        .into_iter()
        .filter(|row| row.iter().all(|cell| !cell.is_empty()))
        .collect();

    let n_missing = n_full - complete.len();
    if n_missing > 0 {
        tracing::warn!(
            "Dropped {} {} rows due to missing values",
            n_missing,
            S::TABLE
        );
        report.record_missing_dropped(S::TABLE, n_missing as u64);
    }

    let mut table = Vec::with_capacity(complete.len());
    let mut n_invalid = 0u64;
    for row in &complete {
        match S::from_cells(row) {
            Ok(sample) => table.push(sample),
            Err(e) => {
                tracing::debug!("Invalid {} row {:?}: {}", S::TABLE, row, e);
                n_invalid += 1;
            }
        }
    }

    if n_invalid > 0 {
        tracing::warn!(
            "Dropped {} {} rows due to invalid values",
            n_invalid,
            S::TABLE
        );
        report.record_invalid_dropped(S::TABLE, n_invalid);
    }

    table
}
