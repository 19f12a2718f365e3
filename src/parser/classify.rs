//! Line classification for BEATwatch files.
//!
//! A file interleaves three kinds of lines:
//! - single-line JSON objects (file header, record events, survey answers)
//! - accelerometer rows, first field prefixed with the `A` sentinel
//! - heart-rate rows, first field a millisecond count
//!
//! Anything else is reported and skipped; one bad line never aborts a file.

use crate::record::{MalformedLine, RawLine, Sample};
use crate::record::{AccelSample, HrSample};
use crate::transparency::ParseReport;
use serde_json::{Map, Value};

/// Sentinel prefixed to the first field of accelerometer rows.
pub const ACCEL_SENTINEL: char = 'A';

/// Firmware before this format version wrote heart-rate confidence scaled by 10.
pub const LEGACY_CONFIDENCE_VERSION: f64 = 0.2;

/// Format version assumed when none is given. Legacy scaling is on.
pub const DEFAULT_FORMAT_VERSION: f64 = 0.1;

/// Column index of `confidence` in heart-rate rows.
const CONFIDENCE_INDEX: usize = 2;

/// Rows accumulated per record type, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBatches {
    pub json: Vec<Map<String, Value>>,
    pub hr: Vec<Vec<String>>,
    pub accel: Vec<Vec<String>>,
}

/// Split one data line with standard CSV quoting rules.
pub fn split_csv(line: &str) -> Vec<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());

    match reader.records().next() {
        Some(Ok(record)) => record.iter().map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

/// Divide a legacy confidence value by 10, rounding half to even.
pub fn scale_legacy_confidence(raw: i64) -> i64 {
    let quotient = raw.div_euclid(10);
    let remainder = raw.rem_euclid(10);
    if remainder > 5 || (remainder == 5 && quotient % 2 != 0) {
        quotient + 1
    } else {
        quotient
    }
}

/// Classify one line. Returns `None` for blank lines and empty CSV rows.
pub fn classify_line(raw_line: &str, format_version: f64) -> Option<RawLine> {
    let line = raw_line.trim();
    if line.is_empty() {
        return None;
    }

    if line.starts_with('{') {
        return Some(match serde_json::from_str::<Map<String, Value>>(line) {
            Ok(object) => RawLine::Json(object),
            Err(e) => RawLine::Malformed(MalformedLine::Json(e.to_string())),
        });
    }

    let mut row = split_csv(line);
    if row.is_empty() {
        return None;
    }

    if row[0].starts_with(ACCEL_SENTINEL) {
        if row.len() != AccelSample::COLUMNS.len() {
            return Some(RawLine::Malformed(MalformedLine::Accel(row)));
        }
        row[0] = row[0].trim_matches(ACCEL_SENTINEL).to_string();
        return Some(RawLine::Accel(row));
    }

    if row[0].starts_with(|c: char| c.is_ascii_digit()) {
        if row.len() != HrSample::COLUMNS.len() {
            return Some(RawLine::Malformed(MalformedLine::Hr(row)));
        }
        if format_version < LEGACY_CONFIDENCE_VERSION {
            // Unparseable cells are left for the table builder to drop
            if let Ok(raw) = row[CONFIDENCE_INDEX].trim().parse::<i64>() {
                row[CONFIDENCE_INDEX] = scale_legacy_confidence(raw).to_string();
            }
        }
        return Some(RawLine::Hr(row));
    }

    Some(RawLine::Malformed(MalformedLine::Unknown(row)))
}

/// Classify every line of a file into raw row batches.
pub fn classify_lines<'a, I>(lines: I, format_version: f64, report: &mut ParseReport) -> RawBatches
where
    I: IntoIterator<Item = &'a str>,
{
    let mut batches = RawBatches::default();

    for (n, line) in lines.into_iter().enumerate() {
        report.lines_read += 1;

        match classify_line(line, format_version) {
            None => {}
            Some(RawLine::Json(object)) => batches.json.push(object),
            Some(RawLine::Accel(row)) => batches.accel.push(row),
            Some(RawLine::Hr(row)) => batches.hr.push(row),
            Some(RawLine::Malformed(MalformedLine::Json(e))) => {
                tracing::warn!("Error reading line {}: {}", n + 1, e);
                report.json_decode_errors += 1;
            }
            Some(RawLine::Malformed(MalformedLine::Accel(row))) => {
                tracing::warn!("Bad accel row: {:?}", row);
                report.bad_accel_rows += 1;
            }
            Some(RawLine::Malformed(MalformedLine::Hr(row))) => {
                tracing::warn!("Bad hr row: {:?}", row);
                report.bad_hr_rows += 1;
            }
            Some(RawLine::Malformed(MalformedLine::Unknown(row))) => {
                tracing::warn!("Unknown data: {:?}", row);
                report.unknown_lines += 1;
            }
        }
    }

    batches
}
