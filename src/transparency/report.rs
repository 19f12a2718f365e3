//! Per-parse diagnostic report.
//!
//! Every anomaly the parser recovers from is logged through `tracing` and
//! counted here. A report belongs to one parse call, so parsing several files
//! in parallel never shares counters.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Counts of recovered anomalies for one parsed file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseReport {
    /// Source file, if the input came from disk
    pub source: Option<PathBuf>,
    /// Lines read from the source (including blank lines)
    pub lines_read: u64,
    /// Lines starting with `{` that failed to decode
    pub json_decode_errors: u64,
    /// Accelerometer rows with the wrong field count
    pub bad_accel_rows: u64,
    /// Heart-rate rows with the wrong field count
    pub bad_hr_rows: u64,
    /// Lines that were neither JSON, accelerometer nor heart-rate data
    pub unknown_lines: u64,
    /// JSON objects with an unrecognised shape
    pub unknown_objects: u64,
    /// Status/record events missing their record block
    pub incomplete_records: u64,
    /// Heart-rate rows dropped for empty cells
    pub hr_missing_dropped: u64,
    /// Accelerometer rows dropped for empty cells
    pub accel_missing_dropped: u64,
    /// Heart-rate rows dropped because a cell failed to cast
    pub hr_invalid_dropped: u64,
    /// Accelerometer rows dropped because a cell failed to cast
    pub accel_invalid_dropped: u64,
    /// Survey answers dropped for missing or non-integral number/item
    pub survey_dropped: u64,
    /// Whether the record start timestamp could not be resolved
    pub missing_start: bool,
    /// Whether the file could not be read at all
    pub io_failed: bool,
}

impl ParseReport {
    /// Create an empty report for a file on disk.
    pub fn for_source(path: PathBuf) -> Self {
        Self {
            source: Some(path),
            ..Self::default()
        }
    }

    /// Number of lines the classifier rejected.
    pub fn malformed_lines(&self) -> u64 {
        self.json_decode_errors + self.bad_accel_rows + self.bad_hr_rows + self.unknown_lines
    }

    /// Number of table rows dropped after classification.
    pub fn dropped_rows(&self) -> u64 {
        self.hr_missing_dropped
            + self.accel_missing_dropped
            + self.hr_invalid_dropped
            + self.accel_invalid_dropped
            + self.survey_dropped
    }

    /// Whether the parse finished without any recovered anomaly.
    pub fn is_clean(&self) -> bool {
        self.malformed_lines() == 0
            && self.dropped_rows() == 0
            && self.unknown_objects == 0
            && self.incomplete_records == 0
            && !self.missing_start
            && !self.io_failed
    }

    pub(crate) fn record_missing_dropped(&mut self, table: &str, count: u64) {
        match table {
            "hr" => self.hr_missing_dropped += count,
            _ => self.accel_missing_dropped += count,
        }
    }

    pub(crate) fn record_invalid_dropped(&mut self, table: &str, count: u64) {
        match table {
            "hr" => self.hr_invalid_dropped += count,
            _ => self.accel_invalid_dropped += count,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let source = self
            .source
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(in memory)".to_string());

        format!(
            "Parse report for {}:\n\
             - Lines read: {}\n\
             - Malformed lines: {} (json {}, accel {}, hr {}, unknown {})\n\
             - Unknown objects: {}\n\
             - Incomplete record events: {}\n\
             - Rows dropped for missing values: hr {}, accel {}\n\
             - Rows dropped for invalid values: hr {}, accel {}\n\
             - Survey responses dropped: {}\n\
             - Record start resolved: {}\n\
             - File read: {}",
            source,
            self.lines_read,
            self.malformed_lines(),
            self.json_decode_errors,
            self.bad_accel_rows,
            self.bad_hr_rows,
            self.unknown_lines,
            self.unknown_objects,
            self.incomplete_records,
            self.hr_missing_dropped,
            self.accel_missing_dropped,
            self.hr_invalid_dropped,
            self.accel_invalid_dropped,
            self.survey_dropped,
            if self.missing_start { "no" } else { "yes" },
            if self.io_failed { "failed" } else { "ok" },
        )
    }
}
