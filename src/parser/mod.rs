//! File parser for BEATwatch recordings.
//!
//! ```text
//! file ──▶ classify ──▶ raw batches ──┬──▶ hr / accel tables ──┐
//!                                     └──▶ reconcile ──────────┼──▶ FileBundle
//!                                          (metadata, survey)  │
//!                      record start ───────────────────────────┘
//! ```
//!
//! Parsing is best-effort: data problems are logged and counted in a
//! [`ParseReport`], never returned as errors.

pub mod classify;
pub mod reconcile;
pub mod table;

pub use classify::{
    classify_line, classify_lines, RawBatches, DEFAULT_FORMAT_VERSION, LEGACY_CONFIDENCE_VERSION,
};
pub use reconcile::{Metadata, MetadataBuilder};

use crate::record::{AccelSample, HrSample, SurveyResponse};
use crate::transparency::ParseReport;
use chrono::Utc;
use chrono_tz::Tz;
use serde::Serialize;
use std::path::Path;

/// Errors raised when constructing a parser.
#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),
}

/// The complete parse result for one file.
///
/// Each table is present only when it holds at least one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileBundle {
    pub metadata: Metadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hr: Option<Vec<HrSample>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accel: Option<Vec<AccelSample>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survey: Option<Vec<SurveyResponse>>,
}

fn non_empty<T>(table: Vec<T>) -> Option<Vec<T>> {
    if table.is_empty() {
        None
    } else {
        Some(table)
    }
}

/// Parser for files written by the BEATwatch application.
#[derive(Debug, Clone)]
pub struct Parser {
    timezone: Tz,
    format_version: f64,
}

impl Parser {
    /// Create a parser for the given IANA timezone (or "UTC").
    ///
    /// The format version defaults to [`DEFAULT_FORMAT_VERSION`], which scales
    /// legacy confidence values. Files written by BEATwatch 0.2 or later need
    /// `with_format_version`.
    pub fn new(timezone: &str) -> Result<Self, ParserError> {
        let timezone = timezone
            .parse::<Tz>()
            .map_err(|_| ParserError::UnknownTimezone(timezone.to_string()))?;

        Ok(Self {
            timezone,
            format_version: DEFAULT_FORMAT_VERSION,
        })
    }

    /// Set the file format version written by the device.
    pub fn with_format_version(mut self, format_version: f64) -> Self {
        self.format_version = format_version;
        self
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn format_version(&self) -> f64 {
        self.format_version
    }

    /// Parse a file. I/O failures are logged and yield a metadata-only bundle.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> FileBundle {
        self.parse_file_with_report(path).0
    }

    /// Parse a file and return the diagnostic report alongside the bundle.
    pub fn parse_file_with_report(&self, path: impl AsRef<Path>) -> (FileBundle, ParseReport) {
        let path = path.as_ref();
        let mut report = ParseReport::for_source(path.to_path_buf());

        tracing::info!("Reading {}", path.display());
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::error!("File {} not found", path.display());
                report.io_failed = true;
                String::new()
            }
            Err(e) => {
                tracing::error!("Error reading {}: {}", path.display(), e);
                report.io_failed = true;
                String::new()
            }
        };

        let bundle = self.parse_into(&text, &mut report);
        (bundle, report)
    }

    /// Parse an in-memory buffer holding the contents of one file.
    pub fn parse_str(&self, text: &str) -> (FileBundle, ParseReport) {
        let mut report = ParseReport::default();
        let bundle = self.parse_into(text, &mut report);
        (bundle, report)
    }

    fn parse_into(&self, text: &str, report: &mut ParseReport) -> FileBundle {
        let batches = classify_lines(text.lines(), self.format_version, report);

        let mut hr: Vec<HrSample> = table::build_table(batches.hr, report);
        let mut accel: Vec<AccelSample> = table::build_table(batches.accel, report);

        let (builder, raw_survey) =
            reconcile::reconcile(batches.json, MetadataBuilder::new(Utc::now()), report);

        let record_start = builder.record_start(&self.timezone);
        report.missing_start = record_start.is_none();

        let survey =
            reconcile::build_survey_table(raw_survey, record_start, &self.timezone, report);
        reconcile::backfill_absolute(&mut hr, record_start);
        reconcile::backfill_absolute(&mut accel, record_start);

        let metadata = builder.with_summary(&hr, &accel, &survey).build();

        FileBundle {
            metadata,
            hr: non_empty(hr),
            accel: non_empty(accel),
            survey: non_empty(survey),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const START: &str =
        r#"{"Status": {"state": "START_RECORD"}, "Record": {"UNIXTimeStamp": 1700000000000}}"#;

    #[test]
    fn test_unknown_timezone() {
        assert!(matches!(
            Parser::new("Mars/Olympus_Mons"),
            Err(ParserError::UnknownTimezone(_))
        ));
        assert!(Parser::new("UTC").is_ok());
        assert!(Parser::new("America/Toronto").is_ok());
    }

    #[test]
    fn test_default_format_version_is_legacy() {
        let parser = Parser::new("UTC").unwrap();
        assert_eq!(parser.format_version(), 0.1);
        assert_eq!(parser.with_format_version(0.2).format_version(), 0.2);
    }

    #[test]
    fn test_default_parser_scales_legacy_confidence() {
        let (bundle, report) = Parser::new("UTC").unwrap().parse_str("0,70,950,1,2\n");

        let hr = bundle.hr.expect("hr table present");
        assert_eq!(hr[0].confidence, 95);
        assert_eq!(report.hr_invalid_dropped, 0);
    }

    #[test]
    fn test_start_record_and_hr_row() {
        let parser = Parser::new("UTC").unwrap().with_format_version(0.2);
        let text = format!("{START}\n5000,72,95,1000,2000\n");
        let (bundle, report) = parser.parse_str(&text);

        let hr = bundle.hr.expect("hr table present");
        assert_eq!(hr.len(), 1);
        assert_eq!(hr[0].time_elapsed, Duration::seconds(5));
        assert_eq!(hr[0].confidence, 95);
        assert_eq!(
            hr[0].time_absolute.map(|t| t.to_rfc3339()),
            Some("2023-11-14T22:13:25+00:00".to_string())
        );
        assert!(bundle.accel.is_none());
        assert!(bundle.survey.is_none());
        assert!(report.is_clean());
    }

    #[test]
    fn test_legacy_start_record_sets_absolute_time() {
        let parser = Parser::new("UTC").unwrap().with_format_version(0.2);
        let text = concat!(
            r#"{"Record": {"State": "START_RECORD", "UNIXTimeStamp": 1700000000000}}"#,
            "\n5000,72,95,1000,2000\n"
        );
        let (bundle, report) = parser.parse_str(text);

        assert_eq!(
            bundle.metadata.get("start_UNIXTimeStamp"),
            Some(&serde_json::json!(1700000000000_i64))
        );
        assert!(!report.missing_start);
        let hr = bundle.hr.expect("hr table present");
        assert_eq!(
            hr[0].time_absolute.map(|t| t.to_rfc3339()),
            Some("2023-11-14T22:13:25+00:00".to_string())
        );
    }

    #[test]
    fn test_status_with_non_object_record_keeps_status() {
        let parser = Parser::new("UTC").unwrap();
        let (bundle, report) =
            parser.parse_str(r#"{"Status": {"state": "START_RECORD"}, "Record": [1]}"#);

        assert_eq!(bundle.metadata.get_str("status_state"), Some("START_RECORD"));
        assert_eq!(report.unknown_objects, 0);
        assert_eq!(report.incomplete_records, 1);
        assert!(report.missing_start);
    }

    #[test]
    fn test_missing_start_yields_not_a_time() {
        let parser = Parser::new("UTC").unwrap();
        let (bundle, report) = parser.parse_str("A100,1,2,3,4,5\n");

        let accel = bundle.accel.unwrap();
        assert!(accel[0].time_absolute.is_none());
        assert!(report.missing_start);
    }

    #[test]
    fn test_malformed_accel_row() {
        let parser = Parser::new("UTC").unwrap();
        let (bundle, report) = parser.parse_str("A1,2,3\n");

        assert!(bundle.accel.is_none());
        assert_eq!(report.bad_accel_rows, 1);
        assert_eq!(bundle.metadata.get("n_samples_accel"), Some(&serde_json::json!(0)));
    }

    #[test]
    fn test_unknown_object_only_baseline_metadata() {
        let parser = Parser::new("UTC").unwrap();
        let (bundle, report) = parser.parse_str(r#"{"foo": 1}"#);

        assert_eq!(report.unknown_objects, 1);
        assert_eq!(bundle.metadata.get_str("StudyName"), Some("NA"));
        assert!(!bundle.metadata.contains_key("foo"));
    }

    #[test]
    fn test_missing_file_returns_metadata_only() {
        let parser = Parser::new("UTC").unwrap();
        let (bundle, report) = parser.parse_file_with_report("/nonexistent/beatwatch.hr");

        assert!(report.io_failed);
        assert!(bundle.hr.is_none());
        assert!(bundle.accel.is_none());
        assert!(bundle.survey.is_none());
        assert!(bundle.metadata.contains_key("Parsed_on"));
        assert_eq!(bundle.metadata.get("n_samples_hr"), Some(&serde_json::json!(0)));
    }
}
