//! Metadata reconciliation and timing for a parsed file.
//!
//! JSON objects are folded, in file order, into one flat metadata mapping.
//! The mapping is carried by a [`MetadataBuilder`] that moves through each
//! step and is finalized once, after the sample tables are built.
//!
//! Key collisions resolve last-write-wins: `File` entries, then
//! `Status`/`Record` entries, exactly in the order they appear in the file.

use crate::record::json::{START_RECORD, STOP_RECORD};
use crate::record::time::{self, Timestamp};
use crate::record::{AccelSample, HrSample, JsonRecord, RawSurveyResponse, Sample, SurveyResponse};
use crate::transparency::ParseReport;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Metadata key holding the record start as a millisecond Unix epoch.
pub const START_TIMESTAMP_KEY: &str = "start_UNIXTimeStamp";

/// Flat metadata for one parsed file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, Value>);

impl Metadata {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// String value of a key, if it holds a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }
}

/// Accumulates metadata entries through the reconciliation steps.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataBuilder {
    entries: BTreeMap<String, Value>,
}

impl MetadataBuilder {
    /// Start from the baseline keys every bundle carries.
    pub fn new(parsed_on: DateTime<Utc>) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert("Parsed_on".to_string(), Value::from(parsed_on.to_rfc3339()));
        entries.insert("StudyName".to_string(), Value::from("NA"));
        entries.insert("StudyInstance".to_string(), Value::from("NA"));
        Self { entries }
    }

    /// Copy entries under a key prefix. Existing keys are overwritten.
    pub fn with_entries(mut self, prefix: &str, entries: &Map<String, Value>) -> Self {
        for (k, v) in entries {
            self.insert(format!("{prefix}{k}"), v.clone());
        }
        self
    }

    fn insert(&mut self, key: String, value: Value) {
        if let Some(old) = self.entries.get(&key) {
            tracing::debug!("Overwriting {}: {} with {}", key, old, value);
        }
        self.entries.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Resolve the record start timestamp from `start_UNIXTimeStamp`.
    ///
    /// Returns not-a-time when the key is absent or not a valid epoch.
    pub fn record_start(&self, tz: &Tz) -> Option<Timestamp> {
        let start = self
            .get(START_TIMESTAMP_KEY)
            .and_then(time::millis_from_json)
            .and_then(|ms| time::from_unix_millis(ms, tz));

        if start.is_none() {
            tracing::warn!(
                "Could not find valid start timestamp ({}: {:?})",
                START_TIMESTAMP_KEY,
                self.get(START_TIMESTAMP_KEY)
            );
        }
        start
    }

    /// Add sample counts and durations observed in the built tables.
    pub fn with_summary(
        mut self,
        hr: &[HrSample],
        accel: &[AccelSample],
        survey: &[SurveyResponse],
    ) -> Self {
        let max_elapsed_ms = |max: Option<Duration>| match max {
            Some(d) => Value::from(d.num_milliseconds()),
            None => Value::Null,
        };

        self.insert("n_samples_hr".to_string(), Value::from(hr.len()));
        self.insert("n_samples_accel".to_string(), Value::from(accel.len()));
        self.insert("n_survey_responses".to_string(), Value::from(survey.len()));
        self.insert(
            "duration_hr".to_string(),
            max_elapsed_ms(hr.iter().map(|s| s.time_elapsed).max()),
        );
        self.insert(
            "duration_accel".to_string(),
            max_elapsed_ms(accel.iter().map(|s| s.time_elapsed).max()),
        );
        self
    }

    pub fn build(self) -> Metadata {
        Metadata(self.entries)
    }
}

/// Fold JSON objects into metadata and collect survey answers.
pub fn reconcile(
    objects: Vec<Map<String, Value>>,
    mut builder: MetadataBuilder,
    report: &mut ParseReport,
) -> (MetadataBuilder, Vec<RawSurveyResponse>) {
    let mut surveys = Vec::new();

    if objects.is_empty() {
        tracing::warn!("No metadata");
        return (builder, surveys);
    }

    for object in objects {
        builder = match JsonRecord::from_object(object) {
            JsonRecord::File(info) => builder.with_entries("", &info.file),
            JsonRecord::Status(status) => {
                let builder = match status.status_entries() {
                    Some(entries) => builder.with_entries("status_", entries),
                    None => {
                        tracing::warn!("Status block is not an object: {}", status.status);
                        report.incomplete_records += 1;
                        builder
                    }
                };
                let prefix = match status.state() {
                    Some(START_RECORD) => Some("start_"),
                    Some(STOP_RECORD) => Some("stop_"),
                    _ => None,
                };
                match (prefix, status.record_entries()) {
                    (Some(prefix), Some(record)) => builder.with_entries(prefix, record),
                    (Some(_), None) => {
                        tracing::warn!("Status {:?} without a Record block", status.state());
                        report.incomplete_records += 1;
                        builder
                    }
                    (None, _) => builder,
                }
            }
            JsonRecord::Legacy(legacy) => match legacy.state() {
                Some(START_RECORD) => builder.with_entries("start_", &legacy.record),
                Some(STOP_RECORD) => builder.with_entries("stop_", &legacy.record),
                _ => builder,
            },
            JsonRecord::Survey(survey) => {
                surveys.push(survey);
                builder
            }
            JsonRecord::Unknown(object) => {
                tracing::warn!("Unknown object: {}", serde_json::Value::Object(object));
                report.unknown_objects += 1;
                builder
            }
        };
    }

    (builder, surveys)
}

fn integral(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn category(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Build the survey table from raw answers.
///
/// `time_absolute` comes from the answer's own `timeStamp`; `time_elapsed`
/// is measured from the record start, so it is not-a-time when either is.
pub fn build_survey_table(
    raw: Vec<RawSurveyResponse>,
    record_start: Option<Timestamp>,
    tz: &Tz,
    report: &mut ParseReport,
) -> Vec<SurveyResponse> {
    let mut table = Vec::with_capacity(raw.len());

    for answer in raw {
        let (Some(number), Some(item)) = (
            integral(answer.number.as_ref()),
            integral(answer.item.as_ref()),
        ) else {
            tracing::warn!(
                "Dropped survey response without number/item: {}",
                answer.question
            );
            report.survey_dropped += 1;
            continue;
        };

        let time_absolute = answer
            .time_stamp
            .as_ref()
            .and_then(time::millis_from_json)
            .and_then(|ms| time::from_unix_millis(ms, tz));

        table.push(SurveyResponse {
            number,
            item,
            time_absolute,
            question: category(&answer.question),
            input: answer.input.as_ref().filter(|v| !v.is_null()).map(category),
            range: answer.range.unwrap_or(Value::Null),
            response: answer.response.unwrap_or(Value::Null),
            time_elapsed: time::elapsed_since(time_absolute, record_start),
        });
    }

    table
}

/// Fill `time_absolute = record_start + time_elapsed` on every sample.
pub fn backfill_absolute<S: Sample>(table: &mut [S], record_start: Option<Timestamp>) {
    for sample in table.iter_mut() {
        let time_absolute = time::offset(record_start, sample.elapsed());
        sample.set_time_absolute(time_absolute);
    }
}
