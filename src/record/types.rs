//! Sample types written by the BEATwatch application.
//!
//! Heart-rate and acceleration rows share the same lifecycle: raw CSV cells
//! are cast into a typed sample once, and the absolute timestamp is filled in
//! later when the record start is known.

use crate::record::time::{self, Timestamp};
use chrono::Duration;
use serde::Serialize;
use serde_json::{Map, Value};
use std::str::FromStr;

/// A cell that could not be cast to its declared column type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid value {value:?} for column {column}")]
pub struct CellError {
    pub column: &'static str,
    pub value: String,
}

/// Anything positioned on the relative and absolute recording clocks.
pub trait Timed {
    fn time_elapsed(&self) -> Option<Duration>;
    fn time_absolute(&self) -> Option<Timestamp>;
}

/// A fixed-schema CSV sample.
pub trait Sample: Timed + Clone {
    /// Short table name used in diagnostics.
    const TABLE: &'static str;

    /// Column names in file order.
    const COLUMNS: &'static [&'static str];

    /// Cast one row of cells (already checked for count and emptiness).
    fn from_cells(cells: &[String]) -> Result<Self, CellError>;

    /// The `time_elapsed` column. Every CSV sample carries one.
    fn elapsed(&self) -> Duration;

    /// Numeric value of a column by name.
    fn column(&self, name: &str) -> Option<f64>;

    fn set_time_absolute(&mut self, time: Option<Timestamp>);
}

fn cast<T: FromStr>(column: &'static str, raw: &str) -> Result<T, CellError> {
    raw.trim().parse::<T>().map_err(|_| CellError {
        column,
        value: raw.to_string(),
    })
}

/// `time_elapsed` is an integer millisecond count that must not be negative.
fn cast_elapsed(raw: &str) -> Result<Duration, CellError> {
    let invalid = || CellError {
        column: "time_elapsed",
        value: raw.to_string(),
    };
    let ms: i64 = cast("time_elapsed", raw)?;
    if ms < 0 {
        return Err(invalid());
    }
    Duration::try_milliseconds(ms).ok_or_else(invalid)
}

/// One heart-rate sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HrSample {
    #[serde(with = "time::duration_ms")]
    pub time_elapsed: Duration,
    pub heart_rate_bpm: i16,
    pub confidence: u8,
    pub ppg_raw: i32,
    pub ppg_filter: i32,
    #[serde(with = "time::option_timestamp")]
    pub time_absolute: Option<Timestamp>,
}

impl Timed for HrSample {
    fn time_elapsed(&self) -> Option<Duration> {
        Some(self.time_elapsed)
    }

    fn time_absolute(&self) -> Option<Timestamp> {
        self.time_absolute
    }
}

impl Sample for HrSample {
    const TABLE: &'static str = "hr";
    const COLUMNS: &'static [&'static str] = &[
        "time_elapsed",
        "heart_rate_bpm",
        "confidence",
        "ppg_raw",
        "ppg_filter",
    ];

    fn from_cells(cells: &[String]) -> Result<Self, CellError> {
        Ok(Self {
            time_elapsed: cast_elapsed(&cells[0])?,
            heart_rate_bpm: cast("heart_rate_bpm", &cells[1])?,
            confidence: cast("confidence", &cells[2])?,
            ppg_raw: cast("ppg_raw", &cells[3])?,
            ppg_filter: cast("ppg_filter", &cells[4])?,
            time_absolute: None,
        })
    }

    fn elapsed(&self) -> Duration {
        self.time_elapsed
    }

    fn column(&self, name: &str) -> Option<f64> {
        match name {
            "time_elapsed" => Some(self.time_elapsed.num_milliseconds() as f64),
            "heart_rate_bpm" => Some(self.heart_rate_bpm.into()),
            "confidence" => Some(self.confidence.into()),
            "ppg_raw" => Some(self.ppg_raw.into()),
            "ppg_filter" => Some(self.ppg_filter.into()),
            _ => None,
        }
    }

    fn set_time_absolute(&mut self, time: Option<Timestamp>) {
        self.time_absolute = time;
    }
}

/// One accelerometer sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccelSample {
    #[serde(with = "time::duration_ms")]
    pub time_elapsed: Duration,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub magnitude: i32,
    pub difference: i32,
    #[serde(with = "time::option_timestamp")]
    pub time_absolute: Option<Timestamp>,
}

impl Timed for AccelSample {
    fn time_elapsed(&self) -> Option<Duration> {
        Some(self.time_elapsed)
    }

    fn time_absolute(&self) -> Option<Timestamp> {
        self.time_absolute
    }
}

impl Sample for AccelSample {
    const TABLE: &'static str = "accel";
    const COLUMNS: &'static [&'static str] =
        &["time_elapsed", "x", "y", "z", "magnitude", "difference"];

    fn from_cells(cells: &[String]) -> Result<Self, CellError> {
        Ok(Self {
            time_elapsed: cast_elapsed(&cells[0])?,
            x: cast("x", &cells[1])?,
            y: cast("y", &cells[2])?,
            z: cast("z", &cells[3])?,
            magnitude: cast("magnitude", &cells[4])?,
            difference: cast("difference", &cells[5])?,
            time_absolute: None,
        })
    }

    fn elapsed(&self) -> Duration {
        self.time_elapsed
    }

    fn column(&self, name: &str) -> Option<f64> {
        match name {
            "time_elapsed" => Some(self.time_elapsed.num_milliseconds() as f64),
            "x" => Some(self.x.into()),
            "y" => Some(self.y.into()),
            "z" => Some(self.z.into()),
            "magnitude" => Some(self.magnitude.into()),
            "difference" => Some(self.difference.into()),
            _ => None,
        }
    }

    fn set_time_absolute(&mut self, time: Option<Timestamp>) {
        self.time_absolute = time;
    }
}

/// One answered survey item.
///
/// `time_elapsed` is derived from the absolute answer time and the record
/// start, so either may be not-a-time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyResponse {
    pub number: i64,
    pub item: i64,
    #[serde(with = "time::option_timestamp")]
    pub time_absolute: Option<Timestamp>,
    pub question: String,
    pub input: Option<String>,
    pub range: Value,
    pub response: Value,
    #[serde(with = "time::option_duration_ms")]
    pub time_elapsed: Option<Duration>,
}

impl Timed for SurveyResponse {
    fn time_elapsed(&self) -> Option<Duration> {
        self.time_elapsed
    }

    fn time_absolute(&self) -> Option<Timestamp> {
        self.time_absolute
    }
}

/// Classification of a single non-empty source line.
#[derive(Debug, Clone, PartialEq)]
pub enum RawLine {
    /// A decoded single-line JSON object (metadata or survey).
    Json(Map<String, Value>),
    /// Accelerometer cells with the `A` sentinel removed.
    Accel(Vec<String>),
    /// Heart-rate cells, legacy confidence scaling already applied.
    Hr(Vec<String>),
    Malformed(MalformedLine),
}

/// Why a line was rejected by the classifier.
#[derive(Debug, Clone, PartialEq)]
pub enum MalformedLine {
    /// Line started with `{` but did not decode as a JSON object.
    Json(String),
    /// Accelerometer sentinel with the wrong field count.
    Accel(Vec<String>),
    /// Numeric first field with the wrong field count.
    Hr(Vec<String>),
    /// Neither sentinel nor digit in the first field.
    Unknown(Vec<String>),
}
