//! Record types for BEATwatch files.
//!
//! This module contains:
//! - Typed heart-rate, acceleration and survey samples
//! - Decoding of the JSON object lines (metadata and survey answers)
//! - Time helpers for relative and absolute clocks

pub mod json;
pub mod time;
pub mod types;

// Re-export commonly used types
pub use json::{FileInfo, JsonRecord, LegacyRecord, RawSurveyResponse, StatusRecord};
pub use time::Timestamp;
pub use types::{
    AccelSample, CellError, HrSample, MalformedLine, RawLine, Sample, SurveyResponse, Timed,
};
