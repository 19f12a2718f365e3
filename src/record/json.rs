//! Decoding of the JSON object lines embedded in BEATwatch files.
//!
//! Device firmware has written several object shapes over time. Each line is
//! decoded into the first matching variant, in priority order:
//! `File`, `Status`, legacy `Record`, survey `question`.

use serde::Deserialize;
use serde_json::{Map, Value};

pub const START_RECORD: &str = "START_RECORD";
pub const STOP_RECORD: &str = "STOP_RECORD";

/// File header block, e.g. study name and firmware version.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FileInfo {
    #[serde(rename = "File")]
    pub file: Map<String, Value>,
}

/// Status event written by current firmware, optionally carrying a record block.
///
/// The `Status` key alone selects this shape. Either block is only read when
/// it is a JSON object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusRecord {
    #[serde(rename = "Status")]
    pub status: Value,
    #[serde(rename = "Record", default)]
    pub record: Option<Value>,
}

impl StatusRecord {
    pub fn status_entries(&self) -> Option<&Map<String, Value>> {
        self.status.as_object()
    }

    pub fn record_entries(&self) -> Option<&Map<String, Value>> {
        self.record.as_ref().and_then(Value::as_object)
    }

    pub fn state(&self) -> Option<&str> {
        self.status_entries()?.get("state").and_then(Value::as_str)
    }
}

/// Record event written by old firmware without a status wrapper.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LegacyRecord {
    #[serde(rename = "Record")]
    pub record: Map<String, Value>,
}

impl LegacyRecord {
    pub fn state(&self) -> Option<&str> {
        self.record.get("State").and_then(Value::as_str)
    }
}

/// A survey answer exactly as the watch wrote it.
///
/// Only `question` is required to recognise the shape; the remaining fields
/// are validated when the survey table is built.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawSurveyResponse {
    pub question: Value,
    #[serde(default)]
    pub number: Option<Value>,
    #[serde(default)]
    pub item: Option<Value>,
    #[serde(rename = "timeStamp", default)]
    pub time_stamp: Option<Value>,
    #[serde(default)]
    pub input: Option<Value>,
    #[serde(default)]
    pub range: Option<Value>,
    #[serde(default)]
    pub response: Option<Value>,
}

/// A decoded JSON object line.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonRecord {
    File(FileInfo),
    Status(StatusRecord),
    Legacy(LegacyRecord),
    Survey(RawSurveyResponse),
    /// Unrecognised shape, kept for diagnostics.
    Unknown(Map<String, Value>),
}

impl JsonRecord {
    /// Decode an object into the first matching variant.
    pub fn from_object(object: Map<String, Value>) -> Self {
        let value = Value::Object(object);

        if let Ok(file) = FileInfo::deserialize(&value) {
            return JsonRecord::File(file);
        }
        if let Ok(status) = StatusRecord::deserialize(&value) {
            return JsonRecord::Status(status);
        }
        if let Ok(record) = LegacyRecord::deserialize(&value) {
            return JsonRecord::Legacy(record);
        }
        if let Ok(survey) = RawSurveyResponse::deserialize(&value) {
            return JsonRecord::Survey(survey);
        }

        let object = match value {
            Value::Object(object) => object,
            _ => Map::new(),
        };
        JsonRecord::Unknown(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: Value) -> JsonRecord {
        match value {
            Value::Object(object) => JsonRecord::from_object(object),
            _ => panic!("test input must be an object"),
        }
    }

    #[test]
    fn test_file_takes_priority() {
        let record = decode(json!({"File": {"StudyName": "pilot"}, "Status": {"state": "x"}}));
        assert!(matches!(record, JsonRecord::File(_)));
    }

    #[test]
    fn test_status_with_record() {
        let record = decode(json!({
            "Status": {"state": "START_RECORD"},
            "Record": {"UNIXTimeStamp": 1700000000000_i64}
        }));
        match record {
            JsonRecord::Status(status) => {
                assert_eq!(status.state(), Some(START_RECORD));
                assert!(status.record_entries().is_some());
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_status_with_non_object_record() {
        let record = decode(json!({"Status": {"state": "START_RECORD"}, "Record": [1]}));
        match record {
            JsonRecord::Status(status) => {
                assert_eq!(status.state(), Some(START_RECORD));
                assert!(status.record_entries().is_none());
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_legacy_start_record() {
        let record = decode(json!({
            "Record": {"State": "START_RECORD", "UNIXTimeStamp": 1700000000000_i64}
        }));
        match record {
            JsonRecord::Legacy(legacy) => assert_eq!(legacy.state(), Some(START_RECORD)),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_legacy_record() {
        let record = decode(json!({"Record": {"State": "STOP_RECORD"}}));
        match record {
            JsonRecord::Legacy(legacy) => assert_eq!(legacy.state(), Some(STOP_RECORD)),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_survey_response() {
        let record = decode(json!({
            "number": 1, "item": 2, "timeStamp": 1700000001000_i64,
            "question": "Mood?", "input": "slider", "range": [0, 10], "response": 7
        }));
        match record {
            JsonRecord::Survey(survey) => {
                assert_eq!(survey.question, json!("Mood?"));
                assert_eq!(survey.response, Some(json!(7)));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_object_keeps_payload() {
        let record = decode(json!({"foo": 1}));
        match record {
            JsonRecord::Unknown(object) => assert_eq!(object.get("foo"), Some(&json!(1))),
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
