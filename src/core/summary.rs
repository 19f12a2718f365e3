//! Descriptive statistics for parsed tables.

use crate::parser::FileBundle;
use crate::record::{AccelSample, HrSample, Sample};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Statistics of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub column: String,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Statistics of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    pub table: String,
    pub samples: usize,
    /// First and last `time_elapsed` in milliseconds
    pub first_elapsed_ms: Option<i64>,
    pub last_elapsed_ms: Option<i64>,
    pub columns: Vec<ColumnStats>,
}

/// Statistics of every table present in a bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BundleSummary {
    pub tables: Vec<TableSummary>,
    pub survey_responses: usize,
}

/// Summarise one sample table. Returns `None` for an empty table.
pub fn summarize_table<S: Sample>(table: &[S]) -> Option<TableSummary> {
    if table.is_empty() {
        return None;
    }

    let columns = S::COLUMNS
        .iter()
        .filter(|name| **name != "time_elapsed")
        .map(|name| {
            let values: Vec<f64> = table.iter().filter_map(|s| s.column(name)).collect();
            ColumnStats {
                column: name.to_string(),
                mean: Statistics::mean(values.iter()),
                // Sample standard deviation is NaN for a single value
                std_dev: Statistics::std_dev(values.iter()),
                min: Statistics::min(values.iter()),
                max: Statistics::max(values.iter()),
            }
        })
        .collect();

    Some(TableSummary {
        table: S::TABLE.to_string(),
        samples: table.len(),
        first_elapsed_ms: table
            .first()
            .and_then(|s| s.time_elapsed())
            .map(|d| d.num_milliseconds()),
        last_elapsed_ms: table
            .last()
            .and_then(|s| s.time_elapsed())
            .map(|d| d.num_milliseconds()),
        columns,
    })
}

/// Summarise all tables of a bundle.
pub fn summarize(bundle: &FileBundle) -> BundleSummary {
    let mut tables = Vec::new();
    if let Some(summary) = bundle.hr.as_deref().and_then(summarize_table::<HrSample>) {
        tables.push(summary);
    }
    if let Some(summary) = bundle
        .accel
        .as_deref()
        .and_then(summarize_table::<AccelSample>)
    {
        tables.push(summary);
    }

    BundleSummary {
        tables,
        survey_responses: bundle.survey.as_ref().map_or(0, Vec::len),
    }
}

impl BundleSummary {
    /// Get a summary string for display.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for table in &self.tables {
            out.push_str(&format!(
                "Table {}: {} samples, time_elapsed {} .. {} ms\n",
                table.table,
                table.samples,
                table.first_elapsed_ms.unwrap_or_default(),
                table.last_elapsed_ms.unwrap_or_default(),
            ));
            for c in &table.columns {
                out.push_str(&format!(
                    "  {:<16} mean {:>10.2}  sd {:>10.2}  min {:>10.0}  max {:>10.0}\n",
                    c.column, c.mean, c.std_dev, c.min, c.max
                ));
            }
        }
        out.push_str(&format!("Survey responses: {}\n", self.survey_responses));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn hr(ms: i64, bpm: i16) -> HrSample {
        HrSample {
            time_elapsed: Duration::milliseconds(ms),
            heart_rate_bpm: bpm,
            confidence: 90,
            ppg_raw: 10,
            ppg_filter: 20,
            time_absolute: None,
        }
    }

    #[test]
    fn test_empty_table() {
        assert!(summarize_table::<HrSample>(&[]).is_none());
    }

    #[test]
    fn test_hr_statistics() {
        let summary = summarize_table(&[hr(0, 60), hr(1000, 70), hr(2000, 80)]).unwrap();

        assert_eq!(summary.table, "hr");
        assert_eq!(summary.samples, 3);
        assert_eq!(summary.first_elapsed_ms, Some(0));
        assert_eq!(summary.last_elapsed_ms, Some(2000));
        assert_eq!(summary.columns.len(), 4);

        let bpm = &summary.columns[0];
        assert_eq!(bpm.column, "heart_rate_bpm");
        assert!((bpm.mean - 70.0).abs() < 1e-9);
        assert!((bpm.std_dev - 10.0).abs() < 1e-9);
        assert_eq!(bpm.min, 60.0);
        assert_eq!(bpm.max, 80.0);
    }

    #[test]
    fn test_bundle_summary_render() {
        let bundle = FileBundle {
            metadata: Default::default(),
            hr: Some(vec![hr(0, 60), hr(500, 62)]),
            accel: None,
            survey: None,
        };
        let summary = summarize(&bundle);
        assert_eq!(summary.tables.len(), 1);

        let text = summary.render();
        assert!(text.contains("Table hr: 2 samples"));
        assert!(text.contains("Survey responses: 0"));
    }
}
