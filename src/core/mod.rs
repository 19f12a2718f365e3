//! Query-time operations over parsed bundles.
//!
//! This module contains:
//! - Period selection by absolute or relative time window
//! - Descriptive statistics per table

pub mod period;
pub mod summary;

// Re-export commonly used types
pub use period::{select_period, Period, PeriodError, Selectable, TimeValue, Window};
pub use summary::{summarize, summarize_table, BundleSummary, ColumnStats, TableSummary};
