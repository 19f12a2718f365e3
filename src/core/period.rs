//! Time-window selection over parsed tables.
//!
//! A period is given by two of `time_start`, `time_end` and `duration`.
//! The bound type picks the time column: zoned timestamps select on
//! `time_absolute`, durations select on `time_elapsed` (relative to the
//! record start). Selection returns new tables and never mutates its input.

use crate::parser::FileBundle;
use crate::record::{Timed, Timestamp};
use chrono::Duration;
use std::fmt;

/// Errors from resolving a period.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeriodError {
    #[error("Two of 'time_start', 'time_end', and 'duration' must be provided")]
    MissingBounds,
    /// A bound derived from `duration` falls outside the representable calendar.
    #[error("period bound out of range")]
    OutOfRange,
}

/// A value on one of the two time columns.
pub trait TimeValue: Copy + PartialOrd + fmt::Display {
    /// Name of the column this value selects on.
    const COLUMN: &'static str;

    fn of<S: Timed>(sample: &S) -> Option<Self>;
    fn checked_add(self, duration: Duration) -> Option<Self>;
    fn checked_sub(self, duration: Duration) -> Option<Self>;
}

impl TimeValue for Timestamp {
    const COLUMN: &'static str = "time_absolute";

    fn of<S: Timed>(sample: &S) -> Option<Self> {
        sample.time_absolute()
    }

    fn checked_add(self, duration: Duration) -> Option<Self> {
        self.checked_add_signed(duration)
    }

    fn checked_sub(self, duration: Duration) -> Option<Self> {
        self.checked_sub_signed(duration)
    }
}

impl TimeValue for Duration {
    const COLUMN: &'static str = "time_elapsed";

    fn of<S: Timed>(sample: &S) -> Option<Self> {
        sample.time_elapsed()
    }

    fn checked_add(self, duration: Duration) -> Option<Self> {
        Duration::checked_add(&self, &duration)
    }

    fn checked_sub(self, duration: Duration) -> Option<Self> {
        Duration::checked_sub(&self, &duration)
    }
}

/// Period arguments before resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Period<V> {
    pub time_start: Option<V>,
    pub time_end: Option<V>,
    pub duration: Option<Duration>,
}

impl<V> Default for Period<V> {
    fn default() -> Self {
        Self {
            time_start: None,
            time_end: None,
            duration: None,
        }
    }
}

impl<V: TimeValue> Period<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(mut self, time_start: V) -> Self {
        self.time_start = Some(time_start);
        self
    }

    pub fn end(mut self, time_end: V) -> Self {
        self.time_end = Some(time_end);
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Resolve the inclusive window bounds.
    pub fn resolve(&self) -> Result<Window<V>, PeriodError> {
        let (start, end) = match (self.time_start, self.time_end, self.duration) {
            (Some(start), Some(end), duration) => {
                if let Some(duration) = duration {
                    tracing::warn!("Ignoring duration: {}", duration);
                }
                (start, end)
            }
            (Some(start), None, Some(duration)) => (
                start,
                start.checked_add(duration).ok_or(PeriodError::OutOfRange)?,
            ),
            (None, Some(end), Some(duration)) => (
                end.checked_sub(duration).ok_or(PeriodError::OutOfRange)?,
                end,
            ),
            _ => return Err(PeriodError::MissingBounds),
        };

        Ok(Window { start, end })
    }
}

/// Resolved, inclusive selection window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window<V> {
    pub start: V,
    pub end: V,
}

impl<V: TimeValue> Window<V> {
    pub fn contains(&self, value: V) -> bool {
        self.start <= value && value <= self.end
    }

    /// Rows of `table` whose time column lies inside the window.
    ///
    /// Rows with a not-a-time value never match.
    pub fn select<S: Timed + Clone>(&self, name: &str, table: &[S]) -> Vec<S> {
        let mut min: Option<V> = None;
        let mut max: Option<V> = None;
        for value in table.iter().filter_map(V::of) {
            if min.map_or(true, |m| value < m) {
                min = Some(value);
            }
            if max.map_or(true, |m| value > m) {
                max = Some(value);
            }
        }

        if let (Some(min), Some(max)) = (min, max) {
            if self.start > max {
                tracing::warn!("Start time is out of range: {} ({})", max, name);
            } else if self.end < min {
                tracing::warn!("End time is out of range: {} ({})", min, name);
            }
        }

        let selected: Vec<S> = table
            .iter()
            .filter(|s| V::of(*s).is_some_and(|v| self.contains(v)))
            .cloned()
            .collect();

        tracing::info!("Table {} -> {} samples", name, selected.len());
        selected
    }
}

/// Data that can be narrowed to a time window.
pub trait Selectable: Sized {
    fn select_window<V: TimeValue>(&self, window: &Window<V>) -> Self;
}

impl<S: Timed + Clone> Selectable for Vec<S> {
    fn select_window<V: TimeValue>(&self, window: &Window<V>) -> Self {
        window.select("(single)", self)
    }
}

impl Selectable for FileBundle {
    fn select_window<V: TimeValue>(&self, window: &Window<V>) -> Self {
        FileBundle {
            metadata: self.metadata.clone(),
            hr: self.hr.as_ref().map(|t| window.select("hr", t)),
            accel: self.accel.as_ref().map(|t| window.select("accel", t)),
            survey: self.survey.as_ref().map(|t| window.select("survey", t)),
        }
    }
}

/// Select a period from a table or a whole bundle.
pub fn select_period<D: Selectable, V: TimeValue>(
    data: &D,
    period: &Period<V>,
) -> Result<D, PeriodError> {
    let window = period.resolve()?;
    tracing::info!(
        "Selecting period from {} to {} on {}",
        window.start,
        window.end,
        V::COLUMN
    );
    Ok(data.select_window(&window))
}
