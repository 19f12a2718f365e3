//! BEATwatch Process - parser for BEATwatch wearable recordings.
//!
//! This library reads the line-oriented log files written by the BEATwatch
//! heart-rate and accelerometer watch into typed tables, attaches recording
//! metadata, and selects time windows from the result.
//!
//! # Parsing Guarantees
//!
//! - **Best effort**: data problems never abort a parse, they are logged and counted
//! - **Two clocks**: every sample keeps its relative `time_elapsed` and, when the
//!   record start is known, its absolute `time_absolute`
//! - **Non-destructive selection**: period selection returns new tables
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     BEATwatch Process                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │  Classify   │──▶│   Tables    │──▶│ FileBundle  │        │
//! │  │   (lines)   │   │ (hr/accel)  │   │             │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! │         │                 ▲                 │               │
//! │         ▼                 │                 ▼               │
//! │  ┌─────────────┐          │          ┌─────────────┐        │
//! │  │  Reconcile  │──────────┘          │   Period    │        │
//! │  │ (metadata)  │   record start      │  Selector   │        │
//! │  └─────────────┘                     └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use beatwatch_process::{core::{select_period, Period}, Parser};
//! use chrono::Duration;
//!
//! let parser = Parser::new("America/Toronto").expect("known timezone");
//! let bundle = parser.parse_file("recording.txt");
//!
//! // First minute of the recording
//! let period = Period::new()
//!     .start(Duration::zero())
//!     .duration(Duration::minutes(1));
//! let first_minute = select_period(&bundle, &period).expect("two bounds given");
//! ```

pub mod config;
pub mod core;
pub mod parser;
pub mod plot;
pub mod record;
pub mod transparency;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use core::{select_period, summarize, Period, PeriodError};
pub use parser::{FileBundle, Metadata, Parser, ParserError};
pub use plot::{render_series, PlotError, TimeAxis};
pub use record::{AccelSample, HrSample, Sample, SurveyResponse, Timed, Timestamp};
pub use transparency::ParseReport;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
