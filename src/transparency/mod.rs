//! Transparency module for BEATwatch parsing.
//!
//! The parser drops what it cannot read and carries on. This module tracks
//! what was dropped so a caller can audit a parse after the fact.

pub mod report;

// Re-export commonly used types
pub use report::ParseReport;
