//! Report rendering for MRP run comparisons.
//!
//! The report has five fixed sections:
//!
//! ```text
//! A) RUN SUMMARY      metadata of both runs
//! B) WHAT CHANGED     severity counts and differences, most severe first
//! C) MOST LIKELY WHY  facts, then inferences with confidence
//! D) LOG EVIDENCE     raw lines backing the explanations (optional)
//! E) NEXT CHECKS      fixed follow-up checklist
//! ```
//!
//! Markdown and plain text carry identical sections with different markup.

pub mod options;
pub mod render;

pub use options::{OptionsError, ReportFormat, ReportOptions};
pub use render::{NO_DIFFERENCES, ReportRenderer, severity_icon};
