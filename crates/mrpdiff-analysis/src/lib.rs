//! Differencing and explanation for pairs of MRP run logs.
//!
//! [`compare`] takes a baseline document (Run A) and a later one (Run B) and
//! produces a [`Comparison`]: severity-tagged [`Difference`]s in discovery order
//! plus a per-severity tally. [`explain`] maps those differences to fact and
//! inference statements for the report.
//!
//! ```
//! use mrpdiff_analysis::{compare, explain, DifferenceType};
//! use mrpdiff_log::DocumentBuilder;
//!
//! let a = DocumentBuilder::new("a").parse("Job: 14567\nProcessing Part:ABC123\n");
//! let b = DocumentBuilder::new("b").parse("");
//! let comparison = compare(a, b);
//!
//! assert_eq!(comparison.differences[0].difference_type, DifferenceType::JobRemoved);
//! assert_eq!(comparison.differences[1].difference_type, DifferenceType::PartRemoved);
//! assert!(explain(&comparison)[0].text.contains("14567"));
//! ```

pub mod diff;
pub mod explain;

pub use diff::{
    Comparison, ComparisonSummary, Difference, DifferenceType, IdKind, IdentifierIndex, Profile,
    Severity, compare,
};
pub use explain::{EvidenceRef, Explanation, ExplanationKind, RunSide, explain};
