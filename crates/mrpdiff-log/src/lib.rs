//! # mrpdiff log model
//!
//! Classifier and document builder for ERP MRP scheduler logs.
//!
//! ## Overview
//!
//! An MRP run writes a semi-structured text log: job and part numbers, demand and
//! supply references, quantities, timestamps and error text, mixed with free-form
//! progress messages. This crate turns one such log into a typed
//! [`LogDocument`](ir::LogDocument):
//!
//! - **Classification**: every non-blank line becomes a [`LogEntry`](ir::LogEntry)
//!   tagged with exactly one [`EntryType`](ir::EntryType)
//! - **Extraction**: identifiers, references and scalars are pulled out with anchored
//!   patterns; a missing pattern leaves the field unset
//! - **Run metadata**: site, run type, start and end time (first match wins)
//! - **Graceful degradation**: malformed metadata is noted in
//!   [`parsing_errors`](ir::LogDocument::parsing_errors), never fatal
//!
//! ## Architecture
//!
//! ```text
//! raw text ──update()──► DocumentBuilder ──finish()──► LogDocument
//!                             │
//!                             └── classify(line) per non-blank line
//! ```
//!
//! ## Examples
//!
//! ```
//! use mrpdiff_log::{DocumentBuilder, ir::EntryType};
//!
//! let log = "Site: MfgSys\nRegeneration started\n01:10:23 ERROR: Job 14567 abandoned due to timeout\n";
//! let doc = DocumentBuilder::new("run_a.log").parse(log);
//!
//! assert_eq!(doc.site.as_deref(), Some("MfgSys"));
//! assert_eq!(doc.entries[2].entry_type, EntryType::Error);
//! assert_eq!(doc.entries[2].job_number.as_deref(), Some("14567"));
//! ```
//!
//! Documents serialize with serde:
//!
//! ```no_run
//! use std::path::Path;
//!
//! let doc = mrpdiff_log::load_document(Path::new("mrp.log"))?;
//! println!("{}", serde_json::to_string_pretty(&doc)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Document builder.
pub mod builder;
/// Line classifier.
pub mod classifier;
/// Typed document IR.
pub mod ir;
/// Source acquisition.
pub mod source;


pub use builder::DocumentBuilder;
pub use classifier::classify;
pub use ir::{EntryType, LogDocument, LogEntry, RunType};
pub use source::{SourceError, load_document, read_source};

/// Schema version for the document IR.
///
/// - MAJOR: Breaking changes to document or entry structure
/// - MINOR: New optional fields or entry types
/// - PATCH: Bug fixes to classification behavior
pub const SCHEMA_VERSION: &str = "1.0.0";
