use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a single log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    Info,
    Warning,
    Error,
    ProcessingStart,
    ProcessingEnd,
    ProcessingPart,
    Demand,
    Supply,
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntryType::Info => "Info",
            EntryType::Warning => "Warning",
            EntryType::Error => "Error",
            EntryType::ProcessingStart => "ProcessingStart",
            EntryType::ProcessingEnd => "ProcessingEnd",
            EntryType::ProcessingPart => "ProcessingPart",
            EntryType::Demand => "Demand",
            EntryType::Supply => "Supply",
        };
        f.write_str(label)
    }
}

/// One classified, non-blank line of an MRP log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// 1-based position in the source, blank lines included.
    pub line_number: usize,
    pub raw_line: String,
    pub entry_type: EntryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_number: Option<String>,
    /// Demand reference, e.g. `S: 100516/1/1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demand_source: Option<String>,
    /// Supply reference, e.g. `J: F340394/0/0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supply_source: Option<String>,
    /// Leading wall-clock stamp of the line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<NaiveTime>,
    /// First calendar date mentioned on the line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl LogEntry {
    pub fn is_error(&self) -> bool {
        self.entry_type == EntryType::Error
    }
}

/// MRP run mode detected from the log content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunType {
    #[default]
    Unknown,
    Regeneration,
    NetChange,
}

impl fmt::Display for RunType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunType::Unknown => "Unknown",
            RunType::Regeneration => "Regeneration",
            RunType::NetChange => "Net Change",
        };
        f.write_str(label)
    }
}

/// Parsed representation of one MRP log.
///
/// Built once by [`DocumentBuilder`](crate::DocumentBuilder) and read-only afterwards.
/// An empty or all-blank input yields a document with no entries and no metadata,
/// which is a perfectly valid value for every downstream stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogDocument {
    pub source_id: String,
    pub run_type: RunType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveDateTime>,
    pub entries: Vec<LogEntry>,
    #[serde(default)]
    pub parsing_errors: Vec<String>,
}

impl LogDocument {
    /// `end_time - start_time`, when both are known.
    pub fn duration(&self) -> Option<Duration> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Looks up the entry produced for a given source line.
    pub fn entry_at(&self, line_number: usize) -> Option<&LogEntry> {
        self.entries
            .binary_search_by_key(&line_number, |e| e.line_number)
            .ok()
            .map(|idx| &self.entries[idx])
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_error()).count()
    }
}
