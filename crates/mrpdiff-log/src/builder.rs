use crate::classifier::{classify, parse_timestamp};
use crate::ir::{LogDocument, LogEntry, RunType};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

static SITE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bsite:\s*([^\s,;]+)").expect("site pattern"));
static START_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bstart time:\s*(.*)$").expect("start time pattern"));
static END_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bend time:\s*(.*)$").expect("end time pattern"));

/// Builds a [`LogDocument`] from MRP log text in a single left-to-right pass.
///
/// Input may arrive whole or in arbitrary chunks; partial lines are held back
/// until their newline (or [`finish`](Self::finish)) arrives, so any chunking
/// of the same text produces the same document.
pub struct DocumentBuilder {
    source_id: String,
    entries: Vec<LogEntry>,
    parsing_errors: Vec<String>,
    site: Option<String>,
    start_time: Option<NaiveDateTime>,
    end_time: Option<NaiveDateTime>,
    saw_regeneration: bool,
    saw_net_change: bool,
    buffer: String,
    lines_seen: usize,
}

impl DocumentBuilder {
    /// Creates an empty builder for the log identified by `source_id`.
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            entries: Vec::new(),
            parsing_errors: Vec::new(),
            site: None,
            start_time: None,
            end_time: None,
            saw_regeneration: false,
            saw_net_change: false,
            buffer: String::new(),
            lines_seen: 0,
        }
    }

    /// Appends a chunk of log text and processes every line it completes.
    ///
    /// # Returns
    ///
    /// The entries produced by lines completed in this call.
    pub fn update(&mut self, input: &str) -> Vec<LogEntry> {
        let start_count = self.entries.len();
        self.feed(input);
        self.entries[start_count..].to_vec()
    }

    /// Processes one complete line (without its terminator).
    ///
    /// Returns the produced entry, or `None` for a blank line.
    pub fn push_line(&mut self, line: &str) -> Option<&LogEntry> {
        if self.process_line(line) {
            self.entries.last()
        } else {
            None
        }
    }

    /// Flushes any trailing partial line and produces the finished document.
    pub fn finish(mut self) -> LogDocument {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            self.process_line(&rest);
        }

        let run_type = if self.saw_regeneration {
            RunType::Regeneration
        } else if self.saw_net_change {
            RunType::NetChange
        } else {
            RunType::Unknown
        };

        log::debug!(
            "built document {}: {} lines, {} entries, {} anomalies, run type {}",
            self.source_id,
            self.lines_seen,
            self.entries.len(),
            self.parsing_errors.len(),
            run_type
        );

        LogDocument {
            source_id: self.source_id,
            run_type,
            site: self.site,
            start_time: self.start_time,
            end_time: self.end_time,
            entries: self.entries,
            parsing_errors: self.parsing_errors,
        }
    }

    /// One-shot parse of a whole log.
    pub fn parse(mut self, input: &str) -> LogDocument {
        self.feed(input);
        self.finish()
    }

    fn feed(&mut self, input: &str) {
        self.buffer.push_str(input);

        let Some(last_nl) = self.buffer.rfind('\n') else {
            return;
        };

        let chunk: String = self.buffer.drain(..=last_nl).collect();
        for line in chunk.split_terminator('\n') {
            self.process_line(line);
        }
    }

    fn process_line(&mut self, raw: &str) -> bool {
        self.lines_seen += 1;
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if line.trim().is_empty() {
            return false;
        }

        let line_number = self.lines_seen;
        self.entries.push(classify(line_number, line));
        self.extract_metadata(line_number, line);
        true
    }

    fn extract_metadata(&mut self, line_number: usize, line: &str) {
        let lower = line.to_lowercase();
        if lower.contains("regen") {
            self.saw_regeneration = true;
        }
        if lower.contains("net change") || lower.contains("netchange") {
            self.saw_net_change = true;
        }

        if self.site.is_none()
            && let Some(caps) = SITE_RE.captures(line)
        {
            self.site = Some(caps[1].to_string());
        }

        if self.start_time.is_none() {
            self.start_time =
                self.marker_timestamp(&START_TIME_RE, line_number, line, "start time");
        }
        if self.end_time.is_none() {
            self.end_time = self.marker_timestamp(&END_TIME_RE, line_number, line, "end time");
        }
    }

    /// Parses the text after a time marker. An unparseable value is recorded as an
    /// anomaly and leaves the field unset for a later line to fill.
    fn marker_timestamp(
        &mut self,
        re: &Regex,
        line_number: usize,
        line: &str,
        what: &str,
    ) -> Option<NaiveDateTime> {
        let caps = re.captures(line)?;
        let text = caps[1].trim();
        let parsed = parse_timestamp(text);
        if parsed.is_none() {
            let note = format!("line {}: unparseable {} '{}'", line_number, what, text);
            log::warn!("{}: {}", self.source_id, note);
            self.parsing_errors.push(note);
        }
        parsed
    }
}

impl LogDocument {
    /// Builds a document from already-split lines.
    pub fn from_lines<I, S>(source_id: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = DocumentBuilder::new(source_id);
        for line in lines {
            builder.push_line(line.as_ref());
        }
        builder.finish()
    }
}
