use crate::ir::{EntryType, LogEntry};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

// Keyword is case-insensitive, captured token is matched exactly.
static JOB_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i:job)[:\s]+([A-Z0-9\-]+)").expect("job pattern"));
static PART_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i:part)[:\s]+([A-Z0-9\-]+)").expect("part pattern"));
static DEMAND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i:demand):\s+S:\s+(\d+/\d+/\d+)").expect("demand pattern"));
static SUPPLY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i:supply):\s+J:\s+([A-Z0-9\-]+/\d+/\d+)").expect("supply pattern")
});
static CLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{1,2}:\d{2}:\d{2}(?:\.\d{1,9})?)\b").expect("clock pattern"));
static SLASH_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").expect("date pattern"));
static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})(?:\b|T)").expect("iso date pattern"));
static QUANTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:qty|quantity)[:=\s]+(-?\d+(?:\.\d+)?)").expect("quantity pattern")
});

/// Keyword classes in priority order. First class with a hit wins.
const KEYWORD_CLASSES: &[(EntryType, &[&str])] = &[
    (EntryType::Error, &["error", "fail", "fatal", "exception"]),
    (EntryType::Warning, &["warn", "timeout", "timed out"]),
    (EntryType::ProcessingStart, &["begin", "start"]),
    (EntryType::ProcessingEnd, &["end", "complete", "finish"]),
];

/// Substrings that force a line to `Error` after classification, whatever class won.
const ERROR_OVERRIDE: &[&str] = &["error", "timeout", "abandoned"];

/// Classifies one raw line into a [`LogEntry`].
///
/// Never fails: any field whose pattern is absent is left as `None`.
pub fn classify(line_number: usize, line: &str) -> LogEntry {
    let lower = line.to_lowercase();

    let job_number = capture(&JOB_RE, line);
    let part_number = capture(&PART_RE, line);
    let demand_source = capture(&DEMAND_RE, line).map(|r| format!("S: {}", r));
    let supply_source = capture(&SUPPLY_RE, line).map(|r| format!("J: {}", r));

    let mut entry_type = keyword_class(&lower).unwrap_or(if demand_source.is_some() {
        EntryType::Demand
    } else if supply_source.is_some() {
        EntryType::Supply
    } else if part_number.is_some() {
        EntryType::ProcessingPart
    } else {
        EntryType::Info
    });

    // Cuts across the priority table: a "Start ... timeout" line is an Error.
    if ERROR_OVERRIDE.iter().any(|k| lower.contains(k)) {
        entry_type = EntryType::Error;
    }
    let error_message = (entry_type == EntryType::Error).then(|| line.to_string());

    LogEntry {
        line_number,
        raw_line: line.to_string(),
        entry_type,
        job_number,
        part_number,
        demand_source,
        supply_source,
        timestamp: leading_clock(line),
        date: first_date(line),
        quantity: capture(&QUANTITY_RE, line).and_then(|q| q.parse().ok()),
        error_message,
    }
}

/// Returns the highest-priority keyword class present in an already lower-cased line.
pub fn keyword_class(lower: &str) -> Option<EntryType> {
    KEYWORD_CLASSES
        .iter()
        .find(|(_, stems)| stems.iter().any(|stem| has_word_prefix(lower, stem)))
        .map(|(ty, _)| *ty)
}

/// True when `stem` occurs at the start of a word: `start` hits "started" but
/// `end` misses "pending".
fn has_word_prefix(haystack: &str, stem: &str) -> bool {
    haystack.match_indices(stem).any(|(idx, _)| {
        haystack[..idx]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric())
    })
}

fn capture(re: &Regex, line: &str) -> Option<String> {
    re.captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn leading_clock(line: &str) -> Option<NaiveTime> {
    let text = capture(&CLOCK_RE, line)?;
    NaiveTime::parse_from_str(&text, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(&text, "%H:%M:%S"))
        .ok()
}

/// Earliest date token on the line. Slash dates are read month-first, then day-first.
fn first_date(line: &str) -> Option<NaiveDate> {
    let slash = SLASH_DATE_RE.captures(line).and_then(|c| {
        let start = c.get(0)?.start();
        let a: u32 = c[1].parse().ok()?;
        let b: u32 = c[2].parse().ok()?;
        let y: i32 = c[3].parse().ok()?;
        let date = NaiveDate::from_ymd_opt(y, a, b).or_else(|| NaiveDate::from_ymd_opt(y, b, a))?;
        Some((start, date))
    });
    let iso = ISO_DATE_RE.captures(line).and_then(|c| {
        let start = c.get(0)?.start();
        let date = NaiveDate::from_ymd_opt(c[1].parse().ok()?, c[2].parse().ok()?, c[3].parse().ok()?)?;
        Some((start, date))
    });

    match (slash, iso) {
        (Some(s), Some(i)) => Some(if s.0 <= i.0 { s.1 } else { i.1 }),
        (s, i) => s.or(i).map(|(_, d)| d),
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
    "%A, %B %d, %Y %I:%M:%S %p",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%d.%m.%Y"];

/// Locale-tolerant timestamp parsing for run metadata markers.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_beats_start() {
        let entry = classify(1, "Start of processing failed for Part: ABC123");
        assert_eq!(entry.entry_type, EntryType::Error);
    }

    #[test]
    fn test_keyword_priority_independent_of_position() {
        assert_eq!(keyword_class("finished with warnings"), Some(EntryType::Warning));
        assert_eq!(keyword_class("warnings cleared, finished"), Some(EntryType::Warning));
        assert_eq!(keyword_class("begin then end"), Some(EntryType::ProcessingStart));
    }

    #[test]
    fn test_word_prefix_rejects_inner_match() {
        assert_eq!(keyword_class("pending demand"), None);
        assert_eq!(keyword_class("run ended"), Some(EntryType::ProcessingEnd));
    }

    #[test]
    fn test_timeout_override_sets_error_message() {
        let line = "Start scheduling Job: 14567 timeout";
        let entry = classify(3, line);
        assert_eq!(entry.entry_type, EntryType::Error);
        assert_eq!(entry.error_message.as_deref(), Some(line));
    }

    #[test]
    fn test_keyword_error_keeps_message() {
        let entry = classify(1, "Job: 14571 failed to firm");
        assert_eq!(entry.entry_type, EntryType::Error);
        assert_eq!(entry.error_message.as_deref(), Some("Job: 14571 failed to firm"));
        assert!(classify(2, "Job: 14571 firmed").error_message.is_none());
    }

    #[test]
    fn test_abandoned_override() {
        let entry = classify(1, "Job 22 abandoned");
        assert_eq!(entry.entry_type, EntryType::Error);
        assert!(entry.error_message.is_some());
    }

    #[test]
    fn test_job_and_part_extraction() {
        let entry = classify(1, "Processing Job: 14567 Part:ABC-123 next Part: ZZZ");
        assert_eq!(entry.job_number.as_deref(), Some("14567"));
        assert_eq!(entry.part_number.as_deref(), Some("ABC-123"));
    }

    #[test]
    fn test_lowercase_token_not_captured() {
        let entry = classify(1, "job abc");
        assert_eq!(entry.job_number, None);
    }

    #[test]
    fn test_demand_and_supply_references() {
        let demand = classify(1, "Demand: S: 100516/1/1");
        assert_eq!(demand.entry_type, EntryType::Demand);
        assert_eq!(demand.demand_source.as_deref(), Some("S: 100516/1/1"));

        let supply = classify(2, "Supply: J: F340394/0/0");
        assert_eq!(supply.entry_type, EntryType::Supply);
        assert_eq!(supply.supply_source.as_deref(), Some("J: F340394/0/0"));
    }

    #[test]
    fn test_part_only_line_is_processing_part() {
        let entry = classify(1, "Processing Part:ABC123");
        assert_eq!(entry.entry_type, EntryType::ProcessingPart);
        assert_eq!(entry.part_number.as_deref(), Some("ABC123"));
    }

    #[test]
    fn test_scalars() {
        let entry = classify(1, "01:10:23 Job: 7 Qty: 12.5 Due: 10/15/2024");
        assert_eq!(entry.timestamp, NaiveTime::from_hms_opt(1, 10, 23));
        assert_eq!(entry.quantity, Some(12.5));
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2024, 10, 15));
    }

    #[test]
    fn test_day_first_fallback() {
        let entry = classify(1, "Due 25/12/2024");
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2024, 12, 25));
    }

    #[test]
    fn test_iso_date_inside_datetime_token() {
        let entry = classify(1, "Job: 5 Due: 2024-10-20T08:00:00");
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2024, 10, 20));
        assert_eq!(classify(2, "Due 2024-10-21").date, NaiveDate::from_ymd_opt(2024, 10, 21));
    }

    #[test]
    fn test_quantity_needs_separator() {
        assert_eq!(classify(1, "Job: 7 Qty=3").quantity, Some(3.0));
        assert_eq!(classify(2, "Job: 7 quantity 4").quantity, Some(4.0));
        assert_eq!(classify(3, "Job: 7 Qty5").quantity, None);
    }

    #[test]
    fn test_garbage_does_not_panic() {
        let entry = classify(1, "Job: Part: Demand: S: Supply: J: 99:99:99 13/45/0000");
        assert_eq!(entry.timestamp, None);
        assert_eq!(entry.date, None);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 10, 15)
            .and_then(|d| d.and_hms_opt(13, 5, 0))
            .unwrap();
        assert_eq!(parse_timestamp("2024-10-15 13:05:00"), Some(expected));
        assert_eq!(parse_timestamp("10/15/2024 1:05:00 PM"), Some(expected));
        assert_eq!(parse_timestamp("Tuesday, October 15, 2024 1:05:00 PM"), Some(expected));
        assert_eq!(parse_timestamp("not a date"), None);
    }
}
