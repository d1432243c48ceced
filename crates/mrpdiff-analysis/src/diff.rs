use chrono::NaiveDate;
use mrpdiff_log::ir::{LogDocument, LogEntry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

/// Kind of discrepancy between two runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DifferenceType {
    JobAdded,
    JobRemoved,
    PartAdded,
    PartRemoved,
    DateShifted,
    QuantityChanged,
    ErrorAppeared,
    ErrorResolved,
}

impl DifferenceType {
    /// Fixed severity policy. `JobRemoved` is escalated to `Critical` by the
    /// differencer when the job vanished around an error.
    pub fn base_severity(self) -> Severity {
        match self {
            DifferenceType::JobRemoved => Severity::Warning,
            DifferenceType::JobAdded => Severity::Info,
            DifferenceType::PartAdded | DifferenceType::PartRemoved => Severity::Info,
            DifferenceType::DateShifted | DifferenceType::QuantityChanged => Severity::Warning,
            DifferenceType::ErrorAppeared => Severity::Critical,
            DifferenceType::ErrorResolved => Severity::Info,
        }
    }
}

impl fmt::Display for DifferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DifferenceType::JobAdded => "JobAdded",
            DifferenceType::JobRemoved => "JobRemoved",
            DifferenceType::PartAdded => "PartAdded",
            DifferenceType::PartRemoved => "PartRemoved",
            DifferenceType::DateShifted => "DateShifted",
            DifferenceType::QuantityChanged => "QuantityChanged",
            DifferenceType::ErrorAppeared => "ErrorAppeared",
            DifferenceType::ErrorResolved => "ErrorResolved",
        };
        f.write_str(label)
    }
}

/// Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Critical => "Critical",
        };
        f.write_str(label)
    }
}

/// One detected discrepancy between Run A and Run B.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difference {
    pub difference_type: DifferenceType,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_number: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub total_differences: usize,
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
}

impl ComparisonSummary {
    pub fn from_differences(differences: &[Difference]) -> Self {
        let mut summary = Self {
            total_differences: differences.len(),
            ..Self::default()
        };
        for d in differences {
            match d.severity {
                Severity::Critical => summary.critical += 1,
                Severity::Warning => summary.warning += 1,
                Severity::Info => summary.info += 1,
            }
        }
        summary
    }
}

/// Two runs and everything that differs between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Baseline (earlier) run.
    pub run_a: LogDocument,
    /// Compared (later) run.
    pub run_b: LogDocument,
    /// Differences in discovery order.
    pub differences: Vec<Difference>,
    pub summary: ComparisonSummary,
}

impl Comparison {
    pub fn has_differences(&self) -> bool {
        !self.differences.is_empty()
    }
}

/// Which identifier a difference is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Job,
    Part,
}

impl IdKind {
    pub fn label(self) -> &'static str {
        match self {
            IdKind::Job => "Job",
            IdKind::Part => "Part",
        }
    }

    pub fn of(self, entry: &LogEntry) -> Option<&str> {
        match self {
            IdKind::Job => entry.job_number.as_deref(),
            IdKind::Part => entry.part_number.as_deref(),
        }
        .filter(|id| !id.is_empty())
    }

    fn added(self) -> DifferenceType {
        match self {
            IdKind::Job => DifferenceType::JobAdded,
            IdKind::Part => DifferenceType::PartAdded,
        }
    }

    fn removed(self) -> DifferenceType {
        match self {
            IdKind::Job => DifferenceType::JobRemoved,
            IdKind::Part => DifferenceType::PartRemoved,
        }
    }
}

/// Identifier a difference refers to, job first.
pub fn subject_of(difference: &Difference) -> Option<(IdKind, &str)> {
    difference
        .job_number
        .as_deref()
        .map(|id| (IdKind::Job, id))
        .or_else(|| difference.part_number.as_deref().map(|id| (IdKind::Part, id)))
}

fn key(id: &str) -> String {
    id.to_uppercase()
}

/// What a run says about one identifier. Scalars keep the line they came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile<'a> {
    /// Spelling of the first mention.
    pub id: &'a str,
    /// Every line mentioning the identifier, in order.
    pub lines: Vec<usize>,
    /// Lines among `lines` classified as errors.
    pub error_lines: Vec<usize>,
    pub date: Option<(NaiveDate, usize)>,
    pub quantity: Option<(f64, usize)>,
    pub first_error: Option<&'a LogEntry>,
}

impl<'a> Profile<'a> {
    fn record(&mut self, entry: &'a LogEntry) {
        self.lines.push(entry.line_number);
        if self.date.is_none() {
            self.date = entry.date.map(|d| (d, entry.line_number));
        }
        if self.quantity.is_none() {
            self.quantity = entry.quantity.map(|q| (q, entry.line_number));
        }
        if entry.is_error() {
            self.error_lines.push(entry.line_number);
            if self.first_error.is_none() {
                self.first_error = Some(entry);
            }
        }
    }
}

/// Profiles of every identifier of one kind in a document, built in a single pass.
///
/// Identifiers are keyed case-insensitively and iterate in first-appearance order.
#[derive(Debug, Default)]
pub struct IdentifierIndex<'a> {
    order: Vec<String>,
    profiles: HashMap<String, Profile<'a>>,
}

impl<'a> IdentifierIndex<'a> {
    pub fn build(doc: &'a LogDocument, kind: IdKind) -> Self {
        let mut index = Self::default();
        for entry in &doc.entries {
            let Some(id) = kind.of(entry) else {
                continue;
            };
            let profile = match index.profiles.entry(key(id)) {
                Entry::Occupied(slot) => slot.into_mut(),
                Entry::Vacant(slot) => {
                    index.order.push(slot.key().clone());
                    slot.insert(Profile {
                        id,
                        ..Profile::default()
                    })
                }
            };
            profile.record(entry);
        }
        index
    }

    pub fn get(&self, id: &str) -> Option<&Profile<'a>> {
        self.profiles.get(&key(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Keyed profiles in first-appearance order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Profile<'a>)> {
        self.order
            .iter()
            .filter_map(|k| self.profiles.get(k).map(|p| (k.as_str(), p)))
    }

    fn contains_key(&self, k: &str) -> bool {
        self.profiles.contains_key(k)
    }

    fn by_key(&self, k: &str) -> Option<&Profile<'a>> {
        self.profiles.get(k)
    }
}

/// Compares a baseline run against a later run.
///
/// Differences come out in discovery order: jobs removed, jobs added, parts removed,
/// parts added, then value changes for identifiers present in both runs (jobs first).
/// Neither document is inspected beyond its entries; the result is deterministic.
pub fn compare(run_a: LogDocument, run_b: LogDocument) -> Comparison {
    let differences = differences(&run_a, &run_b);

    let summary = ComparisonSummary::from_differences(&differences);
    log::debug!(
        "compared {} against {}: {} differences ({} critical, {} warning, {} info)",
        run_a.source_id,
        run_b.source_id,
        summary.total_differences,
        summary.critical,
        summary.warning,
        summary.info
    );

    Comparison {
        run_a,
        run_b,
        differences,
        summary,
    }
}

fn differences(run_a: &LogDocument, run_b: &LogDocument) -> Vec<Difference> {
    let mut out = Vec::new();

    let jobs_a = IdentifierIndex::build(run_a, IdKind::Job);
    let jobs_b = IdentifierIndex::build(run_b, IdKind::Job);
    let parts_a = IdentifierIndex::build(run_a, IdKind::Part);
    let parts_b = IdentifierIndex::build(run_b, IdKind::Part);

    presence_differences(IdKind::Job, &jobs_a, &jobs_b, &mut out);
    presence_differences(IdKind::Part, &parts_a, &parts_b, &mut out);
    value_differences(IdKind::Job, &jobs_a, &jobs_b, &mut out);
    value_differences(IdKind::Part, &parts_a, &parts_b, &mut out);
    out
}

fn difference(
    difference_type: DifferenceType,
    severity: Severity,
    kind: IdKind,
    id: &str,
    description: String,
) -> Difference {
    let (job_number, part_number) = match kind {
        IdKind::Job => (Some(id.to_string()), None),
        IdKind::Part => (None, Some(id.to_string())),
    };
    Difference {
        difference_type,
        severity,
        job_number,
        part_number,
        description,
        old_value: None,
        new_value: None,
    }
}

fn presence_differences(
    kind: IdKind,
    in_a: &IdentifierIndex<'_>,
    in_b: &IdentifierIndex<'_>,
    out: &mut Vec<Difference>,
) {
    for (k, profile) in in_a.iter() {
        if in_b.contains_key(k) {
            continue;
        }
        let ty = kind.removed();
        let mut severity = ty.base_severity();
        let mut description = format!(
            "{} {} present in Run A but missing from Run B",
            kind.label(),
            profile.id
        );
        if kind == IdKind::Job
            && let Some(error) = profile.first_error
        {
            severity = Severity::Critical;
            let message = error.error_message.as_deref().unwrap_or(&error.raw_line);
            description.push_str(&format!(" (last seen with error: {})", message));
        }
        out.push(difference(ty, severity, kind, profile.id, description));
    }

    for (k, profile) in in_b.iter() {
        if in_a.contains_key(k) {
            continue;
        }
        let ty = kind.added();
        let description = format!(
            "{} {} appears in Run B but not in Run A",
            kind.label(),
            profile.id
        );
        out.push(difference(ty, ty.base_severity(), kind, profile.id, description));
    }
}

fn value_differences(
    kind: IdKind,
    in_a: &IdentifierIndex<'_>,
    in_b: &IdentifierIndex<'_>,
    out: &mut Vec<Difference>,
) {
    let label = kind.label();

    for (k, before) in in_a.iter() {
        let Some(after) = in_b.by_key(k) else {
            continue;
        };
        let id = before.id;

        if let (Some((old, _)), Some((new, _))) = (before.date, after.date)
            && old != new
        {
            let (old, new) = (old.format("%Y-%m-%d").to_string(), new.format("%Y-%m-%d").to_string());
            let description = format!("{} {} date shifted from {} to {}", label, id, old, new);
            out.push(changed(DifferenceType::DateShifted, kind, id, description, old, new));
        }

        if let (Some((old, _)), Some((new, _))) = (before.quantity, after.quantity)
            && old != new
        {
            let (old, new) = (old.to_string(), new.to_string());
            let description = format!("{} {} quantity changed from {} to {}", label, id, old, new);
            out.push(changed(DifferenceType::QuantityChanged, kind, id, description, old, new));
        }

        match (before.first_error, after.first_error) {
            (None, Some(_)) => {
                let ty = DifferenceType::ErrorAppeared;
                let description =
                    format!("{} {} reports an error in Run B that was absent in Run A", label, id);
                out.push(difference(ty, ty.base_severity(), kind, id, description));
            }
            (Some(_), None) => {
                let ty = DifferenceType::ErrorResolved;
                let description =
                    format!("{} {} error from Run A no longer occurs in Run B", label, id);
                out.push(difference(ty, ty.base_severity(), kind, id, description));
            }
            _ => {}
        }
    }
}

fn changed(
    ty: DifferenceType,
    kind: IdKind,
    id: &str,
    description: String,
    old: String,
    new: String,
) -> Difference {
    let mut d = difference(ty, ty.base_severity(), kind, id, description);
    d.old_value = Some(old);
    d.new_value = Some(new);
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use mrpdiff_log::DocumentBuilder;

    fn doc(name: &str, text: &str) -> LogDocument {
        DocumentBuilder::new(name).parse(text)
    }

    #[test]
    fn test_identical_runs_have_no_differences() {
        let a = doc("a", "Job: 14567\nPart: ABC123\n");
        let b = doc("b", "Job: 14567\nPart: ABC123\n");
        let cmp = compare(a, b);
        assert!(cmp.differences.is_empty());
        assert_eq!(cmp.summary, ComparisonSummary::default());
    }

    #[test]
    fn test_identifiers_compare_case_insensitively() {
        let a = doc("a", "Job: AB-1\n");
        let mut b = doc("b", "job: AB-1\n");
        b.entries[0].job_number = Some("ab-1".to_string());
        assert!(!compare(a, b).has_differences());
    }

    #[test]
    fn test_removed_job_without_error_is_warning() {
        let cmp = compare(doc("a", "Job: 1\n"), doc("b", ""));
        assert_eq!(cmp.differences.len(), 1);
        assert_eq!(cmp.differences[0].difference_type, DifferenceType::JobRemoved);
        assert_eq!(cmp.differences[0].severity, Severity::Warning);
        assert!(!cmp.differences[0].description.contains("error"));
    }

    #[test]
    fn test_removed_job_with_error_is_critical() {
        let cmp = compare(doc("a", "Job: 1\nJob: 1 failed to schedule\n"), doc("b", ""));
        let d = &cmp.differences[0];
        assert_eq!(d.severity, Severity::Critical);
        assert!(d.description.contains("last seen with error: Job: 1 failed to schedule"));
    }

    #[test]
    fn test_discovery_order() {
        let a = doc("a", "Job: OLD\nPart: P-OLD\n");
        let b = doc("b", "Job: NEW\nPart: P-NEW\n");
        let types: Vec<DifferenceType> = compare(a, b)
            .differences
            .iter()
            .map(|d| d.difference_type)
            .collect();
        assert_eq!(
            types,
            vec![
                DifferenceType::JobRemoved,
                DifferenceType::JobAdded,
                DifferenceType::PartRemoved,
                DifferenceType::PartAdded,
            ]
        );
    }

    #[test]
    fn test_value_changes() {
        let a = doc("a", "Job: 5 Qty: 10 Due: 10/20/2024\n");
        let b = doc("b", "Job: 5 Qty: 12 Due: 10/24/2024\nJob: 5 error while firming\n");
        let cmp = compare(a, b);
        let types: Vec<DifferenceType> =
            cmp.differences.iter().map(|d| d.difference_type).collect();
        assert_eq!(
            types,
            vec![
                DifferenceType::DateShifted,
                DifferenceType::QuantityChanged,
                DifferenceType::ErrorAppeared,
            ]
        );
        let shift = &cmp.differences[0];
        assert_eq!(shift.old_value.as_deref(), Some("2024-10-20"));
        assert_eq!(shift.new_value.as_deref(), Some("2024-10-24"));
        assert_eq!(shift.description, "Job 5 date shifted from 2024-10-20 to 2024-10-24");
        assert_eq!(cmp.differences[1].old_value.as_deref(), Some("10"));
        assert_eq!(cmp.differences[2].severity, Severity::Critical);
    }

    #[test]
    fn test_error_resolved() {
        let a = doc("a", "Part: P1 exception during explosion\n");
        let b = doc("b", "Part: P1\n");
        let cmp = compare(a, b);
        assert_eq!(cmp.differences.len(), 1);
        assert_eq!(cmp.differences[0].difference_type, DifferenceType::ErrorResolved);
        assert_eq!(cmp.differences[0].severity, Severity::Info);
    }

    #[test]
    fn test_summary_counts() {
        let a = doc("a", "Job: 1 error\nJob: 2\nPart: X\n");
        let b = doc("b", "Job: 3\n");
        let cmp = compare(a, b);
        let s = &cmp.summary;
        assert_eq!(s.total_differences, cmp.differences.len());
        assert_eq!(s.critical + s.warning + s.info, s.total_differences);
        assert_eq!(s.critical, 1);
        assert_eq!(s.warning, 1);
        assert_eq!(s.info, 2);
    }

    #[test]
    fn test_index_gathers_profile_in_one_pass() {
        let mut run = doc(
            "a",
            "Job: J1 Qty: 4\nJob: j1 Due: 10/20/2024\nPart: P1\nJob: J1 failed\nJob: J1 Qty: 9\n",
        );
        run.entries[1].job_number = Some("j1".to_string());
        let index = IdentifierIndex::build(&run, IdKind::Job);

        assert_eq!(index.len(), 1);
        let profile = index.get("j1").unwrap();
        assert_eq!(profile.id, "J1");
        assert_eq!(profile.lines, vec![1, 2, 4, 5]);
        assert_eq!(profile.error_lines, vec![4]);
        assert_eq!(profile.quantity, Some((4.0, 1)));
        assert_eq!(profile.date.map(|(_, line)| line), Some(2));
        assert_eq!(profile.first_error.map(|e| e.line_number), Some(4));
        assert!(IdentifierIndex::build(&run, IdKind::Part).get("P1").is_some());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }
}
