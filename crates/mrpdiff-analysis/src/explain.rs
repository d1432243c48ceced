use crate::diff::{Comparison, Difference, DifferenceType, IdKind, IdentifierIndex, subject_of};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence attached to "removed due to previous errors". Kept fixed so that
/// reports from different versions stay comparable.
pub const REMOVED_AFTER_ERROR_CONFIDENCE: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExplanationKind {
    /// Directly evidenced by the logs.
    Fact,
    /// A plausible cause.
    Inference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RunSide {
    A,
    B,
}

impl fmt::Display for RunSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunSide::A => f.write_str("Run A"),
            RunSide::B => f.write_str("Run B"),
        }
    }
}

/// A source line backing an explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EvidenceRef {
    pub run: RunSide,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub kind: ExplanationKind,
    pub text: String,
    /// 1.0 for facts, strictly below 1.0 for inferences.
    pub confidence: f64,
    /// Indices into [`Comparison::differences`].
    pub differences: Vec<usize>,
    #[serde(default)]
    pub evidence: Vec<EvidenceRef>,
}

impl Explanation {
    pub fn fact(text: String, difference: usize, evidence: Vec<EvidenceRef>) -> Self {
        Self {
            kind: ExplanationKind::Fact,
            text,
            confidence: 1.0,
            differences: vec![difference],
            evidence,
        }
    }

    pub fn inference(
        text: String,
        confidence: f64,
        difference: usize,
        evidence: Vec<EvidenceRef>,
    ) -> Self {
        debug_assert!((0.0..1.0).contains(&confidence));
        Self {
            kind: ExplanationKind::Inference,
            text,
            confidence,
            differences: vec![difference],
            evidence,
        }
    }

    pub fn is_fact(&self) -> bool {
        self.kind == ExplanationKind::Fact
    }
}

/// Turns the differences of a comparison into fact and inference statements,
/// in difference order.
///
/// | Difference   | Output                                                      |
/// |--------------|-------------------------------------------------------------|
/// | JobRemoved   | Fact; plus Inference (0.75) if the description mentions `timeout` or `error` |
/// | DateShifted  | Fact restating the description                              |
/// | anything else| nothing                                                     |
pub fn explain(comparison: &Comparison) -> Vec<Explanation> {
    let mut out = Vec::new();
    if !comparison.has_differences() {
        return out;
    }

    let index = RunIndexes::build(comparison);
    for (idx, difference) in comparison.differences.iter().enumerate() {
        match difference.difference_type {
            DifferenceType::JobRemoved => explain_job_removed(&index, idx, difference, &mut out),
            DifferenceType::DateShifted => {
                out.push(Explanation::fact(
                    difference.description.clone(),
                    idx,
                    date_evidence(&index, difference),
                ));
            }
            _ => {}
        }
    }
    log::debug!(
        "{} explanations for {} differences",
        out.len(),
        comparison.differences.len()
    );
    out
}

/// Identifier profiles of both runs, for citing evidence lines.
struct RunIndexes<'a> {
    jobs: [IdentifierIndex<'a>; 2],
    parts: [IdentifierIndex<'a>; 2],
}

impl<'a> RunIndexes<'a> {
    fn build(comparison: &'a Comparison) -> Self {
        let (a, b) = (&comparison.run_a, &comparison.run_b);
        Self {
            jobs: [
                IdentifierIndex::build(a, IdKind::Job),
                IdentifierIndex::build(b, IdKind::Job),
            ],
            parts: [
                IdentifierIndex::build(a, IdKind::Part),
                IdentifierIndex::build(b, IdKind::Part),
            ],
        }
    }

    fn of(&self, kind: IdKind, run: RunSide) -> &IdentifierIndex<'a> {
        let pair = match kind {
            IdKind::Job => &self.jobs,
            IdKind::Part => &self.parts,
        };
        match run {
            RunSide::A => &pair[0],
            RunSide::B => &pair[1],
        }
    }
}

fn cite(run: RunSide, lines: &[usize]) -> Vec<EvidenceRef> {
    lines.iter().map(|&line| EvidenceRef { run, line }).collect()
}

fn explain_job_removed(
    index: &RunIndexes<'_>,
    idx: usize,
    difference: &Difference,
    out: &mut Vec<Explanation>,
) {
    let job = difference.job_number.as_deref().unwrap_or("Unknown");
    let profile = index.of(IdKind::Job, RunSide::A).get(job);

    out.push(Explanation::fact(
        format!("Job {} was present in Run A but not in Run B", job),
        idx,
        profile.map(|p| cite(RunSide::A, &p.lines)).unwrap_or_default(),
    ));

    // Case-sensitive match on the generated description.
    if difference.description.contains("timeout") || difference.description.contains("error") {
        out.push(Explanation::inference(
            format!("Job {} may have been removed due to previous errors", job),
            REMOVED_AFTER_ERROR_CONFIDENCE,
            idx,
            profile.map(|p| cite(RunSide::A, &p.error_lines)).unwrap_or_default(),
        ));
    }
}

fn date_evidence(index: &RunIndexes<'_>, difference: &Difference) -> Vec<EvidenceRef> {
    let Some((kind, id)) = subject_of(difference) else {
        return Vec::new();
    };
    [RunSide::A, RunSide::B]
        .into_iter()
        .filter_map(|run| {
            let (_, line) = index.of(kind, run).get(id)?.date?;
            Some(EvidenceRef { run, line })
        })
        .collect()
}
