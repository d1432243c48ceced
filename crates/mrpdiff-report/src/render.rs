use crate::options::{ReportFormat, ReportOptions};
use chrono::{Duration, Local, NaiveDateTime};
use mrpdiff_analysis::{Comparison, Difference, EvidenceRef, Explanation, RunSide, Severity};
use mrpdiff_log::LogDocument;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::fmt::{self, Write};

const UNKNOWN: &str = "Unknown";

pub const NO_DIFFERENCES: &str = "No significant differences found.";

/// Severity markers per output format: (severity, markdown, plain text).
const SEVERITY_ICONS: &[(Severity, &str, &str)] = &[
    (Severity::Critical, "🔴", "[CRITICAL]"),
    (Severity::Warning, "🟡", "[WARNING]"),
    (Severity::Info, "🔵", "[INFO]"),
];

/// Follow-up checklist appended to every report.
const NEXT_CHECKS: &[&str] = &[
    "Review Critical differences first and confirm whether removed jobs were closed, firmed or deleted between runs.",
    "Check job status and the MRP error log for every job that reported an error, timeout or abandonment.",
    "Verify planning parameters (lead time, min/max, safety stock) for parts with shifted dates or changed quantities.",
    "Confirm both runs used the same site and run type (Regeneration vs Net Change).",
    "Compare open demand (sales orders, forecasts) captured between the two run start times.",
];

pub fn severity_icon(format: ReportFormat, severity: Severity) -> &'static str {
    SEVERITY_ICONS
        .iter()
        .find(|(s, _, _)| *s == severity)
        .map(|(_, md, plain)| match format {
            ReportFormat::Markdown => *md,
            ReportFormat::PlainText => *plain,
        })
        .unwrap_or("")
}

/// Renders comparisons as Markdown or plain text. Both formats carry the same sections
/// in the same order; only the markup differs.
pub struct ReportRenderer {
    options: ReportOptions,
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self::new(ReportOptions::default())
    }
}

impl ReportRenderer {
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    /// Renders a report stamped with the current local time.
    pub fn render(&self, comparison: &Comparison, explanations: &[Explanation]) -> String {
        self.render_at(comparison, explanations, Local::now().naive_local())
    }

    /// Renders a report with an explicit generation timestamp.
    pub fn render_at(
        &self,
        comparison: &Comparison,
        explanations: &[Explanation],
        generated_at: NaiveDateTime,
    ) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_report(&mut out, comparison, explanations, generated_at);
        out
    }

    pub fn write_report<W: Write>(
        &self,
        w: &mut W,
        comparison: &Comparison,
        explanations: &[Explanation],
        generated_at: NaiveDateTime,
    ) -> fmt::Result {
        let mut md = Markup {
            w,
            format: self.options.format,
        };

        md.title("MRP Run Comparison Report")?;
        md.line(&format!(
            "Generated: {}",
            generated_at.format("%Y-%m-%d %H:%M:%S")
        ))?;
        md.blank()?;

        self.write_run_summary(&mut md, comparison)?;
        self.write_changes(&mut md, comparison)?;
        let shown = self.write_explanations(&mut md, explanations)?;
        if self.options.include_evidence {
            self.write_evidence(&mut md, comparison, &shown)?;
        }
        write_next_checks(&mut md)
    }

    fn write_run_summary<W: Write>(&self, md: &mut Markup<'_, W>, c: &Comparison) -> fmt::Result {
        md.section("A) RUN SUMMARY")?;
        for (label, doc) in [("Run A", &c.run_a), ("Run B", &c.run_b)] {
            md.subsection(label)?;
            write_run(md, doc)?;
            md.blank()?;
        }
        Ok(())
    }

    fn write_changes<W: Write>(&self, md: &mut Markup<'_, W>, c: &Comparison) -> fmt::Result {
        md.section("B) WHAT CHANGED")?;
        if !c.has_differences() {
            md.line(NO_DIFFERENCES)?;
            return md.blank();
        }

        let s = &c.summary;
        md.bullet(&format!("Total differences: {}", s.total_differences))?;
        md.bullet(&format!("Critical: {}", s.critical))?;
        md.bullet(&format!("Warning: {}", s.warning))?;
        md.bullet(&format!("Info: {}", s.info))?;
        md.blank()?;

        let mut ordered: Vec<&Difference> = c.differences.iter().collect();
        // Stable: equal severities keep discovery order.
        ordered.sort_by_key(|d| Reverse(d.severity));

        let limit = self.options.max_differences_to_show;
        for d in ordered.iter().take(limit) {
            let line = format!(
                "{} {}: {}",
                severity_icon(md.format, d.severity),
                md.strong(&d.difference_type.to_string()),
                d.description
            );
            md.bullet(&line)?;
        }
        if ordered.len() > limit {
            md.line(&format!(
                "... and {} more difference(s) not shown",
                ordered.len() - limit
            ))?;
        }
        md.blank()
    }

    /// Writes section C and returns the explanations it rendered.
    fn write_explanations<'e, W: Write>(
        &self,
        md: &mut Markup<'_, W>,
        explanations: &'e [Explanation],
    ) -> Result<Vec<&'e Explanation>, fmt::Error> {
        md.section("C) MOST LIKELY WHY")?;

        let facts: Vec<&Explanation> = explanations.iter().filter(|e| e.is_fact()).collect();
        let inferences: Vec<&Explanation> = if self.options.include_inferences {
            explanations.iter().filter(|e| !e.is_fact()).collect()
        } else {
            Vec::new()
        };

        if facts.is_empty() && inferences.is_empty() {
            md.line("No explanations could be derived from the differences.")?;
            md.blank()?;
            return Ok(Vec::new());
        }

        if !facts.is_empty() {
            md.subsection("Facts")?;
            for e in &facts {
                md.bullet(&e.text)?;
            }
            md.blank()?;
        }
        if !inferences.is_empty() {
            md.subsection("Inferences")?;
            for e in &inferences {
                md.bullet(&format!(
                    "{} (confidence: {:.0}%)",
                    e.text,
                    e.confidence * 100.0
                ))?;
            }
            md.blank()?;
        }

        Ok(facts.into_iter().chain(inferences).collect())
    }

    fn write_evidence<W: Write>(
        &self,
        md: &mut Markup<'_, W>,
        c: &Comparison,
        shown: &[&Explanation],
    ) -> fmt::Result {
        md.section("D) LOG EVIDENCE")?;

        let mut seen = HashSet::new();
        let refs: Vec<EvidenceRef> = shown
            .iter()
            .flat_map(|e| e.evidence.iter().copied())
            .filter(|r| seen.insert(*r))
            .collect();

        let lines: Vec<String> = refs
            .iter()
            .filter_map(|r| {
                let doc = match r.run {
                    RunSide::A => &c.run_a,
                    RunSide::B => &c.run_b,
                };
                doc.entry_at(r.line)
                    .map(|e| format!("{} line {}: {}", r.run, r.line, e.raw_line))
            })
            .collect();

        if lines.is_empty() {
            md.line("No log lines are linked to the findings.")?;
            return md.blank();
        }

        let limit = self.options.max_evidence_lines;
        md.excerpt(lines.iter().take(limit).map(String::as_str))?;
        if lines.len() > limit {
            md.line(&format!("... {} more line(s) omitted", lines.len() - limit))?;
        }
        md.blank()
    }
}

fn write_run<W: Write>(md: &mut Markup<'_, W>, doc: &LogDocument) -> fmt::Result {
    let time = |t: Option<NaiveDateTime>| {
        t.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| UNKNOWN.to_string())
    };

    md.bullet(&format!("Source: {}", or_unknown(&doc.source_id)))?;
    md.bullet(&format!("Run type: {}", doc.run_type))?;
    md.bullet(&format!("Start: {}", time(doc.start_time)))?;
    md.bullet(&format!("End: {}", time(doc.end_time)))?;
    md.bullet(&format!(
        "Duration: {}",
        doc.duration()
            .map(format_duration)
            .unwrap_or_else(|| UNKNOWN.to_string())
    ))?;
    md.bullet(&format!(
        "Site: {}",
        doc.site.as_deref().map(or_unknown).unwrap_or(UNKNOWN)
    ))?;
    md.bullet(&format!(
        "Entries: {} ({} errors)",
        doc.entries.len(),
        doc.error_count()
    ))?;
    if !doc.parsing_errors.is_empty() {
        md.bullet(&format!("Parse anomalies: {}", doc.parsing_errors.len()))?;
    }
    Ok(())
}

fn write_next_checks<W: Write>(md: &mut Markup<'_, W>) -> fmt::Result {
    md.section("E) NEXT CHECKS")?;
    for check in NEXT_CHECKS {
        md.checkbox(check)?;
    }
    Ok(())
}

fn or_unknown(s: &str) -> &str {
    if s.trim().is_empty() { UNKNOWN } else { s }
}

pub fn format_duration(d: Duration) -> String {
    let secs = d.num_seconds();
    let sign = if secs < 0 { "-" } else { "" };
    let secs = secs.abs();
    format!("{}{}h {:02}m {:02}s", sign, secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Format-specific markup over a writer.
struct Markup<'w, W: Write> {
    w: &'w mut W,
    format: ReportFormat,
}

impl<W: Write> Markup<'_, W> {
    fn title(&mut self, text: &str) -> fmt::Result {
        match self.format {
            ReportFormat::Markdown => writeln!(self.w, "# {}", text),
            ReportFormat::PlainText => {
                let upper = text.to_uppercase();
                writeln!(self.w, "{}", upper)?;
                writeln!(self.w, "{}", "=".repeat(upper.chars().count()))
            }
        }
    }

    fn section(&mut self, text: &str) -> fmt::Result {
        match self.format {
            ReportFormat::Markdown => writeln!(self.w, "## {}", text)?,
            ReportFormat::PlainText => {
                writeln!(self.w, "{}", text)?;
                writeln!(self.w, "{}", "-".repeat(text.chars().count()))?;
            }
        }
        self.blank()
    }

    fn subsection(&mut self, text: &str) -> fmt::Result {
        match self.format {
            ReportFormat::Markdown => writeln!(self.w, "### {}", text),
            ReportFormat::PlainText => writeln!(self.w, "{}:", text),
        }
    }

    fn strong(&self, text: &str) -> String {
        match self.format {
            ReportFormat::Markdown => format!("**{}**", text),
            ReportFormat::PlainText => text.to_string(),
        }
    }

    fn bullet(&mut self, text: &str) -> fmt::Result {
        match self.format {
            ReportFormat::Markdown => writeln!(self.w, "- {}", text),
            ReportFormat::PlainText => writeln!(self.w, "  * {}", text),
        }
    }

    fn checkbox(&mut self, text: &str) -> fmt::Result {
        match self.format {
            ReportFormat::Markdown => writeln!(self.w, "- [ ] {}", text),
            ReportFormat::PlainText => writeln!(self.w, "  [ ] {}", text),
        }
    }

    fn excerpt<'a>(&mut self, lines: impl Iterator<Item = &'a str>) -> fmt::Result {
        match self.format {
            ReportFormat::Markdown => {
                writeln!(self.w, "```text")?;
                for line in lines {
                    writeln!(self.w, "{}", line)?;
                }
                writeln!(self.w, "```")
            }
            ReportFormat::PlainText => {
                for line in lines {
                    writeln!(self.w, "    {}", line)?;
                }
                Ok(())
            }
        }
    }

    fn line(&mut self, text: &str) -> fmt::Result {
        writeln!(self.w, "{}", text)
    }

    fn blank(&mut self) -> fmt::Result {
        writeln!(self.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icon_table() {
        assert_eq!(severity_icon(ReportFormat::Markdown, Severity::Critical), "🔴");
        assert_eq!(severity_icon(ReportFormat::PlainText, Severity::Warning), "[WARNING]");
        assert_eq!(severity_icon(ReportFormat::PlainText, Severity::Info), "[INFO]");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::seconds(5400)), "1h 30m 00s");
        assert_eq!(format_duration(Duration::seconds(-61)), "-0h 01m 01s");
    }

    #[test]
    fn test_or_unknown() {
        assert_eq!(or_unknown("  "), "Unknown");
        assert_eq!(or_unknown("MfgSys"), "MfgSys");
    }
}
