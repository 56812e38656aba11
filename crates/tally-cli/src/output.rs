//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use crate::pipeline::ReconciliationReport;
use colored::*;
use serde_json::{json, Value};
use tally_domain::{AccountingSummary, CompanyExtraction, EmailEvidence, MatchCandidate, ParsedLine};
use tally_matcher::LineMatch;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

const TEXT_WIDTH: usize = 48;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format classified lines.
    pub fn format_lines(&self, lines: &[ParsedLine]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(
                &lines.iter().map(line_json).collect::<Vec<_>>(),
            )?),
            OutputFormat::Quiet => Ok(lines
                .iter()
                .filter_map(|l| l.search_text.as_deref())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if lines.is_empty() {
                    return Ok(self.colorize("No lines found.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["#", "Type", "Searched", "Text", "Metadata"]);
                for line in lines {
                    let metadata = line
                        .metadata
                        .iter()
                        .map(|(k, v)| format!("{}={}", k, v))
                        .collect::<Vec<_>>()
                        .join(" ");
                    builder.push_record([
                        line.line_number.to_string(),
                        line.line_type.to_string(),
                        if line.is_searchable() { "yes" } else { "no" }.to_string(),
                        truncate(&line.raw_text, TEXT_WIDTH),
                        metadata,
                    ]);
                }
                Ok(render(builder))
            }
        }
    }

    /// Format per-line match outcomes, keeping the top `persist_top` per line.
    pub fn format_line_matches(&self, matches: &[LineMatch], persist_top: usize) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&line_matches_json(matches, persist_top))?),
            OutputFormat::Quiet => Ok(matches
                .iter()
                .filter_map(|m| m.outcome.best())
                .map(|c| c.external_id.clone())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                let rows: Vec<(&ParsedLine, &MatchCandidate, usize)> = matches
                    .iter()
                    .flat_map(|m| {
                        m.outcome
                            .top(persist_top)
                            .iter()
                            .enumerate()
                            .map(move |(rank, c)| (&m.line, c, rank + 1))
                    })
                    .collect();

                let mut out = String::new();
                if rows.is_empty() {
                    out.push_str(&self.colorize("No qualifying matches.", "yellow"));
                } else {
                    let mut builder = Builder::default();
                    builder.push_record(["Line", "Rank", "ID", "Confidence", "Strategy", "Text"]);
                    for (line, candidate, rank) in rows {
                        builder.push_record([
                            line.line_number.to_string(),
                            rank.to_string(),
                            candidate.external_id.clone(),
                            format!("{:.1}", candidate.confidence_percent),
                            candidate.strategy.to_string(),
                            truncate(&candidate.display_text, TEXT_WIDTH),
                        ]);
                    }
                    out.push_str(&render(builder));
                }

                for m in matches {
                    for report in m.outcome.reports.iter().filter(|r| r.failed()) {
                        out.push('\n');
                        out.push_str(&self.warning(&format!(
                            "line {}: {} failed: {}",
                            m.line.line_number,
                            report.kind,
                            report.error.as_deref().unwrap_or_default()
                        )));
                    }
                }
                Ok(out)
            }
        }
    }

    /// Format a company extraction.
    pub fn format_company(&self, company: Option<&CompanyExtraction>) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&company_json(company))?),
            OutputFormat::Quiet => Ok(company.map(|c| c.name.clone()).unwrap_or_default()),
            OutputFormat::Table => Ok(match company {
                Some(c) => self.success(&format!(
                    "{} (source: {}, confidence {:.0})",
                    c.name,
                    c.source.as_str(),
                    c.confidence_percent
                )),
                None => self.warning("No company name found"),
            }),
        }
    }

    /// Format ranked email evidence.
    pub fn format_evidence(&self, evidence: &[EmailEvidence]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(
                &evidence.iter().map(evidence_json).collect::<Vec<_>>(),
            )?),
            OutputFormat::Quiet => Ok(evidence.iter().map(|e| e.id.clone()).collect::<Vec<_>>().join("\n")),
            OutputFormat::Table => {
                if evidence.is_empty() {
                    return Ok(self.colorize("No email evidence found.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["ID", "Score", "Received", "Sender", "Subject"]);
                for e in evidence {
                    builder.push_record([
                        e.id.clone(),
                        format!("{:.1}", e.relevance_score),
                        e.received_at
                            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_else(|| "-".to_string()),
                        truncate(&e.sender, 32),
                        truncate(&e.subject, TEXT_WIDTH),
                    ]);
                }
                Ok(render(builder))
            }
        }
    }

    /// Format an accounting summary.
    pub fn format_summary(&self, summary: Option<&AccountingSummary>) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&summary_json(summary))?),
            OutputFormat::Quiet => Ok(String::new()),
            OutputFormat::Table => {
                let Some(summary) = summary else {
                    return Ok(self.warning("No summary available"));
                };
                let mut builder = Builder::default();
                builder.push_record(["Field", "Value"]);
                for (label, value) in summary_fields(summary) {
                    builder.push_record([label.to_string(), value.unwrap_or("-").to_string()]);
                }
                Ok(render(builder))
            }
        }
    }

    /// Format a full reconciliation report.
    pub fn format_report(&self, report: &ReconciliationReport, persist_top: usize) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let value = json!({
                    "best_match": report.best_match.as_ref().map(candidate_json),
                    "context": {
                        "date": report.context.date.map(|d| d.to_string()),
                        "amount": report.context.amount,
                    },
                    "lines": line_matches_json(&report.lines, persist_top),
                    "company": company_json(report.company.as_ref()),
                    "evidence_source": report.evidence_source.map(|s| s.as_str()),
                    "evidence": report.evidence.iter().map(evidence_json).collect::<Vec<_>>(),
                    "summary": summary_json(report.summary.as_ref()),
                });
                Ok(serde_json::to_string_pretty(&value)?)
            }
            OutputFormat::Quiet => Ok(match &report.best_match {
                Some(best) => best.external_id.clone(),
                None => report.evidence.iter().map(|e| e.id.clone()).collect::<Vec<_>>().join("\n"),
            }),
            OutputFormat::Table => {
                let mut sections = vec![self.format_line_matches(&report.lines, persist_top)?];
                match &report.best_match {
                    Some(best) => sections.push(self.success(&format!(
                        "Best match: {} ({:.1}%, {})",
                        best.external_id, best.confidence_percent, best.strategy
                    ))),
                    None => {
                        sections.push(self.info("No qualifying match; using fallback evidence"));
                        sections.push(self.format_company(report.company.as_ref())?);
                        if let Some(source) = report.evidence_source {
                            sections.push(self.info(&format!("Email evidence ({})", source)));
                            sections.push(self.format_evidence(&report.evidence)?);
                            sections.push(self.format_summary(report.summary.as_ref())?);
                        }
                    }
                }
                Ok(sections.join("\n"))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn render(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn line_json(line: &ParsedLine) -> Value {
    json!({
        "line_number": line.line_number,
        "line_type": line.line_type.as_str(),
        "raw_text": line.raw_text,
        "search_text": line.search_text,
        "metadata": line.metadata,
    })
}

fn candidate_json(candidate: &MatchCandidate) -> Value {
    json!({
        "external_id": candidate.external_id,
        "display_text": candidate.display_text,
        "confidence_percent": candidate.confidence_percent,
        "strategy": candidate.strategy.as_str(),
        "raw_score": candidate.raw_score,
        "posting_fields": candidate.posting_fields,
    })
}

fn line_matches_json(matches: &[LineMatch], persist_top: usize) -> Vec<Value> {
    matches
        .iter()
        .map(|m| {
            json!({
                "line": line_json(&m.line),
                "candidates": m.outcome.top(persist_top).iter().map(candidate_json).collect::<Vec<_>>(),
                "strategies": m.outcome.reports.iter().map(|r| json!({
                    "strategy": r.kind.as_str(),
                    "hits": r.hits,
                    "error": r.error,
                })).collect::<Vec<_>>(),
            })
        })
        .collect()
}

fn company_json(company: Option<&CompanyExtraction>) -> Value {
    match company {
        Some(c) => json!({
            "name": c.name,
            "source": c.source.as_str(),
            "confidence_percent": c.confidence_percent,
        }),
        None => Value::Null,
    }
}

fn evidence_json(evidence: &EmailEvidence) -> Value {
    json!({
        "id": evidence.id,
        "relevance_score": evidence.relevance_score,
        "similarity": evidence.similarity,
        "subject": evidence.subject,
        "sender": evidence.sender,
        "received_at": evidence.received_at.map(|at| at.to_string()),
        "extracted_amounts": evidence.extracted_amounts,
        "extracted_companies": evidence.extracted_companies,
    })
}

fn summary_fields(summary: &AccountingSummary) -> [(&'static str, Option<&str>); 5] {
    [
        ("Cost Center", summary.cost_center.as_deref()),
        ("Company Code", summary.company_code.as_deref()),
        ("GL Account", summary.gl_account.as_deref()),
        ("Invoice/Reference", summary.invoice.as_deref()),
        ("Notes", summary.notes.as_deref()),
    ]
}

fn summary_json(summary: Option<&AccountingSummary>) -> Value {
    match summary {
        Some(s) => json!({
            "cost_center": s.cost_center,
            "company_code": s.company_code,
            "gl_account": s.gl_account,
            "invoice": s.invoice,
            "notes": s.notes,
        }),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_domain::{CompanySource, StrategyKind};
    use tally_matcher::{LineClassifier, MatchOutcome, StrategyReport};

    fn line_match() -> LineMatch {
        let line = LineClassifier::new().classify("BO:1 BO1:ACME LLC").remove(0);
        LineMatch {
            line,
            outcome: MatchOutcome {
                candidates: vec![MatchCandidate {
                    external_id: "post-17".to_string(),
                    display_text: "BO:1 BO1:ACME LLC".to_string(),
                    confidence_percent: 95.0,
                    strategy: StrategyKind::FuzzyText,
                    posting_fields: [("gl_account".to_string(), "4000".to_string())].into(),
                    raw_score: 1.0,
                }],
                reports: vec![
                    StrategyReport {
                        kind: StrategyKind::FuzzyText,
                        hits: 1,
                        error: None,
                    },
                    StrategyReport {
                        kind: StrategyKind::ExternalEmbedding,
                        hits: 0,
                        error: Some("connection refused".to_string()),
                    },
                ],
            },
        }
    }

    #[test]
    fn test_lines_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let lines = LineClassifier::new().classify("BO:1 BO1:ACME LLC\nTRID:998877");
        let output = formatter.format_lines(&lines).unwrap();
        assert!(output.contains("buyer_order_primary"));
        assert!(output.contains("transaction_id=998877"));
    }

    #[test]
    fn test_lines_quiet_prints_search_text_only() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let lines = LineClassifier::new().classify("BO:1 BO1:ACME LLC\nTRID:998877");
        assert_eq!(formatter.format_lines(&lines).unwrap(), "BO:1 BO1:ACME LLC");
    }

    #[test]
    fn test_matches_table_reports_failed_strategy() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_line_matches(&[line_match()], 3).unwrap();
        assert!(output.contains("post-17"));
        assert!(output.contains("95.0"));
        assert!(output.contains("⚠ line 1: external_embedding failed: connection refused"));
    }

    #[test]
    fn test_matches_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_line_matches(&[line_match()], 3).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["candidates"][0]["external_id"], "post-17");
        assert_eq!(value[0]["candidates"][0]["posting_fields"]["gl_account"], "4000");
        assert_eq!(value[0]["strategies"][1]["error"], "connection refused");
    }

    #[test]
    fn test_company_output() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let company = CompanyExtraction::new("ACME LLC", CompanySource::Pattern);
        assert_eq!(
            formatter.format_company(Some(&company)).unwrap(),
            "✓ ACME LLC (source: pattern, confidence 95)"
        );
        assert_eq!(formatter.format_company(None).unwrap(), "⚠ No company name found");
    }

    #[test]
    fn test_summary_table_marks_absent_fields() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let summary = AccountingSummary {
            gl_account: Some("4000".to_string()),
            ..AccountingSummary::default()
        };
        let output = formatter.format_summary(Some(&summary)).unwrap();
        assert!(output.contains("GL Account"));
        assert!(output.contains("4000"));
    }

    #[test]
    fn test_empty_evidence() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert!(formatter.format_evidence(&[]).unwrap().contains("No email evidence"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
    }
}
