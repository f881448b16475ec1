//! Reporters. Each one is a pure function of the run outcome.

use crate::core::catalog::{self, Severity};
use crate::core::diagnostic::Diagnostic;
use crate::core::engine::RunOutcome;
use crate::core::error::SddError;
use crate::core::output;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Markdown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

impl Counts {
    pub fn of(diagnostics: &[Diagnostic]) -> Self {
        let mut counts = Counts::default();
        for d in diagnostics {
            match d.severity {
                Severity::Error => counts.errors += 1,
                Severity::Warning => counts.warnings += 1,
                Severity::Info => counts.info += 1,
            }
        }
        counts
    }
}

pub fn render(outcome: &RunOutcome, format: ReportFormat, color: bool) -> Result<String, SddError> {
    match format {
        ReportFormat::Text => Ok(text(outcome, color)),
        ReportFormat::Json => json(&outcome.diagnostics),
        ReportFormat::Markdown => Ok(markdown(outcome)),
    }
}

fn paint(diag: &Diagnostic, color: bool) -> String {
    use colored::Colorize;

    let line = catalog::format_line(diag);
    if !color {
        return line;
    }
    let tag = format!("[{}]", diag.severity.word());
    let painted = match diag.severity {
        Severity::Error => tag.red().bold(),
        Severity::Warning => tag.yellow().bold(),
        Severity::Info => tag.cyan(),
    };
    line.replacen(&tag, &painted.to_string(), 1)
}

pub fn text(outcome: &RunOutcome, color: bool) -> String {
    use colored::Colorize;

    let mut out = String::new();
    for diag in &outcome.diagnostics {
        let _ = writeln!(out, "{}", paint(diag, color));
    }
    for score in outcome.scores.iter().filter(|s| s.score < 1.0) {
        let failed: Vec<&str> = score.failed_gates().iter().map(|g| g.label()).collect();
        let _ = writeln!(
            out,
            "score: {} {:.2} (failed: {})",
            score.path.display(),
            score.score,
            failed.join(", ")
        );
    }

    let counts = Counts::of(&outcome.diagnostics);
    let summary = format!(
        "sddlint: summary files={} errors={} warnings={} info={} fixed={}",
        outcome.files_checked, counts.errors, counts.warnings, counts.info, outcome.fixes_applied
    );
    let summary = match (color, counts.errors, counts.warnings) {
        (false, _, _) => summary,
        (true, 0, 0) => summary.green().to_string(),
        (true, 0, _) => summary.yellow().to_string(),
        (true, _, _) => summary.red().to_string(),
    };
    let _ = writeln!(out, "{}", summary);

    let errors: Vec<String> = outcome
        .diagnostics
        .iter()
        .filter(|d| d.is_error())
        .map(|d| format!("{} {}", d.code, d.message))
        .collect();
    if !errors.is_empty() {
        let _ = writeln!(
            out,
            "sddlint: errors: {}",
            output::preview_messages(&errors, 2, 110)
        );
    }
    out
}

/// One pretty-printed array of diagnostic records.
pub fn json(diagnostics: &[Diagnostic]) -> Result<String, SddError> {
    let mut rendered = serde_json::to_string_pretty(diagnostics)?;
    rendered.push('\n');
    Ok(rendered)
}

fn location(line: Option<usize>) -> String {
    line.map(|l| l.to_string()).unwrap_or_else(|| "-".to_string())
}

pub fn markdown(outcome: &RunOutcome) -> String {
    let counts = Counts::of(&outcome.diagnostics);
    let mut out = String::from("# sddlint report\n\n");
    let _ = writeln!(
        out,
        "- Files checked: {}\n- Errors: {}\n- Warnings: {}\n- Info: {}\n- Fixes applied: {}\n",
        outcome.files_checked, counts.errors, counts.warnings, counts.info, outcome.fixes_applied
    );

    let low: Vec<_> = outcome.scores.iter().filter(|s| s.score < 1.0).collect();
    if !low.is_empty() {
        out.push_str("## Scores\n\n| Artifact | Score | Failed gates |\n|---|---|---|\n");
        for score in low {
            let failed: Vec<&str> = score.failed_gates().iter().map(|g| g.label()).collect();
            let _ = writeln!(
                out,
                "| {} | {:.2} | {} |",
                score.id.canonical(),
                score.score,
                failed.join(", ")
            );
        }
        out.push('\n');
    }

    if outcome.diagnostics.is_empty() {
        out.push_str("No findings.\n");
        return out;
    }

    let mut by_file: BTreeMap<&Path, Vec<&Diagnostic>> = BTreeMap::new();
    for diag in &outcome.diagnostics {
        by_file.entry(diag.path.as_path()).or_default().push(diag);
    }
    for (path, diags) in by_file {
        let _ = writeln!(out, "## `{}`\n", path.display());
        out.push_str("| Severity | Code | Line | Message |\n|---|---|---|---|\n");
        for diag in diags {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} |",
                diag.severity.word(),
                diag.code,
                location(diag.line),
                output::table_cell(&diag.message, 160)
            );
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::ArtifactId;
    use crate::core::scoring;
    use std::path::PathBuf;

    fn outcome() -> RunOutcome {
        let a = PathBuf::from("docs/BRD-01_goals.md");
        let b = PathBuf::from("docs/PRD-01_app.md");
        let diagnostics = vec![
            Diagnostic::new(
                "FWDREF-E001",
                &a,
                Some(6),
                &[
                    ("source", "BRD-01".to_string()),
                    ("source_layer", "1".to_string()),
                    ("target", "ADR-05".to_string()),
                    ("target_layer", "5".to_string()),
                ],
            ),
            Diagnostic::new(
                "TERM-W001",
                &b,
                Some(3),
                &[("term", "whitelist".to_string()), ("canonical", "allowlist".to_string())],
            ),
        ];
        let scores = scoring::score_all(
            [
                (a.as_path(), ArtifactId::parse("BRD-01").expect("id")),
                (b.as_path(), ArtifactId::parse("PRD-01").expect("id")),
            ]
            .into_iter(),
            &diagnostics,
        );
        RunOutcome {
            diagnostics,
            scores,
            files_checked: 2,
            fixes_applied: 0,
            exit_code: 2,
        }
    }

    #[test]
    fn text_lists_findings_scores_and_summary() {
        let rendered = text(&outcome(), false);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(
            lines[0],
            "[ERROR] FWDREF-E001: docs/BRD-01_goals.md:6: BRD-01 (layer 1) references ADR-05 (layer 5), which does not exist"
        );
        assert!(lines[1].starts_with("[WARNING] TERM-W001: docs/PRD-01_app.md:3:"));
        assert_eq!(lines[2], "score: docs/BRD-01_goals.md 0.80 (failed: traceability)");
        assert_eq!(lines[3], "score: docs/PRD-01_app.md 0.80 (failed: hygiene)");
        assert_eq!(
            lines[4],
            "sddlint: summary files=2 errors=1 warnings=1 info=0 fixed=0"
        );
        assert!(lines[5].starts_with("sddlint: errors: FWDREF-E001"));
    }

    #[test]
    fn json_is_an_array_of_records() {
        let rendered = json(&outcome().diagnostics).expect("json");
        let parsed: serde_json::Value = serde_json::from_str(&rendered).expect("parse");
        let items = parsed.as_array().expect("array");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["code"], "FWDREF-E001");
        assert_eq!(items[0]["severity"], "error");
        assert_eq!(items[0]["line"], 6);
        assert!(items[0].get("fix").is_none());
    }

    #[test]
    fn markdown_groups_by_file() {
        let rendered = markdown(&outcome());
        assert!(rendered.starts_with("# sddlint report\n"));
        assert!(rendered.contains("- Errors: 1\n"));
        assert!(rendered.contains("| BRD-01 | 0.80 | traceability |"));
        assert!(rendered.contains("## `docs/BRD-01_goals.md`"));
        assert!(rendered.contains("| WARNING | TERM-W001 | 3 |"));
    }

    #[test]
    fn empty_outcome_renders_cleanly() {
        let empty = RunOutcome {
            diagnostics: Vec::new(),
            scores: Vec::new(),
            files_checked: 0,
            fixes_applied: 0,
            exit_code: 0,
        };
        assert_eq!(
            text(&empty, false),
            "sddlint: summary files=0 errors=0 warnings=0 info=0 fixed=0\n"
        );
        assert_eq!(json(&empty.diagnostics).expect("json"), "[]\n");
        assert!(markdown(&empty).ends_with("No findings.\n"));
    }
}
