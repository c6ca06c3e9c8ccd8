//! Diagnostic aggregation and rendering.
//!
//! Per-file results are concatenated, sorted by path, and rendered to a
//! tool-agnostic stream: one diagnostic per line in the
//! `path:line:col: message [rule]` format, or JSON for machine consumers.

use crate::{Diagnostic, Severity};
use serde_json::json;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Diagnostics for a single file. Within a file, diagnostics are sorted
/// ascending by (line, column) by the engine.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
}

/// Render reports as the plain diagnostic stream.
pub fn render_text(reports: &[FileReport]) -> String {
    let mut out = String::new();
    for report in sorted(reports) {
        for d in &report.diagnostics {
            let _ = writeln!(
                out,
                "{}:{}:{}: {} [{}]",
                report.path.display(),
                d.line,
                d.column,
                d.message,
                d.rule
            );
        }
    }
    out
}

/// Render reports as a JSON array of diagnostic objects.
pub fn render_json(reports: &[FileReport]) -> String {
    let entries: Vec<_> = sorted(reports)
        .into_iter()
        .flat_map(|report| {
            report.diagnostics.iter().map(|d| {
                json!({
                    "path": report.path.display().to_string(),
                    "line": d.line,
                    "column": d.column,
                    "rule": d.rule,
                    "severity": d.severity.to_string(),
                    "message": d.message,
                })
            })
        })
        .collect();

    serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string())
}

/// True if any report carries an error-severity diagnostic; drives the
/// process exit status.
pub fn has_errors(reports: &[FileReport]) -> bool {
    reports
        .iter()
        .flat_map(|r| &r.diagnostics)
        .any(|d| d.severity == Severity::Error)
}

fn sorted(reports: &[FileReport]) -> Vec<&FileReport> {
    let mut sorted: Vec<&FileReport> = reports.iter().collect();
    sorted.sort_by(|a, b| a.path.cmp(&b.path));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Position;

    fn report(path: &str, diagnostics: Vec<Diagnostic>) -> FileReport {
        FileReport {
            path: PathBuf::from(path),
            diagnostics,
        }
    }

    fn diagnostic(line: usize, rule: &str, severity: Severity, message: &str) -> Diagnostic {
        let mut d = match severity {
            Severity::Error => Diagnostic::error(Position { line, column: 3 }, message),
            Severity::Warning => Diagnostic::warning(Position { line, column: 3 }, message),
            Severity::Info => Diagnostic::info(Position { line, column: 3 }, message),
        };
        d.rule = rule.to_string();
        d
    }

    #[test]
    fn text_format_is_one_line_per_diagnostic() {
        let reports = vec![report(
            ".github/workflows/ci.yml",
            vec![diagnostic(
                4,
                "syntax-check",
                Severity::Error,
                "job 'build' is missing the required 'runs-on' key",
            )],
        )];

        assert_eq!(
            render_text(&reports),
            ".github/workflows/ci.yml:4:3: job 'build' is missing the required 'runs-on' key [syntax-check]\n"
        );
    }

    #[test]
    fn reports_are_sorted_by_path() {
        let reports = vec![
            report("b.yml", vec![diagnostic(1, "r", Severity::Warning, "two")]),
            report("a.yml", vec![diagnostic(1, "r", Severity::Warning, "one")]),
        ];

        let text = render_text(&reports);
        let a = text.find("a.yml").expect("a.yml missing");
        let b = text.find("b.yml").expect("b.yml missing");
        assert!(a < b);
    }

    #[test]
    fn has_errors_ignores_warnings() {
        let reports = vec![report(
            "a.yml",
            vec![diagnostic(1, "r", Severity::Warning, "w")],
        )];
        assert!(!has_errors(&reports));

        let reports = vec![report("a.yml", vec![diagnostic(1, "r", Severity::Error, "e")])];
        assert!(has_errors(&reports));
    }

    #[test]
    fn json_format_includes_severity() {
        let reports = vec![report(
            "a.yml",
            vec![diagnostic(2, "expression", Severity::Warning, "oops")],
        )];

        let text = render_json(&reports);
        assert!(text.contains("\"severity\": \"warning\""));
        assert!(text.contains("\"rule\": \"expression\""));
        assert!(text.contains("\"line\": 2"));
    }
}
