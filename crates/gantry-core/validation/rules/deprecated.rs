use super::super::utils;
use super::super::Rule;
use crate::document::{Document, Node};
use crate::Diagnostic;

/// Deprecated workflow commands and their replacements.
const DEPRECATED_COMMANDS: &[(&str, &str)] = &[
    (
        "::set-output",
        "use `echo \"name=value\" >> $GITHUB_OUTPUT` instead",
    ),
    (
        "::save-state",
        "use `echo \"name=value\" >> $GITHUB_STATE` instead",
    ),
    (
        "::set-env",
        "use `echo \"name=value\" >> $GITHUB_ENV` instead",
    ),
    ("::add-path", "use `echo \"path\" >> $GITHUB_PATH` instead"),
];

/// Archived first-party actions and their replacements.
const ARCHIVED_ACTIONS: &[(&str, &str)] = &[
    (
        "actions/create-release",
        "the action is archived; use softprops/action-gh-release or `gh release create`",
    ),
    (
        "actions/upload-release-asset",
        "the action is archived; use softprops/action-gh-release or `gh release upload`",
    ),
    ("actions/setup-ruby", "use ruby/setup-ruby instead"),
];

/// Detects deprecated workflow commands in `run:` scripts and archived
/// actions in `uses:` references.
pub struct DeprecatedRule;

impl Rule for DeprecatedRule {
    fn name(&self) -> &'static str {
        "deprecated"
    }

    fn check(&self, doc: &Document, source: &str) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for (_, job) in utils::jobs(doc) {
            for step in utils::steps(job) {
                if let Some(run) = step.get("run") {
                    check_run_script(run, doc, source, &mut diagnostics);
                }
                if let Some(uses) = step.get("uses") {
                    check_uses(uses, &mut diagnostics);
                }
            }
        }

        diagnostics
    }
}

fn check_run_script(run: &Node, doc: &Document, source: &str, diagnostics: &mut Vec<Diagnostic>) {
    // Scan the raw slice so the reported position points at the command
    // itself, even in a multi-line script.
    let raw = &source[run.span.start..run.span.end];

    for (command, replacement) in DEPRECATED_COMMANDS {
        if let Some(offset) = raw.find(command) {
            diagnostics.push(Diagnostic::warning(
                doc.position_of(run.span.start + offset),
                format!(
                    "deprecated workflow command '{}'; {}",
                    command, replacement
                ),
            ));
        }
    }
}

fn check_uses(uses: &Node, diagnostics: &mut Vec<Diagnostic>) {
    let reference = match uses.as_str() {
        Some(value) => value.trim(),
        None => return,
    };
    let repository = reference.split('@').next().unwrap_or(reference);

    for (action, replacement) in ARCHIVED_ACTIONS {
        if repository == *action {
            diagnostics.push(Diagnostic::warning(
                uses.position,
                format!("action '{}' is deprecated; {}", repository, replacement),
            ));
        }
    }
}
