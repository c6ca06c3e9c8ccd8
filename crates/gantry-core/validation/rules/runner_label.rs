use super::super::utils;
use super::super::Rule;
use crate::document::{Document, Node, NodeKind};
use crate::{Diagnostic, Position};

/// Labels of GitHub-hosted runners.
const GITHUB_HOSTED: &[&str] = &[
    "ubuntu-latest",
    "ubuntu-24.04",
    "ubuntu-22.04",
    "ubuntu-20.04",
    "windows-latest",
    "windows-2025",
    "windows-2022",
    "windows-2019",
    "macos-latest",
    "macos-15",
    "macos-14",
    "macos-13",
];

/// Labels commonly combined with `self-hosted` in a label array.
const SELF_HOSTED_MODIFIERS: &[&str] = &[
    "self-hosted",
    "linux",
    "windows",
    "macos",
    "x64",
    "arm",
    "arm64",
    "gpu",
];

/// Validates `runs-on` labels against the GitHub-hosted set, the
/// standard self-hosted modifiers, and the labels registered in the
/// configuration.
pub struct RunnerLabelRule {
    extra_labels: Vec<String>,
}

impl RunnerLabelRule {
    pub fn new(extra_labels: Vec<String>) -> Self {
        Self { extra_labels }
    }

    fn is_known(&self, label: &str) -> bool {
        GITHUB_HOSTED.contains(&label)
            || SELF_HOSTED_MODIFIERS.contains(&label)
            || self.extra_labels.iter().any(|extra| extra == label)
    }

    fn check_label(
        &self,
        label: &str,
        position: Position,
        job_name: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let label = label.trim();

        // Expressions and empty labels are out of scope here; the schema
        // rule reports empty values.
        if label.is_empty() || label.contains("${{") {
            return;
        }

        if !self.is_known(label) {
            diagnostics.push(Diagnostic::warning(
                position,
                format!(
                    "job '{}' uses unknown runner label '{}'; register it under 'self-hosted-runner.labels' in .gantry.yml if it is a self-hosted runner",
                    job_name, label
                ),
            ));
        }
    }

    fn check_runs_on(&self, job_name: &str, runs_on: &Node, diagnostics: &mut Vec<Diagnostic>) {
        match &runs_on.kind {
            NodeKind::Scalar(label) => {
                self.check_label(label, runs_on.position, job_name, diagnostics)
            }
            NodeKind::Sequence(items) => {
                for item in items {
                    if let Some(label) = item.as_str() {
                        self.check_label(label, item.position, job_name, diagnostics);
                    }
                }
            }
            NodeKind::Mapping(_) => {
                // `runs-on: { group: ..., labels: ... }` form. Group names
                // are org-defined and not validated.
                if let Some(labels) = runs_on.get("labels") {
                    match &labels.kind {
                        NodeKind::Scalar(label) => {
                            self.check_label(label, labels.position, job_name, diagnostics)
                        }
                        NodeKind::Sequence(items) => {
                            for item in items {
                                if let Some(label) = item.as_str() {
                                    self.check_label(label, item.position, job_name, diagnostics);
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            NodeKind::Null => {}
        }
    }
}

impl Rule for RunnerLabelRule {
    fn name(&self) -> &'static str {
        "runner-label"
    }

    fn check(&self, doc: &Document, _source: &str) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for (job_key, job) in utils::jobs(doc) {
            if let Some(runs_on) = job.get("runs-on") {
                self.check_runs_on(&job_key.value, runs_on, &mut diagnostics);
            }
        }

        diagnostics
    }
}
