use super::super::Rule;
use crate::document::{Document, Node, Scalar};
use crate::Diagnostic;

/// Keys GitHub accepts at the top level of a workflow file.
const TOP_LEVEL_KEYS: &[&str] = &[
    "name",
    "run-name",
    "on",
    "permissions",
    "env",
    "defaults",
    "concurrency",
    "jobs",
];

/// Validates the workflow against the schema: required keys and value
/// shapes. Collects every violation in one pass; never halts on the
/// first error.
pub struct SchemaRule;

impl Rule for SchemaRule {
    fn name(&self) -> &'static str {
        "syntax-check"
    }

    fn check(&self, doc: &Document, _source: &str) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        let entries = match doc.root.as_mapping() {
            Some(entries) => entries,
            None => return diagnostics,
        };

        for (key, _) in entries {
            if !TOP_LEVEL_KEYS.contains(&key.value.as_str()) {
                diagnostics.push(Diagnostic::warning(
                    key.position,
                    format!("unknown top-level key '{}'", key.value),
                ));
            }
        }

        match doc.root.entry("on") {
            Some((key, value)) => {
                if value.is_empty() {
                    diagnostics.push(Diagnostic::error(
                        key.position,
                        "'on' section is empty; at least one trigger event is required",
                    ));
                }
            }
            None => diagnostics.push(Diagnostic::error(
                doc.root.position,
                "workflow is missing the required 'on' section",
            )),
        }

        match doc.root.entry("jobs") {
            Some((key, value)) => match value.as_mapping() {
                Some(jobs) if jobs.is_empty() => diagnostics.push(Diagnostic::error(
                    key.position,
                    "'jobs' section is empty; at least one job is required",
                )),
                Some(jobs) => {
                    for (job_key, job) in jobs {
                        check_job(job_key, job, &mut diagnostics);
                    }
                }
                None => diagnostics.push(Diagnostic::error(
                    key.position,
                    "'jobs' must be a mapping of job definitions",
                )),
            },
            None => diagnostics.push(Diagnostic::error(
                doc.root.position,
                "workflow is missing the required 'jobs' section",
            )),
        }

        diagnostics
    }
}

fn check_job(name: &Scalar, job: &Node, diagnostics: &mut Vec<Diagnostic>) {
    if job.as_mapping().is_none() {
        diagnostics.push(Diagnostic::error(
            name.position,
            format!("job '{}' must be a mapping", name.value),
        ));
        return;
    }

    if job.has("uses") {
        // Reusable workflow call; the runner and steps come from the
        // called workflow.
        if job.has("steps") {
            diagnostics.push(Diagnostic::error(
                name.position,
                format!(
                    "job '{}' calls a reusable workflow and cannot define 'steps'",
                    name.value
                ),
            ));
        }
        return;
    }

    match job.entry("runs-on") {
        None => diagnostics.push(Diagnostic::error(
            name.position,
            format!("job '{}' is missing the required 'runs-on' key", name.value),
        )),
        Some((_, value)) if value.is_empty() => diagnostics.push(Diagnostic::error(
            value.position,
            format!("job '{}' has an empty 'runs-on' value", name.value),
        )),
        Some(_) => {}
    }

    match job.entry("steps") {
        None => diagnostics.push(Diagnostic::error(
            name.position,
            format!("job '{}' has no 'steps'", name.value),
        )),
        Some((key, value)) => match value.as_sequence() {
            Some(steps) if steps.is_empty() => diagnostics.push(Diagnostic::error(
                key.position,
                format!("job '{}' has an empty 'steps' sequence", name.value),
            )),
            Some(steps) => {
                for step in steps {
                    check_step(&name.value, step, diagnostics);
                }
            }
            None => diagnostics.push(Diagnostic::error(
                key.position,
                format!("'steps' of job '{}' must be a sequence", name.value),
            )),
        },
    }
}

fn check_step(job_name: &str, step: &Node, diagnostics: &mut Vec<Diagnostic>) {
    if step.as_mapping().is_none() {
        diagnostics.push(Diagnostic::error(
            step.position,
            format!("step of job '{}' must be a mapping", job_name),
        ));
        return;
    }

    let has_run = step.has("run");
    let has_uses = step.has("uses");

    if has_run && has_uses {
        diagnostics.push(Diagnostic::error(
            step.position,
            format!(
                "step of job '{}' cannot have both 'run' and 'uses'",
                job_name
            ),
        ));
    } else if !has_run && !has_uses {
        diagnostics.push(Diagnostic::error(
            step.position,
            format!(
                "step of job '{}' must have either 'run' or 'uses'",
                job_name
            ),
        ));
    }
}
