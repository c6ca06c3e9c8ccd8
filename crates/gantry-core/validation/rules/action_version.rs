use super::super::utils;
use super::super::Rule;
use crate::document::{Document, Node};
use crate::Diagnostic;

/// Validates `uses:` references: format (`owner/repo@ref`) and version
/// pinning. Refs that are neither a full-length commit SHA nor a version
/// tag are mutable and flagged.
pub struct ActionVersionRule;

impl Rule for ActionVersionRule {
    fn name(&self) -> &'static str {
        "action-version"
    }

    fn check(&self, doc: &Document, _source: &str) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for (_, job) in utils::jobs(doc) {
            // Job-level `uses:` calls a reusable workflow and follows the
            // same pinning rules.
            if let Some(node) = job.get("uses") {
                check_reference(node, &mut diagnostics);
            }
            for step in utils::steps(job) {
                if let Some(node) = step.get("uses") {
                    check_reference(node, &mut diagnostics);
                }
            }
        }

        diagnostics
    }
}

fn check_reference(node: &Node, diagnostics: &mut Vec<Diagnostic>) {
    let reference = match node.as_str() {
        Some(value) => value.trim(),
        None => return,
    };

    // Local paths and docker images are not pinned by git ref.
    if reference.starts_with("./")
        || reference.starts_with("../")
        || reference.starts_with("docker://")
    {
        return;
    }

    // Dynamic references are resolved at run time.
    if reference.contains("${{") {
        return;
    }

    let (repository, git_ref) = match reference.rsplit_once('@') {
        Some(parts) => parts,
        None => {
            diagnostics.push(Diagnostic::error(
                node.position,
                format!(
                    "action reference '{}' is missing '@ref'; remote actions must be pinned (e.g. owner/repo@v1)",
                    reference
                ),
            ));
            return;
        }
    };

    let mut segments = repository.splitn(3, '/');
    let owner = segments.next().unwrap_or("");
    let repo = segments.next().unwrap_or("");

    if owner.is_empty() || owner.contains(char::is_whitespace) || repo.is_empty() {
        diagnostics.push(Diagnostic::error(
            node.position,
            format!(
                "action reference '{}' is malformed; expected owner/repo@ref",
                reference
            ),
        ));
        return;
    }

    if git_ref.is_empty() {
        diagnostics.push(Diagnostic::error(
            node.position,
            format!("action reference '{}' has an empty ref", reference),
        ));
        return;
    }

    if is_commit_sha(git_ref) || is_version_tag(git_ref) {
        return;
    }

    diagnostics.push(Diagnostic::warning(
        node.position,
        format!(
            "action reference '{}' is pinned to mutable ref '{}'; pin to a release tag or a full-length commit SHA",
            reference, git_ref
        ),
    ));
}

fn is_commit_sha(git_ref: &str) -> bool {
    git_ref.len() == 40 && git_ref.chars().all(|c| c.is_ascii_hexdigit())
}

/// Accepts `v1`, `4.2.2`, `v1.2.3-rc.1` and the like. Purely numeric
/// dotted versions only; a digit-leading short commit hash does not
/// qualify.
fn is_version_tag(git_ref: &str) -> bool {
    let rest = git_ref.strip_prefix('v').unwrap_or(git_ref);
    let version = match rest.find(|c| c == '-' || c == '+') {
        Some(i) => &rest[..i],
        None => rest,
    };

    !version.is_empty()
        && version
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}
