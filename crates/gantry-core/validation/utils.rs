//! Helpers shared by validation rules.

use crate::document::{Document, Node, Scalar};

/// Check if a document looks like a GitHub Actions workflow by examining
/// its top-level keys (`on`, `jobs`, or `name`).
pub(crate) fn is_workflow(doc: &Document) -> bool {
    doc.root
        .as_mapping()
        .map(|entries| {
            entries
                .iter()
                .any(|(key, _)| matches!(key.value.as_str(), "on" | "jobs" | "name"))
        })
        .unwrap_or(false)
}

/// Job entries of the workflow, empty when `jobs` is missing or malformed.
pub(crate) fn jobs(doc: &Document) -> &[(Scalar, Node)] {
    doc.root
        .get("jobs")
        .and_then(Node::as_mapping)
        .unwrap_or(&[])
}

/// Steps of a job, empty when `steps` is missing or malformed.
pub(crate) fn steps(job: &Node) -> &[Node] {
    job.get("steps").and_then(Node::as_sequence).unwrap_or(&[])
}
