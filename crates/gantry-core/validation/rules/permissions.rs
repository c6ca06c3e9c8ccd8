use super::super::utils;
use super::super::Rule;
use crate::document::{Document, Node, NodeKind};
use crate::Diagnostic;

/// Permission scopes GitHub accepts in a `permissions:` mapping.
const SCOPES: &[&str] = &[
    "actions",
    "attestations",
    "checks",
    "contents",
    "deployments",
    "discussions",
    "id-token",
    "issues",
    "packages",
    "pages",
    "pull-requests",
    "repository-projects",
    "security-events",
    "statuses",
];

const VALUES: &[&str] = &["read", "write", "none"];

/// Validates `permissions:` blocks at the workflow and job level: scope
/// names, access values, and blanket `write-all` grants. A missing
/// `permissions:` block is not flagged.
pub struct PermissionsRule;

impl Rule for PermissionsRule {
    fn name(&self) -> &'static str {
        "permissions"
    }

    fn check(&self, doc: &Document, _source: &str) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        if let Some(node) = doc.root.get("permissions") {
            check_permissions(node, &mut diagnostics);
        }
        for (_, job) in utils::jobs(doc) {
            if let Some(node) = job.get("permissions") {
                check_permissions(node, &mut diagnostics);
            }
        }

        diagnostics
    }
}

fn check_permissions(node: &Node, diagnostics: &mut Vec<Diagnostic>) {
    match &node.kind {
        NodeKind::Scalar(value) => match value.as_str() {
            "write-all" => diagnostics.push(Diagnostic::warning(
                node.position,
                "'write-all' grants write access to every scope; enumerate the scopes the workflow needs",
            )),
            "read-all" | "none" => {}
            other => diagnostics.push(Diagnostic::error(
                node.position,
                format!(
                    "invalid permissions value '{}' (expected 'read-all', 'write-all', or 'none')",
                    other
                ),
            )),
        },
        NodeKind::Mapping(entries) => {
            for (scope, value) in entries {
                if !SCOPES.contains(&scope.value.as_str()) {
                    diagnostics.push(Diagnostic::error(
                        scope.position,
                        format!("unknown permission scope '{}'", scope.value),
                    ));
                }
                match value.as_str() {
                    Some(access) if VALUES.contains(&access) => {}
                    Some(access) => diagnostics.push(Diagnostic::error(
                        value.position,
                        format!(
                            "invalid permission value '{}' for scope '{}' (expected 'read', 'write', or 'none')",
                            access, scope.value
                        ),
                    )),
                    None => diagnostics.push(Diagnostic::error(
                        value.position,
                        format!("permission scope '{}' must have a scalar value", scope.value),
                    )),
                }
            }
        }
        // A bare `permissions:` key revokes everything, which is valid.
        NodeKind::Null => {}
        NodeKind::Sequence(_) => diagnostics.push(Diagnostic::error(
            node.position,
            "'permissions' must be a mapping or an access level string",
        )),
    }
}
