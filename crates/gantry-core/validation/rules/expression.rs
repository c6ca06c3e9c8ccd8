use super::super::Rule;
use crate::document::{Document, Node, NodeKind};
use crate::expr::{self, Expr};
use crate::Diagnostic;

/// Context roots the runner provides to expressions.
const CONTEXTS: &[&str] = &[
    "github", "env", "vars", "job", "jobs", "steps", "runner", "secrets", "strategy", "matrix",
    "needs", "inputs",
];

/// Built-in expression functions, compared case-insensitively.
const FUNCTIONS: &[&str] = &[
    "contains",
    "startswith",
    "endswith",
    "format",
    "join",
    "tojson",
    "fromjson",
    "hashfiles",
    "success",
    "always",
    "cancelled",
    "failure",
];

/// GitHub event properties that can be controlled by external users and
/// are therefore untrusted. Interpolating these directly into a `run:`
/// script is a shell injection vector.
const UNTRUSTED_INPUTS: &[&str] = &[
    "github.event.issue.title",
    "github.event.issue.body",
    "github.event.pull_request.title",
    "github.event.pull_request.body",
    "github.event.pull_request.head.ref",
    "github.event.pull_request.head.label",
    "github.event.comment.body",
    "github.event.review.body",
    "github.event.review_comment.body",
    "github.event.discussion.title",
    "github.event.discussion.body",
    "github.event.pages.*.page_name",
    "github.event.commits.*.message",
    "github.event.commits.*.author.name",
    "github.event.commits.*.author.email",
    "github.event.head_commit.message",
    "github.event.head_commit.author.name",
    "github.event.head_commit.author.email",
    "github.head_ref",
];

/// Checks every `${{ ... }}` span embedded in scalar values: balanced
/// braces, expression grammar, known contexts and functions, configured
/// `vars.*` names, and untrusted interpolations in shell contexts.
pub struct ExpressionRule {
    config_variables: Option<Vec<String>>,
}

impl ExpressionRule {
    pub fn new(config_variables: Option<Vec<String>>) -> Self {
        Self { config_variables }
    }
}

impl Rule for ExpressionRule {
    fn name(&self) -> &'static str {
        "expression"
    }

    fn check(&self, doc: &Document, source: &str) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        self.scan_node(&doc.root, false, doc, source, &mut diagnostics);
        diagnostics
    }
}

impl ExpressionRule {
    fn scan_node(
        &self,
        node: &Node,
        in_run: bool,
        doc: &Document,
        source: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        match &node.kind {
            NodeKind::Mapping(entries) => {
                for (key, value) in entries {
                    self.scan_node(value, key.value == "run", doc, source, diagnostics);
                }
            }
            NodeKind::Sequence(items) => {
                for item in items {
                    self.scan_node(item, false, doc, source, diagnostics);
                }
            }
            NodeKind::Scalar(_) => self.scan_scalar(node, in_run, doc, source, diagnostics),
            NodeKind::Null => {}
        }
    }

    /// Scan the raw source slice of a scalar, so byte offsets map back to
    /// real positions even inside multi-line block scalars.
    fn scan_scalar(
        &self,
        node: &Node,
        in_run: bool,
        doc: &Document,
        source: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let raw = &source[node.span.start..node.span.end];
        let mut cursor = 0;

        while let Some(found) = raw[cursor..].find("${{") {
            let open = cursor + found;
            let inner_start = open + 3;

            let close = match raw[inner_start..].find("}}") {
                Some(offset) => inner_start + offset,
                None => {
                    diagnostics.push(Diagnostic::error(
                        doc.position_of(node.span.start + open),
                        "unclosed '${{' expression",
                    ));
                    return;
                }
            };

            let inner = &raw[inner_start..close];
            let position = doc.position_of(node.span.start + open);

            if inner.trim().is_empty() {
                diagnostics.push(Diagnostic::error(position, "empty expression"));
                cursor = close + 2;
                continue;
            }

            match expr::parse(inner) {
                Ok(ast) => {
                    self.check_ast(&ast, in_run, position, diagnostics);
                }
                Err(err) => {
                    diagnostics.push(Diagnostic::error(
                        doc.position_of(node.span.start + inner_start + err.offset),
                        format!("invalid expression: {}", err.message),
                    ));
                }
            }

            cursor = close + 2;
        }
    }

    fn check_ast(
        &self,
        ast: &Expr,
        in_run: bool,
        position: crate::Position,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        ast.walk(&mut |node| {
            if let Expr::Call { function, .. } = node {
                let lower = function.to_lowercase();
                if !FUNCTIONS.contains(&lower.as_str()) {
                    diagnostics.push(Diagnostic::warning(
                        position,
                        format!("unknown function '{}' in expression", function),
                    ));
                }
            }
        });

        let mut paths = Vec::new();
        collect_paths(ast, &mut paths);

        for path in &paths {
            let root = path.split('.').next().unwrap_or(path);
            if !CONTEXTS.contains(&root) {
                diagnostics.push(Diagnostic::warning(
                    position,
                    format!("unknown context '{}' in expression", root),
                ));
                continue;
            }

            if let Some(variables) = &self.config_variables {
                if let Some(name) = path.strip_prefix("vars.") {
                    let name = name.split('.').next().unwrap_or(name);
                    if !variables.iter().any(|v| v.eq_ignore_ascii_case(name)) {
                        diagnostics.push(Diagnostic::warning(
                            position,
                            format!(
                                "configuration variable '{}' is not listed in 'config-variables'",
                                name
                            ),
                        ));
                    }
                }
            }

            if in_run && is_untrusted(path) {
                diagnostics.push(Diagnostic::warning(
                    position,
                    format!(
                        "'{}' is untrusted input; interpolating it into a shell script enables injection, pass it via an environment variable instead",
                        path
                    ),
                ));
            }
        }
    }
}

/// Collect the dotted context paths referenced by an expression. Access
/// chains contribute one path each; arguments of calls and bracket index
/// expressions are searched recursively.
fn collect_paths(expr: &Expr, out: &mut Vec<String>) {
    match expr {
        Expr::Ident(name) => out.push(name.clone()),
        Expr::Member { object, .. } | Expr::Index { object, .. } => {
            if let Some(path) = expr.path() {
                out.push(path);
                if let Expr::Index { index, .. } = expr {
                    collect_paths(index, out);
                }
            } else {
                collect_paths(object, out);
                if let Expr::Index { index, .. } = expr {
                    collect_paths(index, out);
                }
            }
        }
        Expr::Call { args, .. } => {
            for arg in args {
                collect_paths(arg, out);
            }
        }
        Expr::Not(inner) => collect_paths(inner, out),
        Expr::Binary { lhs, rhs, .. } => {
            collect_paths(lhs, out);
            collect_paths(rhs, out);
        }
        Expr::Null | Expr::Bool(_) | Expr::Number(_) | Expr::Str(_) => {}
    }
}

fn is_untrusted(path: &str) -> bool {
    let segments: Vec<&str> = path.split('.').collect();
    UNTRUSTED_INPUTS.iter().any(|pattern| {
        let expected: Vec<&str> = pattern.split('.').collect();
        expected.len() == segments.len()
            && expected
                .iter()
                .zip(&segments)
                .all(|(p, s)| *p == "*" || *s == "*" || p == s)
    })
}
