//! Validation rule framework.
//! Rules are independent and can run in parallel.

use crate::config::GantryConfig;
use crate::document::Document;
use crate::{Diagnostic, LintResult, Severity};
use std::collections::HashMap;

pub mod rules;
mod utils;

/// A semantic check applied to a parsed workflow tree.
///
/// Rules must be:
/// - Pure functions (same input → same output)
/// - Independent (no dependencies on other rules)
/// - Deterministic (no side effects)
pub trait Rule: Send + Sync {
    /// Identifier attached to every diagnostic this rule produces.
    fn name(&self) -> &'static str;

    /// Inspect the document and return diagnostics. The raw source is
    /// available for rules that report positions inside scalars.
    fn check(&self, doc: &Document, source: &str) -> Vec<Diagnostic>;

    /// Whether this rule only applies to GitHub Actions workflow files.
    ///
    /// Returns `true` by default. Rules that apply to any YAML document
    /// should override this to return `false`.
    fn requires_workflow(&self) -> bool {
        true
    }
}

/// Registry of validation rules.
pub struct RuleSet {
    rules: Vec<Box<dyn Rule>>,
    severity_overrides: HashMap<&'static str, Severity>,
}

impl RuleSet {
    /// Create a new empty rule set.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            severity_overrides: HashMap::new(),
        }
    }

    /// Build the default registry, honoring the configuration's rule
    /// toggles and severity overrides.
    pub fn builtin(config: &GantryConfig) -> Self {
        let mut set = Self::new();

        if config.is_rule_enabled("syntax-check") {
            set.add_rule(rules::SchemaRule);
        }
        if config.is_rule_enabled("expression") {
            set.add_rule(rules::ExpressionRule::new(config.config_variables.clone()));
        }
        if config.is_rule_enabled("action-version") {
            set.add_rule(rules::ActionVersionRule);
        }
        if config.is_rule_enabled("deprecated") {
            set.add_rule(rules::DeprecatedRule);
        }
        if config.is_rule_enabled("permissions") {
            set.add_rule(rules::PermissionsRule);
        }
        if config.is_rule_enabled("runner-label") {
            set.add_rule(rules::RunnerLabelRule::new(
                config.self_hosted_runner.labels.clone(),
            ));
        }

        for rule in &set.rules {
            if let Some(severity) = config.rule_severity(rule.name()) {
                set.severity_overrides.insert(rule.name(), severity);
            }
        }

        set
    }

    /// Add a validation rule.
    pub fn add_rule<R: Rule + 'static>(&mut self, rule: R) {
        self.rules.push(Box::new(rule));
    }

    /// Run every rule over the document.
    ///
    /// Rules are independent and run concurrently. The final set is
    /// deduplicated by (line, column, rule) and sorted by position, so
    /// rule evaluation order never affects the result.
    ///
    /// The workflow check is performed once here rather than in each
    /// rule, eliminating redundant tree walks.
    pub fn run(&self, doc: &Document, source: &str) -> LintResult {
        use rayon::prelude::*;

        let is_workflow = utils::is_workflow(doc);

        let mut diagnostics: Vec<Diagnostic> = self
            .rules
            .par_iter()
            .filter(|rule| is_workflow || !rule.requires_workflow())
            .flat_map(|rule| {
                let name = rule.name();
                let severity = self.severity_overrides.get(name).copied();
                rule.check(doc, source)
                    .into_iter()
                    .map(move |mut d| {
                        d.rule = name.to_string();
                        if let Some(severity) = severity {
                            d.severity = severity;
                        }
                        d
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        diagnostics.sort_by(|a, b| {
            (a.line, a.column, a.rule.as_str(), a.severity)
                .cmp(&(b.line, b.column, b.rule.as_str(), b.severity))
        });
        // Distinct violations can share a position (e.g. two missing
        // required sections both anchored to the document root), so the
        // message is part of the identity.
        diagnostics.dedup_by(|a, b| {
            a.line == b.line && a.column == b.column && a.rule == b.rule && a.message == b.message
        });

        LintResult { diagnostics }
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new()
    }
}
