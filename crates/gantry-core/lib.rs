//! Gantry Core
//!
//! Static analysis engine for GitHub Actions workflow files.
//! This crate is editor-agnostic and fully deterministic.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

pub mod config;
pub mod document;
pub mod expr;
pub mod parser;
pub mod reporter;
pub mod validation;

pub use config::GantryConfig;
pub use document::{Document, Node, NodeKind, Scalar};
pub use parser::{ParseError, YamlParser};
pub use reporter::FileReport;
pub use validation::{Rule, RuleSet};

/// Entry point for the Gantry analysis engine.
///
/// The engine owns the rule registry and the configuration; analysis
/// itself is stateless, so a single engine can be shared across files
/// and threads.
pub struct GantryEngine {
    rules: RuleSet,
}

impl GantryEngine {
    /// Creates an engine with the default configuration and all
    /// built-in rules enabled.
    pub fn new() -> Self {
        Self::with_config(GantryConfig::default())
    }

    /// Creates an engine from a loaded configuration. Disabled rules are
    /// not registered; severity overrides are applied to emitted
    /// diagnostics.
    pub fn with_config(config: GantryConfig) -> Self {
        Self {
            rules: RuleSet::builtin(&config),
        }
    }

    /// Analyze a workflow document and return diagnostics.
    ///
    /// This function must:
    /// - Be deterministic
    /// - Avoid side effects
    /// - Never panic on malformed input
    pub fn analyze(&self, source: &str) -> LintResult {
        let mut parser = YamlParser::new();
        let doc = match parser.load(source) {
            Ok(doc) => doc,
            Err(err) => {
                // A parse failure is a single diagnostic, not a fatal error;
                // callers continue with their remaining files.
                return LintResult {
                    diagnostics: vec![Diagnostic {
                        line: err.line,
                        column: err.column,
                        rule: "syntax-check".to_string(),
                        severity: Severity::Error,
                        message: err.message,
                    }],
                };
            }
        };

        self.rules.run(&doc, source)
    }

    /// Analyze a single file on disk.
    ///
    /// An unreadable file yields exactly one diagnostic and is otherwise
    /// skipped; it never aborts a multi-file run.
    pub fn analyze_file(&self, path: &Path) -> FileReport {
        match fs::read_to_string(path) {
            Ok(source) => FileReport {
                path: path.to_path_buf(),
                diagnostics: self.analyze(&source).diagnostics,
            },
            Err(err) => FileReport {
                path: path.to_path_buf(),
                diagnostics: vec![Diagnostic {
                    line: 1,
                    column: 1,
                    rule: "syntax-check".to_string(),
                    severity: Severity::Error,
                    message: format!("could not read file: {}", err),
                }],
            },
        }
    }

    /// Analyze a set of files in parallel.
    ///
    /// Files are independent, so this is embarrassingly parallel; the
    /// result order matches the input order.
    pub fn analyze_files(&self, paths: &[PathBuf]) -> Vec<FileReport> {
        use rayon::prelude::*;

        paths.par_iter().map(|path| self.analyze_file(path)).collect()
    }
}

impl Default for GantryEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of an analysis pass over one document.
#[derive(Debug)]
pub struct LintResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl LintResult {
    /// Returns true if no errors were found.
    pub fn is_ok(&self) -> bool {
        !self
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

/// A diagnostic produced by the engine. Immutable once created.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    /// 1-based line in the source file.
    pub line: usize,
    /// 1-based column in the source file.
    pub column: usize,
    /// Identifier of the rule that produced this diagnostic.
    pub rule: String,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    /// Create an error diagnostic. The rule identifier is attached by the
    /// engine when the owning rule's results are merged.
    pub fn error(position: Position, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, position, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(position: Position, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, position, message)
    }

    /// Create an informational diagnostic.
    pub fn info(position: Position, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, position, message)
    }

    fn new(severity: Severity, position: Position, message: impl Into<String>) -> Self {
        Self {
            line: position.line,
            column: position.column,
            rule: String::new(),
            severity,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} [{}]",
            self.line, self.column, self.message, self.rule
        )
    }
}

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// 1-based line/column position in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Byte range in the raw source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}
