//! Configuration file support.
//!
//! Parses `.gantry.yml` configuration files that let users register
//! self-hosted runner labels and configuration variables (to suppress
//! false positives), toggle rules, override severities, and ignore file
//! patterns.
//!
//! # Example `.gantry.yml`
//!
//! ```yaml
//! self-hosted-runner:
//!   labels:
//!     - linux-large
//! config-variables:
//!   - DEPLOY_ENV
//!
//! rules:
//!   runner-label:
//!     enabled: false
//!   action-version:
//!     severity: error
//!
//! ignore:
//!   - ".github/workflows/generated-*.yml"
//! ```

use crate::Severity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GantryConfig {
    /// Self-hosted runner registration.
    pub self_hosted_runner: SelfHostedRunner,

    /// Configuration variables (`vars.*`) known to the repository.
    /// When unset, `vars` references are not checked at all.
    pub config_variables: Option<Vec<String>>,

    /// Per-rule configuration overrides.
    pub rules: HashMap<String, RuleConfig>,

    /// File glob patterns to ignore during validation.
    pub ignore: Vec<String>,
}

/// Labels of self-hosted runners available to the repository. `runs-on`
/// labels in this list are accepted by the runner-label rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfHostedRunner {
    pub labels: Vec<String>,
}

/// Configuration for an individual rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Whether this rule is enabled. Defaults to `true`.
    pub enabled: bool,

    /// Override the default severity for this rule.
    /// Valid values: "error", "warning", "info".
    pub severity: Option<String>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            severity: None,
        }
    }
}

impl GantryConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        // An empty config file means "all defaults", not a parse error.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Auto-discover `.gantry.yml` by walking up from the given directory.
    ///
    /// Searches the given directory, then each parent, stopping at the
    /// filesystem root. Returns `None` if no config file is found.
    pub fn discover(start_dir: &Path) -> Option<PathBuf> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(".gantry.yml");
            if candidate.is_file() {
                return Some(candidate);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// Check if a file path should be ignored based on the `ignore` patterns.
    pub fn is_ignored(&self, path: &str) -> bool {
        for pattern in &self.ignore {
            if let Ok(glob_pattern) = glob::Pattern::new(pattern) {
                if glob_pattern.matches(path) {
                    return true;
                }
            }
        }
        false
    }

    /// Check if a rule is enabled.
    pub fn is_rule_enabled(&self, rule_name: &str) -> bool {
        match self.rules.get(rule_name) {
            Some(config) => config.enabled,
            None => true, // enabled by default
        }
    }

    /// Get the severity override for a rule, if any. Unknown severity
    /// strings are treated as no override.
    pub fn rule_severity(&self, rule_name: &str) -> Option<Severity> {
        match self.rules.get(rule_name)?.severity.as_deref()? {
            "error" => Some(Severity::Error),
            "warning" => Some(Severity::Warning),
            "info" => Some(Severity::Info),
            _ => None,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading the config file.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// YAML parse error.
    Parse { path: PathBuf, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config '{}': {}", path.display(), source)
            }
            ConfigError::Parse { path, message } => {
                write!(f, "invalid config '{}': {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_has_defaults() {
        let config: GantryConfig = serde_yaml::from_str("{}").unwrap();
        assert!(config.self_hosted_runner.labels.is_empty());
        assert!(config.config_variables.is_none());
        assert!(config.rules.is_empty());
        assert!(config.ignore.is_empty());
    }

    #[test]
    fn parse_self_hosted_labels() {
        let yaml = r#"
self-hosted-runner:
  labels:
    - linux-large
    - gpu-runner
"#;
        let config: GantryConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.self_hosted_runner.labels.len(), 2);
        assert_eq!(config.self_hosted_runner.labels[0], "linux-large");
    }

    #[test]
    fn parse_config_variables() {
        let yaml = "config-variables:\n  - DEPLOY_ENV\n";
        let config: GantryConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config.config_variables.as_deref(),
            Some(&["DEPLOY_ENV".to_string()][..])
        );
    }

    #[test]
    fn parse_rule_config() {
        let yaml = r#"
rules:
  runner-label:
    enabled: false
  action-version:
    severity: error
"#;
        let config: GantryConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.is_rule_enabled("runner-label"));
        assert!(config.is_rule_enabled("action-version"));
        assert_eq!(config.rule_severity("action-version"), Some(Severity::Error));
    }

    #[test]
    fn parse_ignore_patterns() {
        let yaml = r#"
ignore:
  - "vendor/**"
  - "*.generated.yml"
"#;
        let config: GantryConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.ignore.len(), 2);
        assert!(config.is_ignored("vendor/nested/a.yml"));
        assert!(!config.is_ignored("main.yml"));
    }

    #[test]
    fn unknown_rule_is_enabled() {
        let config = GantryConfig::default();
        assert!(config.is_rule_enabled("nonexistent-rule"));
        assert_eq!(config.rule_severity("nonexistent-rule"), None);
    }
}
