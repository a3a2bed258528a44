//! Checker configuration.
//!
//! Everything is optional in the JSON form; missing fields take the zerolog
//! defaults.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::AnalysisOptions;
use crate::classify::{ClassifierConfig, RoleTable};
use crate::directive::DEFAULT_DIRECTIVE;

/// Errors loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {reason}")]
    Invalid { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    pub classifier: ClassifierConfig,
    /// Comment directive suppressing findings.
    pub directive: String,
    pub report_unused_directives: bool,
    /// Leave procedures declared in `_test.go` files unchecked.
    pub skip_test_files: bool,
    /// Source files whose procedures are left unchecked.
    pub exclude_files: BTreeSet<String>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        CheckerConfig {
            classifier: ClassifierConfig::default(),
            directive: DEFAULT_DIRECTIVE.to_string(),
            report_unused_directives: true,
            skip_test_files: false,
            exclude_files: BTreeSet::new(),
        }
    }
}

impl CheckerConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: CheckerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rejects configurations that could never match anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.classifier;
        let required = [
            ("directive", &self.directive),
            ("classifier.types_package", &c.types_package),
            ("classifier.builder_type", &c.builder_type),
            ("classifier.carrier_type", &c.carrier_type),
            ("classifier.field_set_type", &c.field_set_type),
            ("classifier.marker_setter", &c.marker_setter),
            ("classifier.marker_type", &c.marker_type),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    reason: format!("{} must not be empty", name),
                });
            }
        }
        let roles = [&c.builder_type, &c.carrier_type, &c.field_set_type];
        if roles[0] == roles[1] || roles[0] == roles[2] || roles[1] == roles[2] {
            return Err(ConfigError::Invalid {
                reason: "role type names must be distinct".into(),
            });
        }
        Ok(())
    }

    pub fn role_table(&self) -> RoleTable {
        RoleTable::new(self.classifier.clone())
    }

    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            directive: self.directive.clone(),
            report_unused_directives: self.report_unused_directives,
            skip_test_files: self.skip_test_files,
            exclude_files: self.exclude_files.clone(),
        }
    }
}
