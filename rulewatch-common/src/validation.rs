//! Configuration validation for rulewatch.
//!
//! Provides validation logic for configuration fields to ensure
//! all required values are present and within valid ranges.

use std::collections::HashSet;
use thiserror::Error;

use crate::config::{
    Config, DetectorConfig, NotifyConfig, ObservabilityConfig, RoutingConfig, StoreConfig,
};

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Configuration conflict: {reason}")]
    Conflict { reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

const STORE_BACKENDS: &[&str] = &["file", "sqlite", "memory"];
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["pretty", "json"];
const SINKS: &[&str] = &["console", "jsonl"];

fn invalid(field: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn one_of(field: &str, value: &str, allowed: &[&str]) -> ValidationResult<()> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(invalid(
            field,
            format!("'{value}' is not one of {}", allowed.join(", ")),
        ))
    }
}

fn collect(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

impl Config {
    /// Validate the entire configuration.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = self.observability.validate() {
            errors.push(e);
        }
        if let Err(e) = self.store.validate() {
            errors.push(e);
        }
        if let Err(e) = self.routing.validate() {
            errors.push(e);
        }
        if let Err(e) = self.detector.validate() {
            errors.push(e);
        }
        if let Err(e) = self.notify.validate() {
            errors.push(e);
        }
        if let Err(e) = self.check_sources() {
            errors.push(e);
        }

        collect(errors)
    }

    /// Source names drive dedup priority, so they must be present and unique.
    fn check_sources(&self) -> ValidationResult<()> {
        let mut seen = HashSet::new();
        for (idx, source) in self.sources.iter().enumerate() {
            if source.name.trim().is_empty() {
                return Err(ValidationError::MissingField {
                    field: format!("sources[{idx}].name"),
                });
            }
            if source.path.trim().is_empty() {
                return Err(ValidationError::MissingField {
                    field: format!("sources[{idx}].path"),
                });
            }
            if !seen.insert(source.name.as_str()) {
                return Err(ValidationError::Conflict {
                    reason: format!("source '{}' is declared more than once", source.name),
                });
            }
        }
        Ok(())
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        one_of("observability.log_level", &self.log_level.to_lowercase(), LOG_LEVELS)?;
        one_of("observability.log_format", &self.log_format, LOG_FORMATS)
    }
}

impl Validate for StoreConfig {
    fn validate(&self) -> ValidationResult<()> {
        one_of("store.backend", &self.backend, STORE_BACKENDS)?;
        if self.backend != "memory" && self.path.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "store.path".into(),
            });
        }
        Ok(())
    }
}

impl Validate for RoutingConfig {
    fn validate(&self) -> ValidationResult<()> {
        for (idx, rule) in self.owners.iter().enumerate() {
            if rule.keyword.trim().is_empty() {
                return Err(invalid(
                    &format!("routing.owners[{idx}].keyword"),
                    "keyword must not be empty (it would match every title)",
                ));
            }
            if rule.owner.trim().is_empty() {
                return Err(ValidationError::MissingField {
                    field: format!("routing.owners[{idx}].owner"),
                });
            }
        }
        Ok(())
    }
}

impl Validate for DetectorConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.preview_chars == 0 {
            return Err(invalid("detector.preview_chars", "must be greater than 0"));
        }
        if !(2..=3).contains(&self.diff_context) {
            return Err(invalid("detector.diff_context", "must be 2 or 3"));
        }
        Ok(())
    }
}

impl Validate for NotifyConfig {
    fn validate(&self) -> ValidationResult<()> {
        one_of("notify.sink", &self.sink, SINKS)?;
        if self.sink == "jsonl" && self.path.as_deref().map_or(true, |p| p.trim().is_empty()) {
            return Err(ValidationError::MissingField {
                field: "notify.path".into(),
            });
        }
        if self.max_diff_chars == 0 {
            return Err(invalid("notify.max_diff_chars", "must be greater than 0"));
        }
        Ok(())
    }
}
