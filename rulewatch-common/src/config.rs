//! Configuration management for rulewatch.
//!
//! The watcher reads a single JSON configuration file, `~/.rulewatch/config.json` by
//! default. Every section is optional; missing sections fall back to defaults.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (RULEWATCH_* prefix)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `RULEWATCH_LOG_LEVEL` → observability.log_level
//! - `RULEWATCH_LOG_FORMAT` → observability.log_format
//! - `RULEWATCH_STATE_PATH` → store.path
//! - `RULEWATCH_STORE_BACKEND` → store.backend

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".rulewatch"),
        |dirs| dirs.home_dir().join(".rulewatch"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

// ============================================================================
// Root
// ============================================================================

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// JSON Schema reference
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Snapshot store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Keyword → owner routing table
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Fetch strategies in declared priority order.
    ///
    /// When two strategies return the same document in one cycle, the copy from the
    /// strategy listed first wins.
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,

    /// Change detector tuning
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Notification sink
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema: None,
            observability: ObservabilityConfig::default(),
            store: StoreConfig::default(),
            routing: RoutingConfig::default(),
            sources: default_sources(),
            detector: DetectorConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration (explicit path or default) and apply environment overrides.
    pub fn load_with_env(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("RULEWATCH_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Ok(format) = std::env::var("RULEWATCH_LOG_FORMAT") {
            self.observability.log_format = format;
        }
        if let Ok(path) = std::env::var("RULEWATCH_STATE_PATH") {
            self.store.path = path;
        }
        if let Ok(backend) = std::env::var("RULEWATCH_STORE_BACKEND") {
            self.store.backend = backend;
        }
    }

    /// Enabled sources, in declared priority order.
    pub fn enabled_sources(&self) -> impl Iterator<Item = &SourceConfig> {
        self.sources.iter().filter(|s| s.enabled)
    }

    /// Names of enabled sources, in declared priority order.
    pub fn source_priority(&self) -> Vec<String> {
        self.enabled_sources().map(|s| s.name.clone()).collect()
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets to clamp to `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

/// Snapshot store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend type (file, sqlite, memory)
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// State directory. The file backend writes one record per document here;
    /// the sqlite backend opens `snapshots.db` inside it.
    #[serde(default = "default_state_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: default_state_path(),
        }
    }
}

/// One row of the owner routing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRule {
    /// Case-insensitive substring to look for
    pub keyword: String,
    /// Owner tag assigned on match
    pub owner: String,
}

impl OwnerRule {
    pub fn new(keyword: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            owner: owner.into(),
        }
    }
}

/// Owner routing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Ordered keyword table. First match wins.
    #[serde(default = "default_owner_rules")]
    pub owners: Vec<OwnerRule>,

    /// Also search the document body, not only the title
    #[serde(default)]
    pub match_summary: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            owners: default_owner_rules(),
            match_summary: false,
        }
    }
}

/// A fetch strategy whose adapter drops parsed entries into an inbox file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Strategy name (agency-search, topic-search, ...)
    pub name: String,

    /// Path of the JSON entry file written by the fetch adapter
    pub path: String,

    /// Disabled sources are skipped entirely
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl SourceConfig {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            enabled: true,
        }
    }
}

/// Change detector tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Character cap for the preview attached to NEW events
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,

    /// Context lines around each diff hunk (2 or 3)
    #[serde(default = "default_diff_context")]
    pub diff_context: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            preview_chars: default_preview_chars(),
            diff_context: default_diff_context(),
        }
    }
}

/// Notification sink configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Sink type (console, jsonl)
    #[serde(default = "default_sink")]
    pub sink: String,

    /// Output file for the jsonl sink
    #[serde(default)]
    pub path: Option<String>,

    /// Diff character cap when rendering to the console
    #[serde(default = "default_max_diff_chars")]
    pub max_diff_chars: usize,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            sink: default_sink(),
            path: None,
            max_diff_chars: default_max_diff_chars(),
        }
    }
}

// ============================================================================
// Defaults
// ============================================================================

fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "pretty".into()
}
fn default_store_backend() -> String {
    "file".into()
}
fn default_state_path() -> String {
    ".rulewatch_state".into()
}
fn default_preview_chars() -> usize {
    600
}
fn default_diff_context() -> usize {
    2
}
fn default_sink() -> String {
    "console".into()
}
fn default_max_diff_chars() -> usize {
    2000
}
fn default_true() -> bool {
    true
}

/// Healthcare payment-rule routing table.
pub fn default_owner_rules() -> Vec<OwnerRule> {
    vec![
        OwnerRule::new("IPPS", "Hospital Inpatient Payment Team"),
        OwnerRule::new("Inpatient Prospective Payment", "Hospital Inpatient Payment Team"),
        OwnerRule::new("OPPS", "Hospital Outpatient Payment Team"),
        OwnerRule::new("Outpatient Prospective Payment", "Hospital Outpatient Payment Team"),
        OwnerRule::new("Physician Fee Schedule", "Physician Payment Team"),
        OwnerRule::new("PFS", "Physician Payment Team"),
        OwnerRule::new("Medicare Advantage", "MA/Part D Team"),
        OwnerRule::new("Part D", "MA/Part D Team"),
    ]
}

/// Agency search, topic search, then suggested-search expansion.
pub fn default_sources() -> Vec<SourceConfig> {
    ["agency-search", "topic-search", "suggested-search"]
        .into_iter()
        .map(|name| SourceConfig::new(name, format!("inbox/{name}.json")))
        .collect()
}
