//! Command implementations shared by one-shot runs and the daemon loop.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rulewatch_common::util::truncate_with_ellipsis;
use rulewatch_common::{Config, Error};
use rulewatch_core::{open_store, CycleReport, Notifier, Pipeline};
use std::io::Write;
use std::path::Path;

use crate::inbox::load_inbox;
use crate::render::build_notifier;

/// Characters of stored text shown by `show`.
const SHOW_PREVIEW_CHARS: usize = 400;

/// Load configuration (file plus environment overrides) and reject invalid values.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = Config::load_with_env(path)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    config
        .validate()
        .map_err(|e| Error::Config(e.to_string()))?;
    Ok(())
}

/// Run one detection cycle and deliver its events through the configured sink.
pub fn run_cycle(config: &Config) -> Result<CycleReport> {
    let mut notifier = build_notifier(&config.notify)?;
    run_cycle_with(config, notifier.as_mut(), Utc::now())
}

/// Run one cycle with an explicit notifier and clock.
///
/// Every event is offered to the notifier. Rejected events are counted in the report
/// and their documents are detected again next cycle.
pub fn run_cycle_with(
    config: &Config,
    notifier: &mut dyn Notifier,
    now: DateTime<Utc>,
) -> Result<CycleReport> {
    validate(config)?;
    let store = open_store(&config.store)
        .with_context(|| format!("Failed to open {} snapshot store", config.store.backend))?;
    let pipeline = Pipeline::from_config(config, store);

    let inbox = load_inbox(config, now);
    let mut report = pipeline.deliver_cycle_at(inbox.batches, notifier, now);
    report.stats.received += inbox.dropped;
    report.stats.dropped += inbox.dropped;
    Ok(report)
}

/// One-line cycle summary for the terminal.
pub fn format_summary(report: &CycleReport) -> String {
    let s = &report.stats;
    let mut line = format!(
        "Cycle: {} received, {} new, {} changed, {} unchanged, {} duplicate, {} dropped, \
         {} failed, {} undelivered",
        s.received,
        s.new,
        s.changed,
        s.unchanged,
        s.duplicates,
        s.dropped,
        s.read_failures + s.write_failures,
        s.delivery_failures
    );
    if report.flush_error.is_some() {
        line.push_str(" (notifier flush failed)");
    }
    line
}

/// Print the stored snapshot for an identity. Absent identities are a not-found error.
pub fn show(config: &Config, identity: &str, out: &mut dyn Write) -> Result<()> {
    let store = open_store(&config.store)
        .with_context(|| format!("Failed to open {} snapshot store", config.store.backend))?;

    let snapshot = store
        .get(identity)
        .with_context(|| format!("Failed to read snapshot for {identity}"))?
        .ok_or_else(|| Error::NotFound(format!("no snapshot for '{identity}'")))?;

    writeln!(out, "Identity:  {}", snapshot.identity)?;
    writeln!(out, "Key:       {}", store.describe_key(identity))?;
    writeln!(out, "Hash:      {}", snapshot.content_hash)?;
    writeln!(out, "Last seen: {}", snapshot.last_seen_at.to_rfc3339())?;
    writeln!(out)?;
    writeln!(
        out,
        "{}",
        truncate_with_ellipsis(&snapshot.normalized_text, SHOW_PREVIEW_CHARS)
    )?;
    Ok(())
}

/// Validate the configuration and describe what it resolves to.
pub fn check_config(config: &Config, out: &mut dyn Write) -> Result<()> {
    validate(config)?;

    writeln!(out, "Configuration OK")?;
    writeln!(out, "  store:   {} at {}", config.store.backend, config.store.path)?;
    writeln!(out, "  sink:    {}", config.notify.sink)?;
    writeln!(out, "  owners:  {} keyword rules", config.routing.owners.len())?;
    writeln!(out, "  sources (priority order):")?;
    for source in &config.sources {
        let state = if source.enabled { "" } else { " (disabled)" };
        writeln!(out, "    {} <- {}{state}", source.name, source.path)?;
    }
    Ok(())
}

/// Exit code for a failed command.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<Error>())
        .map_or(1, Error::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulewatch_common::SourceConfig;

    #[test]
    fn test_check_config_lists_sources() {
        let mut out = Vec::new();
        check_config(&Config::default(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Configuration OK"));
        assert!(text.contains("agency-search"));
    }

    #[test]
    fn test_check_config_rejects_invalid() {
        let mut config = Config::default();
        config.sources.push(SourceConfig::new("agency-search", "dup.json"));
        let err = check_config(&config, &mut Vec::new()).unwrap_err();
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn test_run_cycle_rejects_invalid_config() {
        let mut config = Config::default();
        config.store.backend = "memory".into();
        config.detector.preview_chars = 0;
        let mut notifier = rulewatch_core::CollectingNotifier::default();
        let err = run_cycle_with(&config, &mut notifier, Utc::now()).unwrap_err();
        assert_eq!(exit_code(&err), 2);
        assert!(format!("{err:#}").contains("detector.preview_chars"));
        assert!(notifier.events.is_empty());
    }

    #[test]
    fn test_load_config_rejects_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"store": {{"backend": "redis"}}}}"#).unwrap();
        let err = load_config(Some(file.path())).unwrap_err();
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn test_show_missing_is_not_found() {
        let mut config = Config::default();
        config.store.backend = "memory".into();
        let err = show(&config, "nope", &mut Vec::new()).unwrap_err();
        assert_eq!(exit_code(&err), 3);
    }

    #[test]
    fn test_exit_code_defaults_to_one() {
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), 1);
    }
}
