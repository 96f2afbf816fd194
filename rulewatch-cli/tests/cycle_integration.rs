//! Integration tests for the inbox → pipeline → notifier path.

use chrono::{TimeZone, Utc};
use rulewatch_cli::commands::{format_summary, run_cycle, run_cycle_with, show};
use rulewatch_cli::render::JsonlNotifier;
use rulewatch_common::{Config, SourceConfig};
use rulewatch_core::{ChangeEvent, CollectingNotifier, Notifier, NotifyError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_inbox(path: &Path, body: &str) {
    fs::write(path, body).unwrap();
}

fn test_config(dir: &TempDir, backend: &str) -> Config {
    let mut config = Config::default();
    config.store.backend = backend.into();
    config.store.path = dir.path().join("state").display().to_string();
    config.sources = vec![
        SourceConfig::new("agency-search", dir.path().join("agency.json").display().to_string()),
        SourceConfig::new("topic-search", dir.path().join("topic.json").display().to_string()),
    ];
    config
}

const PFS_V1: &str = r#"[
    {
        "document_number": "2026-00001",
        "title": "CY2026 Physician Fee Schedule (PFS) Final Rule",
        "html_url": "https://www.federalregister.gov/d/2026-00001",
        "publication_date": "2026-01-02",
        "abstract": "<p>The conversion factor increases by 2.3%.</p>"
    },
    {"title": "entry without identity"}
]"#;

const PFS_V2: &str = r#"[
    {
        "document_number": "2026-00001",
        "title": "CY2026 Physician Fee Schedule (PFS) Final Rule",
        "html_url": "https://www.federalregister.gov/d/2026-00001",
        "publication_date": "2026-01-02",
        "abstract": "<p>The conversion factor increases by 3.1%.</p>"
    }
]"#;

fn run_to_lines(
    config: &Config,
    hour: u32,
) -> (rulewatch_core::CycleReport, Vec<serde_json::Value>) {
    let mut notifier = JsonlNotifier::new(Vec::new());
    let now = Utc.with_ymd_and_hms(2026, 6, 1, hour, 0, 0).unwrap();
    let report = run_cycle_with(config, &mut notifier, now).unwrap();
    let out = String::from_utf8(notifier.into_inner()).unwrap();
    let lines = out
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    (report, lines)
}

#[test]
fn test_new_changed_unchanged_across_cycles() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, "file");
    write_inbox(&dir.path().join("agency.json"), PFS_V1);
    write_inbox(
        &dir.path().join("topic.json"),
        r#"{"results": [{"document_number": "2026-00001", "title": "duplicate via topic"}]}"#,
    );

    let (report, events) = run_to_lines(&config, 1);
    assert_eq!(report.stats.received, 3);
    assert_eq!(report.stats.dropped, 1);
    assert_eq!(report.stats.duplicates, 1);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["classification"], "NEW");
    assert_eq!(events[0]["owner"], "Physician Payment Team");
    assert_eq!(events[0]["source"], "agency-search");
    assert_eq!(events[0]["preview_text"], "The conversion factor increases by 2.3%.");

    write_inbox(&dir.path().join("agency.json"), PFS_V2);
    let (report, events) = run_to_lines(&config, 2);
    assert_eq!(report.stats.changed, 1);
    assert_eq!(events[0]["classification"], "CHANGED");
    assert_eq!(events[0]["numeric_added"][0], "3.1%");
    assert_eq!(events[0]["numeric_removed"][0], "2.3%");

    let (report, events) = run_to_lines(&config, 3);
    assert_eq!(report.stats.unchanged, 1);
    assert!(events.is_empty());
    assert!(format_summary(&report).contains("1 unchanged"));
}

#[test]
fn test_show_prints_stored_snapshot() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, "sqlite");
    write_inbox(&dir.path().join("agency.json"), PFS_V2);
    run_to_lines(&config, 1);

    let mut out = Vec::new();
    show(&config, "2026-00001", &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Identity:  2026-00001"));
    assert!(text.contains("Last seen: 2026-06-01T01:00:00+00:00"));
    assert!(text.contains("The conversion factor increases by 3.1%."));
}

#[test]
fn test_missing_inbox_is_not_fatal() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, "file");
    write_inbox(&dir.path().join("topic.json"), PFS_V2);

    let (report, events) = run_to_lines(&config, 1);
    assert_eq!(report.stats.new, 1);
    assert_eq!(events[0]["source"], "topic-search");
}

#[test]
fn test_jsonl_sink_from_config() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir, "file");
    let events_path = dir.path().join("events.jsonl");
    config.notify.sink = "jsonl".into();
    config.notify.path = Some(events_path.display().to_string());
    write_inbox(&dir.path().join("agency.json"), PFS_V2);

    let report = run_cycle(&config).unwrap();
    assert_eq!(report.stats.new, 1);
    let content = fs::read_to_string(&events_path).unwrap();
    assert_eq!(content.lines().count(), 1);
}

/// Sink whose device is full.
struct FullDiskNotifier;

impl Notifier for FullDiskNotifier {
    fn notify(&mut self, _event: &ChangeEvent) -> Result<(), NotifyError> {
        Err(std::io::Error::other("disk full").into())
    }
}

#[test]
fn test_undelivered_event_is_reported_next_cycle() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, "file");
    write_inbox(&dir.path().join("agency.json"), PFS_V2);
    let now = Utc.with_ymd_and_hms(2026, 6, 1, 1, 0, 0).unwrap();

    let report = run_cycle_with(&config, &mut FullDiskNotifier, now).unwrap();
    assert_eq!(report.stats.new, 0);
    assert_eq!(report.stats.delivery_failures, 1);
    assert!(report.events.is_empty());
    assert!(format_summary(&report).contains("1 undelivered"));

    let mut notifier = CollectingNotifier::default();
    let report = run_cycle_with(&config, &mut notifier, now).unwrap();
    assert_eq!(report.stats.new, 1);
    assert_eq!(report.stats.unchanged, 0);
    assert_eq!(notifier.events.len(), 1);
    assert_eq!(notifier.events[0].identity, "2026-00001");
}

#[test]
fn test_mixed_inbox_keeps_well_formed_entries() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, "memory");
    write_inbox(
        &dir.path().join("agency.json"),
        r#"[
            {"id": "x", "title": "Physician Fee Schedule notice", "summary": "one"},
            {"identity": "y", "id": "y", "title": "both spellings", "raw_body": "two"},
            {"id": 42, "title": "numeric id"}
        ]"#,
    );

    let (report, events) = run_to_lines(&config, 1);
    assert_eq!(report.stats.received, 3);
    assert_eq!(report.stats.dropped, 1);
    let identities: Vec<_> = events.iter().map(|e| e["identity"].clone()).collect();
    assert_eq!(identities, vec!["x", "y"]);
}
