//! Notifier implementations: console blocks and JSON lines.
//!
//! Both sinks attach a one-line summary from a [`Summarizer`], the template one unless
//! another is supplied.

use anyhow::{Context, Result};
use rulewatch_common::util::truncate_with_ellipsis;
use rulewatch_common::NotifyConfig;
use rulewatch_core::{ChangeEvent, Notifier, NotifyError, Summarizer, TemplateSummarizer};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

const RULE: &str = "------------------------------------------------------------";

/// Human-readable blocks, one per event.
pub struct ConsoleNotifier<W: Write> {
    out: W,
    max_diff_chars: usize,
    summarizer: Box<dyn Summarizer>,
}

impl ConsoleNotifier<io::Stdout> {
    pub fn stdout(max_diff_chars: usize) -> Self {
        Self::new(io::stdout(), max_diff_chars)
    }
}

impl<W: Write> ConsoleNotifier<W> {
    pub fn new(out: W, max_diff_chars: usize) -> Self {
        Self {
            out,
            max_diff_chars,
            summarizer: Box::new(TemplateSummarizer::default()),
        }
    }

    pub fn with_summarizer(mut self, summarizer: Box<dyn Summarizer>) -> Self {
        self.summarizer = summarizer;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_header(&mut self, label: &str, event: &ChangeEvent) -> io::Result<()> {
        writeln!(self.out, "{RULE}")?;
        writeln!(self.out, "[{label}] {}", event.title)?;
        writeln!(self.out, "Owner:     {}", event.owner)?;
        writeln!(self.out, "Identity:  {}", event.identity)?;
        writeln!(self.out, "Source:    {}", event.source)?;
        if let Some(published) = event.published {
            writeln!(self.out, "Published: {}", published.format("%Y-%m-%d"))?;
        }
        if let Some(link) = &event.link {
            writeln!(self.out, "Link:      {link}")?;
        }
        writeln!(self.out, "Summary:   {}", self.summarizer.summarize(event))?;
        Ok(())
    }
}

impl<W: Write> Notifier for ConsoleNotifier<W> {
    fn notify(&mut self, event: &ChangeEvent) -> Result<(), NotifyError> {
        if event.is_new() {
            self.write_header("NEW", event)?;
            if !event.preview_text.is_empty() {
                writeln!(self.out)?;
                writeln!(self.out, "{}", event.preview_text)?;
            }
        } else {
            self.write_header("UPDATED", event)?;
            for line in event.numeric_summary() {
                writeln!(self.out, "{line}")?;
            }
            if !event.diff_text.is_empty() {
                writeln!(self.out)?;
                let diff = truncate_with_ellipsis(&event.diff_text, self.max_diff_chars);
                writeln!(self.out, "{}", diff.trim_end())?;
            }
        }
        writeln!(self.out)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), NotifyError> {
        self.out.flush()?;
        Ok(())
    }
}

/// One JSON object per line, appended. Each line is flushed as it is written.
pub struct JsonlNotifier<W: Write> {
    out: W,
    summarizer: Box<dyn Summarizer>,
}

#[derive(Serialize)]
struct EventRecord<'a> {
    #[serde(flatten)]
    event: &'a ChangeEvent,
    summary: String,
}

impl JsonlNotifier<BufWriter<File>> {
    pub fn append_to(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open event log {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonlNotifier<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            summarizer: Box::new(TemplateSummarizer::default()),
        }
    }

    pub fn with_summarizer(mut self, summarizer: Box<dyn Summarizer>) -> Self {
        self.summarizer = summarizer;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Notifier for JsonlNotifier<W> {
    fn notify(&mut self, event: &ChangeEvent) -> Result<(), NotifyError> {
        let record = EventRecord {
            event,
            summary: self.summarizer.summarize(event),
        };
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');
        self.out.write_all(&line)?;
        self.out.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), NotifyError> {
        self.out.flush()?;
        Ok(())
    }
}

/// Notifier selected by the notify section.
pub fn build_notifier(config: &NotifyConfig) -> Result<Box<dyn Notifier>> {
    match config.sink.as_str() {
        "console" => Ok(Box::new(ConsoleNotifier::stdout(config.max_diff_chars))),
        "jsonl" => {
            let path = config
                .path
                .as_deref()
                .context("notify.path is required for the jsonl sink")?;
            Ok(Box::new(JsonlNotifier::append_to(Path::new(path))?))
        }
        other => anyhow::bail!("Unknown notify sink: {other}"),
    }
}
