use dropsync_core::domain::{SyncCounters, WriteMode};
use dropsync_core::ports::{IProgressReporter, Outcome, SyncEvent};
use dropsync_sync::engine::RunStatus;
use serde::Serialize;

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Trait for formatting CLI output
pub trait OutputFormatter {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    fn info(&self, message: &str);
    fn print_json(&self, value: &serde_json::Value);
}

/// Human-readable output formatter with checkmarks and indentation
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn success(&self, message: &str) {
        println!("\u{2713} {}", message);
    }
    fn error(&self, message: &str) {
        eprintln!("\u{2717} Error: {}", message);
    }
    fn warn(&self, message: &str) {
        eprintln!("\u{26a0} Warning: {}", message);
    }
    fn info(&self, message: &str) {
        println!("  {}", message);
    }
    fn print_json(&self, _value: &serde_json::Value) {
        // Human formatter doesn't print JSON
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn success(&self, message: &str) {
        println!(
            "{}",
            serde_json::json!({"success": true, "message": message})
        );
    }
    fn error(&self, message: &str) {
        eprintln!(
            "{}",
            serde_json::json!({"success": false, "error": message})
        );
    }
    fn warn(&self, message: &str) {
        eprintln!(
            "{}",
            serde_json::json!({"level": "warning", "message": message})
        );
    }
    fn info(&self, _message: &str) {}
    fn print_json(&self, value: &serde_json::Value) {
        println!("{}", value);
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn OutputFormatter + Send + Sync> {
    match format {
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Human => Box::new(HumanFormatter),
    }
}

// ============================================================================
// Per-file progress
// ============================================================================

/// How an event is shown in human output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Success,
    Warning,
    Error,
    Plain,
}

fn describe(event: &SyncEvent) -> (Tone, String) {
    let path = &event.path;
    match &event.outcome {
        Outcome::Uploaded { mode, bytes } => {
            let verb = match mode {
                WriteMode::Add => "Uploaded",
                WriteMode::Overwrite => "Updated",
            };
            (Tone::Success, format!("{} {} ({} bytes)", verb, path, bytes))
        }
        Outcome::Downloaded { overwrite, bytes } => {
            let verb = if *overwrite { "Refreshed" } else { "Downloaded" };
            (Tone::Success, format!("{} {} ({} bytes)", verb, path, bytes))
        }
        Outcome::Skipped { reason } => (Tone::Plain, format!("Skipped {}: {}", path, reason)),
        Outcome::Conflict { conflict } => {
            (Tone::Warning, format!("Conflict at {}: {}", path, conflict))
        }
        Outcome::Failed { error } => (Tone::Error, format!("{}: {}", path, error)),
    }
}

/// Prints one line per file outcome through an [`OutputFormatter`]
///
/// Skips are only shown when not in quiet mode.
pub struct ConsoleReporter {
    formatter: Box<dyn OutputFormatter + Send + Sync>,
    quiet: bool,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        Self {
            formatter: get_formatter(OutputFormat::Human),
            quiet,
        }
    }
}

impl IProgressReporter for ConsoleReporter {
    fn report(&self, event: &SyncEvent) {
        let (tone, line) = describe(event);
        match tone {
            Tone::Success => self.formatter.success(&line),
            Tone::Warning => self.formatter.warn(&line),
            Tone::Error => self.formatter.error(&line),
            Tone::Plain if !self.quiet => self.formatter.info(&line),
            Tone::Plain => {}
        }
    }
}

/// Prints every event as one JSON object per line
pub struct JsonReporter;

impl IProgressReporter for JsonReporter {
    fn report(&self, event: &SyncEvent) {
        match serde_json::to_string(event) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::warn!(error = %e, "Cannot serialize event"),
        }
    }
}

// ============================================================================
// Run summary
// ============================================================================

#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub status: &'static str,
    pub counters: &'a SyncCounters,
    pub runtime: String,
}

impl<'a> RunSummary<'a> {
    pub fn new(status: Option<RunStatus>, counters: &'a SyncCounters, runtime: String) -> Self {
        let status = match status {
            Some(RunStatus::Completed) => "completed",
            Some(RunStatus::Aborted) => "aborted",
            None => "failed",
        };
        Self {
            status,
            counters,
            runtime,
        }
    }

    /// The closing counter lines, in print order
    pub fn lines(&self) -> Vec<String> {
        let c = self.counters;
        vec![
            format!("New files uploaded: {}", c.uploaded_new),
            format!("Updated files uploaded: {}", c.uploaded_updated),
            format!("Total bytes uploaded: {}", c.bytes_uploaded),
            format!("New files downloaded: {}", c.downloaded_new),
            format!("Updated files downloaded: {}", c.downloaded_updated),
            format!("Total bytes downloaded: {}", c.bytes_downloaded),
            format!("Runtime: {}", self.runtime),
        ]
    }

    pub fn print(&self, formatter: &dyn OutputFormatter, format: OutputFormat) {
        match format {
            OutputFormat::Json => match serde_json::to_value(self) {
                Ok(value) => formatter.print_json(&value),
                Err(e) => formatter.error(&format!("Cannot serialize summary: {}", e)),
            },
            OutputFormat::Human => {
                match self.status {
                    "completed" => formatter.success("Sync completed"),
                    "aborted" => formatter.warn("Sync aborted"),
                    _ => {}
                }
                for line in self.lines() {
                    formatter.info(&line);
                }
            }
        }
    }
}
