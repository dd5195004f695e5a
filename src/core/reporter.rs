//! User-facing progress reporting
//!
//! Components receive a `&dyn Reporter` instead of writing to the console
//! themselves, so a run can be observed (or silenced) by whoever drives it.

use std::sync::Mutex;

const PREFIX: &str = "[republish-npm]";

/// Severity of a reported line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLevel {
    Info,
    Success,
    Warn,
    Error,
}

/// Sink for progress and outcome messages
pub trait Reporter: Send + Sync {
    fn report(&self, level: ReportLevel, message: &str);

    fn info(&self, message: &str) {
        self.report(ReportLevel::Info, message);
    }

    fn success(&self, message: &str) {
        self.report(ReportLevel::Success, message);
    }

    fn warn(&self, message: &str) {
        self.report(ReportLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.report(ReportLevel::Error, message);
    }
}

/// Prints to stdout (info, success) and stderr (warn, error)
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&self, level: ReportLevel, message: &str) {
        match level {
            ReportLevel::Info => println!("{} {}", PREFIX, message),
            ReportLevel::Success => println!("{} ✅ {}", PREFIX, message),
            ReportLevel::Warn => eprintln!("{}[warn] ⚠️  {}", PREFIX, message),
            ReportLevel::Error => eprintln!("{}[error] ❌ {}", PREFIX, message),
        }
    }
}

/// A reported line, as recorded by [`MemoryReporter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub level: ReportLevel,
    pub message: String,
}

/// Records every line in memory
#[derive(Debug, Default)]
pub struct MemoryReporter {
    entries: Mutex<Vec<ReportEntry>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far
    pub fn entries(&self) -> Vec<ReportEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Messages reported at `level`
    pub fn messages(&self, level: ReportLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.level == level)
            .map(|entry| entry.message)
            .collect()
    }

    /// Whether any line at `level` contains `needle`
    pub fn contains(&self, level: ReportLevel, needle: &str) -> bool {
        self.messages(level).iter().any(|m| m.contains(needle))
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, level: ReportLevel, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(ReportEntry {
                level,
                message: message.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_reporter_records_levels() {
        let reporter = MemoryReporter::new();
        reporter.info("reading versions");
        reporter.warn("npm whoami failed");
        reporter.error("publish failed");

        assert_eq!(reporter.entries().len(), 3);
        assert_eq!(reporter.messages(ReportLevel::Warn), vec!["npm whoami failed"]);
        assert!(reporter.contains(ReportLevel::Error, "publish"));
        assert!(!reporter.contains(ReportLevel::Info, "publish"));
    }

    #[test]
    fn test_reporter_usable_as_trait_object() {
        let reporter = MemoryReporter::new();
        let sink: &dyn Reporter = &reporter;
        sink.success("done");

        assert_eq!(
            reporter.entries(),
            vec![ReportEntry {
                level: ReportLevel::Success,
                message: "done".to_string(),
            }]
        );
    }
}
