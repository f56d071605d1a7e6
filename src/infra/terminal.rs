use std::io::{self, Write};
use std::sync::Mutex;

use crate::domain::ticket::ImportSummary;
use crate::services::ProgressObserver;

/// Prints progress for headless runs. Turn off `echo_logs` when the
/// console log layer already prints the same lines.
pub struct TerminalProgress<W: Write + Send> {
    label: String,
    echo_logs: bool,
    out: Mutex<W>,
}

impl TerminalProgress<io::Stdout> {
    pub fn stdout(label: impl Into<String>) -> Self {
        Self::new(label, io::stdout())
    }
}

impl<W: Write + Send> TerminalProgress<W> {
    pub fn new(label: impl Into<String>, out: W) -> Self {
        Self {
            label: label.into(),
            echo_logs: true,
            out: Mutex::new(out),
        }
    }

    pub fn echo_logs(mut self, enabled: bool) -> Self {
        self.echo_logs = enabled;
        self
    }

    fn line(&self, text: &str) {
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out, "{text}");
        }
    }
}

#[cfg(test)]
impl<W: Write + Send> TerminalProgress<W> {
    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> ProgressObserver for TerminalProgress<W> {
    fn on_start(&self, total: usize) {
        self.line(&format!("Importing {} ({total} rows)", self.label));
    }

    fn on_progress(&self, current: usize, total: usize) {
        self.line(&format!("{current} of {total}"));
    }

    fn on_log(&self, line: &str) {
        if self.echo_logs {
            self.line(&format!("  {line}"));
        }
    }

    fn on_complete(&self, summary: &ImportSummary) {
        self.line(&summary.to_string());
    }
}
