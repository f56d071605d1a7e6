use crate::domain::ticket::ImportSummary;

/// Receives progress from an import run. Calls arrive on the importing task,
/// one row at a time, with `current` strictly increasing.
pub trait ProgressObserver: Send + Sync {
    fn on_start(&self, _total: usize) {}
    fn on_progress(&self, current: usize, total: usize);
    fn on_log(&self, line: &str);
    fn on_complete(&self, summary: &ImportSummary);
}
