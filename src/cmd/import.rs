use std::path::PathBuf;

use clap::Args;

use crate::config::AppConfig;
use crate::context::AppContext;
use crate::domain::ticket::ImportSummary;
use crate::error::AppResult;
use crate::services::ProgressObserver;
use crate::workflow::import::import_tickets;

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// Spreadsheet to import (.xlsx, .xls, .xlsb, .ods or .csv).
    pub file: PathBuf,
    /// ServiceDesk domain, e.g. sdp.example.com:8080.
    #[arg(short, long)]
    pub domain: Option<String>,
    /// Technician API key sent in the `authtoken` header.
    #[arg(short, long)]
    pub key: Option<String>,
    /// Worksheet to read instead of the first one.
    #[arg(short, long)]
    pub sheet: Option<String>,
    /// File receiving submissions that failed even after dropping the group.
    #[arg(long)]
    pub error_log: Option<PathBuf>,
    /// Only write logs to the log file, not to stderr.
    #[arg(short, long)]
    pub quiet: bool,
}

impl ImportArgs {
    /// Command-line values take precedence over the environment and stored config.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(domain) = &self.domain {
            config.domain = Some(domain.clone());
        }
        if let Some(key) = &self.key {
            config.technician_key = Some(key.clone());
        }
        if let Some(path) = &self.error_log {
            config.error_log_file = path.clone();
        }
    }
}

pub async fn run(ctx: &AppContext, observer: &dyn ProgressObserver) -> AppResult<ImportSummary> {
    import_tickets(ctx, observer).await
}
