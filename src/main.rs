mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod logging;
mod services;
mod workflow;

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::import::{self as import_cmd, ImportArgs};
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::infra::audit::AuditLog;
use crate::infra::servicedesk::ServiceDeskClient;
use crate::infra::spreadsheet::SpreadsheetSource;
use crate::infra::terminal::TerminalProgress;
use crate::logging::LoggingContext;
use crate::services::RowSource;

/// Exit status when the run finished but some rows were not imported.
const PARTIAL_FAILURE_EXIT: u8 = 2;

#[derive(Parser)]
#[command(
    name = "sdp-import",
    author,
    version,
    about = "Import spreadsheet rows into ServiceDesk Plus MSP as requests"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create one request per spreadsheet row.
    Import(ImportArgs),
    /// Manage CLI configuration.
    Config(ConfigArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("Error: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> AppResult<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config(args) => {
            config_cmd::run(args.command)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Import(args) => run_import(args).await,
    }
}

async fn run_import(args: ImportArgs) -> AppResult<ExitCode> {
    let mut config = AppConfig::load()?;
    args.apply(&mut config);

    let mut logging = LoggingContext::from_config(&config);
    if args.quiet {
        logging = logging.without_console();
    }
    let _log_guard = logging.install()?;

    let base_url = config.base_url()?;
    let technician_key = config.technician_key()?.to_string();
    info!("Importing into {base_url}");

    let source = SpreadsheetSource::new(args.file.clone(), args.sheet.clone());
    let observer = TerminalProgress::stdout(source.describe()).echo_logs(args.quiet);
    let tickets = ServiceDeskClient::new(
        base_url,
        technician_key,
        AuditLog::new(config.error_log_file.clone()),
    )?;

    let context = AppContext::new(config, Arc::new(source), Arc::new(tickets));
    let summary = import_cmd::run(&context, &observer).await?;

    if summary.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(PARTIAL_FAILURE_EXIT))
    }
}
