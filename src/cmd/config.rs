use std::io::{self, Write};

use clap::{Args, Subcommand};

use crate::config::{StoredConfig, config_file_path};
use crate::error::AppResult;
use crate::infra::servicedesk::mask_secret;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Run the interactive configuration wizard.
    Init,
    /// Show the stored configuration (secrets masked).
    Show,
}

pub fn run(command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Init => run_init(),
        ConfigCommand::Show => run_show(),
    }
}

fn run_init() -> AppResult<()> {
    let mut cfg = StoredConfig::load()?;

    println!("Configuring sdp-import.");
    println!("Press Enter to keep the current value, '-' to clear it.");
    println!(
        "The technician key is stored in the local config file; \
         protect your filesystem accordingly."
    );
    println!();

    apply_prompt(
        "ServiceDesk domain (e.g., example.manageengine.com:8080)",
        &mut cfg.domain,
        false,
    )?;
    apply_prompt("Technician key", &mut cfg.technician_key, true)?;
    apply_prompt("Log file", &mut cfg.log_file, false)?;
    apply_prompt("Log level (error/warn/info/debug)", &mut cfg.log_level, false)?;
    apply_prompt("Error log file for failed retries", &mut cfg.error_log_file, false)?;

    cfg.save()?;

    let path = config_file_path()?;
    println!("\nConfiguration saved to {}", path.display());
    Ok(())
}

fn run_show() -> AppResult<()> {
    let cfg = StoredConfig::load()?;
    let path = config_file_path()?;

    println!("Configuration file: {}", path.display());
    println!("ServiceDesk domain: {}", display_value(&cfg.domain));
    println!(
        "Technician key: {}",
        mask_secret(cfg.technician_key.as_deref().unwrap_or(""))
    );
    println!("Log file: {}", display_value(&cfg.log_file));
    println!("Log level: {}", display_value(&cfg.log_level));
    println!("Error log file: {}", display_value(&cfg.error_log_file));

    Ok(())
}

fn apply_prompt(field: &str, target: &mut Option<String>, secret: bool) -> AppResult<()> {
    let action = prompt(field, target.as_deref(), secret)?;
    apply_action(action, target);
    Ok(())
}

fn apply_action(action: PromptAction, target: &mut Option<String>) {
    match action {
        PromptAction::Keep => {}
        PromptAction::Clear => *target = None,
        PromptAction::Set(value) => *target = Some(value),
    }
}

fn prompt(field: &str, current: Option<&str>, secret: bool) -> AppResult<PromptAction> {
    let mut stdout = io::stdout();

    match (current, secret) {
        (Some(_), true) => write!(stdout, "{field} [****] (Enter to keep, '-' to clear): ")?,
        (Some(value), false) => {
            write!(stdout, "{field} [{value}] (Enter to keep, '-' to clear): ")?
        }
        (None, _) => write!(stdout, "{field} (Enter to skip): ")?,
    }
    stdout.flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(PromptAction::parse(&input))
}

fn display_value(value: &Option<String>) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "<not set>".to_string())
}

#[derive(Debug, PartialEq)]
enum PromptAction {
    Keep,
    Clear,
    Set(String),
}

impl PromptAction {
    fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            PromptAction::Keep
        } else if trimmed == "-" {
            PromptAction::Clear
        } else {
            PromptAction::Set(trimmed.to_string())
        }
    }
}
