use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// Log destinations for one import run. Installed as the default subscriber
/// of the current thread for as long as the returned guard lives, so runs and
/// tests never share a destination.
#[derive(Debug, Clone)]
pub struct LoggingContext {
    level: String,
    file: Option<PathBuf>,
    console: bool,
}

impl LoggingContext {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            file: None,
            console: true,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.log_level.clone()).with_file(config.log_file.clone())
    }

    pub fn with_file(mut self, path: PathBuf) -> Self {
        self.file = Some(path);
        self
    }

    pub fn without_console(mut self) -> Self {
        self.console = false;
        self
    }

    pub fn install(&self) -> AppResult<DefaultGuard> {
        let filter = EnvFilter::try_new(&self.level).map_err(|err| {
            AppError::Configuration(format!("invalid log level '{}': {err}", self.level))
        })?;

        let file_layer = match &self.file {
            Some(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Some(
                    fmt::layer()
                        .with_ansi(false)
                        .with_target(false)
                        .with_writer(Mutex::new(file)),
                )
            }
            None => None,
        };
        let console_layer = self
            .console
            .then(|| fmt::layer().with_target(false).with_writer(io::stderr));

        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .with(file_layer);
        Ok(tracing::subscriber::set_default(subscriber))
    }
}
