use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// Append-only JSON-lines log of submissions that still failed after the
/// group-less retry.
pub struct AuditLog {
    path: PathBuf,
}

#[derive(Debug, Serialize)]
struct AuditEntry<'a> {
    timestamp: String,
    request_payload: &'a Value,
    response_status: u16,
    response_body: &'a str,
}

impl AuditLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, request_payload: &Value, status: u16, body: &str) -> AppResult<()> {
        let entry = AuditEntry {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            request_payload,
            response_status: status,
            response_body: body,
        };
        let mut line = serde_json::to_string(&entry)
            .map_err(|err| AppError::AuditLog(format!("failed to encode entry: {err}")))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| {
                AppError::AuditLog(format!("failed to open {}: {err}", self.path.display()))
            })?;
        file.write_all(line.as_bytes()).map_err(|err| {
            AppError::AuditLog(format!("failed to write {}: {err}", self.path.display()))
        })?;
        Ok(())
    }
}
