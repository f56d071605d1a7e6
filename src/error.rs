use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("row source error: {0}")]
    RowSource(String),
    #[error("ticket API responded with {status}: {body}")]
    TicketRejected { status: u16, body: String },
    #[error("ticket API transport error: {0}")]
    Transport(String),
    #[error("audit log error: {0}")]
    AuditLog(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
