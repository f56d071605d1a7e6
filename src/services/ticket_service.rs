use async_trait::async_trait;

use crate::domain::ticket::{SubmissionReceipt, TicketPayload};
use crate::error::AppResult;

#[async_trait]
pub trait TicketService: Send + Sync {
    async fn submit(&self, payload: &TicketPayload) -> AppResult<SubmissionReceipt>;
}
