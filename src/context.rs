use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{RowSource, TicketService};

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub row_source: Arc<dyn RowSource>,
    pub tickets: Arc<dyn TicketService>,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        row_source: Arc<dyn RowSource>,
        tickets: Arc<dyn TicketService>,
    ) -> Self {
        Self {
            config,
            row_source,
            tickets,
        }
    }
}
