use tracing::{debug, error, info};

use crate::context::AppContext;
use crate::domain::mapping::map_record;
use crate::domain::record::Record;
use crate::domain::ticket::ImportSummary;
use crate::error::AppResult;
use crate::services::{ProgressObserver, TicketService};

/// One pass over a set of records. A constructed run is idle, `execute`
/// drives it to completion and hands back the summary.
pub struct ImportRun<'a> {
    tickets: &'a dyn TicketService,
    observer: &'a dyn ProgressObserver,
}

impl<'a> ImportRun<'a> {
    pub fn new(tickets: &'a dyn TicketService, observer: &'a dyn ProgressObserver) -> Self {
        Self { tickets, observer }
    }

    pub async fn execute(self, records: &[Record]) -> ImportSummary {
        let total = records.len();
        let mut succeeded = 0;
        let mut failed_rows = Vec::new();
        self.observer.on_start(total);

        for (offset, record) in records.iter().enumerate() {
            let row = offset + 1;
            self.log(format!("Processing row {row}/{total}"));

            let mapped = map_record(record);
            for diagnostic in &mapped.diagnostics {
                self.observer.on_log(&format!("Row {row}: {diagnostic}"));
            }

            match self.tickets.submit(&mapped.payload).await {
                Ok(receipt) => {
                    succeeded += 1;
                    if receipt.retried_without_group {
                        self.log(format!("Row {row} created without group"));
                    } else {
                        debug!("Row {row} created (HTTP {})", receipt.status);
                    }
                }
                Err(err) => {
                    let line = format!("Row {row} failed: {err}");
                    error!("{line}");
                    self.observer.on_log(&line);
                    failed_rows.push(row);
                }
            }

            self.observer.on_progress(row, total);
        }

        let summary = ImportSummary {
            succeeded,
            total,
            failed_rows,
        };
        info!("{summary}");
        self.observer.on_complete(&summary);
        summary
    }

    fn log(&self, line: String) {
        info!("{line}");
        self.observer.on_log(&line);
    }
}

/// Loads every row from the context's source, then imports them in order.
/// Only a load failure aborts; row failures end up in the summary.
pub async fn import_tickets(
    ctx: &AppContext,
    observer: &dyn ProgressObserver,
) -> AppResult<ImportSummary> {
    let records = ctx.row_source.load()?;
    info!(
        "Importing {} rows from {}; failed retries go to {}",
        records.len(),
        ctx.row_source.describe(),
        ctx.config.error_log_file.display()
    );
    let run = ImportRun::new(ctx.tickets.as_ref(), observer);
    Ok(run.execute(&records).await)
}
