pub mod progress;
pub mod row_source;
pub mod ticket_service;

pub use progress::ProgressObserver;
pub use row_source::RowSource;
pub use ticket_service::TicketService;
