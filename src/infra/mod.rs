pub mod audit;
pub mod servicedesk;
pub mod spreadsheet;
pub mod terminal;
