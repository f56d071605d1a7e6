pub mod mapping;
pub mod record;
pub mod ticket;
