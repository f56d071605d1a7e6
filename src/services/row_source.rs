use crate::domain::record::Record;
use crate::error::AppResult;

/// Supplies the rows of one import, in input order.
pub trait RowSource: Send + Sync {
    fn describe(&self) -> String;
    fn load(&self) -> AppResult<Vec<Record>>;
}
