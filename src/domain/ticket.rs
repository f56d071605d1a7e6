use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value, json};

/// Body of a ticket-creation request, before it is wrapped under `request`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TicketPayload {
    fields: Map<String, Value>,
}

impl TicketPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.fields.insert(key.to_string(), value);
    }

    /// Copy of this payload with `key` removed.
    pub fn without(&self, key: &str) -> Self {
        let mut fields = self.fields.clone();
        fields.remove(key);
        Self { fields }
    }

    /// The `{"request": ...}` envelope expected by the API.
    pub fn envelope(&self) -> Value {
        json!({ "request": self.fields })
    }
}

#[cfg(test)]
impl TicketPayload {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub status: u16,
    /// Set when the ticket was only accepted after dropping the group.
    pub retried_without_group: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub succeeded: usize,
    pub total: usize,
    pub failed_rows: Vec<usize>,
}

impl ImportSummary {
    pub fn is_clean(&self) -> bool {
        self.failed_rows.is_empty()
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Import complete: {}/{} succeeded.",
            self.succeeded, self.total
        )?;
        if !self.failed_rows.is_empty() {
            write!(f, " Failed rows: {:?}", self.failed_rows)?;
        }
        Ok(())
    }
}
