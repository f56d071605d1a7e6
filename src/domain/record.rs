use chrono::NaiveDateTime;

/// Format used for date cells in the import spreadsheet.
pub const IMPORT_DATE_FORMAT: &str = "%d/%m/%Y %I:%M %p";

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Missing,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn text<S: Into<String>>(value: S) -> Self {
        let value = value.into();
        if value.is_empty() {
            CellValue::Missing
        } else {
            CellValue::Text(value)
        }
    }

    /// Trimmed text form of the cell, `None` for missing or blank cells.
    pub fn as_text(&self) -> Option<String> {
        let rendered = match self {
            CellValue::Missing => return None,
            CellValue::Text(value) => value.trim().to_string(),
            CellValue::Number(value) => format_number(*value),
            CellValue::Bool(value) => value.to_string(),
            CellValue::DateTime(value) => value.format(IMPORT_DATE_FORMAT).to_string(),
        };
        if rendered.is_empty() {
            None
        } else {
            Some(rendered)
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value >= i64::MIN as f64 && value <= i64::MAX as f64 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

/// One spreadsheet row, keyed by header name in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    cells: Vec<(String, CellValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<S: Into<String>>(&mut self, column: S, value: CellValue) {
        let column = column.into();
        match self.cells.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = value,
            None => self.cells.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn is_blank(&self) -> bool {
        self.cells
            .iter()
            .all(|(_, value)| value.as_text().is_none())
    }
}

#[cfg(test)]
impl Record {
    pub fn with<S: Into<String>>(mut self, column: S, value: CellValue) -> Self {
        self.insert(column, value);
        self
    }
}
