use std::path::{Path, PathBuf};

use calamine::{Data, Reader, open_workbook_auto};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use tracing::info;

use crate::domain::record::{CellValue, Record};
use crate::error::{AppError, AppResult};
use crate::services::RowSource;

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];
const MILLIS_PER_DAY: f64 = 86_400_000.0;
// Well inside both the i64 and TimeDelta millisecond ranges.
const MAX_SERIAL_MILLIS: f64 = 1.0e17;

/// Reads rows from a workbook or CSV file. The first row holds the headers.
pub struct SpreadsheetSource {
    path: PathBuf,
    sheet: Option<String>,
}

impl SpreadsheetSource {
    pub fn new(path: PathBuf, sheet: Option<String>) -> Self {
        Self { path, sheet }
    }

    fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default()
    }
}

impl RowSource for SpreadsheetSource {
    fn describe(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    fn load(&self) -> AppResult<Vec<Record>> {
        info!("Loading spreadsheet: {}", self.path.display());
        let extension = self.extension();
        let records = if extension == "csv" {
            read_csv(&self.path)?
        } else if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
            read_workbook(&self.path, self.sheet.as_deref())?
        } else {
            return Err(AppError::RowSource(format!(
                "unsupported file type '{}' for {}",
                extension,
                self.path.display()
            )));
        };
        info!("Loaded {} rows", records.len());
        Ok(records)
    }
}

fn read_workbook(path: &Path, sheet: Option<&str>) -> AppResult<Vec<Record>> {
    let mut workbook = open_workbook_auto(path).map_err(|err| {
        AppError::RowSource(format!("failed to open {}: {err}", path.display()))
    })?;

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| AppError::RowSource(format!("{} has no sheets", path.display())))?,
    };

    let range = workbook.worksheet_range(&sheet_name).map_err(|err| {
        AppError::RowSource(format!("failed to read sheet '{sheet_name}': {err}"))
    })?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header_row.iter().map(header_text).collect();

    let records = rows
        .map(|row| {
            let mut record = Record::new();
            for (header, cell) in headers.iter().zip(row.iter()) {
                if !header.is_empty() {
                    record.insert(header.clone(), cell_value(cell));
                }
            }
            record
        })
        .filter(|record| !record.is_blank())
        .collect();
    Ok(records)
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(text) => text.clone(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Missing,
        Data::String(text) => CellValue::text(text.as_str()),
        Data::Int(value) => CellValue::Number(*value as f64),
        Data::Float(value) => CellValue::Number(*value),
        Data::Bool(value) => CellValue::Bool(*value),
        Data::DateTime(value) => {
            let serial = value.as_f64();
            excel_serial_to_datetime(serial)
                .map(CellValue::DateTime)
                .unwrap_or(CellValue::Number(serial))
        }
        Data::DateTimeIso(text) => NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
            .map(CellValue::DateTime)
            .unwrap_or_else(|_| CellValue::text(text.as_str())),
        Data::DurationIso(text) => CellValue::text(text.as_str()),
    }
}

// Assumes the 1900 date system.
fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * MILLIS_PER_DAY).round();
    if !millis.is_finite() || millis.abs() > MAX_SERIAL_MILLIS {
        return None;
    }
    epoch.checked_add_signed(TimeDelta::try_milliseconds(millis as i64)?)
}

fn read_csv(path: &Path) -> AppResult<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|err| AppError::RowSource(format!("failed to open {}: {err}", path.display())))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|err| AppError::RowSource(format!("failed to read CSV headers: {err}")))?
        .iter()
        .map(|header| header.to_string())
        .collect();

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.map_err(|err| {
            AppError::RowSource(format!("failed to read CSV row {}: {err}", index + 1))
        })?;
        let mut record = Record::new();
        for (position, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let value = row
                .get(position)
                .map(CellValue::text)
                .unwrap_or(CellValue::Missing);
            record.insert(header.clone(), value);
        }
        if !record.is_blank() {
            records.push(record);
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use rust_xlsxwriter::{Format, Workbook, XlsxError};

    use super::*;

    fn write_workbook(path: &Path) -> Result<(), XlsxError> {
        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("dd/mm/yyyy hh:mm");

        let first = workbook.add_worksheet();
        first.write_string(0, 0, "Subject")?;
        first.write_string(0, 1, "Level")?;
        first.write_string(0, 2, "Created Time")?;
        first.write_string(0, 3, "Group")?;
        first.write_string(1, 0, "Printer jammed")?;
        first.write_number(1, 1, 3.0)?;
        first.write_number_with_format(1, 2, 45285.604166666664, &date_format)?;
        first.write_string(1, 3, "Not Assigned")?;
        first.write_string(3, 0, "VPN down")?;

        let second = workbook.add_worksheet();
        second.set_name("Tickets")?;
        second.write_string(0, 0, "Subject")?;
        second.write_string(1, 0, "From second sheet")?;

        workbook.save(path)
    }

    #[test]
    fn reads_first_sheet_of_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickets.xlsx");
        write_workbook(&path).unwrap();

        let source = SpreadsheetSource::new(path, None);
        assert_eq!(source.describe(), "tickets.xlsx");

        let records = source.load().unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(
            first.get("Subject").and_then(CellValue::as_text).as_deref(),
            Some("Printer jammed")
        );
        assert_eq!(
            first.get("Level").and_then(CellValue::as_text).as_deref(),
            Some("3")
        );
        assert_eq!(
            first
                .get("Created Time")
                .and_then(CellValue::as_text)
                .as_deref(),
            Some("25/12/2023 02:30 PM")
        );
        assert_eq!(
            records[1].get("Level").and_then(CellValue::as_text),
            None
        );
    }

    #[test]
    fn reads_named_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickets.xlsx");
        write_workbook(&path).unwrap();

        let records = SpreadsheetSource::new(path, Some("Tickets".to_string()))
            .load()
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].get("Subject").and_then(CellValue::as_text).as_deref(),
            Some("From second sheet")
        );
    }

    #[test]
    fn unknown_sheet_is_a_row_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickets.xlsx");
        write_workbook(&path).unwrap();

        let err = SpreadsheetSource::new(path, Some("Missing".to_string()))
            .load()
            .unwrap_err();
        assert!(matches!(err, AppError::RowSource(_)));
    }

    #[test]
    fn reads_csv_with_short_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickets.csv");
        std::fs::write(
            &path,
            "Subject,Priority,udf_pick_1\nPrinter jammed,High,Hardware\nVPN down\n,,\n",
        )
        .unwrap();

        let records = SpreadsheetSource::new(path, None).load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].get("udf_pick_1"),
            Some(&CellValue::Text("Hardware".to_string()))
        );
        assert_eq!(records[1].get("Priority"), Some(&CellValue::Missing));
    }

    #[test]
    fn rejects_unknown_extension() {
        let err = SpreadsheetSource::new(PathBuf::from("tickets.txt"), None)
            .load()
            .unwrap_err();
        assert!(matches!(err, AppError::RowSource(_)));
    }

    #[test]
    fn missing_file_is_a_row_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SpreadsheetSource::new(dir.path().join("absent.xlsx"), None)
            .load()
            .unwrap_err();
        assert!(matches!(err, AppError::RowSource(_)));
    }

    #[test]
    fn converts_excel_serials() {
        let converted = excel_serial_to_datetime(45285.5).unwrap();
        assert_eq!(converted.to_string(), "2023-12-25 12:00:00");
    }

    #[test]
    fn out_of_range_serials_do_not_convert() {
        assert_eq!(excel_serial_to_datetime(-1.0e20), None);
        assert_eq!(excel_serial_to_datetime(1.0e20), None);
        assert_eq!(excel_serial_to_datetime(f64::NAN), None);
        assert_eq!(excel_serial_to_datetime(f64::INFINITY), None);
    }

    #[test]
    fn huge_date_cell_loads_as_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickets.xlsx");
        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("dd/mm/yyyy hh:mm");
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Created Time").unwrap();
        sheet
            .write_number_with_format(1, 0, -1.0e20, &date_format)
            .unwrap();
        workbook.save(&path).unwrap();

        let records = SpreadsheetSource::new(path, None).load().unwrap();
        assert_eq!(records.len(), 1);
        assert!(!matches!(
            records[0].get("Created Time"),
            Some(CellValue::DateTime(_))
        ));
    }
}
