//! Spreadsheet export of the student table.
//!
//! One header row followed by one row per record, numbered from 1 in the
//! order given.

use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use serde::Deserialize;
use thiserror::Error;

use crate::models::StudentRecord;

pub const HEADERS: [&str; 5] = ["S.No", "Student Name", "Class", "Joined Year", "Total Hours"];

pub const SHEET_NAME: &str = "Students";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No data to download")]
    Empty,

    #[error("Failed to build spreadsheet: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("Failed to build CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to build CSV: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "Excel",
            ExportFormat::Csv => "CSV",
        }
    }
}

/// One exported line.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub serial: usize,
    pub name: String,
    pub class: String,
    pub joined_year: i32,
    pub total_hours: f64,
}

/// A finished download.
#[derive(Debug)]
pub struct ExportArtifact {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Project records onto export rows. Fails when there is nothing to export.
pub fn rows<'a, I>(records: I) -> Result<Vec<ExportRow>, ExportError>
where
    I: IntoIterator<Item = &'a StudentRecord>,
{
    let rows: Vec<ExportRow> = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| ExportRow {
            serial: index + 1,
            name: record.name.clone(),
            class: record.class.clone(),
            joined_year: record.joined_year,
            total_hours: record.total_hours,
        })
        .collect();

    if rows.is_empty() {
        return Err(ExportError::Empty);
    }
    Ok(rows)
}

/// `student_attendance_<date>.<ext>`
pub fn filename(date: NaiveDate, format: ExportFormat) -> String {
    format!(
        "student_attendance_{}.{}",
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

pub fn to_xlsx(rows: &[ExportRow]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    worksheet.set_name(SHEET_NAME)?;

    let header = Format::new().set_bold();
    for (col, label) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *label, &header)?;
    }

    for (index, row) in rows.iter().enumerate() {
        let r = (index + 1) as u32;
        worksheet.write_number(r, 0, row.serial as f64)?;
        worksheet.write_string(r, 1, &row.name)?;
        worksheet.write_string(r, 2, &row.class)?;
        worksheet.write_number(r, 3, f64::from(row.joined_year))?;
        worksheet.write_number(r, 4, row.total_hours)?;
    }

    workbook.push_worksheet(worksheet);
    Ok(workbook.save_to_buffer()?)
}

pub fn to_csv(rows: &[ExportRow]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADERS)?;

    for row in rows {
        writer.write_record([
            row.serial.to_string(),
            row.name.clone(),
            row.class.clone(),
            row.joined_year.to_string(),
            row.total_hours.to_string(),
        ])?;
    }

    writer.into_inner().map_err(|e| e.into_error().into())
}

/// Build the download for `records` in the given order.
pub fn export<'a, I>(
    records: I,
    format: ExportFormat,
    date: NaiveDate,
) -> Result<ExportArtifact, ExportError>
where
    I: IntoIterator<Item = &'a StudentRecord>,
{
    let rows = rows(records)?;
    let bytes = match format {
        ExportFormat::Xlsx => to_xlsx(&rows)?,
        ExportFormat::Csv => to_csv(&rows)?,
    };

    tracing::debug!(rows = rows.len(), format = format.extension(), "Export built");

    Ok(ExportArtifact {
        filename: filename(date, format),
        content_type: format.content_type(),
        bytes,
    })
}
