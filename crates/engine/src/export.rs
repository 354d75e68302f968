//! Delimited-text and JSON exports of a result view.

use std::borrow::{Borrow, Cow};

use csv::{QuoteStyle, Terminator, WriterBuilder};
use resultgrid_types::{CellValue, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::discover::DEFAULT_FALLBACK_NAME;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("delimited export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("export buffer error: {0}")]
    Io(#[from] std::io::Error),
    #[error("delimited export produced invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Field separator. Non-ASCII characters fall back to `,`.
    pub delimiter: char,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { delimiter: ',' }
    }
}

impl ExportOptions {
    fn delimiter_byte(&self) -> u8 {
        u8::try_from(self.delimiter).ok().filter(u8::is_ascii).unwrap_or(b',')
    }
}

/// Writes a header line plus one line per row, every field quoted.
///
/// Embedded quotes are doubled and line breaks collapse to a single space, so
/// the output always has `rows.len() + 1` lines. Absent cells export empty.
pub fn to_delimited<R: Borrow<Row>>(rows: &[R], columns: &[String], options: &ExportOptions) -> Result<String, ExportError> {
    if columns.is_empty() {
        if rows.is_empty() {
            return Ok(String::new());
        }
        return Ok("\n".repeat(rows.len() + 1));
    }

    let mut writer = WriterBuilder::new()
        .delimiter(options.delimiter_byte())
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let header: Vec<String> = columns.iter().map(|column| single_line(column).into_owned()).collect();
    writer.write_record(&header)?;
    for row in rows {
        let row = row.borrow();
        let fields: Vec<String> = columns
            .iter()
            .map(|column| {
                let raw = row.get(column).map(CellValue::to_raw_string).unwrap_or_default();
                single_line(&raw).into_owned()
            })
            .collect();
        writer.write_record(&fields)?;
    }

    let buffer = writer.into_inner().map_err(|error| ExportError::Io(error.into_error()))?;
    Ok(String::from_utf8(buffer)?)
}

/// Two-space indented JSON of the untouched source document.
pub fn to_pretty_json(document: &Value) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Default file name for a dataset export.
pub fn csv_file_name(dataset_name: &str) -> String {
    let stem = if dataset_name.trim().is_empty() {
        DEFAULT_FALLBACK_NAME
    } else {
        dataset_name.trim()
    };
    format!("{}.csv", sanitize_file_stem(stem))
}

/// Default file name for a raw document export.
pub fn json_file_name(job_id: &str) -> String {
    format!("job_{}.json", sanitize_file_stem(job_id.trim()))
}

fn sanitize_file_stem(stem: &str) -> String {
    stem.chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect()
}

fn single_line(text: &str) -> Cow<'_, str> {
    if text.contains(['\n', '\r']) {
        Cow::Owned(text.replace("\r\n", " ").replace(['\n', '\r'], " "))
    } else {
        Cow::Borrowed(text)
    }
}
