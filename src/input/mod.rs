// src/input/mod.rs
//! Input file reading: CSV rows to `InputRow`s.

use crate::error::{AppError, InputError};
use crate::model::InputRow;
use crate::types::{ContentType, ValidatedUrl};
use std::io::Read;
use std::path::Path;

/// Column holding the source article URL.
pub const URL_COLUMN: &str = "URLs";
/// Column holding the comma-separated categories.
pub const CATEGORIES_COLUMN: &str = "Categories";

/// Reads every row of the CSV file at `path`.
pub fn read_rows(path: &Path, content_type: ContentType) -> Result<Vec<InputRow>, AppError> {
    let file = std::fs::File::open(path).map_err(|e| AppError::Input {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_rows(file, content_type).map_err(|e| AppError::Input {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Parses CSV with a header row. Other columns are ignored and empty lines skipped;
/// rows with a blank or invalid URL are logged and left out.
pub fn parse_rows<R: Read>(reader: R, content_type: ContentType) -> Result<Vec<InputRow>, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let url_index = headers
        .iter()
        .position(|h| h == URL_COLUMN)
        .ok_or(InputError::MissingColumn(URL_COLUMN))?;
    let categories_index = headers.iter().position(|h| h == CATEGORIES_COLUMN);

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let line = index + 2;

        let raw_url = record.get(url_index).unwrap_or_default();
        if raw_url.is_empty() {
            log::debug!("Line {}: no URL, skipping", line);
            continue;
        }

        let source_url = match ValidatedUrl::parse(raw_url) {
            Ok(url) => url,
            Err(e) => {
                log::warn!("Line {}: {}", line, e);
                continue;
            }
        };

        let categories = categories_index
            .and_then(|i| record.get(i))
            .unwrap_or_default();
        rows.push(InputRow::new(source_url, categories, content_type));
    }

    log::info!("Read {} input row(s)", rows.len());
    Ok(rows)
}
