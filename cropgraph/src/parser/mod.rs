//! Delimited record loading with encoding auto-detection.
//!
//! Reads a simulation output file into a [`Dataset`]: one [`Series`] per
//! column, one cell per data row. Column names come from the first header
//! line; any further header lines (units, descriptions) are skipped.

use std::collections::BTreeSet;
use std::path::Path;

use crate::config::Config;
use crate::error::{ConfigResult, RecordError, RecordResult};
use crate::models::{Cell, Dataset, Series};

/// How to read a record file.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Field delimiter
    pub delimiter: u8,
    /// Number of header lines (at least 1)
    pub header_lines: usize,
    /// Columns to keep; `None` keeps all of them
    pub columns: Option<BTreeSet<String>>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            header_lines: 1,
            columns: None,
        }
    }
}

impl LoadOptions {
    /// Options for reading inputs of `config`, keeping only the columns its graphs use.
    pub fn from_config(config: &Config) -> ConfigResult<Self> {
        Ok(Self {
            delimiter: config.delimiter_byte()?,
            header_lines: config.header_lines()?,
            columns: Some(config.required_columns()),
        })
    }

    fn wants(&self, column: &str) -> bool {
        self.columns.as_ref().map_or(true, |c| c.contains(column))
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Map chardet names onto the spellings decode_content handles
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Unknown encodings and invalid UTF-8 fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Load a record file from disk.
pub fn load_dataset(path: impl AsRef<Path>, options: &LoadOptions) -> RecordResult<Dataset> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| RecordError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let content = decode_content(&bytes, &detect_encoding(&bytes));
    parse_dataset(&content, path.display().to_string(), options)
}

/// Parse delimited text into a dataset.
pub fn parse_dataset(
    content: &str,
    origin: impl Into<String>,
    options: &LoadOptions,
) -> RecordResult<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());
    let mut records = reader.records();

    // First header line names the columns, the rest are skipped
    let mut header: Option<csv::StringRecord> = None;
    for found in 0..options.header_lines {
        match records.next() {
            Some(record) => {
                let record = record?;
                if header.is_none() {
                    header = Some(record);
                }
            }
            None => {
                return Err(RecordError::MissingHeader {
                    expected: options.header_lines,
                    found,
                })
            }
        }
    }
    let header = header.ok_or(RecordError::MissingHeader {
        expected: options.header_lines,
        found: 0,
    })?;

    // (name, field index) of every kept column, first occurrence wins
    let mut selected: Vec<(String, usize)> = Vec::new();
    for (index, name) in header.iter().enumerate() {
        let name = name.trim();
        if options.wants(name) && !selected.iter().any(|(n, _)| n == name) {
            selected.push((name.to_string(), index));
        }
    }

    let mut cells: Vec<Vec<Cell>> = vec![Vec::new(); selected.len()];
    for record in records {
        let record = record?;
        if record.len() != header.len() {
            return Err(RecordError::FieldCount {
                line: record.position().map(|p| p.line()).unwrap_or(0),
                expected: header.len(),
                found: record.len(),
            });
        }
        for ((_, index), column) in selected.iter().zip(cells.iter_mut()) {
            column.push(Cell::Text(record[*index].to_string()));
        }
    }

    let mut dataset = Dataset::new(origin);
    for ((name, _), column) in selected.into_iter().zip(cells) {
        dataset.insert(name, Series::new(column))?;
    }
    Ok(dataset)
}
