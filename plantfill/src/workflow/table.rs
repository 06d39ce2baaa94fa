//! Tabular input/output
//!
//! A [`PlantTable`] is a header row plus string cells, read from and written
//! to CSV. Short rows are padded and long rows truncated to the header width
//! on load, so every row can be indexed by any header position.

use crate::error::{EnrichError, EnrichResult};
use crate::models::RecordField;
use std::io::{Read, Write};
use std::path::Path;

/// Provenance JSON column
pub const DATA_SOURCES_COLUMN: &str = "DATA_SOURCES";
/// Confidence score column
pub const CONFIDENCE_SCORE_COLUMN: &str = "CONFIDENCE_SCORE";
/// Last-updated timestamp column
pub const LAST_UPDATED_COLUMN: &str = "LAST_UPDATED";

/// Columns appended to every enriched table
pub const METADATA_COLUMNS: [&str; 3] = [DATA_SOURCES_COLUMN, CONFIDENCE_SCORE_COLUMN, LAST_UPDATED_COLUMN];

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlantTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl PlantTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn read_csv(path: &Path) -> EnrichResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> EnrichResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut table = Self::new(headers);
        for result in csv_reader.records() {
            let record = result?;
            table.push_row(record.iter().map(str::to_string).collect());
        }
        Ok(table)
    }

    pub fn write_csv(&self, path: &Path) -> EnrichResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::File::create(path)?;
        self.to_writer(file)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> EnrichResult<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.headers)?;
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row, fitted to the header width
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    /// Header position, matched case-insensitively
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.eq_ignore_ascii_case(name))
    }

    /// Position of a column, appending it (blank in every row) if absent
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(index) = self.column_index(name) {
            return index;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    /// Position of the species column
    ///
    /// # Errors
    /// `MissingColumn` if the table has no `SPECIES` header.
    pub fn species_column(&self) -> EnrichResult<usize> {
        self.column_index(RecordField::Species.column())
            .ok_or_else(|| EnrichError::MissingColumn(RecordField::Species.column().to_string()))
    }

    /// Cell text, empty when the column is absent
    pub fn cell<'a>(&self, row: &'a [String], column: Option<usize>) -> &'a str {
        column.and_then(|i| row.get(i)).map(String::as_str).unwrap_or("")
    }
}
