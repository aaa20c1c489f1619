//! Row-oriented CSV tables.
//!
//! `Table` is the untyped form of every file the pipeline reads or writes:
//! a header row plus string cells. Empty cells stand for nulls.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::error::AppError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Load a CSV file with a header row.
    ///
    /// Fields that are not valid UTF-8 are decoded as latin-1, which is what the
    /// facilities exports use. Short rows are padded, long rows truncated.
    pub fn read_csv(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path)
            .map_err(|e| AppError::io(format!("Failed to open CSV '{}': {e}", path.display())))?;

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

        let columns: Vec<String> = reader
            .byte_headers()
            .map_err(|e| AppError::io(format!("Failed to read CSV headers of '{}': {e}", path.display())))?
            .iter()
            .map(decode_field)
            .collect();

        let width = columns.len();
        let mut rows = Vec::new();
        for (idx, result) in reader.byte_records().enumerate() {
            let record = result.map_err(|e| {
                AppError::io(format!(
                    "Failed to read CSV '{}' at line {}: {e}",
                    path.display(),
                    idx + 2
                ))
            })?;
            let mut row: Vec<String> = record.iter().take(width).map(decode_field).collect();
            row.resize(width, String::new());
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    /// Write the table with a header row.
    ///
    /// The file is written next to its destination and renamed into place, so a
    /// failed write never leaves a partial artifact behind.
    pub fn write_csv(&self, path: &Path) -> Result<(), AppError> {
        let tmp = temp_path(path);
        let result = self.write_csv_to(&tmp).and_then(|()| {
            fs::rename(&tmp, path).map_err(|e| {
                AppError::io(format!("Failed to move CSV into place at '{}': {e}", path.display()))
            })
        });
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }

    fn write_csv_to(&self, path: &Path) -> Result<(), AppError> {
        let mut writer = csv::Writer::from_path(path)
            .map_err(|e| AppError::io(format!("Failed to create CSV '{}': {e}", path.display())))?;
        writer
            .write_record(&self.columns)
            .map_err(|e| AppError::io(format!("Failed to write CSV header: {e}")))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|e| AppError::io(format!("Failed to write CSV row: {e}")))?;
        }
        writer
            .flush()
            .map_err(|e| AppError::io(format!("Failed to flush CSV '{}': {e}", path.display())))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Trimmed cell value, `None` for empty cells.
    pub fn value(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// Concatenate tables, taking the union of their columns in first-seen order.
    ///
    /// Cells for columns a table did not have are left empty.
    pub fn concat(tables: Vec<Table>) -> Table {
        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for col in &table.columns {
                if !columns.contains(col) {
                    columns.push(col.clone());
                }
            }
        }

        let mut out = Table::new(columns);
        for table in tables {
            let mapping: Vec<Option<usize>> = out
                .columns
                .iter()
                .map(|c| table.column_index(c))
                .collect();
            for row in table.rows {
                let merged = mapping
                    .iter()
                    .map(|idx| idx.and_then(|i| row.get(i).cloned()).unwrap_or_default())
                    .collect();
                out.rows.push(merged);
            }
        }
        out
    }
}

fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "table".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}
