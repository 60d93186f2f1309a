use std::io::Write;
use std::path::Path;

use serde_json::Value;

use crate::error::{Context, Result};
use crate::fetch::decode::value_to_string;

const SCALAR_COLUMN: &str = "value";

/// Column-oriented view over JSON records for CSV export.
///
/// Columns are the union of object keys in first-seen order. Records that are
/// not objects are placed under a single `value` column.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RecordTable {
    pub fn from_records(records: &[Value]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            match record {
                Value::Object(map) => {
                    for key in map.keys() {
                        if !columns.iter().any(|column| column == key) {
                            columns.push(key.clone());
                        }
                    }
                }
                _ => {
                    if !columns.iter().any(|column| column == SCALAR_COLUMN) {
                        columns.push(SCALAR_COLUMN.to_string());
                    }
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| match record {
                        Value::Object(map) => map.get(column).map(cell).unwrap_or_default(),
                        other if column == SCALAR_COLUMN => cell(other),
                        _ => String::new(),
                    })
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        if !self.columns.is_empty() {
            writer.write_record(&self.columns)?;
        }
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Persist the table so it can be opened in a spreadsheet later.
    pub fn save_to_csv<P: AsRef<Path>>(&self, file_path: P) -> Result<()> {
        let path = file_path.as_ref();
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create CSV file {}", path.display()))?;
        self.write_to(file)
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Array(_) | Value::Object(_) => value.to_string(),
        other => value_to_string(other),
    }
}
