use crate::error::DataError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;

/// One record: column name to raw value, in the column order of the source.
pub type Row = Map<String, Value>;

/// Ordered sequence of rows as produced by a file reader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowSet {
    rows: Vec<Row>,
}

impl RowSet {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Create a RowSet from a JSON array of objects (a lone object becomes one row)
    pub fn from_json(value: &Value) -> Result<Self, DataError> {
        let items: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            Value::Object(_) => vec![value],
            _ => {
                return Err(DataError::Shape(
                    "Input data must be a JSON array of objects".to_string(),
                ))
            }
        };

        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            let obj = item
                .as_object()
                .ok_or_else(|| DataError::Shape("Items in array must be objects".to_string()))?;
            let row: Row = obj
                .iter()
                .map(|(k, v)| (k.clone(), normalize_cell(v)))
                .collect();
            rows.push(row);
        }

        Ok(Self { rows })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, DataError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_json(&value)
    }

    /// Read CSV with a header row; every cell is kept as a string.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DataError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let mut row = Row::new();
            for (i, header) in headers.iter().enumerate() {
                // Short records leave trailing columns absent
                if let Some(cell) = record.get(i) {
                    row.insert(header.clone(), Value::String(cell.to_string()));
                }
            }
            rows.push(row);
        }

        Ok(Self { rows })
    }

    /// Dispatch on file extension (`csv` or `json`).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Self::from_csv_reader(std::fs::File::open(path)?),
            "json" => Self::from_json_str(&std::fs::read_to_string(path)?),
            other => Err(DataError::UnsupportedFormat {
                format: if other.is_empty() { "<none>".to_string() } else { other.to_string() },
            }),
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Column set: keys of the first row, in their original order.
    pub fn columns(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// True if any row carries the key.
    pub fn has_column(&self, name: &str) -> bool {
        self.rows.iter().any(|r| r.contains_key(name))
    }

    /// All cells of a column in row order (`None` where a row lacks the key).
    pub fn column_cells<'a>(&'a self, name: &'a str) -> impl Iterator<Item = Option<&'a Value>> + 'a {
        self.rows.iter().map(move |r| r.get(name))
    }
}

impl From<Vec<Row>> for RowSet {
    fn from(rows: Vec<Row>) -> Self {
        Self::new(rows)
    }
}

impl<'a> IntoIterator for &'a RowSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

// Booleans become strings; nested structures are kept as JSON text
fn normalize_cell(value: &Value) -> Value {
    match value {
        Value::Bool(b) => Value::String(b.to_string()),
        Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
        other => other.clone(),
    }
}
