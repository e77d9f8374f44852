use thiserror::Error;

/// Failures surfaced by the chart builder.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    #[error("Unsupported chart type: '{family}'")]
    UnsupportedChartType { family: String },
    #[error("No valid data rows for chart '{family}' with the selected columns")]
    NoValidData { family: String },
    #[error("Column '{column}' bound to role '{role}' does not exist in the data")]
    ColumnNotFound { role: String, column: String },
    #[error("Invalid option '{name}': {reason}")]
    InvalidOption { name: String, reason: String },
}

/// Failures while turning raw input into a row-set.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported data format: {format}")]
    UnsupportedFormat { format: String },
    #[error("Invalid data shape: {0}")]
    Shape(String),
}

pub type Result<T> = std::result::Result<T, ChartError>;
