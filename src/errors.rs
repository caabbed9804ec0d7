use thiserror::Error;

/// Application-wide error type - single point of truth
#[derive(Error, Debug)]
pub enum AppError {
    /// Database operations (classification source or snapshot store unavailable)
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File I/O operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV processing
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration issues
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation/parsing
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Period key that does not parse for its granularity
    #[error("Invalid period key '{key}' for {period_type} period")]
    InvalidPeriodKey { key: String, period_type: String },

    /// Custom date range that is out of order or not representable
    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    /// Unknown report key, period type or dimension name
    #[error("Unknown {kind}: {value}")]
    Unknown { kind: &'static str, value: String },

    /// Invalid activity record in an import file
    #[error("Invalid activity record at line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },
}

/// Application-wide result type - single point of truth
pub type AppResult<T> = Result<T, AppError>;

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidData(format!("JSON error: {}", err))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
