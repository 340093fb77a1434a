/// Client input that is incomplete or malformed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid date format for {field}: {value:?} (expected YYYY-MM-DD)")]
    BadDateFormat { field: &'static str, value: String },
}

/// Failures on the time-series path.
#[derive(Debug, thiserror::Error)]
pub enum TimeSeriesError {
    #[error("time-series transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("time-series engine returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("failed to read annotated CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("time-series engine reported a query error: {0}")]
    Query(String),
    #[error("field {field} could not be coerced from {value:?}")]
    Coercion { field: &'static str, value: String },
    #[error("record has no usable _time column")]
    MissingTimestamp,
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("patient not found: {0}")]
    NotFound(String),
    #[error("patient already exists: {0}")]
    Conflict(String),
    #[error("relational store error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("time-series store error: {0}")]
    TimeSeries(#[from] TimeSeriesError),
    #[error("stored record {patient_id} is malformed: {reason}")]
    MalformedRow { patient_id: String, reason: String },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
