use thiserror::Error;

/// Fatal transform failures. Soft conditions (unparsable timestamps,
/// results that filter down to zero rows) never surface here.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("no input tables supplied")]
    NoInput,

    #[error("max_position must be between 1 and 100, got {value}")]
    MaxPositionOutOfRange { value: u32 },

    #[error("{input}: CSV error: {source}")]
    Csv {
        input: String,
        #[source]
        source: csv::Error,
    },

    #[error("{input}: missing required column '{column}'")]
    MissingColumn {
        input: String,
        column: &'static str,
    },

    #[error("{input} row {row}: no value in required column '{column}'")]
    MissingValue {
        input: String,
        row: usize,
        column: &'static str,
    },

    #[error("{input} row {row}: column '{column}' value '{value}' is not an integer")]
    InvalidInteger {
        input: String,
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("{input} row {row}: traffic must be non-negative, got {value}")]
    NegativeTraffic {
        input: String,
        row: usize,
        value: i64,
    },

    #[error("invalid branded term pattern: {source}")]
    BrandedPattern {
        #[source]
        source: regex::Error,
    },
}

pub type Result<T> = std::result::Result<T, TransformError>;
