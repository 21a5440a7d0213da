use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataQualityError {
    #[error("Missing required column '{column}' in {table}")]
    MissingColumn { table: String, column: String },

    #[error("Invalid tolerance {0}: must be non-negative")]
    InvalidTolerance(f64),

    #[error("Unparsable date '{value}' ({context})")]
    DateParse { context: String, value: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DataQualityError>;
