use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Invalid forecast point at index {index}: {details}")]
    InvalidForecastPoint { index: usize, details: String },

    #[error("Invalid starting balance {0}: must be a finite number")]
    InvalidBalance(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
