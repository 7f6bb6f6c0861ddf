use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatArbError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Degenerate series: {0}")]
    DegenerateSeries(String),

    #[error("Invalid window: {window} for series of length {len}")]
    InvalidWindow { window: usize, len: usize },

    #[error("Misaligned series: {0}")]
    MisalignedSeries(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for StatArbError {
    fn from(e: serde_json::Error) -> Self {
        StatArbError::SerializationError(e.to_string())
    }
}
