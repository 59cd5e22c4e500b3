use thiserror::Error;

/// Everything the relay kernel can refuse to do.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Ingest input matched neither the single-record nor the batch shape,
    /// or no record in it was usable.
    #[error("malformed telemetry payload: {0}")]
    MalformedPayload(String),

    #[error("a recording is already in progress")]
    AlreadyRecording,

    #[error("no recording is in progress")]
    NotRecording,

    #[error("replay '{0}' not found")]
    NotFound(String),

    /// On-disk replay archive failed. Never leaves in-memory state half-applied.
    #[error("replay archive error: {0}")]
    Archive(String),
}

impl From<std::io::Error> for RelayError {
    fn from(e: std::io::Error) -> Self {
        RelayError::Archive(e.to_string())
    }
}

pub type RelayResult<T> = Result<T, RelayError>;
