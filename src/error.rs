use thiserror::Error;

pub type HistResult<T> = Result<T, HistError>;

#[derive(Debug, Error)]
pub enum HistError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}
