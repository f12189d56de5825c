use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unknown protocol: {0}")]
    UnknownProtocol(String),

    #[error("Invalid run number: {value}")]
    InvalidRunNumber { value: String },
}
