//! Error types for the tm-app service layer.

use std::path::PathBuf;

use tm_core::RunNumber;

/// Which bounded call of Tydex generation timed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TydexStage {
    RowFetch,
    Generation,
}

/// Classified Tydex generation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TydexError {
    #[error("No template_tydex found for run {run}")]
    MissingTemplate { run: RunNumber },

    #[error("Run {run} has not completed")]
    NotCompleted { run: RunNumber },

    #[error("Timed out during {stage:?}")]
    Timeout { stage: TydexStage },

    #[error("Failed to get row data: {0}")]
    RowFetch(String),

    #[error("Generator rejected the request: {0}")]
    Rejected(String),

    #[error("Generator call failed: {0}")]
    Backend(String),
}

impl TydexError {
    /// Text shown to the user for this failure.
    pub fn user_message(&self) -> String {
        let detail = match self {
            TydexError::Timeout {
                stage: TydexStage::RowFetch,
            } => "Request timeout while fetching the test configuration. Please try again.".to_string(),
            TydexError::Timeout {
                stage: TydexStage::Generation,
            } => "Request timeout. The TYDEX generation is taking too long. Please try again or check the server logs.".to_string(),
            TydexError::MissingTemplate { .. } => {
                "Missing template configuration for this test.".to_string()
            }
            TydexError::NotCompleted { run } => {
                format!("Run {run} must complete before its Tydex can be generated.")
            }
            TydexError::RowFetch(_) => {
                "Unable to fetch test configuration. Please refresh and try again.".to_string()
            }
            TydexError::Rejected(message) | TydexError::Backend(message) => message.clone(),
        };
        format!("Error generating Tydex: {detail}")
    }
}

/// Application error type wrapping the lower crates and the page operations.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Project name or protocol not found; reload the project")]
    ConfigurationMissing,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Sheet error: {0}")]
    Sheet(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Run {0} is not part of the rendered matrix")]
    RunNotRendered(RunNumber),

    #[error("Run {run} cannot be dispatched: {reason}")]
    RunUnavailable { run: RunNumber, reason: String },

    #[error("Run {run} failed: {message}")]
    Dispatch { run: RunNumber, message: String },

    #[error(transparent)]
    Tydex(#[from] TydexError),

    #[error("Project lifecycle error: {0}")]
    Lifecycle(String),

    #[error("Batch plan error: {0}")]
    Batch(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Backend error: {message}")]
    Backend { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for tm-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<tm_core::CoreError> for AppError {
    fn from(err: tm_core::CoreError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<tm_sheet::SheetError> for AppError {
    fn from(err: tm_sheet::SheetError) -> Self {
        AppError::Sheet(err.to_string())
    }
}

impl From<tm_store::StoreError> for AppError {
    fn from(err: tm_store::StoreError) -> Self {
        AppError::Store(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Export(err.to_string())
    }
}

impl AppError {
    /// Message for inline display; Tydex failures use their classified text.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Tydex(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}
