use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Format error: {0}")]
    Format(String),

    #[error("Predictor error: {0}")]
    Predictor(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Batch cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConsoleError {
    /// Format error pointing at a specific input line (1-based) when determinable.
    pub fn format_at_line(line: usize, message: impl Into<String>) -> Self {
        ConsoleError::Format(format!("line {}: {}", line, message.into()))
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
