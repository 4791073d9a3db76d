use thiserror::Error;

#[derive(Error, Debug)]
pub enum PieError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PieError {
    /// Whether the error came from the file system rather than from input.
    pub fn is_storage(&self) -> bool {
        matches!(self, PieError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, PieError>;
