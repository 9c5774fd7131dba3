use thiserror::Error;

#[derive(Error, Debug)]
pub enum MenuError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} is not configured")]
    NotConfigured(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Place lookup failed: {0}")]
    Places(String),

    #[error("Menu structuring failed: {0}")]
    Structuring(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl MenuError {
    /// Whether the error was caused by the caller rather than by an upstream
    /// service or the server configuration.
    pub fn is_client_error(&self) -> bool {
        matches!(self, MenuError::InvalidInput(_))
    }
}

pub type Result<T> = std::result::Result<T, MenuError>;
