use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parsing error: {message}")]
    Parse { message: String },

    #[error("Plugin error: {plugin_type}: {message}")]
    Plugin { plugin_type: String, message: String },

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Timed out after {seconds}s: {operation}")]
    Timeout { operation: String, seconds: u64 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Implement conversion from validation errors
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("{}", err))
    }
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
