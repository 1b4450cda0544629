//! Error types for the whatsup service

/// Errors that can occur in the whatsup service
#[derive(Debug, thiserror::Error)]
pub enum WhatsupError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The transport failed: DNS, refused, reset, TLS or a broken body
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("State store error: {0}")]
    StateStore(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for whatsup operations
pub type Result<T> = std::result::Result<T, WhatsupError>;
