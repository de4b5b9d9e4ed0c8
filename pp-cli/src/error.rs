//! CLI Error Types

use thiserror::Error;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// API connection error
    #[error("API connection error: {message}")]
    ConnectionError { message: String },

    /// API request failed
    #[error("API request failed: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Server failed to start or stopped with an error
    #[error("Server error: {message}")]
    ServerError { message: String },

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] pp_store::StoreError),

    /// Error raised while building the API state
    #[error("{0}")]
    Api(#[from] pp_api::ApiError),

    /// File I/O error
    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub fn config(message: impl Into<String>) -> Self {
        CliError::ConfigError {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        CliError::ConnectionError {
            message: message.into(),
        }
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        CliError::ApiError {
            status,
            message: message.into(),
        }
    }

    pub fn server(message: impl Into<String>) -> Self {
        CliError::ServerError {
            message: message.into(),
        }
    }

    /// Get exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::ConfigError { .. } => 1,
            CliError::ConnectionError { .. } => 3,
            CliError::ApiError { .. } => 4,
            CliError::IoError(_) => 5,
            CliError::JsonError(_) => 6,
            CliError::HttpError(_) => 7,
            CliError::Api(_) => 10,
            CliError::ServerError { .. } => 30,
            CliError::DatabaseError(_) => 31,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CliError::config("PP_JWT_SECRET must be set");
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("PP_JWT_SECRET"));
    }

    #[test]
    fn test_api_error() {
        let err = CliError::api(503, "unhealthy");
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_store_error_converts() {
        let err: CliError = pp_store::StoreError::Database("refused".to_string()).into();
        assert_eq!(err.exit_code(), 31);
    }
}
