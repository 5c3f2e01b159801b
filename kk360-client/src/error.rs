//! Error types for the client boundary.

use crate::config::ConfigError;
use kk360_core::user_facing_message;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Server returned {status}: {message}")]
    Server { status: u16, message: String },
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
    #[error("Operation already in progress: {0}")]
    Busy(&'static str),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to init logging: {0}")]
    Logging(String),
}

impl ClientError {
    /// Message safe to show in a notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Server { message, .. } | Self::InvalidResponse(message) => {
                user_facing_message(message)
            }
            Self::Http(err) if err.is_timeout() => "The server took too long to respond.".to_string(),
            Self::Http(err) if err.is_connect() => "Could not reach the server.".to_string(),
            other => user_facing_message(&other.to_string()),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;
    use kk360_core::error::MARKUP_FALLBACK;

    #[test]
    fn test_server_markup_is_replaced() {
        let err = ClientError::Server {
            status: 502,
            message: "<!DOCTYPE html><html>Bad gateway</html>".to_string(),
        };
        assert_eq!(err.user_message(), MARKUP_FALLBACK);
    }

    #[test]
    fn test_server_message_passes_through() {
        let err = ClientError::Server {
            status: 404,
            message: "Application not found".to_string(),
        };
        assert_eq!(err.user_message(), "Application not found");
        assert_eq!(err.to_string(), "Server returned 404: Application not found");
    }
}
