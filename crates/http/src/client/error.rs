//! Client error types

use thiserror::Error;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Request was unauthorized (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Token refresh failed, or a retried request was still unauthorized
    #[error("Session expired")]
    SessionExpired,

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Create error from HTTP status code
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        let message = extract_message(&body, status);
        match status.as_u16() {
            400 => Self::BadRequest(message),
            401 => Self::Unauthorized(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            _ => Self::ServerError {
                status: status.as_u16(),
                message,
            },
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// The server-supplied message for status-derived errors, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized(m)
            | Self::NotFound(m)
            | Self::BadRequest(m)
            | Self::Forbidden(m)
            | Self::ServerError { message: m, .. } => Some(m.as_str()),
            _ => None,
        }
    }
}

/// Pull a human-readable message out of an error body. Backends answer
/// either with a bare string or with `{"message": "..."}` / `{"error": "..."}`.
fn extract_message(body: &str, status: reqwest::StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error", "title"] {
            if let Some(message) = value.get(key).and_then(|m| m.as_str()) {
                if !message.is_empty() {
                    return message.to_string();
                }
            }
        }
        if let Some(message) = value.as_str() {
            return message.to_string();
        }
    }
    if body.trim().is_empty() {
        status.to_string()
    } else {
        body.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn status_codes_map_to_variants() {
        assert!(matches!(
            ClientError::from_status(StatusCode::UNAUTHORIZED, String::new()),
            ClientError::Unauthorized(_)
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::NOT_FOUND, String::new()),
            ClientError::NotFound(_)
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::INTERNAL_SERVER_ERROR, String::new()),
            ClientError::ServerError { status: 500, .. }
        ));
    }

    #[test]
    fn json_message_fields_are_extracted() {
        let err = ClientError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"message":"Email is already taken"}"#.to_string(),
        );
        assert_eq!(err.server_message(), Some("Email is already taken"));

        let err = ClientError::from_status(
            StatusCode::UNAUTHORIZED,
            r#"{"error":"Invalid credentials"}"#.to_string(),
        );
        assert_eq!(err.server_message(), Some("Invalid credentials"));
    }

    #[test]
    fn plain_text_bodies_pass_through() {
        let err =
            ClientError::from_status(StatusCode::BAD_REQUEST, "password too short".to_string());
        assert_eq!(err.server_message(), Some("password too short"));
    }
}
