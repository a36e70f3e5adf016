//! Shared error taxonomy for the client core

/// Result type for session and auth operations
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Errors surfaced by the session manager and request client.
///
/// Clone + PartialEq so a single refresh outcome can be fanned out to every
/// queued waiter and asserted on in tests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Bad credentials or a malformed login response; the session state is
    /// unaffected and the message is fit to show on the login form.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// Server rejected a registration; the message carries the server's
    /// validation error where one was supplied.
    #[error("Registration failed: {message}")]
    RegistrationFailed { message: String },

    /// Token refresh failed or a retried request was still unauthorized.
    /// Terminal for the current session.
    #[error("Session expired")]
    SessionExpired,

    /// Transport failure; retryable, does not invalidate the session.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Corrupt persisted session record. Handled internally by clearing the
    /// store; never shown to a user.
    #[error("Malformed persisted session")]
    MalformedSession,
}

impl AuthError {
    pub fn authentication_failed(message: impl Into<String>) -> Self {
        Self::AuthenticationFailed {
            message: message.into(),
        }
    }

    pub fn registration_failed(message: impl Into<String>) -> Self {
        Self::RegistrationFailed {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }
}
