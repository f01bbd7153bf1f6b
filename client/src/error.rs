//! Error types for API calls, token storage and configuration.

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Failure taxonomy for everything the client talks to.
///
/// Every failure is terminal for the attempt that produced it. Nothing in
/// this crate retries automatically.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    // ═══════════════════════════════════════════════════════════
    // Remote API
    // ═══════════════════════════════════════════════════════════
    /// No response was received (DNS, connect, TLS, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// The credential was missing, invalid or expired (HTTP 401).
    #[error("Unauthorized")]
    Unauthorized {
        /// Message supplied by the server, if any
        message: Option<String>,
    },

    /// The requested resource does not exist (HTTP 404).
    #[error("Not found")]
    NotFound {
        /// Message supplied by the server, if any
        message: Option<String>,
    },

    /// The server refused the request (validation or business rule).
    #[error("Request rejected with status {status}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Message supplied by the server, if any
        message: Option<String>,
    },

    /// The response body did not match the expected schema.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    // ═══════════════════════════════════════════════════════════
    // Local
    // ═══════════════════════════════════════════════════════════
    /// Reading or writing the persisted token failed.
    #[error("Token storage error: {0}")]
    Storage(String),

    /// Configuration value is missing or malformed.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// The server-supplied message, when the server sent one.
    ///
    /// # Examples
    ///
    /// ```
    /// # use eventdesk_client::ClientError;
    /// let error = ClientError::Rejected {
    ///     status: 400,
    ///     message: Some("Event is full".to_string()),
    /// };
    /// assert_eq!(error.server_message(), Some("Event is full"));
    /// assert_eq!(ClientError::Network("reset".into()).server_message(), None);
    /// ```
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { message }
            | Self::NotFound { message }
            | Self::Rejected { message, .. } => {
                message.as_deref().filter(|m| !m.trim().is_empty())
            },
            Self::Network(_) | Self::Decode(_) | Self::Storage(_) | Self::Config(_) => None,
        }
    }

    /// Text to show the user: the server message, else `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }

    /// Returns `true` if the credential was rejected.
    ///
    /// Authentication failures always end the session.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Returns `true` if the resource does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
