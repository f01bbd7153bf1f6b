//! Session actions.

use crate::constants::messages;
use crate::credential::Credential;
use crate::error::ClientError;
use crate::types::{LoginRequest, SignupRequest, User};
use uuid::Uuid;

/// How a session was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// Email and password login
    Login,
    /// Account registration (implies login)
    Signup,
}

impl AuthMethod {
    /// Success notification text.
    #[must_use]
    pub const fn success_message(self) -> &'static str {
        match self {
            Self::Login => messages::LOGIN_SUCCESS,
            Self::Signup => messages::SIGNUP_SUCCESS,
        }
    }

    /// Failure notification text when the server sent no message.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::Login => messages::LOGIN_FAILED,
            Self::Signup => messages::SIGNUP_FAILED,
        }
    }
}

/// Session actions.
///
/// Commands come from the [`SessionManager`](super::SessionManager); the
/// rest are results fed back by effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    // Commands
    /// Read the persisted token (once, at startup)
    Initialize,
    /// Fetch the user for the attached credential
    LoadUser,
    /// Log in with email and password
    Login {
        /// Matches the result action to the caller
        correlation_id: Uuid,
        /// Credentials
        request: LoginRequest,
    },
    /// Create an account and log in
    RegisterAccount {
        /// Matches the result action to the caller
        correlation_id: Uuid,
        /// Account data
        request: SignupRequest,
    },
    /// Log out (idempotent)
    Logout,
    /// A view saw the credential rejected
    Invalidate,

    // Results
    /// Persisted token read
    TokenLoaded {
        /// The token, if one was stored
        credential: Option<Credential>,
    },
    /// User fetched for `credential`
    UserLoaded {
        /// Credential the fetch was made with
        credential: Credential,
        /// The user
        user: User,
    },
    /// User fetch for `credential` failed
    UserLoadFailed {
        /// Credential the fetch was made with
        credential: Credential,
        /// Why
        error: ClientError,
    },
    /// Login or registration succeeded
    Authenticated {
        /// Correlation id of the command
        correlation_id: Uuid,
        /// Login or signup
        method: AuthMethod,
        /// Issued credential
        credential: Credential,
        /// The user
        user: User,
    },
    /// Login or registration failed
    AuthenticationFailed {
        /// Correlation id of the command
        correlation_id: Uuid,
        /// Login or signup
        method: AuthMethod,
        /// Why
        error: ClientError,
    },
}

impl SessionAction {
    /// Correlation id of a login/registration result.
    #[must_use]
    pub const fn result_for(&self) -> Option<Uuid> {
        match self {
            Self::Authenticated { correlation_id, .. }
            | Self::AuthenticationFailed { correlation_id, .. } => Some(*correlation_id),
            _ => None,
        }
    }
}
