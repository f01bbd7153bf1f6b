//! Session state.

use crate::credential::Credential;
use crate::types::User;

/// Where the session is in its lifecycle.
///
/// ```text
/// Uninitialized ──(no token)────────────────────────▶ LoggedOut
///       │                                               ▲   │
///   (token found)                   (loadUser fails,    │   │ (login/register)
///       ▼                            logout, 401)       │   ▼
///    Loading ──(user fetched)──▶ Authenticated ─────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Startup; the persisted token has not been read yet
    #[default]
    Uninitialized,
    /// A token is attached and the user is being fetched
    Loading,
    /// Credential and user are both known
    Authenticated,
    /// No credential
    LoggedOut,
}

/// The credential and user of an authenticated session.
///
/// Views receive this snapshot and pass the credential explicitly to every
/// authenticated call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    /// Bearer credential
    pub credential: Credential,
    /// Signed-in user
    pub user: User,
}

/// Session state.
///
/// `user` is present only once the credential has been exchanged for user
/// data. `loading` starts `true` and drops to `false` once per credential
/// change, after the fetch for that credential resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Attached credential, if any
    pub credential: Option<Credential>,
    /// Current user, if fetched
    pub user: Option<User>,
    /// Whether the session is still being resolved
    pub loading: bool,
    /// Lifecycle phase
    pub phase: SessionPhase,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            credential: None,
            user: None,
            loading: true,
            phase: SessionPhase::Uninitialized,
        }
    }
}

impl SessionState {
    /// Whether a user is signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.phase == SessionPhase::Authenticated && self.credential.is_some() && self.user.is_some()
    }

    /// Snapshot for views, when authenticated.
    #[must_use]
    pub fn viewer(&self) -> Option<Viewer> {
        if self.phase != SessionPhase::Authenticated {
            return None;
        }
        match (&self.credential, &self.user) {
            (Some(credential), Some(user)) => Some(Viewer {
                credential: credential.clone(),
                user: user.clone(),
            }),
            _ => None,
        }
    }

    /// Whether `credential` is the one currently attached.
    #[must_use]
    pub fn is_current(&self, credential: &Credential) -> bool {
        self.credential.as_ref() == Some(credential)
    }

    /// Drop credential and user, ending in [`SessionPhase::LoggedOut`].
    pub fn end(&mut self) {
        self.credential = None;
        self.user = None;
        self.loading = false;
        self.phase = SessionPhase::LoggedOut;
    }
}
