//! Session manager facade.

use super::actions::SessionAction;
use super::environment::SessionEnvironment;
use super::reducer::SessionReducer;
use super::state::{SessionPhase, SessionState, Viewer};
use crate::credential::Credential;
use crate::providers::{AuthApi, Notifier, SessionInvalidator, TokenStorage};
use crate::types::{LoginRequest, SignupRequest, User};
use eventdesk_runtime::{Store, StoreError};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// How long `login`/`register` wait for the outcome by default.
///
/// Longer than the HTTP request timeout, so the request itself always
/// resolves first.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(60);

type SessionStore<A, T, N> =
    Store<SessionState, SessionAction, SessionEnvironment<A, T, N>, SessionReducer<A, T, N>>;

/// The single source of truth for who is signed in.
///
/// Wraps the session [`Store`]. Every method waits until the state machine
/// has settled, including persisting or clearing the token and showing the
/// notification. Clones share one session.
pub struct SessionManager<A, T, N>
where
    A: AuthApi + Clone + 'static,
    T: TokenStorage + Clone + 'static,
    N: Notifier + Clone + 'static,
{
    store: SessionStore<A, T, N>,
    response_timeout: Duration,
}

impl<A, T, N> Clone for SessionManager<A, T, N>
where
    A: AuthApi + Clone + 'static,
    T: TokenStorage + Clone + 'static,
    N: Notifier + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            response_timeout: self.response_timeout,
        }
    }
}

impl<A, T, N> SessionManager<A, T, N>
where
    A: AuthApi + Clone + 'static,
    T: TokenStorage + Clone + 'static,
    N: Notifier + Clone + 'static,
{
    /// Create an uninitialized session.
    #[must_use]
    pub fn new(environment: SessionEnvironment<A, T, N>) -> Self {
        Self {
            store: Store::new(SessionState::default(), SessionReducer::new(), environment),
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }

    /// Set how long `login`/`register` wait for their outcome.
    #[must_use]
    pub const fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Restore the session from the persisted token.
    ///
    /// Returns once the session is either authenticated or logged out.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the session was torn down.
    pub async fn initialize(&self) -> Result<(), StoreError> {
        self.store.send(SessionAction::Initialize).await?.wait().await;
        Ok(())
    }

    /// Re-fetch the user for the attached credential.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the session was torn down.
    pub async fn load_user(&self) -> Result<(), StoreError> {
        self.store.send(SessionAction::LoadUser).await?.wait().await;
        Ok(())
    }

    /// Log in. Returns `true` on success.
    ///
    /// On failure a notification has been shown and the session is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if no outcome arrived within the response
    /// timeout or the session was torn down.
    pub async fn login(&self, request: LoginRequest) -> Result<bool, StoreError> {
        let correlation_id = Uuid::new_v4();
        self.await_outcome(
            SessionAction::Login {
                correlation_id,
                request,
            },
            correlation_id,
        )
        .await
    }

    /// Create an account and log in. Returns `true` on success.
    ///
    /// # Errors
    ///
    /// Same as [`SessionManager::login`].
    pub async fn register(&self, request: SignupRequest) -> Result<bool, StoreError> {
        let correlation_id = Uuid::new_v4();
        self.await_outcome(
            SessionAction::RegisterAccount {
                correlation_id,
                request,
            },
            correlation_id,
        )
        .await
    }

    async fn await_outcome(
        &self,
        command: SessionAction,
        correlation_id: Uuid,
    ) -> Result<bool, StoreError> {
        let outcome = self
            .store
            .send_and_wait_for(
                command,
                |action| action.result_for() == Some(correlation_id),
                self.response_timeout,
            )
            .await?;

        Ok(matches!(outcome, SessionAction::Authenticated { .. }))
    }

    /// Log out. Safe to call when already logged out.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the session was torn down.
    pub async fn logout(&self) -> Result<(), StoreError> {
        self.store.send(SessionAction::Logout).await?.wait().await;
        Ok(())
    }

    /// Credential and user, when authenticated.
    pub async fn viewer(&self) -> Option<Viewer> {
        self.store.state(SessionState::viewer).await
    }

    /// Attached credential, if any.
    pub async fn credential(&self) -> Option<Credential> {
        self.store.state(|s| s.credential.clone()).await
    }

    /// Whether a user is signed in.
    pub async fn is_authenticated(&self) -> bool {
        self.store.state(SessionState::is_authenticated).await
    }

    /// Signed-in user, if any.
    pub async fn current_user(&self) -> Option<User> {
        self.store.state(|s| s.user.clone()).await
    }

    /// Whether the session is still being resolved.
    pub async fn is_loading(&self) -> bool {
        self.store.state(|s| s.loading).await
    }

    /// Lifecycle phase.
    pub async fn phase(&self) -> SessionPhase {
        self.store.state(|s| s.phase).await
    }

    /// Full state snapshot.
    pub async fn snapshot(&self) -> SessionState {
        self.store.state(Clone::clone).await
    }

    /// Abort in-flight session effects and stop accepting commands.
    pub fn teardown(&self) {
        self.store.teardown();
    }
}

impl<A, T, N> SessionInvalidator for SessionManager<A, T, N>
where
    A: AuthApi + Clone + 'static,
    T: TokenStorage + Clone + 'static,
    N: Notifier + Clone + 'static,
{
    async fn invalidate(&self) {
        match self.store.send(SessionAction::Invalidate).await {
            Ok(mut handle) => handle.wait().await,
            Err(error) => debug!(%error, "Session invalidation skipped"),
        }
    }
}
