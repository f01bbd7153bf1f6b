//! Session reducer.
//!
//! Owns the token lifecycle:
//!
//! 1. `Initialize` reads the persisted token
//! 2. A token found is attached and exchanged for the user (`LoadUser`)
//! 3. `Login`/`RegisterAccount` obtain a new token; success persists it
//! 4. `Logout`, a failed user fetch, or a view-reported 401 end the session
//!
//! A user fetch that resolves after its credential was replaced is ignored.
//! Persisting and clearing the token are best effort: storage failures are
//! logged and never change the outcome the user sees.

use super::actions::{AuthMethod, SessionAction};
use super::environment::SessionEnvironment;
use super::state::{SessionPhase, SessionState};
use crate::constants::messages;
use crate::credential::Credential;
use crate::error::ClientError;
use crate::providers::{AuthApi, Notifier, TokenStorage};
use crate::types::{AuthResponse, Notification};
use eventdesk_core::effect::Effect;
use eventdesk_core::reducer::Reducer;
use eventdesk_core::{smallvec, SmallVec};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Session reducer.
#[derive(Debug, Clone)]
pub struct SessionReducer<A, T, N> {
    _phantom: std::marker::PhantomData<(A, T, N)>,
}

impl<A, T, N> SessionReducer<A, T, N> {
    /// Create a new session reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<A, T, N> Default for SessionReducer<A, T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, T, N> SessionReducer<A, T, N>
where
    A: AuthApi + Clone + 'static,
    T: TokenStorage + Clone + 'static,
    N: Notifier + Clone + 'static,
{
    fn load_user(
        state: &mut SessionState,
        env: &SessionEnvironment<A, T, N>,
    ) -> SmallVec<[Effect<SessionAction>; 4]> {
        let Some(credential) = state.credential.clone() else {
            debug!("LoadUser without a credential");
            state.end();
            return SmallVec::new();
        };

        state.loading = true;
        state.phase = SessionPhase::Loading;

        let api = env.api.clone();
        smallvec![Effect::future(async move {
            match api.current_user(&credential).await {
                Ok(user) => Some(SessionAction::UserLoaded { credential, user }),
                Err(error) => Some(SessionAction::UserLoadFailed { credential, error }),
            }
        })]
    }

    fn authenticate(
        correlation_id: Uuid,
        method: AuthMethod,
        result: Result<AuthResponse, ClientError>,
    ) -> SessionAction {
        let issued = result.and_then(|response| {
            Credential::parse(&response.token)
                .map(|credential| (credential, response.user))
                .map_err(|_| ClientError::Decode("server issued an empty token".to_string()))
        });

        match issued {
            Ok((credential, user)) => SessionAction::Authenticated {
                correlation_id,
                method,
                credential,
                user,
            },
            Err(error) => SessionAction::AuthenticationFailed {
                correlation_id,
                method,
                error,
            },
        }
    }

    /// Clear the persisted token, then optionally notify.
    fn clear_token(
        env: &SessionEnvironment<A, T, N>,
        notification: Option<Notification>,
    ) -> Effect<SessionAction> {
        let storage = env.storage.clone();
        let notifier = env.notifier.clone();

        Effect::future(async move {
            if let Err(error) = storage.clear().await {
                warn!(%error, "Failed to clear persisted token");
            }
            if let Some(notification) = notification {
                notifier.notify(notification);
            }
            None
        })
    }
}

impl<A, T, N> Reducer for SessionReducer<A, T, N>
where
    A: AuthApi + Clone + 'static,
    T: TokenStorage + Clone + 'static,
    N: Notifier + Clone + 'static,
{
    type State = SessionState;
    type Action = SessionAction;
    type Environment = SessionEnvironment<A, T, N>;

    #[allow(clippy::too_many_lines)] // One arm per lifecycle step
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ═══════════════════════════════════════════════════════════════
            // Initialize: read the persisted token
            // ═══════════════════════════════════════════════════════════════
            SessionAction::Initialize => {
                if state.phase != SessionPhase::Uninitialized {
                    debug!(phase = ?state.phase, "Session already initialized");
                    return SmallVec::new();
                }

                let storage = env.storage.clone();
                smallvec![Effect::future(async move {
                    let credential = match storage.load().await {
                        Ok(credential) => credential,
                        Err(error) => {
                            warn!(%error, "Failed to read persisted token");
                            None
                        },
                    };
                    Some(SessionAction::TokenLoaded { credential })
                })]
            },

            SessionAction::TokenLoaded { credential } => {
                if state.phase != SessionPhase::Uninitialized {
                    debug!("Ignoring persisted token, session already resolved");
                    return SmallVec::new();
                }

                match credential {
                    Some(credential) => {
                        state.credential = Some(credential);
                        Self::load_user(state, env)
                    },
                    None => {
                        state.end();
                        SmallVec::new()
                    },
                }
            },

            // ═══════════════════════════════════════════════════════════════
            // LoadUser: exchange the attached credential for the user
            // ═══════════════════════════════════════════════════════════════
            SessionAction::LoadUser => Self::load_user(state, env),

            SessionAction::UserLoaded { credential, user } => {
                if !state.is_current(&credential) {
                    debug!("Discarding user fetched for a replaced credential");
                    return SmallVec::new();
                }

                info!(user_id = %user.id, "Session restored");
                state.user = Some(user);
                state.loading = false;
                state.phase = SessionPhase::Authenticated;
                SmallVec::new()
            },

            SessionAction::UserLoadFailed { credential, error } => {
                if !state.is_current(&credential) {
                    debug!("Discarding failed fetch for a replaced credential");
                    return SmallVec::new();
                }

                // An invalid session is definitive: no retry
                warn!(%error, "Failed to load user, logging out");
                state.end();
                smallvec![Self::clear_token(env, None)]
            },

            // ═══════════════════════════════════════════════════════════════
            // Login / RegisterAccount: obtain a new credential
            // ═══════════════════════════════════════════════════════════════
            SessionAction::Login {
                correlation_id,
                request,
            } => {
                let api = env.api.clone();
                smallvec![Effect::future(async move {
                    let result = api.login(&request).await;
                    Some(Self::authenticate(correlation_id, AuthMethod::Login, result))
                })]
            },

            SessionAction::RegisterAccount {
                correlation_id,
                request,
            } => {
                let api = env.api.clone();
                smallvec![Effect::future(async move {
                    let result = api.signup(&request).await;
                    Some(Self::authenticate(correlation_id, AuthMethod::Signup, result))
                })]
            },

            SessionAction::Authenticated {
                method,
                credential,
                user,
                ..
            } => {
                info!(user_id = %user.id, ?method, "Authenticated");
                state.credential = Some(credential.clone());
                state.user = Some(user);
                state.loading = false;
                state.phase = SessionPhase::Authenticated;

                let storage = env.storage.clone();
                let notifier = env.notifier.clone();
                smallvec![Effect::future(async move {
                    if let Err(error) = storage.save(&credential).await {
                        warn!(%error, "Failed to persist token");
                    }
                    notifier.notify(Notification::success(method.success_message()));
                    None
                })]
            },

            SessionAction::AuthenticationFailed { method, error, .. } => {
                debug!(%error, ?method, "Authentication failed");
                let message = error.user_message(method.failure_message());
                let notifier = env.notifier.clone();
                smallvec![Effect::future(async move {
                    notifier.notify(Notification::error(message));
                    None
                })]
            },

            // ═══════════════════════════════════════════════════════════════
            // Logout / Invalidate: end the session
            // ═══════════════════════════════════════════════════════════════
            SessionAction::Logout => {
                state.end();
                smallvec![Self::clear_token(
                    env,
                    Some(Notification::success(messages::LOGOUT_SUCCESS)),
                )]
            },

            SessionAction::Invalidate => {
                if state.credential.is_none() && state.phase == SessionPhase::LoggedOut {
                    return SmallVec::new();
                }

                warn!("Credential rejected, logging out");
                state.end();
                smallvec![Self::clear_token(env, None)]
            },
        }
    }
}
