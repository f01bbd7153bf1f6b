//! Dashboard view-model: the viewer's upcoming and past registrations.
//!
//! The upcoming/past split is taken from the server as is. Only upcoming
//! registrations can be cancelled; past ones are informational.

use super::environment::ViewEnvironment;
use crate::constants::messages;
use crate::error::ClientError;
use crate::providers::{EventsApi, Navigator, Notifier, RegistrationsApi, SessionInvalidator};
use crate::session::Viewer;
use crate::types::{EventId, MyRegistrations, Notification, Route};
use eventdesk_core::effect::Effect;
use eventdesk_core::reducer::Reducer;
use eventdesk_core::{smallvec, SmallVec};
use tracing::{info, warn};

/// Dashboard state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardState {
    /// Authenticated viewer; the dashboard is unreachable without one
    pub viewer: Option<Viewer>,
    /// Latest server partition
    pub registrations: MyRegistrations,
    /// Whether the list is being fetched
    pub loading: bool,
    /// Event whose registration is being cancelled
    pub cancelling: Option<EventId>,
}

impl DashboardState {
    /// Dashboard for `viewer`, not yet loaded.
    #[must_use]
    pub fn new(viewer: Option<Viewer>) -> Self {
        Self {
            viewer,
            ..Self::default()
        }
    }

    /// Whether `event_id` has a cancellable (upcoming) registration.
    #[must_use]
    pub fn can_cancel(&self, event_id: &EventId) -> bool {
        self.cancelling.is_none() && self.registrations.is_registered(event_id)
    }
}

/// Dashboard actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardAction {
    /// Fetch the viewer's registrations
    Load,
    /// Registrations fetched
    Loaded {
        /// Server partition
        registrations: MyRegistrations,
    },
    /// Fetch failed
    LoadFailed {
        /// Why
        error: ClientError,
    },
    /// Cancel the registration for an upcoming event
    Cancel(EventId),
    /// Cancel call succeeded
    CancelSucceeded,
    /// Cancel call failed
    CancelFailed {
        /// Why
        error: ClientError,
    },
}

/// Dashboard reducer.
#[derive(Debug, Clone)]
pub struct DashboardReducer<P, N, V, I> {
    _phantom: std::marker::PhantomData<(P, N, V, I)>,
}

impl<P, N, V, I> DashboardReducer<P, N, V, I> {
    /// Create a new dashboard reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<P, N, V, I> Default for DashboardReducer<P, N, V, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, N, V, I> DashboardReducer<P, N, V, I>
where
    P: EventsApi + RegistrationsApi + Clone + 'static,
    N: Notifier + Clone + 'static,
    V: Navigator + Clone + 'static,
    I: SessionInvalidator + Clone + 'static,
{
    fn fetch(
        state: &mut DashboardState,
        env: &ViewEnvironment<P, N, V, I>,
    ) -> SmallVec<[Effect<DashboardAction>; 4]> {
        let Some(viewer) = state.viewer.clone() else {
            return smallvec![Self::to_login(env)];
        };

        state.loading = true;

        let api = env.api.clone();
        smallvec![Effect::future(async move {
            match api.my_registrations(&viewer.credential).await {
                Ok(registrations) => Some(DashboardAction::Loaded { registrations }),
                Err(error) => Some(DashboardAction::LoadFailed { error }),
            }
        })]
    }

    fn to_login(env: &ViewEnvironment<P, N, V, I>) -> Effect<DashboardAction> {
        let navigator = env.navigator.clone();
        Effect::future(async move {
            navigator.navigate(Route::Login);
            None
        })
    }

    fn notify(env: &ViewEnvironment<P, N, V, I>, notification: Notification) -> Effect<DashboardAction> {
        let notifier = env.notifier.clone();
        Effect::future(async move {
            notifier.notify(notification);
            None
        })
    }

    /// Drop the viewer, end the session and leave the private route.
    fn sign_out(
        state: &mut DashboardState,
        env: &ViewEnvironment<P, N, V, I>,
    ) -> Effect<DashboardAction> {
        state.viewer = None;
        state.registrations = MyRegistrations::default();

        let session = env.session.clone();
        Effect::chain(vec![
            Effect::future(async move {
                session.invalidate().await;
                None
            }),
            Self::to_login(env),
        ])
    }
}

impl<P, N, V, I> Reducer for DashboardReducer<P, N, V, I>
where
    P: EventsApi + RegistrationsApi + Clone + 'static,
    N: Notifier + Clone + 'static,
    V: Navigator + Clone + 'static,
    I: SessionInvalidator + Clone + 'static,
{
    type State = DashboardState;
    type Action = DashboardAction;
    type Environment = ViewEnvironment<P, N, V, I>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            DashboardAction::Load => Self::fetch(state, env),

            DashboardAction::Loaded { registrations } => {
                state.registrations = registrations;
                state.loading = false;
                SmallVec::new()
            },

            DashboardAction::LoadFailed { error } => {
                warn!(%error, "Failed to load registrations");
                state.registrations = MyRegistrations::default();
                state.loading = false;

                let notify = Self::notify(env, Notification::error(messages::REGISTRATIONS_LOAD_FAILED));
                if error.is_auth_failure() {
                    return smallvec![notify, Self::sign_out(state, env)];
                }
                smallvec![notify]
            },

            DashboardAction::Cancel(event_id) => {
                let Some(viewer) = state.viewer.clone() else {
                    return smallvec![Self::to_login(env)];
                };
                if !state.can_cancel(&event_id) {
                    return SmallVec::new();
                }

                state.cancelling = Some(event_id.clone());

                let api = env.api.clone();
                smallvec![Effect::future(async move {
                    match api.cancel(&viewer.credential, &event_id).await {
                        Ok(()) => Some(DashboardAction::CancelSucceeded),
                        Err(error) => Some(DashboardAction::CancelFailed { error }),
                    }
                })]
            },

            DashboardAction::CancelSucceeded => {
                if let Some(event_id) = state.cancelling.take() {
                    info!(%event_id, "Registration cancelled");
                }

                let mut steps = vec![Self::notify(env, Notification::success(messages::CANCEL_SUCCESS))];
                steps.extend(Self::fetch(state, env));
                smallvec![Effect::chain(steps)]
            },

            DashboardAction::CancelFailed { error } => {
                warn!(%error, "Cancelling failed");
                state.cancelling = None;

                let notify = Self::notify(env, Notification::error(error.user_message(messages::CANCEL_FAILED)));
                if error.is_auth_failure() {
                    return smallvec![notify, Self::sign_out(state, env)];
                }
                smallvec![notify]
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::{
        event, Endpoint, MockApi, MockSessionInvalidator, RecordingNavigator, RecordingNotifier,
    };
    use chrono::Duration;
    use eventdesk_core::environment::Clock;
    use eventdesk_testing::{assertions, reduce_to_completion, test_clock, ReducerTest};
    use std::sync::Arc;

    type TestEnv =
        ViewEnvironment<MockApi, RecordingNotifier, RecordingNavigator, MockSessionInvalidator>;
    type TestReducer =
        DashboardReducer<MockApi, RecordingNotifier, RecordingNavigator, MockSessionInvalidator>;

    fn env() -> TestEnv {
        let clock = test_clock();
        ViewEnvironment::new(
            MockApi::new(clock.now()),
            RecordingNotifier::new(),
            RecordingNavigator::new(),
            MockSessionInvalidator::new(),
            Arc::new(clock),
        )
    }

    /// A viewer registered for one upcoming and one past event.
    fn seeded(env: &TestEnv) -> Viewer {
        let now = env.clock.now();
        let user = env.api.add_account("Ada", "ada@example.com", "pw");
        let credential = env.api.issue_token(&user);

        env.api.put_event(event("future", 10, 0, now + Duration::days(3)));
        env.api.put_event(event("gone", 10, 0, now - Duration::days(3)));
        env.api.seed_registration(&user, &EventId::new("future"), now);
        env.api.seed_registration(&user, &EventId::new("gone"), now - Duration::days(5));

        Viewer { credential, user }
    }

    #[tokio::test]
    async fn test_load_keeps_server_partition() {
        let env = env();
        let mut state = DashboardState::new(Some(seeded(&env)));

        reduce_to_completion(&TestReducer::new(), &mut state, DashboardAction::Load, &env).await;

        assert_eq!(state.registrations.upcoming.len(), 1);
        assert_eq!(state.registrations.past.len(), 1);
        assert!(state.can_cancel(&EventId::new("future")));
        assert!(!state.can_cancel(&EventId::new("gone")));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_anonymous_viewer_is_sent_to_login() {
        let env = env();
        let mut state = DashboardState::new(None);

        reduce_to_completion(&TestReducer::new(), &mut state, DashboardAction::Load, &env).await;

        assert_eq!(env.navigator.last(), Some(Route::Login));
        assert_eq!(env.api.calls(Endpoint::MyRegistrations), 0);
    }

    #[tokio::test]
    async fn test_load_failure_degrades_to_empty() {
        let env = env();
        let viewer = seeded(&env);
        let reducer = TestReducer::new();
        let mut state = DashboardState::new(Some(viewer));
        reduce_to_completion(&reducer, &mut state, DashboardAction::Load, &env).await;

        env.api.fail(Endpoint::MyRegistrations, ClientError::Network("offline".to_string()));
        reduce_to_completion(&reducer, &mut state, DashboardAction::Load, &env).await;

        assert!(state.registrations.upcoming.is_empty());
        assert!(state.registrations.past.is_empty());
        assert_eq!(
            env.notifier.messages(),
            vec![messages::REGISTRATIONS_LOAD_FAILED.to_string()]
        );
        assert_eq!(env.session.invalidations(), 0);
    }

    #[tokio::test]
    async fn test_expired_credential_signs_out() {
        let env = env();
        let mut state = DashboardState::new(Some(seeded(&env)));
        env.api.revoke_tokens();

        reduce_to_completion(&TestReducer::new(), &mut state, DashboardAction::Load, &env).await;

        assert_eq!(state.viewer, None);
        assert_eq!(env.session.invalidations(), 1);
        assert_eq!(env.navigator.last(), Some(Route::Login));
    }

    #[tokio::test]
    async fn test_cancel_refetches_list() {
        let env = env();
        let reducer = TestReducer::new();
        let mut state = DashboardState::new(Some(seeded(&env)));
        reduce_to_completion(&reducer, &mut state, DashboardAction::Load, &env).await;

        reduce_to_completion(
            &reducer,
            &mut state,
            DashboardAction::Cancel(EventId::new("future")),
            &env,
        )
        .await;

        assert!(state.registrations.upcoming.is_empty());
        assert_eq!(state.registrations.past.len(), 1);
        assert_eq!(state.cancelling, None);
        assert_eq!(env.notifier.last().unwrap().message, messages::CANCEL_SUCCESS);
        assert_eq!(env.api.calls(Endpoint::MyRegistrations), 2);
    }

    #[tokio::test]
    async fn test_past_registration_cannot_be_cancelled() {
        let env = env();
        let reducer = TestReducer::new();
        let mut state = DashboardState::new(Some(seeded(&env)));
        reduce_to_completion(&reducer, &mut state, DashboardAction::Load, &env).await;

        ReducerTest::new(reducer)
            .with_env(env)
            .given_state(state)
            .when_action(DashboardAction::Cancel(EventId::new("gone")))
            .then_state(|state| assert_eq!(state.cancelling, None))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn test_cancel_failure_keeps_registration() {
        let env = env();
        let reducer = TestReducer::new();
        let mut state = DashboardState::new(Some(seeded(&env)));
        reduce_to_completion(&reducer, &mut state, DashboardAction::Load, &env).await;
        env.api.fail(Endpoint::Cancel, ClientError::Network("offline".to_string()));

        reduce_to_completion(
            &reducer,
            &mut state,
            DashboardAction::Cancel(EventId::new("future")),
            &env,
        )
        .await;

        assert_eq!(state.registrations.upcoming.len(), 1);
        assert_eq!(env.notifier.messages(), vec![messages::CANCEL_FAILED.to_string()]);
    }
}
