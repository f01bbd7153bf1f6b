//! Event detail view-model.
//!
//! Derives seat availability and the viewer's registration status for one
//! event, and issues register/cancel calls. Every successful mutation is
//! followed by a re-fetch of the event; seat counts are never adjusted
//! locally. One mutation at a time: while a register or cancel call is in
//! flight, further mutation actions are ignored.

use super::environment::ViewEnvironment;
use crate::constants::{labels, messages};
use crate::error::ClientError;
use crate::providers::{EventsApi, Navigator, Notifier, RegistrationsApi, SessionInvalidator};
use crate::session::Viewer;
use crate::types::{Availability, Event, EventId, MyRegistrations, Notification, Route};
use chrono::{DateTime, Utc};
use eventdesk_core::effect::Effect;
use eventdesk_core::reducer::Reducer;
use eventdesk_core::{smallvec, SmallVec};
use tracing::{debug, info, warn};

// ═══════════════════════════════════════════════════════════════════════
// State
// ═══════════════════════════════════════════════════════════════════════

/// A registration mutation in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// `POST /api/registrations`
    Register,
    /// `DELETE /api/registrations/:eventId`
    Cancel,
}

/// Event detail state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDetailState {
    /// Event shown by this view
    pub event_id: EventId,
    /// Latest server record of the event
    pub event: Option<Event>,
    /// Whether the event is being fetched
    pub loading: bool,
    /// Whether the viewer holds an upcoming registration
    pub registered: bool,
    /// Mutation in flight, if any
    pub pending: Option<Mutation>,
    /// Authenticated viewer, if any
    pub viewer: Option<Viewer>,
    /// Latest registration check; older results are stale
    status_seq: u64,
}

impl EventDetailState {
    /// Detail view for `event_id`, not yet loaded.
    #[must_use]
    pub const fn new(event_id: EventId, viewer: Option<Viewer>) -> Self {
        Self {
            event_id,
            event: None,
            loading: false,
            registered: false,
            pending: None,
            viewer,
            status_seq: 0,
        }
    }

    /// Sequence number of the latest registration check.
    #[must_use]
    pub const fn status_seq(&self) -> u64 {
        self.status_seq
    }

    /// Seat availability, once the event is loaded.
    #[must_use]
    pub fn availability(&self) -> Option<Availability> {
        self.event.as_ref().map(Event::availability)
    }

    /// Whether the event is loaded and started before `now`.
    #[must_use]
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.event.as_ref().is_some_and(|event| event.is_past(now))
    }

    /// State of the register/cancel control, once the event is loaded.
    #[must_use]
    pub fn affordance(&self, now: DateTime<Utc>) -> Option<Affordance> {
        let event = self.event.as_ref()?;

        let affordance = if event.is_past(now) {
            Affordance::Past
        } else if self.viewer.is_none() {
            Affordance::LoginToRegister
        } else if self.registered {
            Affordance::Registered {
                cancelling: self.pending == Some(Mutation::Cancel),
            }
        } else if self.pending == Some(Mutation::Register) {
            Affordance::Registering
        } else if event.availability().is_full() {
            Affordance::Full
        } else {
            Affordance::Available
        };

        Some(affordance)
    }

    fn can_mutate(&self, now: DateTime<Utc>) -> bool {
        self.pending.is_none() && self.event.as_ref().is_some_and(|event| !event.is_past(now))
    }
}

/// The register/cancel control of the detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affordance {
    /// The event is over; nothing can be changed
    Past,
    /// Anonymous viewer; the control leads to the login form
    LoginToRegister,
    /// The viewer is registered and may cancel
    Registered {
        /// A cancel call is in flight
        cancelling: bool,
    },
    /// A register call is in flight
    Registering,
    /// No seats left
    Full,
    /// The viewer may register
    Available,
}

impl Affordance {
    /// Control label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Past => labels::EVENT_PASSED,
            Self::LoginToRegister => labels::LOGIN_TO_REGISTER,
            Self::Registered { .. } => labels::CANCEL_REGISTRATION,
            Self::Registering => labels::REGISTERING,
            Self::Full => labels::EVENT_FULL,
            Self::Available => labels::REGISTER_NOW,
        }
    }

    /// Whether the control accepts input.
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        matches!(
            self,
            Self::LoginToRegister | Self::Registered { cancelling: false } | Self::Available
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Actions
// ═══════════════════════════════════════════════════════════════════════

/// Event detail actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventDetailAction {
    /// Fetch the event and, for a viewer, their registrations
    Load,
    /// Event fetched
    EventLoaded {
        /// Server record
        event: Event,
    },
    /// Event fetch failed
    EventLoadFailed {
        /// Why
        error: ClientError,
    },
    /// Viewer's registrations fetched
    RegistrationsLoaded {
        /// Check this answers
        seq: u64,
        /// Server partition
        registrations: MyRegistrations,
    },
    /// Viewer's registrations could not be fetched
    RegistrationsFailed {
        /// Check this answers
        seq: u64,
        /// Why
        error: ClientError,
    },
    /// Register the viewer for the event
    Register,
    /// Register call succeeded
    RegisterSucceeded,
    /// Register call failed
    RegisterFailed {
        /// Why
        error: ClientError,
    },
    /// Cancel the viewer's registration
    Cancel,
    /// Cancel call succeeded
    CancelSucceeded,
    /// Cancel call failed
    CancelFailed {
        /// Why
        error: ClientError,
    },
    /// The session changed
    SetViewer(Option<Viewer>),
}

// ═══════════════════════════════════════════════════════════════════════
// Reducer
// ═══════════════════════════════════════════════════════════════════════

/// Event detail reducer.
#[derive(Debug, Clone)]
pub struct EventDetailReducer<P, N, V, I> {
    _phantom: std::marker::PhantomData<(P, N, V, I)>,
}

impl<P, N, V, I> EventDetailReducer<P, N, V, I> {
    /// Create a new event detail reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<P, N, V, I> Default for EventDetailReducer<P, N, V, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, N, V, I> EventDetailReducer<P, N, V, I>
where
    P: EventsApi + RegistrationsApi + Clone + 'static,
    N: Notifier + Clone + 'static,
    V: Navigator + Clone + 'static,
    I: SessionInvalidator + Clone + 'static,
{
    fn fetch_event(
        state: &mut EventDetailState,
        env: &ViewEnvironment<P, N, V, I>,
    ) -> Effect<EventDetailAction> {
        state.loading = true;

        let api = env.api.clone();
        let event_id = state.event_id.clone();
        Effect::future(async move {
            match api.get_event(&event_id).await {
                Ok(event) => Some(EventDetailAction::EventLoaded { event }),
                Err(error) => Some(EventDetailAction::EventLoadFailed { error }),
            }
        })
    }

    /// Check whether the viewer is registered. Any earlier check goes stale.
    fn fetch_registrations(
        state: &mut EventDetailState,
        env: &ViewEnvironment<P, N, V, I>,
    ) -> Effect<EventDetailAction> {
        state.status_seq += 1;
        let Some(viewer) = state.viewer.clone() else {
            return Effect::None;
        };

        let api = env.api.clone();
        let seq = state.status_seq;
        Effect::future(async move {
            match api.my_registrations(&viewer.credential).await {
                Ok(registrations) => {
                    Some(EventDetailAction::RegistrationsLoaded { seq, registrations })
                },
                Err(error) => Some(EventDetailAction::RegistrationsFailed { seq, error }),
            }
        })
    }

    /// Notify, then re-read the event so seat counts come from the server.
    fn reconcile(
        state: &mut EventDetailState,
        env: &ViewEnvironment<P, N, V, I>,
        message: &'static str,
    ) -> SmallVec<[Effect<EventDetailAction>; 4]> {
        let notifier = env.notifier.clone();
        smallvec![Effect::chain(vec![
            Effect::future(async move {
                notifier.notify(Notification::success(message));
                None
            }),
            Self::fetch_event(state, env),
        ])]
    }

    /// Surface a mutation failure; a rejected credential also ends the session.
    fn mutation_failed(
        state: &mut EventDetailState,
        env: &ViewEnvironment<P, N, V, I>,
        error: &ClientError,
        fallback: &str,
    ) -> SmallVec<[Effect<EventDetailAction>; 4]> {
        state.pending = None;

        let notifier = env.notifier.clone();
        let message = error.user_message(fallback);
        let notify = Effect::future(async move {
            notifier.notify(Notification::error(message));
            None
        });

        if !error.is_auth_failure() {
            return smallvec![notify];
        }

        state.viewer = None;
        state.registered = false;
        smallvec![notify, Self::invalidate_session(env)]
    }

    fn invalidate_session(env: &ViewEnvironment<P, N, V, I>) -> Effect<EventDetailAction> {
        let session = env.session.clone();
        Effect::future(async move {
            session.invalidate().await;
            None
        })
    }

    fn navigate(env: &ViewEnvironment<P, N, V, I>, route: Route) -> Effect<EventDetailAction> {
        let navigator = env.navigator.clone();
        Effect::future(async move {
            navigator.navigate(route);
            None
        })
    }
}

impl<P, N, V, I> Reducer for EventDetailReducer<P, N, V, I>
where
    P: EventsApi + RegistrationsApi + Clone + 'static,
    N: Notifier + Clone + 'static,
    V: Navigator + Clone + 'static,
    I: SessionInvalidator + Clone + 'static,
{
    type State = EventDetailState;
    type Action = EventDetailAction;
    type Environment = ViewEnvironment<P, N, V, I>;

    #[allow(clippy::too_many_lines)] // One arm per step of the register/cancel cycle
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            EventDetailAction::Load => {
                smallvec![
                    Self::fetch_event(state, env),
                    Self::fetch_registrations(state, env),
                ]
            },

            EventDetailAction::EventLoaded { event } => {
                state.event = Some(event);
                state.loading = false;
                SmallVec::new()
            },

            EventDetailAction::EventLoadFailed { error } => {
                if error.is_not_found() {
                    info!(event_id = %state.event_id, "Event does not exist");
                } else {
                    warn!(event_id = %state.event_id, %error, "Failed to load event");
                }
                state.event = None;
                state.loading = false;

                let notifier = env.notifier.clone();
                smallvec![Effect::chain(vec![
                    Effect::future(async move {
                        notifier.notify(Notification::error(messages::EVENT_NOT_FOUND));
                        None
                    }),
                    Self::navigate(env, Route::Events),
                ])]
            },

            EventDetailAction::RegistrationsLoaded { seq, registrations } => {
                if seq != state.status_seq {
                    debug!(seq, latest = state.status_seq, "Discarding stale registration check");
                    return SmallVec::new();
                }
                state.registered = registrations.is_registered(&state.event_id);
                SmallVec::new()
            },

            EventDetailAction::RegistrationsFailed { seq, error } => {
                if seq != state.status_seq {
                    debug!(
                        seq,
                        latest = state.status_seq,
                        "Discarding stale registration check failure"
                    );
                    return SmallVec::new();
                }
                debug!(event_id = %state.event_id, %error, "Registration check failed");
                if !error.is_auth_failure() {
                    return SmallVec::new();
                }
                state.viewer = None;
                state.registered = false;
                smallvec![Self::invalidate_session(env)]
            },

            EventDetailAction::Register => {
                let Some(viewer) = state.viewer.clone() else {
                    return smallvec![Self::navigate(env, Route::Login)];
                };
                if !state.can_mutate(env.clock.now()) || state.registered {
                    return SmallVec::new();
                }
                if state.availability().is_none_or(|seats| seats.is_full()) {
                    debug!(event_id = %state.event_id, "Register ignored: event is full");
                    return SmallVec::new();
                }

                state.pending = Some(Mutation::Register);
                state.status_seq += 1;

                let api = env.api.clone();
                let event_id = state.event_id.clone();
                smallvec![Effect::future(async move {
                    match api.register(&viewer.credential, &event_id).await {
                        Ok(()) => Some(EventDetailAction::RegisterSucceeded),
                        Err(error) => Some(EventDetailAction::RegisterFailed { error }),
                    }
                })]
            },

            EventDetailAction::RegisterSucceeded => {
                info!(event_id = %state.event_id, "Registered for event");
                state.pending = None;
                state.registered = true;
                Self::reconcile(state, env, messages::EVENT_REGISTER_SUCCESS)
            },

            EventDetailAction::RegisterFailed { error } => {
                warn!(event_id = %state.event_id, %error, "Registration failed");
                Self::mutation_failed(state, env, &error, messages::EVENT_REGISTER_FAILED)
            },

            EventDetailAction::Cancel => {
                let Some(viewer) = state.viewer.clone() else {
                    return SmallVec::new();
                };
                if !state.registered || !state.can_mutate(env.clock.now()) {
                    return SmallVec::new();
                }

                state.pending = Some(Mutation::Cancel);
                state.status_seq += 1;

                let api = env.api.clone();
                let event_id = state.event_id.clone();
                smallvec![Effect::future(async move {
                    match api.cancel(&viewer.credential, &event_id).await {
                        Ok(()) => Some(EventDetailAction::CancelSucceeded),
                        Err(error) => Some(EventDetailAction::CancelFailed { error }),
                    }
                })]
            },

            EventDetailAction::CancelSucceeded => {
                info!(event_id = %state.event_id, "Registration cancelled");
                state.pending = None;
                state.registered = false;
                Self::reconcile(state, env, messages::CANCEL_SUCCESS)
            },

            EventDetailAction::CancelFailed { error } => {
                warn!(event_id = %state.event_id, %error, "Cancelling failed");
                Self::mutation_failed(state, env, &error, messages::CANCEL_FAILED)
            },

            EventDetailAction::SetViewer(viewer) => {
                if state.viewer == viewer {
                    return SmallVec::new();
                }
                state.viewer = viewer;
                state.registered = false;
                smallvec![Self::fetch_registrations(state, env)]
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
        EventDetailReducer<MockApi, RecordingNotifier, RecordingNavigator, MockSessionInvalidator>;

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

    fn viewer(env: &TestEnv) -> Viewer {
        let user = env.api.add_account("Ada", "ada@example.com", "pw");
        let credential = env.api.issue_token(&user);
        Viewer { credential, user }
    }

    fn tomorrow(env: &TestEnv) -> DateTime<Utc> {
        env.clock.now() + Duration::days(1)
    }

    /// Loaded detail state for a fresh event.
    fn loaded(env: &TestEnv, capacity: u32, taken: u32, viewer: Option<Viewer>) -> EventDetailState {
        let upcoming = event("evt-1", capacity, taken, tomorrow(env));
        env.api.put_event(upcoming.clone());
        EventDetailState {
            event: Some(upcoming),
            ..EventDetailState::new(EventId::new("evt-1"), viewer)
        }
    }

    #[test]
    fn test_full_event_disables_registration() {
        let env = env();
        let now = env.clock.now();
        let state = loaded(&env, 10, 10, Some(viewer(&env)));

        let affordance = state.affordance(now).unwrap();
        assert_eq!(affordance, Affordance::Full);
        assert_eq!(affordance.label(), "Event Full");
        assert!(!affordance.is_enabled());
        assert_eq!(state.availability().unwrap().available_seats(), 0);

        ReducerTest::new(TestReducer::new())
            .with_env(env)
            .given_state(state)
            .when_action(EventDetailAction::Register)
            .then_state(|state| assert_eq!(state.pending, None))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn test_anonymous_register_navigates_to_login() {
        let env = env();
        let mut state = loaded(&env, 10, 0, None);
        assert_eq!(state.affordance(env.clock.now()), Some(Affordance::LoginToRegister));

        reduce_to_completion(&TestReducer::new(), &mut state, EventDetailAction::Register, &env)
            .await;

        assert_eq!(env.navigator.last(), Some(Route::Login));
        assert_eq!(env.api.calls(Endpoint::Register), 0);
        assert_eq!(state.pending, None);
    }

    #[test]
    fn test_register_while_pending_is_noop() {
        let env = env();
        let state = EventDetailState {
            pending: Some(Mutation::Register),
            ..loaded(&env, 10, 0, Some(viewer(&env)))
        };
        assert_eq!(state.affordance(env.clock.now()), Some(Affordance::Registering));

        ReducerTest::new(TestReducer::new())
            .with_env(env)
            .given_state(state)
            .when_action(EventDetailAction::Register)
            .when_action(EventDetailAction::Cancel)
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_check_from_before_register_is_stale() {
        let env = env();
        let state = loaded(&env, 10, 0, Some(viewer(&env)));

        ReducerTest::new(TestReducer::new())
            .with_env(env)
            .given_state(state)
            .when_action(EventDetailAction::Load)
            .when_action(EventDetailAction::Register)
            .when_action(EventDetailAction::RegisterSucceeded)
            .when_action(EventDetailAction::RegistrationsLoaded {
                seq: 1,
                registrations: MyRegistrations::default(),
            })
            .then_state(|state| {
                assert!(state.registered);
                assert_eq!(state.status_seq(), 2);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_check_resolving_while_pending_is_stale() {
        let env = env();
        let state = loaded(&env, 10, 0, Some(viewer(&env)));

        ReducerTest::new(TestReducer::new())
            .with_env(env)
            .given_state(state)
            .when_action(EventDetailAction::Load)
            .when_action(EventDetailAction::Register)
            .when_action(EventDetailAction::RegistrationsFailed {
                seq: 1,
                error: ClientError::Unauthorized { message: None },
            })
            .then_state(|state| {
                assert!(state.viewer.is_some());
                assert_eq!(state.pending, Some(Mutation::Register));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_past_event_overrides_every_other_state() {
        let env = env();
        let now = env.clock.now();
        let state = EventDetailState {
            event: Some(event("evt-1", 10, 10, now - Duration::hours(1))),
            registered: true,
            ..EventDetailState::new(EventId::new("evt-1"), Some(viewer(&env)))
        };
        assert_eq!(state.affordance(now), Some(Affordance::Past));
        assert_eq!(Affordance::Past.label(), "This event has already passed");

        ReducerTest::new(TestReducer::new())
            .with_env(env)
            .given_state(state)
            .when_action(EventDetailAction::Cancel)
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn test_register_marks_registered_and_refetches() {
        let env = env();
        let mut state = loaded(&env, 10, 3, Some(viewer(&env)));

        reduce_to_completion(&TestReducer::new(), &mut state, EventDetailAction::Register, &env)
            .await;

        assert!(state.registered);
        assert_eq!(state.pending, None);
        assert_eq!(state.event.as_ref().unwrap().registrations_count, 4);
        assert_eq!(env.api.calls(Endpoint::GetEvent), 1);
        assert_eq!(
            env.notifier.messages(),
            vec![messages::EVENT_REGISTER_SUCCESS.to_string()]
        );
        assert_eq!(
            state.affordance(env.clock.now()),
            Some(Affordance::Registered { cancelling: false })
        );
    }

    #[tokio::test]
    async fn test_register_failure_shows_server_message() {
        let env = env();
        let mut state = loaded(&env, 10, 3, Some(viewer(&env)));
        env.api.fail(
            Endpoint::Register,
            ClientError::Rejected {
                status: 400,
                message: Some("Event is full".to_string()),
            },
        );

        reduce_to_completion(&TestReducer::new(), &mut state, EventDetailAction::Register, &env)
            .await;

        assert!(!state.registered);
        assert_eq!(state.pending, None);
        assert_eq!(env.notifier.messages(), vec!["Event is full".to_string()]);
        assert_eq!(env.api.calls(Endpoint::GetEvent), 0);
    }

    #[tokio::test]
    async fn test_rejected_credential_ends_session() {
        let env = env();
        let mut state = loaded(&env, 10, 3, Some(viewer(&env)));
        env.api.revoke_tokens();

        reduce_to_completion(&TestReducer::new(), &mut state, EventDetailAction::Register, &env)
            .await;

        assert_eq!(env.session.invalidations(), 1);
        assert_eq!(state.viewer, None);
        assert_eq!(env.notifier.error_count(), 1);
        assert_eq!(state.affordance(env.clock.now()), Some(Affordance::LoginToRegister));
    }

    #[tokio::test]
    async fn test_missing_event_returns_to_list() {
        let env = env();
        let mut state = EventDetailState::new(EventId::new("missing"), None);

        reduce_to_completion(&TestReducer::new(), &mut state, EventDetailAction::Load, &env).await;

        assert_eq!(state.event, None);
        assert!(!state.loading);
        assert_eq!(env.notifier.messages(), vec![messages::EVENT_NOT_FOUND.to_string()]);
        assert_eq!(env.navigator.last(), Some(Route::Events));
    }

    #[tokio::test]
    async fn test_cancel_clears_flag_and_refetches_count() {
        let env = env();
        let viewer = viewer(&env);
        let mut state = loaded(&env, 10, 0, Some(viewer.clone()));
        let reducer = TestReducer::new();

        reduce_to_completion(&reducer, &mut state, EventDetailAction::Register, &env).await;
        assert_eq!(state.event.as_ref().unwrap().registrations_count, 1);

        reduce_to_completion(&reducer, &mut state, EventDetailAction::Cancel, &env).await;

        assert!(!state.registered);
        assert_eq!(state.event.as_ref().unwrap().registrations_count, 0);
        assert_eq!(env.notifier.last().unwrap().message, messages::CANCEL_SUCCESS);
        assert_eq!(state.affordance(env.clock.now()), Some(Affordance::Available));
    }

    #[tokio::test]
    async fn test_load_resolves_registration_status() {
        let env = env();
        let viewer = viewer(&env);
        let mut state = loaded(&env, 10, 1, Some(viewer.clone()));
        state.event = None;
        env.api.seed_registration(&viewer.user, &EventId::new("evt-1"), env.clock.now());

        reduce_to_completion(&TestReducer::new(), &mut state, EventDetailAction::Load, &env).await;

        assert!(state.registered);
        assert!(state.event.is_some());
        assert!(env.notifier.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_failed_registration_check_is_silent() {
        let env = env();
        let mut state = loaded(&env, 10, 1, Some(viewer(&env)));
        env.api.fail(Endpoint::MyRegistrations, ClientError::Network("offline".to_string()));

        reduce_to_completion(&TestReducer::new(), &mut state, EventDetailAction::Load, &env).await;

        assert!(!state.registered);
        assert!(state.viewer.is_some());
        assert!(env.notifier.notifications().is_empty());
        assert_eq!(env.session.invalidations(), 0);
    }
}
