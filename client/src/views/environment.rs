//! View environment.

use crate::providers::{EventsApi, Navigator, Notifier, RegistrationsApi, SessionInvalidator};
use eventdesk_core::environment::Clock;
use std::sync::Arc;

/// Dependencies shared by the view reducers.
///
/// # Type Parameters
///
/// - `P`: Events and registrations API
/// - `N`: Notifier
/// - `V`: Navigator
/// - `I`: Session invalidator (the session manager in production)
#[derive(Clone)]
pub struct ViewEnvironment<P, N, V, I>
where
    P: EventsApi + RegistrationsApi + Clone,
    N: Notifier + Clone,
    V: Navigator + Clone,
    I: SessionInvalidator + Clone,
{
    /// Events and registrations API.
    pub api: P,

    /// Notification display.
    pub notifier: N,

    /// Navigation.
    pub navigator: V,

    /// Ends the session when a credential is rejected.
    pub session: I,

    /// Time source for "is this event in the past".
    pub clock: Arc<dyn Clock>,
}

impl<P, N, V, I> ViewEnvironment<P, N, V, I>
where
    P: EventsApi + RegistrationsApi + Clone,
    N: Notifier + Clone,
    V: Navigator + Clone,
    I: SessionInvalidator + Clone,
{
    /// Create a new view environment.
    #[must_use]
    pub fn new(api: P, notifier: N, navigator: V, session: I, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            notifier,
            navigator,
            session,
            clock,
        }
    }
}
