//! Session environment.

use crate::providers::{AuthApi, Notifier, TokenStorage};

/// Dependencies of the session reducer.
///
/// # Type Parameters
///
/// - `A`: Authentication API
/// - `T`: Token storage
/// - `N`: Notifier
#[derive(Debug, Clone)]
pub struct SessionEnvironment<A, T, N>
where
    A: AuthApi + Clone,
    T: TokenStorage + Clone,
    N: Notifier + Clone,
{
    /// Authentication API.
    pub api: A,

    /// Persisted token.
    pub storage: T,

    /// Notification display.
    pub notifier: N,
}

impl<A, T, N> SessionEnvironment<A, T, N>
where
    A: AuthApi + Clone,
    T: TokenStorage + Clone,
    N: Notifier + Clone,
{
    /// Create a new session environment.
    #[must_use]
    pub const fn new(api: A, storage: T, notifier: N) -> Self {
        Self {
            api,
            storage,
            notifier,
        }
    }
}
