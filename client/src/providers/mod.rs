//! Client providers.
//!
//! Traits for every external collaborator of the session and view reducers:
//! the remote API, token persistence, notification display, navigation, and
//! session invalidation. Reducers depend on these traits only; the binary
//! wires in [`HttpApi`], [`FileTokenStorage`] and the console providers,
//! tests wire in the in-memory mocks.
//!
//! Every authenticated call takes the [`Credential`] as an argument. There
//! is no ambient authorization state anywhere in the client.

use crate::credential::Credential;
use crate::error::Result;
use crate::types::{
    AuthResponse, Event, EventFilter, EventId, LoginRequest, MyRegistrations, Notification,
    Route, SignupRequest, User,
};
use std::future::Future;

pub mod console;
pub mod http;
pub mod storage;

pub use console::{ConsoleNavigator, ConsoleNotifier};
pub use http::HttpApi;
pub use storage::FileTokenStorage;

/// Authentication endpoints.
pub trait AuthApi: Send + Sync {
    /// Exchange email and password for a token (`POST /api/auth/login`).
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Network request fails
    /// - Server rejects the credentials
    /// - Response does not match the expected schema
    fn login(&self, request: &LoginRequest) -> impl Future<Output = Result<AuthResponse>> + Send;

    /// Create an account and sign in (`POST /api/auth/register`).
    ///
    /// # Errors
    ///
    /// Same as [`AuthApi::login`].
    fn signup(&self, request: &SignupRequest)
    -> impl Future<Output = Result<AuthResponse>> + Send;

    /// Fetch the user the credential belongs to (`GET /api/auth/me`).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Unauthorized`](crate::ClientError::Unauthorized)
    /// if the credential is invalid or expired.
    fn current_user(&self, credential: &Credential) -> impl Future<Output = Result<User>> + Send;
}

/// Public event endpoints.
pub trait EventsApi: Send + Sync {
    /// List events matching `filter` (`GET /api/events`).
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is malformed.
    fn list_events(&self, filter: &EventFilter) -> impl Future<Output = Result<Vec<Event>>> + Send;

    /// Fetch one event (`GET /api/events/:id`).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`](crate::ClientError::NotFound) if
    /// the event does not exist.
    fn get_event(&self, id: &EventId) -> impl Future<Output = Result<Event>> + Send;
}

/// Registration endpoints. All of them require a credential.
pub trait RegistrationsApi: Send + Sync {
    /// The caller's registrations, split by the server into upcoming and past.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is malformed.
    fn my_registrations(
        &self,
        credential: &Credential,
    ) -> impl Future<Output = Result<MyRegistrations>> + Send;

    /// Register the caller for an event (`POST /api/registrations`).
    ///
    /// The server enforces capacity; the client never reserves a seat.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Network request fails
    /// - The event is full or the caller is already registered
    /// - The credential is rejected
    fn register(
        &self,
        credential: &Credential,
        event_id: &EventId,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Cancel the caller's registration (`DELETE /api/registrations/:eventId`).
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or no registration exists.
    fn cancel(
        &self,
        credential: &Credential,
        event_id: &EventId,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Persistence of the single bearer token across runs.
pub trait TokenStorage: Send + Sync {
    /// Read the persisted token, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`](crate::ClientError::Storage) if the
    /// token exists but cannot be read.
    fn load(&self) -> impl Future<Output = Result<Option<Credential>>> + Send;

    /// Persist the token, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`](crate::ClientError::Storage) on I/O failure.
    fn save(&self, credential: &Credential) -> impl Future<Output = Result<()>> + Send;

    /// Remove the persisted token. Removing a missing token succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`](crate::ClientError::Storage) on I/O failure.
    fn clear(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Displays transient notifications (toasts).
pub trait Notifier: Send + Sync {
    /// Show a notification.
    fn notify(&self, notification: Notification);
}

/// Client-side navigation.
pub trait Navigator: Send + Sync {
    /// Go to `route`.
    fn navigate(&self, route: Route);
}

/// Ends the session after an authentication failure seen by a view.
pub trait SessionInvalidator: Send + Sync {
    /// Drop the credential and user as a failed identity fetch would.
    ///
    /// Emits no notification of its own.
    fn invalidate(&self) -> impl Future<Output = ()> + Send;
}
