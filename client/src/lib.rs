//! # EventDesk Client
//!
//! Session and registration-state management for the EventDesk event
//! platform, built on EventDesk reducers and the `Store` runtime.
//!
//! ## Features
//!
//! - **Explicit credentials**: the session owns the bearer token and every
//!   authenticated call receives it as an argument
//! - **Server-authoritative seats**: availability is always recomputed from
//!   a re-fetched event, never adjusted locally
//! - **Gated mutations**: at most one register/cancel call per view
//! - **Testable**: every provider has an in-memory mock
//!
//! ## Architecture
//!
//! ```text
//! SessionManager ──Viewer──▶ view reducers ──▶ EventsApi / RegistrationsApi
//!        ▲                          │
//!        └──── SessionInvalidator ◀─┘  (on HTTP 401)
//! ```
//!
//! ## Example: sign in and register
//!
//! ```rust,ignore
//! use eventdesk_client::*;
//!
//! let session = SessionManager::new(SessionEnvironment::new(api, storage, notifier));
//! session.initialize().await?;
//!
//! if session.login(LoginRequest::new("ada@example.com", "secret")).await? {
//!     let viewer = session.viewer().await;
//!     let store = Store::new(
//!         EventDetailState::new(EventId::new("42"), viewer),
//!         EventDetailReducer::new(),
//!         view_env,
//!     );
//!     store.send(EventDetailAction::Load).await?.wait().await;
//!     store.send(EventDetailAction::Register).await?.wait().await;
//! }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod config;
pub mod constants;
pub mod credential;
pub mod error;
pub mod providers;
pub mod session;
pub mod types;
pub mod views;

// Mock implementations for testing
#[cfg(feature = "test-utils")]
pub mod mocks;

// Re-export main types for convenience
pub use config::ClientConfig;
pub use credential::Credential;
pub use error::{ClientError, Result};
pub use providers::{FileTokenStorage, HttpApi};
pub use session::{SessionEnvironment, SessionManager, Viewer};
pub use types::{Event, EventFilter, EventId, LoginRequest, Route, SignupRequest, User};
