//! Session management.
//!
//! The session owns the credential. Nothing else in the client stores or
//! mutates it; views receive a [`Viewer`] snapshot and report rejected
//! credentials back through [`SessionInvalidator`](crate::providers::SessionInvalidator).

pub mod actions;
pub mod environment;
pub mod manager;
pub mod reducer;
pub mod state;

pub use actions::{AuthMethod, SessionAction};
pub use environment::SessionEnvironment;
pub use manager::SessionManager;
pub use reducer::SessionReducer;
pub use state::{SessionPhase, SessionState, Viewer};
