//! Screen view-models.
//!
//! Each screen is a reducer over its own state. Views never own the
//! credential: they receive a [`Viewer`](crate::session::Viewer) snapshot
//! and report rejected credentials through the session invalidator.

pub mod dashboard;
pub mod environment;
pub mod event_detail;
pub mod event_list;

pub use dashboard::{DashboardAction, DashboardReducer, DashboardState};
pub use environment::ViewEnvironment;
pub use event_detail::{Affordance, EventDetailAction, EventDetailReducer, EventDetailState, Mutation};
pub use event_list::{EventCard, EventListAction, EventListReducer, EventListState};
