//! Mock provider implementations for testing.
//!
//! In-memory implementations of every provider trait, plus event fixtures.

pub mod api;
pub mod presentation;
pub mod storage;

pub use api::{Endpoint, MockApi};
pub use presentation::{MockSessionInvalidator, RecordingNavigator, RecordingNotifier};
pub use storage::MemoryTokenStorage;

use crate::types::{Event, EventId};
use chrono::{DateTime, Utc};

/// Build an event with the given seat counts and start time.
#[must_use]
pub fn event(id: &str, capacity: u32, registrations: u32, date: DateTime<Utc>) -> Event {
    Event {
        id: EventId::new(id),
        name: format!("Event {id}"),
        description: format!("Description of {id}"),
        category: "Meetup".to_string(),
        date,
        location: "Berlin".to_string(),
        organizer: "EventDesk".to_string(),
        image_url: None,
        capacity,
        registrations_count: registrations,
    }
}
