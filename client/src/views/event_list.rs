//! Event list view-model.
//!
//! Holds the filter and the matching events. Every filter change re-fetches;
//! each request carries a sequence number and only the response to the
//! latest request is applied, so fast typing never shows an older result.

use super::environment::ViewEnvironment;
use crate::constants::{labels, messages};
use crate::error::ClientError;
use crate::providers::{EventsApi, Navigator, Notifier, RegistrationsApi, SessionInvalidator};
use crate::types::{Availability, Category, Event, EventFilter, EventId, Notification, Route};
use chrono::{DateTime, Utc};
use eventdesk_core::effect::Effect;
use eventdesk_core::reducer::Reducer;
use eventdesk_core::{smallvec, SmallVec};
use tracing::{debug, warn};

/// Event list state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventListState {
    /// Current filter
    pub filter: EventFilter,
    /// Events matching the filter, as of the latest applied response
    pub events: Vec<Event>,
    /// Whether a request is in flight
    pub loading: bool,
    request_seq: u64,
}

impl EventListState {
    /// Create an empty list with no filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number of the latest request.
    #[must_use]
    pub const fn request_seq(&self) -> u64 {
        self.request_seq
    }

    /// Event cards in server order.
    #[must_use]
    pub fn cards(&self) -> Vec<EventCard> {
        self.events.iter().map(EventCard::from).collect()
    }
}

/// One entry of the event list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCard {
    /// Event id
    pub id: EventId,
    /// Title
    pub name: String,
    /// Category as sent by the server
    pub category: String,
    /// Start time
    pub date: DateTime<Utc>,
    /// Venue
    pub location: String,
    /// Seats
    pub availability: Availability,
}

impl EventCard {
    /// "Sold Out" when full, else "View Details".
    #[must_use]
    pub fn action_label(&self) -> &'static str {
        if self.availability.is_full() {
            labels::SOLD_OUT
        } else {
            labels::VIEW_DETAILS
        }
    }

    /// Seat summary, e.g. `3 / 10 seats available`.
    #[must_use]
    pub fn seats(&self) -> String {
        self.availability.summary()
    }

    /// Where selecting the card leads.
    #[must_use]
    pub fn route(&self) -> Route {
        Route::EventDetail(self.id.clone())
    }
}

impl From<&Event> for EventCard {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id.clone(),
            name: event.name.clone(),
            category: event.category.clone(),
            date: event.date,
            location: event.location.clone(),
            availability: event.availability(),
        }
    }
}

/// Event list actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventListAction {
    /// (Re)load with the current filter
    Load,
    /// Set the search text
    SetSearch(String),
    /// Set or clear the category
    SetCategory(Option<Category>),
    /// Set the location text
    SetLocation(String),
    /// Reset all criteria
    ClearFilters,
    /// Response to request `seq`
    EventsLoaded {
        /// Request sequence number
        seq: u64,
        /// Matching events
        events: Vec<Event>,
    },
    /// Request `seq` failed
    EventsFailed {
        /// Request sequence number
        seq: u64,
        /// Why
        error: ClientError,
    },
}

/// Event list reducer.
#[derive(Debug, Clone)]
pub struct EventListReducer<P, N, V, I> {
    _phantom: std::marker::PhantomData<(P, N, V, I)>,
}

impl<P, N, V, I> EventListReducer<P, N, V, I> {
    /// Create a new event list reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<P, N, V, I> Default for EventListReducer<P, N, V, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, N, V, I> EventListReducer<P, N, V, I>
where
    P: EventsApi + RegistrationsApi + Clone + 'static,
    N: Notifier + Clone + 'static,
    V: Navigator + Clone + 'static,
    I: SessionInvalidator + Clone + 'static,
{
    fn fetch(
        state: &mut EventListState,
        env: &ViewEnvironment<P, N, V, I>,
    ) -> SmallVec<[Effect<EventListAction>; 4]> {
        state.request_seq += 1;
        state.loading = true;

        let seq = state.request_seq;
        let filter = state.filter.clone();
        let api = env.api.clone();

        smallvec![Effect::future(async move {
            match api.list_events(&filter).await {
                Ok(events) => Some(EventListAction::EventsLoaded { seq, events }),
                Err(error) => Some(EventListAction::EventsFailed { seq, error }),
            }
        })]
    }
}

impl<P, N, V, I> Reducer for EventListReducer<P, N, V, I>
where
    P: EventsApi + RegistrationsApi + Clone + 'static,
    N: Notifier + Clone + 'static,
    V: Navigator + Clone + 'static,
    I: SessionInvalidator + Clone + 'static,
{
    type State = EventListState;
    type Action = EventListAction;
    type Environment = ViewEnvironment<P, N, V, I>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            EventListAction::Load => Self::fetch(state, env),

            EventListAction::SetSearch(search) => {
                if state.filter.search == search {
                    return SmallVec::new();
                }
                state.filter.search = search;
                Self::fetch(state, env)
            },

            EventListAction::SetCategory(category) => {
                if state.filter.category == category {
                    return SmallVec::new();
                }
                state.filter.category = category;
                Self::fetch(state, env)
            },

            EventListAction::SetLocation(location) => {
                if state.filter.location == location {
                    return SmallVec::new();
                }
                state.filter.location = location;
                Self::fetch(state, env)
            },

            EventListAction::ClearFilters => {
                if state.filter == EventFilter::default() {
                    return SmallVec::new();
                }
                state.filter.clear();
                Self::fetch(state, env)
            },

            EventListAction::EventsLoaded { seq, events } => {
                if seq != state.request_seq {
                    debug!(seq, latest = state.request_seq, "Discarding stale event list");
                    return SmallVec::new();
                }
                state.events = events;
                state.loading = false;
                SmallVec::new()
            },

            EventListAction::EventsFailed { seq, error } => {
                if seq != state.request_seq {
                    debug!(seq, latest = state.request_seq, "Discarding stale event list failure");
                    return SmallVec::new();
                }
                warn!(%error, "Failed to load events");
                state.events.clear();
                state.loading = false;

                let notifier = env.notifier.clone();
                smallvec![Effect::future(async move {
                    notifier.notify(Notification::error(messages::EVENTS_LOAD_FAILED));
                    None
                })]
            },
        }
    }
}
