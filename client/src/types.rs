//! Wire and domain types.
//!
//! Every API response is parsed into one of these types at the boundary.
//! A body that does not fit is a [`ClientError::Decode`], never a partially
//! filled value.

use crate::error::ClientError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// ═══════════════════════════════════════════════════════════════════════
// Identifiers
// ═══════════════════════════════════════════════════════════════════════

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw id.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The raw id.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

string_id!(
    /// Server-assigned user id.
    UserId
);
string_id!(
    /// Server-assigned event id.
    EventId
);
string_id!(
    /// Server-assigned registration id.
    RegistrationId
);

/// Pick the object id from `_id` or `id`; `_id` wins when both are sent.
fn object_id<T>(underscore: Option<T>, plain: Option<T>) -> Result<T, &'static str> {
    underscore.or(plain).ok_or("missing field `_id`")
}

// ═══════════════════════════════════════════════════════════════════════
// Users and authentication
// ═══════════════════════════════════════════════════════════════════════

/// The authenticated user.
///
/// Fields beyond id, name and email (such as `role`) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UserRecord")]
pub struct User {
    /// User id (`_id` on the wire, `id` also accepted)
    #[serde(rename = "_id")]
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
}

#[derive(Deserialize)]
struct UserRecord {
    #[serde(rename = "_id")]
    underscore_id: Option<UserId>,
    id: Option<UserId>,
    name: String,
    email: String,
}

impl TryFrom<UserRecord> for User {
    type Error = &'static str;

    fn try_from(record: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: object_id(record.underscore_id, record.id)?,
            name: record.name,
            email: record.email,
        })
    }
}

/// Body of `POST /api/auth/login`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

impl LoginRequest {
    /// Create a login request.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /api/auth/register`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct SignupRequest {
    /// Display name
    pub name: String,
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

impl SignupRequest {
    /// Create a signup request.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response of login and signup: a token next to the user fields.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    /// Bearer token
    pub token: String,
    /// User fields, flattened beside the token
    #[serde(flatten)]
    pub user: User,
}

impl fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthResponse")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Events
// ═══════════════════════════════════════════════════════════════════════

/// An event as served by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "EventRecord")]
pub struct Event {
    /// Event id (`_id` on the wire, `id` also accepted)
    #[serde(rename = "_id")]
    pub id: EventId,
    /// Title
    pub name: String,
    /// Long description
    pub description: String,
    /// Category name as sent by the server
    pub category: String,
    /// Start time
    pub date: DateTime<Utc>,
    /// Venue
    pub location: String,
    /// Organizer name
    pub organizer: String,
    /// Cover image
    pub image_url: Option<String>,
    /// Total seats
    pub capacity: u32,
    /// Seats taken; missing or null means none
    pub registrations_count: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventRecord {
    #[serde(rename = "_id")]
    underscore_id: Option<EventId>,
    id: Option<EventId>,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: String,
    date: DateTime<Utc>,
    #[serde(default)]
    location: String,
    #[serde(default)]
    organizer: String,
    #[serde(default)]
    image_url: Option<String>,
    capacity: u32,
    #[serde(default, deserialize_with = "null_as_zero")]
    registrations_count: u32,
}

impl TryFrom<EventRecord> for Event {
    type Error = &'static str;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: object_id(record.underscore_id, record.id)?,
            name: record.name,
            description: record.description,
            category: record.category,
            date: record.date,
            location: record.location,
            organizer: record.organizer,
            image_url: record.image_url,
            capacity: record.capacity,
            registrations_count: record.registrations_count,
        })
    }
}

impl Event {
    /// Seat availability derived from capacity and registrations.
    #[must_use]
    pub const fn availability(&self) -> Availability {
        Availability::new(self.capacity, self.registrations_count)
    }

    /// Whether the event started before `now`.
    #[must_use]
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.date < now
    }
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or_default())
}

/// Seat availability of one event.
///
/// Always recomputed from the latest server record, never adjusted locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Availability {
    /// Total seats
    pub capacity: u32,
    /// Seats taken
    pub registered: u32,
}

impl Availability {
    /// Create availability from raw counts.
    #[must_use]
    pub const fn new(capacity: u32, registered: u32) -> Self {
        Self {
            capacity,
            registered,
        }
    }

    /// `capacity - registered`; negative when the event is oversold.
    ///
    /// ```
    /// # use eventdesk_client::types::Availability;
    /// assert_eq!(Availability::new(10, 12).available_seats(), -2);
    /// ```
    #[must_use]
    pub fn available_seats(&self) -> i64 {
        i64::from(self.capacity) - i64::from(self.registered)
    }

    /// No seats left.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.available_seats() <= 0
    }

    /// Seats to display; an oversold event shows zero.
    #[must_use]
    pub const fn displayed_seats(&self) -> u32 {
        self.capacity.saturating_sub(self.registered)
    }

    /// Seat summary line, e.g. `3 / 10 seats available`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} / {} seats available",
            self.displayed_seats(),
            self.capacity
        )
    }
}

/// Response of `GET /api/events`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventsPage {
    /// Matching events; a missing list means none
    #[serde(default)]
    pub events: Vec<Event>,
}

/// Event categories offered by the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Conference
    Conference,
    /// Workshop
    Workshop,
    /// Meetup
    Meetup,
    /// Concert
    Concert,
    /// Sports
    Sports,
    /// Anything else
    Other,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Self; 6] = [
        Self::Conference,
        Self::Workshop,
        Self::Meetup,
        Self::Concert,
        Self::Sports,
        Self::Other,
    ];

    /// Name used on the wire and in the filter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Conference => "Conference",
            Self::Workshop => "Workshop",
            Self::Meetup => "Meetup",
            Self::Concert => "Concert",
            Self::Sports => "Sports",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ClientError::Config(format!("unknown category {wanted:?}")))
    }
}

/// Event list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Free-text search
    pub search: String,
    /// Category, or `None` for all categories
    pub category: Option<Category>,
    /// Location substring
    pub location: String,
}

impl EventFilter {
    /// Whether no criterion is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty() && self.category.is_none() && self.location.trim().is_empty()
    }

    /// Reset all criteria.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Query parameters; unset criteria are omitted.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);
        if !self.search.trim().is_empty() {
            pairs.push(("search", self.search.trim().to_string()));
        }
        if let Some(category) = self.category {
            pairs.push(("category", category.as_str().to_string()));
        }
        if !self.location.trim().is_empty() {
            pairs.push(("location", self.location.trim().to_string()));
        }
        pairs
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registrations
// ═══════════════════════════════════════════════════════════════════════

/// A registration of the current user for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RegistrationRecord")]
pub struct Registration {
    /// Registration id (`_id` on the wire, `id` also accepted)
    #[serde(rename = "_id")]
    pub id: RegistrationId,
    /// The event, embedded by the server
    pub event: Event,
    /// When the registration was made
    pub registered_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistrationRecord {
    #[serde(rename = "_id")]
    underscore_id: Option<RegistrationId>,
    id: Option<RegistrationId>,
    event: Event,
    registered_at: DateTime<Utc>,
}

impl TryFrom<RegistrationRecord> for Registration {
    type Error = &'static str;

    fn try_from(record: RegistrationRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: object_id(record.underscore_id, record.id)?,
            event: record.event,
            registered_at: record.registered_at,
        })
    }
}

/// Response of `GET /api/registrations/my-registrations`.
///
/// The upcoming/past split is computed by the server and never recomputed here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MyRegistrations {
    /// Registrations for events that have not happened yet
    pub upcoming: Vec<Registration>,
    /// Registrations for events in the past
    pub past: Vec<Registration>,
}

impl MyRegistrations {
    /// Whether the user holds an upcoming registration for `event_id`.
    #[must_use]
    pub fn is_registered(&self, event_id: &EventId) -> bool {
        self.upcoming.iter().any(|r| &r.event.id == event_id)
    }
}

/// Body of `POST /api/registrations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRegistration {
    /// Event to register for
    pub event_id: EventId,
}

// ═══════════════════════════════════════════════════════════════════════
// Presentation
// ═══════════════════════════════════════════════════════════════════════

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationLevel {
    /// Operation succeeded
    Success,
    /// Operation failed
    Error,
}

/// A transient user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity
    pub level: NotificationLevel,
    /// Text
    pub message: String,
}

impl Notification {
    /// Success notification.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    /// Error notification.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Navigation targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    /// Login form
    Login,
    /// Signup form
    Register,
    /// Event list
    Events,
    /// One event
    EventDetail(EventId),
    /// The user's registrations
    Dashboard,
}

impl Route {
    /// Path of the route.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Login => "/login".to_string(),
            Self::Register => "/register".to_string(),
            Self::Events => "/events".to_string(),
            Self::EventDetail(id) => format!("/event/{id}"),
            Self::Dashboard => "/dashboard".to_string(),
        }
    }

    /// Resolve a path; `/` redirects to the event list.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.trim_end_matches('/');
        match path {
            "" | "/events" => Some(Self::Events),
            "/login" => Some(Self::Login),
            "/register" => Some(Self::Register),
            "/dashboard" => Some(Self::Dashboard),
            other => other
                .strip_prefix("/event/")
                .filter(|id| !id.is_empty() && !id.contains('/'))
                .map(|id| Self::EventDetail(EventId::new(id))),
        }
    }

    /// Whether the route requires an authenticated session.
    #[must_use]
    pub const fn is_private(&self) -> bool {
        matches!(self, Self::Dashboard)
    }

    /// Where an anonymous or authenticated visitor to this route lands.
    #[must_use]
    pub fn guard(self, authenticated: bool) -> Self {
        if self.is_private() && !authenticated {
            Self::Login
        } else {
            self
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event_json() -> serde_json::Value {
        json!({
            "_id": "evt-1",
            "name": "RustConf",
            "description": "Talks",
            "category": "Conference",
            "date": "2030-09-10T09:00:00Z",
            "location": "Montreal",
            "organizer": "Rust Foundation",
            "imageUrl": "https://img.example/rustconf.png",
            "capacity": 10,
            "registrationsCount": 4,
            "createdBy": "someone"
        })
    }

    #[test]
    fn test_event_parses_mongo_shape() {
        let event: Event = serde_json::from_value(event_json()).unwrap();
        assert_eq!(event.id.as_str(), "evt-1");
        assert_eq!(event.image_url.as_deref(), Some("https://img.example/rustconf.png"));
        assert_eq!(event.availability().available_seats(), 6);
    }

    #[test]
    fn test_missing_or_null_count_is_zero() {
        let mut value = event_json();
        value.as_object_mut().unwrap().remove("registrationsCount");
        let event: Event = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(event.registrations_count, 0);

        value["registrationsCount"] = serde_json::Value::Null;
        let event: Event = serde_json::from_value(value).unwrap();
        assert_eq!(event.registrations_count, 0);
    }

    #[test]
    fn test_event_rejects_negative_capacity() {
        let mut value = event_json();
        value["capacity"] = json!(-1);
        assert!(serde_json::from_value::<Event>(value).is_err());
    }

    #[test]
    fn test_plain_id_is_accepted() {
        let user: User = serde_json::from_value(json!({
            "id": "u-1",
            "name": "Ada",
            "email": "ada@example.com",
            "role": "user"
        }))
        .unwrap();
        assert_eq!(user.id, UserId::new("u-1"));
    }

    #[test]
    fn test_both_id_keys_prefer_underscore() {
        let user: User = serde_json::from_value(json!({
            "_id": "u-1",
            "id": "u-1-virtual",
            "name": "Ada",
            "email": "ada@example.com"
        }))
        .unwrap();
        assert_eq!(user.id, UserId::new("u-1"));

        let mut value = event_json();
        value["id"] = json!("evt-1");
        let event: Event = serde_json::from_value(value).unwrap();
        assert_eq!(event.id.as_str(), "evt-1");
    }

    #[test]
    fn test_missing_id_is_rejected() {
        let mut value = event_json();
        value.as_object_mut().unwrap().remove("_id");
        assert!(serde_json::from_value::<Event>(value).is_err());
    }

    #[test]
    fn test_auth_response_flattens_user() {
        let response: AuthResponse = serde_json::from_value(json!({
            "_id": "u-1",
            "name": "Ada",
            "email": "ada@example.com",
            "role": "user",
            "token": "jwt"
        }))
        .unwrap();
        assert_eq!(response.token, "jwt");
        assert_eq!(response.user.name, "Ada");
        assert!(!format!("{response:?}").contains("jwt"));
    }

    #[test]
    fn test_oversold_event_shows_zero_seats() {
        let availability = Availability::new(10, 13);
        assert!(availability.is_full());
        assert_eq!(availability.summary(), "0 / 10 seats available");
    }

    #[test]
    fn test_filter_omits_empty_criteria() {
        let mut filter = EventFilter {
            search: "  rust ".to_string(),
            category: Some(Category::Workshop),
            location: String::new(),
        };
        assert_eq!(
            filter.query_pairs(),
            vec![
                ("search", "rust".to_string()),
                ("category", "Workshop".to_string())
            ]
        );

        filter.clear();
        assert!(filter.is_empty());
        assert!(filter.query_pairs().is_empty());
    }

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!("meetup".parse::<Category>().unwrap(), Category::Meetup);
        assert!("gala".parse::<Category>().is_err());
    }

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::from_path("/"), Some(Route::Events));
        assert_eq!(
            Route::from_path("/event/abc"),
            Some(Route::EventDetail(EventId::new("abc")))
        );
        assert_eq!(Route::EventDetail(EventId::new("abc")).path(), "/event/abc");
        assert_eq!(Route::from_path("/nowhere"), None);
        assert!(Route::Dashboard.is_private());
    }

    #[test]
    fn test_private_route_redirects_anonymous_visitor() {
        assert_eq!(Route::Dashboard.guard(false), Route::Login);
        assert_eq!(Route::Dashboard.guard(true), Route::Dashboard);

        let detail = Route::from_path("/event/abc/").unwrap();
        assert_eq!(detail.clone().guard(false), detail);
        assert_eq!(Route::from_path("/dashboard").unwrap().guard(false), Route::Login);
    }

    #[test]
    fn test_create_registration_body() {
        let body = serde_json::to_value(CreateRegistration {
            event_id: EventId::new("evt-1"),
        })
        .unwrap();
        assert_eq!(body, json!({ "eventId": "evt-1" }));
    }
}
