//! User-facing text.
//!
//! Notification messages and control labels shown by every front end.

/// Notification messages.
pub mod messages {
    /// Login succeeded.
    pub const LOGIN_SUCCESS: &str = "Login successful!";

    /// Login failed and the server sent no message.
    pub const LOGIN_FAILED: &str = "Login failed";

    /// Account registration succeeded.
    pub const SIGNUP_SUCCESS: &str = "Registration successful!";

    /// Account registration failed and the server sent no message.
    pub const SIGNUP_FAILED: &str = "Registration failed";

    /// Logout completed.
    pub const LOGOUT_SUCCESS: &str = "Logged out successfully";

    /// Event registration succeeded.
    pub const EVENT_REGISTER_SUCCESS: &str = "Successfully registered for event!";

    /// Event registration failed and the server sent no message.
    pub const EVENT_REGISTER_FAILED: &str = "Registration failed";

    /// Event registration cancelled.
    pub const CANCEL_SUCCESS: &str = "Registration cancelled";

    /// Cancelling failed and the server sent no message.
    pub const CANCEL_FAILED: &str = "Failed to cancel registration";

    /// Event detail could not be loaded.
    pub const EVENT_NOT_FOUND: &str = "Event not found";

    /// Event list could not be loaded.
    pub const EVENTS_LOAD_FAILED: &str = "Failed to load events";

    /// Dashboard registrations could not be loaded.
    pub const REGISTRATIONS_LOAD_FAILED: &str = "Failed to load registrations";
}

/// Control labels.
pub mod labels {
    /// Event date is in the past.
    pub const EVENT_PASSED: &str = "This event has already passed";

    /// Anonymous viewer.
    pub const LOGIN_TO_REGISTER: &str = "Login to Register";

    /// Viewer already holds a registration.
    pub const CANCEL_REGISTRATION: &str = "Cancel Registration";

    /// A register call is in flight.
    pub const REGISTERING: &str = "Registering...";

    /// No seats left.
    pub const EVENT_FULL: &str = "Event Full";

    /// Registration is possible.
    pub const REGISTER_NOW: &str = "Register Now";

    /// Event card of a full event.
    pub const SOLD_OUT: &str = "Sold Out";

    /// Event card of an event with seats left.
    pub const VIEW_DETAILS: &str = "View Details";

    /// Category filter with no category selected.
    pub const ALL_CATEGORIES: &str = "All Categories";
}
