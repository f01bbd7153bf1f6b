//! Terminal notifier and navigator.

use crate::providers::{Navigator, Notifier};
use crate::types::{Notification, NotificationLevel, Route};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

/// Prints notifications to the terminal.
///
/// Successes go to stdout, errors to stderr. Each notification is also
/// logged through `tracing`.
#[derive(Clone, Debug, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    /// Create a new console notifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => {
                info!(message = %notification.message, "notification");
                println!("✔ {}", notification.message);
            },
            NotificationLevel::Error => {
                warn!(message = %notification.message, "notification");
                eprintln!("✘ {}", notification.message);
            },
        }
    }
}

/// Records where the views asked to go.
///
/// A terminal has no router, so the binary reads the last requested route
/// after a command and prints a hint.
#[derive(Clone, Debug, Default)]
pub struct ConsoleNavigator {
    last: Arc<Mutex<Option<Route>>>,
}

impl ConsoleNavigator {
    /// Create a navigator with no recorded route.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the most recently requested route.
    #[must_use]
    pub fn take_last(&self) -> Option<Route> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl Navigator for ConsoleNavigator {
    fn navigate(&self, route: Route) {
        info!(path = %route, "navigate");
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(route);
    }
}
