//! In-memory event platform backend.

use crate::credential::Credential;
use crate::error::{ClientError, Result};
use crate::providers::{AuthApi, EventsApi, RegistrationsApi};
use crate::types::{
    AuthResponse, Event, EventFilter, EventId, LoginRequest, MyRegistrations, Registration,
    RegistrationId, SignupRequest, User, UserId,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Endpoints of the API, for call counting and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `POST /api/auth/login`
    Login,
    /// `POST /api/auth/register`
    Signup,
    /// `GET /api/auth/me`
    CurrentUser,
    /// `GET /api/events`
    ListEvents,
    /// `GET /api/events/:id`
    GetEvent,
    /// `GET /api/registrations/my-registrations`
    MyRegistrations,
    /// `POST /api/registrations`
    Register,
    /// `DELETE /api/registrations/:eventId`
    Cancel,
}

#[derive(Debug)]
struct Account {
    user: User,
    password: String,
}

#[derive(Debug)]
struct Backend {
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, UserId>,
    events: BTreeMap<EventId, Event>,
    registrations: Vec<(UserId, RegistrationId, EventId, DateTime<Utc>)>,
    now: DateTime<Utc>,
    next_id: u64,
    calls: HashMap<Endpoint, usize>,
    failures: HashMap<Endpoint, ClientError>,
    latency: HashMap<Endpoint, Duration>,
}

impl Backend {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn authenticate(&self, credential: &Credential) -> Result<UserId> {
        self.tokens
            .get(credential.secret())
            .cloned()
            .ok_or_else(|| ClientError::Unauthorized {
                message: Some("Not authorized, token failed".to_string()),
            })
    }

    fn issue(&mut self, user: &User) -> AuthResponse {
        let token = self.next_id("token");
        self.tokens.insert(token.clone(), user.id.clone());
        AuthResponse {
            token,
            user: user.clone(),
        }
    }

    fn event(&self, id: &EventId) -> Result<Event> {
        self.events
            .get(id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound {
                message: Some("Event not found".to_string()),
            })
    }
}

/// In-memory implementation of every API trait.
///
/// Behaves like the real backend: passwords are checked, tokens are issued
/// and verified, capacity is enforced, registration counts move with
/// registrations, and registrations are split into upcoming and past
/// against a fixed "server time". Clones share the same backend.
#[derive(Debug, Clone)]
pub struct MockApi {
    backend: Arc<Mutex<Backend>>,
}

impl MockApi {
    /// Create an empty backend whose clock reads `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            backend: Arc::new(Mutex::new(Backend {
                accounts: HashMap::new(),
                tokens: HashMap::new(),
                events: BTreeMap::new(),
                registrations: Vec::new(),
                now,
                next_id: 0,
                calls: HashMap::new(),
                failures: HashMap::new(),
                latency: HashMap::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Backend> {
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create an account.
    pub fn add_account(&self, name: &str, email: &str, password: &str) -> User {
        let mut backend = self.lock();
        let user = User {
            id: UserId::new(backend.next_id("user")),
            name: name.to_string(),
            email: email.to_string(),
        };
        backend.accounts.insert(
            email.to_string(),
            Account {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        user
    }

    /// Issue a valid token for an existing account, bypassing login.
    #[must_use]
    pub fn issue_token(&self, user: &User) -> Credential {
        let response = self.lock().issue(user);
        Credential::from_issued(response.token)
    }

    /// Invalidate every issued token.
    pub fn revoke_tokens(&self) {
        self.lock().tokens.clear();
    }

    /// Add or replace an event.
    pub fn put_event(&self, event: Event) {
        self.lock().events.insert(event.id.clone(), event);
    }

    /// Current server record of an event.
    #[must_use]
    pub fn event(&self, id: &EventId) -> Option<Event> {
        self.lock().events.get(id).cloned()
    }

    /// Register `user` for an event directly, bypassing capacity checks.
    pub fn seed_registration(&self, user: &User, event_id: &EventId, registered_at: DateTime<Utc>) {
        let mut backend = self.lock();
        let registration_id = RegistrationId::new(backend.next_id("reg"));
        if let Some(event) = backend.events.get_mut(event_id) {
            event.registrations_count += 1;
        }
        backend.registrations.push((
            user.id.clone(),
            registration_id,
            event_id.clone(),
            registered_at,
        ));
    }

    /// Make every call to `endpoint` fail with `error` until [`MockApi::recover`].
    pub fn fail(&self, endpoint: Endpoint, error: ClientError) {
        self.lock().failures.insert(endpoint, error);
    }

    /// Stop failing `endpoint`.
    pub fn recover(&self, endpoint: Endpoint) {
        self.lock().failures.remove(&endpoint);
    }

    /// Delay every call to `endpoint` by `delay`.
    pub fn set_latency(&self, endpoint: Endpoint, delay: Duration) {
        self.lock().latency.insert(endpoint, delay);
    }

    /// Number of calls received by `endpoint`.
    #[must_use]
    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.lock().calls.get(&endpoint).copied().unwrap_or(0)
    }

    /// Enter an endpoint: count the call, apply latency, apply injected failure.
    fn enter(&self, endpoint: Endpoint) -> impl Future<Output = Result<()>> + Send {
        let backend = Arc::clone(&self.backend);

        async move {
            let delay = {
                let mut guard = backend.lock().unwrap_or_else(PoisonError::into_inner);
                *guard.calls.entry(endpoint).or_insert(0) += 1;
                guard.latency.get(&endpoint).copied()
            };

            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let failure = backend
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .failures
                .get(&endpoint)
                .cloned();
            failure.map_or(Ok(()), Err)
        }
    }
}

impl AuthApi for MockApi {
    fn login(&self, request: &LoginRequest) -> impl Future<Output = Result<AuthResponse>> + Send {
        let api = self.clone();
        let request = request.clone();

        async move {
            api.enter(Endpoint::Login).await?;
            let mut backend = api.lock();

            let user = match backend.accounts.get(&request.email) {
                Some(account) if account.password == request.password => account.user.clone(),
                Some(_) => {
                    return Err(ClientError::Unauthorized {
                        message: Some("Invalid password".to_string()),
                    });
                },
                None => {
                    return Err(ClientError::Unauthorized {
                        message: Some("Invalid credentials".to_string()),
                    });
                },
            };

            Ok(backend.issue(&user))
        }
    }

    fn signup(&self, request: &SignupRequest) -> impl Future<Output = Result<AuthResponse>> + Send {
        let api = self.clone();
        let request = request.clone();

        async move {
            api.enter(Endpoint::Signup).await?;

            if api.lock().accounts.contains_key(&request.email) {
                return Err(ClientError::Rejected {
                    status: 400,
                    message: Some("User already exists".to_string()),
                });
            }

            let user = api.add_account(&request.name, &request.email, &request.password);
            Ok(api.lock().issue(&user))
        }
    }

    fn current_user(&self, credential: &Credential) -> impl Future<Output = Result<User>> + Send {
        let api = self.clone();
        let credential = credential.clone();

        async move {
            api.enter(Endpoint::CurrentUser).await?;
            let backend = api.lock();

            let user_id = backend.authenticate(&credential)?;
            backend
                .accounts
                .values()
                .find(|a| a.user.id == user_id)
                .map(|a| a.user.clone())
                .ok_or_else(|| ClientError::Unauthorized {
                    message: Some("User not found".to_string()),
                })
        }
    }
}

fn matches_filter(event: &Event, filter: &EventFilter) -> bool {
    let search = filter.search.trim().to_lowercase();
    let location = filter.location.trim().to_lowercase();

    (search.is_empty()
        || event.name.to_lowercase().contains(&search)
        || event.description.to_lowercase().contains(&search))
        && filter
            .category
            .is_none_or(|c| event.category.eq_ignore_ascii_case(c.as_str()))
        && (location.is_empty() || event.location.to_lowercase().contains(&location))
}

impl EventsApi for MockApi {
    fn list_events(&self, filter: &EventFilter) -> impl Future<Output = Result<Vec<Event>>> + Send {
        let api = self.clone();
        let filter = filter.clone();

        async move {
            api.enter(Endpoint::ListEvents).await?;
            let backend = api.lock();

            let mut events: Vec<Event> = backend
                .events
                .values()
                .filter(|e| matches_filter(e, &filter))
                .cloned()
                .collect();
            events.sort_by_key(|e| e.date);
            Ok(events)
        }
    }

    fn get_event(&self, id: &EventId) -> impl Future<Output = Result<Event>> + Send {
        let api = self.clone();
        let id = id.clone();

        async move {
            api.enter(Endpoint::GetEvent).await?;
            api.lock().event(&id)
        }
    }
}

impl RegistrationsApi for MockApi {
    fn my_registrations(
        &self,
        credential: &Credential,
    ) -> impl Future<Output = Result<MyRegistrations>> + Send {
        let api = self.clone();
        let credential = credential.clone();

        async move {
            api.enter(Endpoint::MyRegistrations).await?;
            let backend = api.lock();
            let user_id = backend.authenticate(&credential)?;

            let mut mine = MyRegistrations::default();
            for (owner, id, event_id, registered_at) in &backend.registrations {
                if owner != &user_id {
                    continue;
                }
                let Some(event) = backend.events.get(event_id).cloned() else {
                    continue;
                };
                let registration = Registration {
                    id: id.clone(),
                    event,
                    registered_at: *registered_at,
                };
                if registration.event.date >= backend.now {
                    mine.upcoming.push(registration);
                } else {
                    mine.past.push(registration);
                }
            }
            Ok(mine)
        }
    }

    fn register(
        &self,
        credential: &Credential,
        event_id: &EventId,
    ) -> impl Future<Output = Result<()>> + Send {
        let api = self.clone();
        let credential = credential.clone();
        let event_id = event_id.clone();

        async move {
            api.enter(Endpoint::Register).await?;
            let mut backend = api.lock();
            let user_id = backend.authenticate(&credential)?;
            let event = backend.event(&event_id)?;

            let already = backend
                .registrations
                .iter()
                .any(|(owner, _, id, _)| owner == &user_id && id == &event_id);
            if already {
                return Err(ClientError::Rejected {
                    status: 400,
                    message: Some("Already registered for this event".to_string()),
                });
            }
            if event.availability().is_full() {
                return Err(ClientError::Rejected {
                    status: 400,
                    message: Some("Event is full".to_string()),
                });
            }

            let registration_id = RegistrationId::new(backend.next_id("reg"));
            let now = backend.now;
            backend
                .registrations
                .push((user_id, registration_id, event_id.clone(), now));
            if let Some(event) = backend.events.get_mut(&event_id) {
                event.registrations_count += 1;
            }
            Ok(())
        }
    }

    fn cancel(
        &self,
        credential: &Credential,
        event_id: &EventId,
    ) -> impl Future<Output = Result<()>> + Send {
        let api = self.clone();
        let credential = credential.clone();
        let event_id = event_id.clone();

        async move {
            api.enter(Endpoint::Cancel).await?;
            let mut backend = api.lock();
            let user_id = backend.authenticate(&credential)?;

            let before = backend.registrations.len();
            backend
                .registrations
                .retain(|(owner, _, id, _)| !(owner == &user_id && id == &event_id));
            if backend.registrations.len() == before {
                return Err(ClientError::NotFound {
                    message: Some("Registration not found".to_string()),
                });
            }

            if let Some(event) = backend.events.get_mut(&event_id) {
                event.registrations_count = event.registrations_count.saturating_sub(1);
            }
            Ok(())
        }
    }
}
