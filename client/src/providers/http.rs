//! `reqwest` implementation of the API traits.

use crate::config::ClientConfig;
use crate::credential::Credential;
use crate::error::{ClientError, Result};
use crate::providers::{AuthApi, EventsApi, RegistrationsApi};
use crate::types::{
    AuthResponse, CreateRegistration, Event, EventFilter, EventId, EventsPage, LoginRequest,
    MyRegistrations, SignupRequest, User,
};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

/// HTTP client for the event platform API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone, Debug)]
pub struct HttpApi {
    client: Client,
    api_url: Arc<str>,
}

/// Error body shape: `{ "message": "..." }`.
#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl HttpApi {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: Arc::from(config.api_url.as_str()),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }

    fn event_path(prefix: &str, id: &EventId) -> String {
        format!("{prefix}/{}", urlencoding::encode(id.as_str()))
    }

    fn authorized(request: RequestBuilder, credential: &Credential) -> RequestBuilder {
        request.header(AUTHORIZATION, credential.authorization_header())
    }

    async fn execute(request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message);

        debug!(status = status.as_u16(), "API request failed");

        Err(match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized { message },
            StatusCode::NOT_FOUND => ClientError::NotFound { message },
            status => ClientError::Rejected {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn fetch<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
        let bytes = Self::execute(request)
            .await?
            .bytes()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

impl AuthApi for HttpApi {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        debug!(email = %request.email, "POST /api/auth/login");
        Self::fetch(self.client.post(self.url("/api/auth/login")).json(request)).await
    }

    async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse> {
        debug!(email = %request.email, "POST /api/auth/register");
        Self::fetch(self.client.post(self.url("/api/auth/register")).json(request)).await
    }

    async fn current_user(&self, credential: &Credential) -> Result<User> {
        let request = self.client.get(self.url("/api/auth/me"));
        Self::fetch(Self::authorized(request, credential)).await
    }
}

impl EventsApi for HttpApi {
    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        let request = self
            .client
            .get(self.url("/api/events"))
            .query(&filter.query_pairs());
        let page: EventsPage = Self::fetch(request).await?;
        Ok(page.events)
    }

    async fn get_event(&self, id: &EventId) -> Result<Event> {
        let path = Self::event_path("/api/events", id);
        Self::fetch(self.client.get(self.url(&path))).await
    }
}

impl RegistrationsApi for HttpApi {
    async fn my_registrations(&self, credential: &Credential) -> Result<MyRegistrations> {
        let request = self
            .client
            .get(self.url("/api/registrations/my-registrations"));
        Self::fetch(Self::authorized(request, credential)).await
    }

    async fn register(&self, credential: &Credential, event_id: &EventId) -> Result<()> {
        debug!(event_id = %event_id, "POST /api/registrations");
        let body = CreateRegistration {
            event_id: event_id.clone(),
        };
        let request = self.client.post(self.url("/api/registrations")).json(&body);
        Self::execute(Self::authorized(request, credential))
            .await
            .map(|_| ())
    }

    async fn cancel(&self, credential: &Credential, event_id: &EventId) -> Result<()> {
        debug!(event_id = %event_id, "DELETE /api/registrations");
        let path = Self::event_path("/api/registrations", event_id);
        let request = self.client.delete(self.url(&path));
        Self::execute(Self::authorized(request, credential))
            .await
            .map(|_| ())
    }
}
