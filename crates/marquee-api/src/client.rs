use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use super::auth;
use super::error::ApiError;
use super::types::{
    Actor, AuthToken, Credentials, Envelope, FavoriteChange, Introspection, Media, MediaQuery,
    NewUser, Page, PasswordChange, StreamLink, SubscriptionPlan, UserProfile,
};
use crate::traits::StreamingService;

/// Default request timeout, matching the web client.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(6);

/// REST client for the streaming backend.
#[derive(Debug, Clone)]
pub struct StreamingClient {
    base_url: String,
    http: Client,
}

impl StreamingClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = base_url.into();
        Url::parse(&base_url)?;
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn auth_header(token: &str) -> String {
        format!("Bearer {token}")
    }

    /// Check the HTTP response for errors, preferring the envelope's code
    /// and message when the error body carries one.
    pub(crate) async fn check_response(
        resp: reqwest::Response,
    ) -> Result<reqwest::Response, ApiError> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        tracing::warn!(status, "streaming API error");

        if let Ok(envelope) = serde_json::from_str::<Envelope<serde_json::Value>>(&body) {
            if !envelope.is_success() {
                return Err(ApiError::Rejected {
                    code: envelope.code,
                    message: envelope.message.unwrap_or_default(),
                });
            }
        }
        Err(ApiError::Api {
            status,
            message: body,
        })
    }

    /// Like `check_response`, but a refused bearer token maps to
    /// `ApiError::Unauthenticated`.
    async fn check_authorized(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                tracing::warn!(status = resp.status().as_u16(), "bearer token refused");
                Err(ApiError::Unauthenticated)
            }
            _ => Self::check_response(resp).await,
        }
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        let resp = request.send().await?;
        let resp = Self::check_response(resp).await?;
        resp.json().await.map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn send_authorized<T: DeserializeOwned>(
        request: RequestBuilder,
        token: &str,
    ) -> Result<T, ApiError> {
        let resp = request
            .header("Authorization", Self::auth_header(token))
            .send()
            .await?;
        let resp = Self::check_authorized(resp).await?;
        resp.json().await.map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn put_authorized<B: Serialize + ?Sized>(
        &self,
        path: &str,
        token: &str,
        body: &B,
    ) -> Result<UserProfile, ApiError> {
        let envelope: Envelope<UserProfile> =
            Self::send_authorized(self.http.put(self.url(path)).json(body), token).await?;
        envelope.into_result()
    }
}

impl StreamingService for StreamingClient {
    type Error = ApiError;

    async fn login(&self, credentials: &Credentials) -> Result<AuthToken, ApiError> {
        auth::login(self, credentials).await
    }

    async fn register(&self, user: &NewUser) -> Result<UserProfile, ApiError> {
        auth::register(self, user).await
    }

    async fn introspect(&self, token: &str) -> Result<Introspection, ApiError> {
        auth::introspect(self, token).await
    }

    async fn refresh(&self, token: &str) -> Result<AuthToken, ApiError> {
        auth::refresh(self, token).await
    }

    async fn logout(&self, token: &str) -> Result<(), ApiError> {
        auth::logout(self, token).await
    }

    async fn list_media(&self, query: &MediaQuery) -> Result<Page<Media>, ApiError> {
        let request = self.http.get(self.url("/api/media")).query(&query.to_pairs());
        let envelope: Envelope<Page<Media>> = Self::send_json(request).await?;
        envelope.into_result()
    }

    async fn search_media(&self, query: &MediaQuery) -> Result<Page<Media>, ApiError> {
        let request = self
            .http
            .get(self.url("/api/media/search"))
            .query(&query.to_pairs());
        let envelope: Envelope<Page<Media>> = Self::send_json(request).await?;
        envelope.into_result()
    }

    async fn get_media(&self, media_id: u32) -> Result<Media, ApiError> {
        let request = self.http.get(self.url(&format!("/api/media/{media_id}")));
        let envelope: Envelope<Media> = Self::send_json(request).await?;
        envelope.into_result()
    }

    async fn list_actors(&self) -> Result<Vec<Actor>, ApiError> {
        // Bare JSON array, no envelope.
        Self::send_json(self.http.get(self.url("/api/actors"))).await
    }

    async fn stream_link(&self, token: &str, media_id: u32) -> Result<StreamLink, ApiError> {
        let request = self.http.get(self.url(&format!("/api/stream/{media_id}")));
        Self::send_authorized(request, token).await
    }

    async fn favorites(&self, token: &str) -> Result<Vec<Media>, ApiError> {
        let request = self.http.get(self.url("/api/favorites"));
        let envelope: Envelope<Vec<Media>> = Self::send_authorized(request, token).await?;
        envelope.into_result()
    }

    async fn toggle_favorite(
        &self,
        token: &str,
        media_id: u32,
    ) -> Result<Option<FavoriteChange>, ApiError> {
        let request = self
            .http
            .post(self.url(&format!("/api/favorites/{media_id}")))
            .json(&serde_json::json!({}));
        let envelope: Envelope<serde_json::Value> = Self::send_authorized(request, token).await?;
        let message = envelope.into_unit()?;
        Ok(message.as_deref().and_then(FavoriteChange::from_message))
    }

    async fn favorite_status(&self, token: &str, media_id: u32) -> Result<bool, ApiError> {
        let request = self
            .http
            .get(self.url(&format!("/api/favorites/status/{media_id}")));
        let envelope: Envelope<bool> = Self::send_authorized(request, token).await?;
        envelope.into_result()
    }

    async fn recommendations(&self, token: &str) -> Result<Vec<Media>, ApiError> {
        let request = self.http.get(self.url("/api/favorites/recommendations"));
        let envelope: Envelope<Vec<Media>> = Self::send_authorized(request, token).await?;
        envelope.into_result()
    }

    async fn my_info(&self, token: &str) -> Result<UserProfile, ApiError> {
        let request = self.http.get(self.url("/users/myInfo"));
        let envelope: Envelope<UserProfile> = Self::send_authorized(request, token).await?;
        envelope.into_result()
    }

    async fn update_password(
        &self,
        token: &str,
        change: &PasswordChange,
    ) -> Result<UserProfile, ApiError> {
        self.put_authorized("/users/myInfo/password", token, change)
            .await
    }

    async fn update_subscription(
        &self,
        token: &str,
        plan: SubscriptionPlan,
    ) -> Result<UserProfile, ApiError> {
        let body = serde_json::json!({ "subscriptionPlan": plan });
        self.put_authorized("/users/myInfo/subscription", token, &body)
            .await
    }
}
