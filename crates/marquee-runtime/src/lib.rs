mod db;

use std::future::Future;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use marquee_api::types::{
    Actor, Credentials, FavoriteChange, Media, MediaQuery, NewUser, Page, PasswordChange,
    StreamLink, SubscriptionPlan, UserProfile,
};
use marquee_api::{ApiError, StreamingClient, StreamingService};
use marquee_core::config::AppConfig;
use marquee_core::error::CoreError;
use marquee_core::favorites::FavoriteSet;
use marquee_core::models::{WatchEntry, HOME_CATEGORIES};
use marquee_core::session::{assess, Freshness, Persist, SessionEvent, SessionOp, SessionState};
use marquee_core::storage::SESSION_SERVICE;

pub use db::DbHandle;

/// Backend rule for new accounts and password changes.
pub const MIN_PASSWORD_LEN: usize = 8;

const INTENDED_SUBSCRIPTION: &str = "intended_subscription";
const REDIRECT_AFTER_LOGIN: &str = "redirect_after_login";
const SUBSCRIPTION_ROUTE: &str = "/subscription";

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(String),
    #[error("database error: {0}")]
    Database(String),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("not logged in")]
    NotAuthenticated,
    #[error("a favorite change for media {0} is already in progress")]
    Busy(u32),
    #[error("invalid input: {0}")]
    Invalid(String),
}

fn db_err(e: CoreError) -> RuntimeError {
    RuntimeError::Database(e.to_string())
}

/// One genre row on the home screen.
#[derive(Debug, Clone)]
pub struct GenreRow {
    pub name: &'static str,
    pub genre_id: u32,
    pub media: Vec<Media>,
}

#[derive(Debug, Clone)]
pub enum SubscribeOutcome {
    /// Free needs no purchase.
    AlreadyFree,
    Updated(UserProfile),
}

/// Owns the session and routes every call to the backend.
///
/// Authenticated calls go through [`Runtime::check_token`] first, which
/// refreshes an expired token when it still can and drops the session
/// when it cannot.
pub struct Runtime<S = StreamingClient> {
    api: S,
    db: DbHandle,
    config: RwLock<AppConfig>,
    session: RwLock<SessionState>,
    /// Held while a token is assessed and refreshed.
    token_check: Mutex<()>,
    favorites: Mutex<FavoriteSet>,
}

impl Runtime<StreamingClient> {
    /// Connect to the configured backend and open the on-disk database.
    pub async fn new(config: AppConfig) -> Result<Self, RuntimeError> {
        let api = StreamingClient::new(config.api.base_url.clone(), config.api.timeout())
            .map_err(|e| RuntimeError::Config(e.to_string()))?;
        let db_path =
            AppConfig::ensure_db_path().map_err(|e| RuntimeError::Config(e.to_string()))?;
        let db = DbHandle::open(&db_path)
            .ok_or_else(|| RuntimeError::Database("failed to open database".into()))?;
        Self::with_service(api, db, config).await
    }
}

impl<S> Runtime<S>
where
    S: StreamingService<Error = ApiError>,
{
    pub async fn with_service(api: S, db: DbHandle, config: AppConfig) -> Result<Self, RuntimeError> {
        let token = db.get_token(SESSION_SERVICE).await.map_err(db_err)?;
        tracing::debug!(has_token = token.is_some(), "session restored");

        Ok(Self {
            api,
            db,
            config: RwLock::new(config),
            session: RwLock::new(SessionState::restore(token)),
            token_check: Mutex::new(()),
            favorites: Mutex::new(FavoriteSet::new()),
        })
    }

    pub async fn config(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    pub async fn session(&self) -> SessionState {
        self.session.read().await.clone()
    }

    async fn current_token(&self) -> Option<String> {
        self.session.read().await.token.clone()
    }

    /// Feed an event to the session and write through any token change.
    async fn apply(&self, event: SessionEvent) -> Result<(), RuntimeError> {
        let effect = self.session.write().await.apply(event);
        match effect {
            Some(Persist::Store(token)) => self
                .db
                .save_token(SESSION_SERVICE, token)
                .await
                .map_err(db_err),
            Some(Persist::Remove) => self.db.clear_token(SESSION_SERVICE).await.map_err(db_err),
            None => Ok(()),
        }
    }

    /// Record a failed identity operation and hand back the error.
    async fn fail(&self, op: SessionOp, err: ApiError) -> RuntimeError {
        let message = match &err {
            ApiError::Rejected { message, .. } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        };
        if let Err(e) = self
            .apply(SessionEvent::Failed {
                op,
                message: Some(message),
            })
            .await
        {
            tracing::warn!("failed to record {op} failure: {e}");
        }
        err.into()
    }

    // ── Session ─────────────────────────────────────────────────

    pub async fn login(&self, username: &str, password: &str) -> Result<SessionState, RuntimeError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(RuntimeError::Invalid(
                "username and password are required".into(),
            ));
        }

        self.apply(SessionEvent::Pending(SessionOp::Login)).await?;
        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        let auth = match self.api.login(&credentials).await {
            Ok(auth) => auth,
            Err(e) => return Err(self.fail(SessionOp::Login, e).await),
        };
        self.apply(SessionEvent::LoggedIn(auth)).await?;
        tracing::info!(username, "logged in");

        if let Err(e) = self.profile().await {
            tracing::warn!("could not load profile after login: {e}");
        }
        Ok(self.session().await)
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, RuntimeError> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() {
            return Err(RuntimeError::Invalid("username is required".into()));
        }
        if !email.contains('@') {
            return Err(RuntimeError::Invalid(format!("invalid email: {email}")));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(RuntimeError::Invalid(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        self.apply(SessionEvent::Pending(SessionOp::Register)).await?;
        let user = NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        match self.api.register(&user).await {
            Ok(profile) => {
                self.apply(SessionEvent::Registered).await?;
                tracing::info!(username, "account created");
                Ok(profile)
            }
            Err(e) => Err(self.fail(SessionOp::Register, e).await),
        }
    }

    /// Invalidate the token on the server, then forget it locally.
    ///
    /// If the server cannot be reached the session is kept. A token the
    /// server already refuses counts as logged out.
    pub async fn logout(&self) -> Result<(), RuntimeError> {
        let Some(token) = self.current_token().await else {
            return self.apply(SessionEvent::LoggedOut).await;
        };

        self.apply(SessionEvent::Pending(SessionOp::Logout)).await?;
        match self.api.logout(&token).await {
            Ok(()) => {}
            Err(e) if e.is_unauthenticated() => {
                tracing::debug!("server already dropped the token");
            }
            Err(e) => return Err(self.fail(SessionOp::Logout, e).await),
        }
        self.apply(SessionEvent::LoggedOut).await?;
        tracing::info!("logged out");
        Ok(())
    }

    /// Ask the server whether the current token is valid.
    pub async fn introspect(&self) -> Result<bool, RuntimeError> {
        let token = self.token_for(SessionOp::Introspect).await?;
        self.apply(SessionEvent::Pending(SessionOp::Introspect))
            .await?;
        match self.api.introspect(&token).await {
            Ok(result) => {
                self.apply(SessionEvent::Introspected(result)).await?;
                Ok(result.valid)
            }
            Err(e) => Err(self.fail(SessionOp::Introspect, e).await),
        }
    }

    async fn token_for(&self, op: SessionOp) -> Result<String, RuntimeError> {
        if op.requires_fresh_token() {
            self.check_token().await
        } else {
            self.current_token()
                .await
                .ok_or(RuntimeError::NotAuthenticated)
        }
    }

    /// Make sure the session holds a usable token and return it.
    ///
    /// Concurrent callers share one refresh: the token is read only after
    /// any refresh already under way has stored its result.
    pub async fn check_token(&self) -> Result<String, RuntimeError> {
        let _check = self.token_check.lock().await;
        let token = self
            .current_token()
            .await
            .ok_or(RuntimeError::NotAuthenticated)?;
        let policy = self.config.read().await.session;
        self.apply(SessionEvent::Pending(SessionOp::CheckToken))
            .await?;

        let token = match assess(&token, Utc::now().timestamp(), &policy) {
            Freshness::Fresh => token,
            Freshness::NeedsRefresh => match self.refresh_token(&token).await {
                Ok(fresh) => fresh,
                Err(e) => {
                    tracing::warn!("token refresh failed: {e}");
                    return Err(self.expire("token refresh failed").await);
                }
            },
            Freshness::Stale => {
                tracing::info!("token is past its refresh window");
                return Err(self.expire("session expired, please log in again").await);
            }
            Freshness::Invalid => {
                tracing::warn!("stored token could not be decoded");
                return Err(self.expire("stored token is not a valid JWT").await);
            }
        };

        self.apply(SessionEvent::TokenChecked {
            token: token.clone(),
        })
        .await?;
        Ok(token)
    }

    async fn expire(&self, reason: &str) -> RuntimeError {
        let event = SessionEvent::Failed {
            op: SessionOp::CheckToken,
            message: Some(reason.to_string()),
        };
        if let Err(e) = self.apply(event).await {
            tracing::warn!("failed to clear session: {e}");
        }
        RuntimeError::NotAuthenticated
    }

    async fn refresh_token(&self, token: &str) -> Result<String, RuntimeError> {
        self.apply(SessionEvent::Pending(SessionOp::Refresh)).await?;
        match self.api.refresh(token).await {
            Ok(auth) => {
                let fresh = auth.token.clone();
                self.apply(SessionEvent::Refreshed(auth)).await?;
                tracing::info!("token refreshed");
                Ok(fresh)
            }
            Err(e) => Err(self.fail(SessionOp::Refresh, e).await),
        }
    }

    /// Run an authenticated call with a checked token.
    async fn authorized<T, F, Fut>(&self, call: F) -> Result<T, RuntimeError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let token = self.check_token().await?;
        self.send_authorized(token, call).await
    }

    async fn send_authorized<T, F, Fut>(&self, token: String, call: F) -> Result<T, RuntimeError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        match call(token).await {
            Ok(value) => Ok(value),
            Err(e) if e.is_unauthenticated() => {
                tracing::warn!("server rejected the session token");
                self.apply(SessionEvent::Cleared).await?;
                Err(RuntimeError::NotAuthenticated)
            }
            Err(e) => Err(e.into()),
        }
    }

    // ── Catalog ─────────────────────────────────────────────────

    /// Titles for the banner carousel. Empty when the backend is unavailable.
    pub async fn banners(&self) -> Vec<Media> {
        match self.api.list_media(&MediaQuery::default()).await {
            Ok(page) => page.content,
            Err(e) => {
                tracing::warn!("failed to load banners: {e}");
                Vec::new()
            }
        }
    }

    pub async fn browse(&self, query: &MediaQuery) -> Result<Page<Media>, RuntimeError> {
        Ok(self.api.list_media(query).await?)
    }

    pub async fn search(&self, query: &MediaQuery) -> Result<Page<Media>, RuntimeError> {
        Ok(self.api.search_media(query).await?)
    }

    pub async fn media(&self, media_id: u32) -> Result<Media, RuntimeError> {
        match self.api.get_media(media_id).await {
            Ok(media) => Ok(media),
            Err(e) if e.is_not_found() => Err(RuntimeError::NotFound(format!("media {media_id}"))),
            Err(e) => Err(e.into()),
        }
    }

    /// The home screen's genre rows. A row that fails to load comes back empty.
    pub async fn genre_rows(&self, release_year: Option<i32>) -> Vec<GenreRow> {
        let mut rows = Vec::with_capacity(HOME_CATEGORIES.len());
        for category in HOME_CATEGORIES {
            let media = match self.api.search_media(&category.query(release_year)).await {
                Ok(page) => page.content,
                Err(e) => {
                    tracing::warn!(genre = category.name, "failed to load genre row: {e}");
                    Vec::new()
                }
            };
            rows.push(GenreRow {
                name: category.name,
                genre_id: category.genre_id,
                media,
            });
        }
        rows
    }

    pub async fn actors(&self) -> Result<Vec<Actor>, RuntimeError> {
        Ok(self.api.list_actors().await?)
    }

    // ── Authenticated ───────────────────────────────────────────

    pub async fn favorites(&self) -> Result<Vec<Media>, RuntimeError> {
        let list = self
            .authorized(|token| async move { self.api.favorites(&token).await })
            .await?;
        self.favorites
            .lock()
            .await
            .replace_all(list.iter().map(|m| m.media_id));
        Ok(list)
    }

    /// Flip a title's favorite flag, returning whether it is now a favorite.
    pub async fn toggle_favorite(&self, media_id: u32) -> Result<bool, RuntimeError> {
        let ticket = self
            .favorites
            .lock()
            .await
            .begin(media_id)
            .ok_or(RuntimeError::Busy(media_id))?;
        let optimistic = ticket.now_favorite();

        let result = self
            .authorized(|token| async move { self.api.toggle_favorite(&token, media_id).await })
            .await;

        let mut favorites = self.favorites.lock().await;
        match result {
            Ok(change) => {
                favorites.settle(ticket, true);
                let favorite = match change {
                    Some(FavoriteChange::Added) => true,
                    Some(FavoriteChange::Removed) => false,
                    None => optimistic,
                };
                favorites.mark(media_id, favorite);
                tracing::info!(media_id, favorite, "favorite toggled");
                Ok(favorite)
            }
            Err(e) => {
                favorites.settle(ticket, false);
                Err(e)
            }
        }
    }

    pub async fn is_favorite(&self, media_id: u32) -> Result<bool, RuntimeError> {
        let favorite = self
            .authorized(|token| async move { self.api.favorite_status(&token, media_id).await })
            .await?;
        let mut favorites = self.favorites.lock().await;
        // A toggle still on the wire wins over the server's older answer.
        if favorites.is_pending(media_id) {
            return Ok(favorites.contains(media_id));
        }
        favorites.mark(media_id, favorite);
        Ok(favorite)
    }

    pub async fn recommendations(&self) -> Result<Vec<Media>, RuntimeError> {
        self.authorized(|token| async move { self.api.recommendations(&token).await })
            .await
    }

    /// Fetch the signed-in user and keep it on the session.
    pub async fn profile(&self) -> Result<UserProfile, RuntimeError> {
        let user = self
            .authorized(|token| async move { self.api.my_info(&token).await })
            .await?;
        self.apply(SessionEvent::ProfileLoaded(user.clone())).await?;
        Ok(user)
    }

    pub async fn change_password(
        &self,
        current: &str,
        new: &str,
    ) -> Result<UserProfile, RuntimeError> {
        if current.is_empty() {
            return Err(RuntimeError::Invalid("current password is required".into()));
        }
        if new.chars().count() < MIN_PASSWORD_LEN {
            return Err(RuntimeError::Invalid(format!(
                "new password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if current == new {
            return Err(RuntimeError::Invalid(
                "new password must differ from the current one".into(),
            ));
        }

        let change = PasswordChange {
            current_password: current.to_string(),
            new_password: new.to_string(),
        };
        let change = &change;
        let user = self
            .authorized(|token| async move { self.api.update_password(&token, change).await })
            .await?;
        tracing::info!("password changed");
        Ok(user)
    }

    /// Switch plans. Without a usable session the choice is remembered
    /// for after login and `NotAuthenticated` is returned.
    pub async fn subscribe(&self, plan: SubscriptionPlan) -> Result<SubscribeOutcome, RuntimeError> {
        let token = match self.check_token().await {
            Ok(token) => token,
            Err(RuntimeError::NotAuthenticated) => {
                self.db
                    .set_intent(INTENDED_SUBSCRIPTION, plan.id())
                    .await
                    .map_err(db_err)?;
                self.db
                    .set_intent(REDIRECT_AFTER_LOGIN, SUBSCRIPTION_ROUTE)
                    .await
                    .map_err(db_err)?;
                tracing::info!(plan = plan.id(), "plan choice saved until login");
                return Err(RuntimeError::NotAuthenticated);
            }
            Err(e) => return Err(e),
        };

        if plan == SubscriptionPlan::Free {
            return Ok(SubscribeOutcome::AlreadyFree);
        }

        let user = self
            .send_authorized(token, |token| async move {
                self.api.update_subscription(&token, plan).await
            })
            .await?;
        self.apply(SessionEvent::ProfileLoaded(user.clone())).await?;
        tracing::info!(plan = plan.id(), "subscription updated");
        Ok(SubscribeOutcome::Updated(user))
    }

    /// The plan chosen before logging in, if any. Consumed on read.
    pub async fn pending_subscription(&self) -> Result<Option<SubscriptionPlan>, RuntimeError> {
        let plan = self
            .db
            .take_intent(INTENDED_SUBSCRIPTION)
            .await
            .map_err(db_err)?;
        if let Some(route) = self
            .db
            .take_intent(REDIRECT_AFTER_LOGIN)
            .await
            .map_err(db_err)?
        {
            tracing::debug!(%route, "post-login redirect consumed");
        }
        Ok(plan.and_then(|id| SubscriptionPlan::from_id(&id)))
    }

    /// Resolve the playback URL and note the title in watch history.
    pub async fn stream(&self, media_id: u32) -> Result<StreamLink, RuntimeError> {
        let link = self
            .authorized(|token| async move { self.api.stream_link(&token, media_id).await })
            .await?;
        if let Err(e) = self.remember(media_id).await {
            tracing::warn!(media_id, "failed to record watch history: {e}");
        }
        Ok(link)
    }

    async fn remember(&self, media_id: u32) -> Result<(), RuntimeError> {
        let previous = self.db.get_history(media_id).await.map_err(db_err)?;
        let position_secs = previous.as_ref().map_or(0, |e| e.position_secs);

        let entry = match self.api.get_media(media_id).await {
            Ok(media) => WatchEntry {
                media_id,
                title: media.title,
                poster_url: media.poster_url,
                position_secs,
                duration_secs: media.duration.map(|minutes| minutes.saturating_mul(60)),
                watched_at: Utc::now(),
            },
            Err(e) => {
                tracing::debug!(media_id, "no details for history entry: {e}");
                WatchEntry {
                    media_id,
                    title: previous
                        .map(|e| e.title)
                        .unwrap_or_else(|| format!("Media {media_id}")),
                    poster_url: None,
                    position_secs,
                    duration_secs: None,
                    watched_at: Utc::now(),
                }
            }
        };
        self.db.record_progress(entry).await.map_err(db_err)
    }

    // ── Local ───────────────────────────────────────────────────

    /// Move the playback position of a title already in history.
    pub async fn update_progress(
        &self,
        media_id: u32,
        position_secs: u32,
    ) -> Result<WatchEntry, RuntimeError> {
        let mut entry = self
            .db
            .get_history(media_id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| RuntimeError::NotFound(format!("media {media_id} in history")))?;
        entry.position_secs = position_secs;
        entry.watched_at = Utc::now();
        self.db
            .record_progress(entry.clone())
            .await
            .map_err(db_err)?;
        Ok(entry)
    }

    pub async fn keep_watching(&self, limit: usize) -> Result<Vec<WatchEntry>, RuntimeError> {
        self.db.recent_history(limit).await.map_err(db_err)
    }

    pub async fn forget(&self, media_id: u32) -> Result<bool, RuntimeError> {
        self.db.remove_history(media_id).await.map_err(db_err)
    }
}
