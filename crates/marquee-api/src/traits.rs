//! Trait definition for the streaming backend.
//!
//! The HTTP client implements this trait, which lets the runtime drive
//! session and catalog logic without caring where responses come from.

use std::future::Future;

use crate::types::{
    Actor, AuthToken, Credentials, FavoriteChange, Introspection, Media, MediaQuery, NewUser,
    Page, PasswordChange, StreamLink, SubscriptionPlan, UserProfile,
};

/// Everything the client can ask of the streaming backend.
///
/// Methods taking a `token` need a bearer credential; the others are
/// anonymous.
pub trait StreamingService: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    // ── Identity ────────────────────────────────────────────────

    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<AuthToken, Self::Error>> + Send;

    fn register(&self, user: &NewUser)
        -> impl Future<Output = Result<UserProfile, Self::Error>> + Send;

    fn introspect(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Introspection, Self::Error>> + Send;

    fn refresh(&self, token: &str) -> impl Future<Output = Result<AuthToken, Self::Error>> + Send;

    fn logout(&self, token: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;

    // ── Catalog ─────────────────────────────────────────────────

    /// Browse all titles, filtered by type or genre.
    fn list_media(
        &self,
        query: &MediaQuery,
    ) -> impl Future<Output = Result<Page<Media>, Self::Error>> + Send;

    /// Search by title, year, type or genre.
    fn search_media(
        &self,
        query: &MediaQuery,
    ) -> impl Future<Output = Result<Page<Media>, Self::Error>> + Send;

    fn get_media(&self, media_id: u32) -> impl Future<Output = Result<Media, Self::Error>> + Send;

    fn list_actors(&self) -> impl Future<Output = Result<Vec<Actor>, Self::Error>> + Send;

    // ── Authenticated ───────────────────────────────────────────

    fn stream_link(
        &self,
        token: &str,
        media_id: u32,
    ) -> impl Future<Output = Result<StreamLink, Self::Error>> + Send;

    fn favorites(&self, token: &str) -> impl Future<Output = Result<Vec<Media>, Self::Error>> + Send;

    /// Flip the favorite flag. `None` when the server did not say which way.
    fn toggle_favorite(
        &self,
        token: &str,
        media_id: u32,
    ) -> impl Future<Output = Result<Option<FavoriteChange>, Self::Error>> + Send;

    fn favorite_status(
        &self,
        token: &str,
        media_id: u32,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    fn recommendations(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Vec<Media>, Self::Error>> + Send;

    fn my_info(&self, token: &str) -> impl Future<Output = Result<UserProfile, Self::Error>> + Send;

    fn update_password(
        &self,
        token: &str,
        change: &PasswordChange,
    ) -> impl Future<Output = Result<UserProfile, Self::Error>> + Send;

    fn update_subscription(
        &self,
        token: &str,
        plan: SubscriptionPlan,
    ) -> impl Future<Output = Result<UserProfile, Self::Error>> + Send;
}
