use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ApiError;

/// Envelope code the backend uses for a successful call.
pub const SUCCESS_CODE: i32 = 1000;

// ── Response envelope ────────────────────────────────────────────

/// The backend's `{code, message, result}` wrapper.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default = "default_code")]
    pub code: i32,
    pub message: Option<String>,
    pub result: Option<T>,
}

fn default_code() -> i32 {
    SUCCESS_CODE
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// Unwrap the result, failing on a non-success code or a missing result.
    pub fn into_result(self) -> Result<T, ApiError> {
        if !self.is_success() {
            return Err(self.rejection());
        }
        self.result
            .ok_or_else(|| ApiError::Parse("envelope has no result".into()))
    }

    /// Accept a successful envelope without a result, returning its message.
    pub fn into_unit(self) -> Result<Option<String>, ApiError> {
        if !self.is_success() {
            return Err(self.rejection());
        }
        Ok(self.message)
    }

    fn rejection(&self) -> ApiError {
        ApiError::Rejected {
            code: self.code,
            message: self.message.clone().unwrap_or_default(),
        }
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }
}

// ── Catalog ─────────────────────────────────────────────────────

/// Kind of streamable title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaType {
    Movie,
    Series,
    Other(String),
}

impl MediaType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Movie => "Movie",
            Self::Series => "Series",
            Self::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "movie" => Self::Movie,
            "series" => Self::Series,
            _ => Self::Other(s.to_string()),
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MediaType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MediaType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Genre {
    pub genre_id: u32,
    pub genre_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub actor_id: u32,
    pub actor_name: String,
    pub bio: Option<String>,
    pub birthdate: Option<String>,
    #[serde(rename = "profileImageURL")]
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Director {
    pub director_id: u32,
    pub director_name: String,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub episode_id: u32,
    pub episode_number: u32,
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration: Option<u32>,
    pub release_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    pub season_id: u32,
    pub season_number: u32,
    pub description: Option<String>,
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

/// A streamable title with its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub media_id: u32,
    pub title: String,
    pub description: Option<String>,
    pub release_year: Option<i32>,
    /// Running time in minutes.
    pub duration: Option<u32>,
    pub language: Option<String>,
    pub age_rating: Option<String>,
    #[serde(rename = "posterURL")]
    pub poster_url: Option<String>,
    #[serde(rename = "trailerURL")]
    pub trailer_url: Option<String>,
    pub added_date: Option<NaiveDateTime>,
    pub view_count: Option<u64>,
    pub access_level: Option<String>,
    pub media_type: Option<MediaType>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub genres: Vec<Genre>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub actors: Vec<Actor>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub directors: Vec<Director>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub seasons: Vec<Season>,
}

impl Media {
    /// Genre names joined for display.
    pub fn genre_names(&self) -> String {
        self.genres
            .iter()
            .map(|g| g.genre_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Seasons ordered by number, each with its episodes ordered by number.
    pub fn episodes_sorted(&self) -> Vec<Season> {
        let mut seasons = self.seasons.clone();
        seasons.sort_by_key(|s| s.season_number);
        for season in &mut seasons {
            season.episodes.sort_by_key(|e| e.episode_number);
        }
        seasons
    }

    pub fn is_series(&self) -> bool {
        matches!(self.media_type, Some(MediaType::Series))
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Filters for the media listing and search endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaQuery {
    pub page: u32,
    pub size: u32,
    pub title: Option<String>,
    pub media_type: Option<MediaType>,
    pub release_year: Option<i32>,
    pub genre_id: Option<u32>,
    pub genre_name: Option<String>,
}

impl Default for MediaQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: 10,
            title: None,
            media_type: None,
            release_year: None,
            genre_id: None,
            genre_name: None,
        }
    }
}

impl MediaQuery {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn genre(genre_id: u32, release_year: Option<i32>) -> Self {
        Self {
            genre_id: Some(genre_id),
            release_year,
            ..Default::default()
        }
    }

    /// Query string pairs, omitting unset filters.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string()), ("size", self.size.to_string())];
        if let Some(ref title) = self.title {
            pairs.push(("title", title.clone()));
        }
        if let Some(ref media_type) = self.media_type {
            pairs.push(("mediaType", media_type.to_string()));
        }
        if let Some(year) = self.release_year {
            pairs.push(("releaseYear", year.to_string()));
        }
        if let Some(id) = self.genre_id {
            pairs.push(("genreId", id.to_string()));
        }
        if let Some(ref name) = self.genre_name {
            pairs.push(("genreName", name.clone()));
        }
        pairs
    }
}

/// What a favorite toggle did on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteChange {
    Added,
    Removed,
}

impl FavoriteChange {
    /// The toggle endpoint reports its outcome only in the envelope message.
    pub fn from_message(message: &str) -> Option<Self> {
        let lower = message.to_ascii_lowercase();
        if lower.starts_with("added") {
            Some(Self::Added)
        } else if lower.starts_with("removed") {
            Some(Self::Removed)
        } else {
            None
        }
    }
}

/// Playback location returned by the stream endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamLink {
    pub url: String,
}

// ── Users ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionPlan {
    Free,
    Premium,
    #[serde(rename = "VIP")]
    Vip,
}

impl SubscriptionPlan {
    pub const ALL: &[SubscriptionPlan] = &[Self::Free, Self::Premium, Self::Vip];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::Premium => "Premium",
            Self::Vip => "VIP",
        }
    }

    /// Plan id as used in links and on the command line.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Premium => "premium",
            Self::Vip => "vip",
        }
    }

    pub fn from_id(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "free" => Some(Self::Free),
            "premium" => Some(Self::Premium),
            "vip" => Some(Self::Vip),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    Active,
    Banned,
    Suspended,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "userID")]
    pub user_id: u32,
    pub username: String,
    pub email: Option<String>,
    pub join_date: Option<NaiveDateTime>,
    pub subscription_plan: Option<SubscriptionPlan>,
    pub subscription_expiry: Option<NaiveDate>,
    #[serde(rename = "avatarURL")]
    pub avatar_url: Option<String>,
    pub last_login: Option<NaiveDateTime>,
    pub account_status: Option<AccountStatus>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub roles: Vec<String>,
}

impl UserProfile {
    pub fn plan(&self) -> SubscriptionPlan {
        self.subscription_plan.unwrap_or(SubscriptionPlan::Free)
    }
}

/// Fields for creating an account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub email: String,
    /// Sent as plain text; the server hashes it.
    #[serde(rename = "passwordHash")]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

// ── Auth ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthToken {
    pub token: String,
    #[serde(default)]
    pub authenticated: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Introspection {
    pub valid: bool,
}
