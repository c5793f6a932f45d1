//! Client-side session lifecycle.
//!
//! `SessionState` is a plain reducer: the runtime performs the network
//! calls and feeds their outcomes in as [`SessionEvent`]s. Transitions
//! that change the stored token return a [`Persist`] effect, so the
//! caller decides how and where the token is written.
//!
//! [`assess`] decides, from the token's own claims, whether an
//! authenticated action may proceed, needs a refresh first, or must
//! send the user back to sign in.

use marquee_api::jwt::decode_claims;
use marquee_api::types::{AuthToken, Introspection, UserProfile};

use crate::config::SessionConfig;

/// An identity operation that moves through pending → fulfilled | rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOp {
    Login,
    Register,
    Introspect,
    Refresh,
    Logout,
    CheckToken,
}

impl SessionOp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login => "auth/login",
            Self::Register => "auth/register",
            Self::Introspect => "auth/introspect",
            Self::Refresh => "auth/refresh",
            Self::Logout => "auth/logout",
            Self::CheckToken => "auth/checkToken",
        }
    }

    /// Whether the freshness check must run before this operation.
    ///
    /// Operations that obtain, replace, drop or check the token skip it;
    /// everything else acting on the session goes through it first.
    pub fn requires_fresh_token(&self) -> bool {
        matches!(self, Self::Introspect)
    }

    fn fallback_error(&self) -> &'static str {
        match self {
            Self::Login => "login failed",
            Self::Register => "registration failed",
            Self::Introspect | Self::CheckToken => "token check failed",
            Self::Refresh => "token refresh failed",
            Self::Logout => "logout failed",
        }
    }
}

impl std::fmt::Display for SessionOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of an identity operation.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Pending(SessionOp),
    LoggedIn(AuthToken),
    Registered,
    Introspected(Introspection),
    Refreshed(AuthToken),
    LoggedOut,
    /// The freshness check passed, possibly after a refresh.
    TokenChecked { token: String },
    ProfileLoaded(UserProfile),
    Failed { op: SessionOp, message: Option<String> },
    /// Drop everything, as when the server refuses the token outright.
    Cleared,
}

/// Side effect on the persisted token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persist {
    Store(String),
    Remove,
}

/// In-memory view of the signed-in user.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub token: Option<String>,
    pub authenticated: bool,
    pub user: Option<UserProfile>,
    pub loading: bool,
    pub error: Option<String>,
}

impl SessionState {
    /// Start from a persisted token. Nothing is trusted until it is checked.
    pub fn restore(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
            ..Default::default()
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Apply an event, returning what should happen to the stored token.
    pub fn apply(&mut self, event: SessionEvent) -> Option<Persist> {
        match event {
            SessionEvent::Pending(SessionOp::CheckToken) => None,
            SessionEvent::Pending(_) => {
                self.loading = true;
                self.error = None;
                None
            }
            SessionEvent::LoggedIn(auth) => {
                self.loading = false;
                self.authenticated = auth.authenticated;
                self.user = None;
                self.error = None;
                self.token = Some(auth.token.clone());
                Some(Persist::Store(auth.token))
            }
            SessionEvent::Registered => {
                self.loading = false;
                self.error = None;
                None
            }
            SessionEvent::Introspected(result) => {
                self.loading = false;
                self.authenticated = result.valid;
                self.error = None;
                None
            }
            SessionEvent::Refreshed(auth) => {
                self.loading = false;
                self.authenticated = auth.authenticated;
                self.error = None;
                self.token = Some(auth.token.clone());
                Some(Persist::Store(auth.token))
            }
            SessionEvent::LoggedOut => {
                self.reset();
                Some(Persist::Remove)
            }
            SessionEvent::TokenChecked { token } => {
                self.authenticated = true;
                self.error = None;
                let changed = self.token.as_deref() != Some(token.as_str());
                self.token = Some(token.clone());
                changed.then_some(Persist::Store(token))
            }
            SessionEvent::ProfileLoaded(user) => {
                self.user = Some(user);
                None
            }
            SessionEvent::Failed { op, message } => self.fail(op, message),
            SessionEvent::Cleared => {
                self.reset();
                Some(Persist::Remove)
            }
        }
    }

    fn fail(&mut self, op: SessionOp, message: Option<String>) -> Option<Persist> {
        let message = message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| op.fallback_error().to_string());
        tracing::debug!(op = op.name(), %message, "session operation failed");

        if op != SessionOp::CheckToken {
            self.loading = false;
        }
        self.error = Some(message);

        match op {
            SessionOp::Login | SessionOp::Introspect => {
                self.authenticated = false;
                None
            }
            SessionOp::Register | SessionOp::Logout => None,
            SessionOp::Refresh | SessionOp::CheckToken => {
                self.token = None;
                self.authenticated = false;
                Some(Persist::Remove)
            }
        }
    }

    fn reset(&mut self) {
        self.token = None;
        self.authenticated = false;
        self.user = None;
        self.loading = false;
        self.error = None;
    }
}

// ── Freshness ───────────────────────────────────────────────────

/// What the client can tell about a token without asking the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Not expired; use as is.
    Fresh,
    /// Expired but still inside the refresh window.
    NeedsRefresh,
    /// Expired and past the refresh window.
    Stale,
    /// Not a decodable JWT.
    Invalid,
}

/// Classify a token at `now` (unix seconds).
///
/// A token without `exp` never expires on the client side, and an
/// expired token without `iat` is offered to the server for refresh.
pub fn assess(token: &str, now: i64, policy: &SessionConfig) -> Freshness {
    let claims = match decode_claims(token) {
        Ok(claims) => claims,
        Err(_) => return Freshness::Invalid,
    };

    let Some(exp) = claims.exp else {
        return Freshness::Fresh;
    };
    if exp - policy.leeway_secs >= now {
        return Freshness::Fresh;
    }

    match claims.iat {
        Some(iat) if now - iat > policy.refreshable_secs => Freshness::Stale,
        _ => Freshness::NeedsRefresh,
    }
}
