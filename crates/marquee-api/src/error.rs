use thiserror::Error;

/// Envelope code the backend uses for a missing, expired or revoked token.
pub const UNAUTHENTICATED_CODE: i32 = 1003;

/// Errors from the streaming backend client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server refused the bearer token (HTTP 401/403).
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The response envelope carried a non-success code.
    #[error("request rejected (code {code}): {message}")]
    Rejected { code: i32, message: String },

    #[error("invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("token error: {0}")]
    Token(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// Whether the error means the stored token is no longer usable.
    ///
    /// The auth endpoints report a dead token in the envelope, sometimes
    /// behind a plain 400.
    pub fn is_unauthenticated(&self) -> bool {
        match self {
            Self::Unauthenticated => true,
            Self::Rejected { code, .. } => *code == UNAUTHENTICATED_CODE,
            Self::Api { status, .. } => matches!(status, 401 | 403),
            _ => false,
        }
    }

    /// Whether the server says the requested resource does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status == 404,
            Self::Rejected { message, .. } => message.to_ascii_lowercase().contains("not found"),
            _ => false,
        }
    }
}
