//! Read-only access to the claims of a backend-issued JWT.
//!
//! The client never holds the signer key, so nothing here verifies a
//! signature. Claims are only used to decide *when* to ask the server
//! for a fresh token; the server remains the authority on validity.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

use crate::error::ApiError;

/// Registered and custom claims carried by the access token.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Claims {
    pub sub: Option<String>,
    pub iss: Option<String>,
    /// Issued-at, unix seconds.
    pub iat: Option<i64>,
    /// Expiry, unix seconds.
    pub exp: Option<i64>,
    pub jti: Option<String>,
    /// Roles and permissions, comma separated.
    pub scope: Option<String>,
}

impl Claims {
    pub fn scopes(&self) -> Vec<&str> {
        self.scope
            .as_deref()
            .map(|s| {
                s.split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|part| !part.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes().iter().any(|s| *s == scope)
    }
}

/// Decode the payload segment of a compact JWS without verifying it.
pub fn decode_claims(token: &str) -> Result<Claims, ApiError> {
    let mut parts = token.trim().split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) if !payload.is_empty() => payload,
        _ => return Err(ApiError::Token("expected three dot-separated segments".into())),
    };

    // Tolerate encoders that keep the `=` padding.
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| ApiError::Token(format!("invalid base64 payload: {e}")))?;

    serde_json::from_slice(&bytes).map_err(|e| ApiError::Token(format!("invalid claims: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build an unsigned-looking token with the given claims JSON.
    fn make_token(claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS512"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.c2lnbmF0dXJl")
    }

    #[test]
    fn test_decode_claims() {
        let token = make_token(&serde_json::json!({
            "sub": "mira",
            "iss": "movie.com",
            "iat": 1_700_000_000,
            "exp": 1_700_003_600,
            "jti": "6f1c",
            "scope": "ROLE_USER, VIEW_MEDIA"
        }));

        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("mira"));
        assert_eq!(claims.exp, Some(1_700_003_600));
        assert_eq!(claims.scopes(), vec!["ROLE_USER", "VIEW_MEDIA"]);
        assert!(claims.has_scope("VIEW_MEDIA"));
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(matches!(decode_claims("not-a-token"), Err(ApiError::Token(_))));
        assert!(matches!(decode_claims("a..c"), Err(ApiError::Token(_))));
        assert!(matches!(decode_claims("a.!!!.c"), Err(ApiError::Token(_))));
        assert!(matches!(decode_claims("a.b.c.d"), Err(ApiError::Token(_))));
    }

    #[test]
    fn test_decode_padded_payload() {
        let payload = base64::engine::general_purpose::URL_SAFE.encode(br#"{"exp":50}"#);
        assert!(payload.ends_with('='));
        let token = format!("h.{payload}.s");
        assert_eq!(decode_claims(&token).unwrap().exp, Some(50));
    }
}
