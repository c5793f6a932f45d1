use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::StreamingClient;
use crate::error::ApiError;
use crate::types::{AuthToken, Credentials, Envelope, Introspection, NewUser, UserProfile};

#[derive(Serialize)]
struct TokenBody<'a> {
    token: &'a str,
}

/// POST a JSON body to an identity endpoint and decode the envelope.
async fn post<B, T>(client: &StreamingClient, path: &str, body: &B) -> Result<Envelope<T>, ApiError>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let resp = client
        .http()
        .post(client.url(path))
        .json(body)
        .send()
        .await?;

    let resp = StreamingClient::check_response(resp).await?;
    resp.json::<Envelope<T>>()
        .await
        .map_err(|e| ApiError::Parse(e.to_string()))
}

/// Exchange username and password for an access token.
pub async fn login(client: &StreamingClient, credentials: &Credentials) -> Result<AuthToken, ApiError> {
    tracing::debug!(username = %credentials.username, "requesting token");
    post(client, "/auth/token", credentials).await?.into_result()
}

/// Create a new account. Does not sign the user in.
pub async fn register(client: &StreamingClient, user: &NewUser) -> Result<UserProfile, ApiError> {
    post(client, "/users/add", user).await?.into_result()
}

/// Ask the server whether a token is still valid.
pub async fn introspect(client: &StreamingClient, token: &str) -> Result<Introspection, ApiError> {
    post(client, "/auth/introspect", &TokenBody { token })
        .await?
        .into_result()
}

/// Exchange an expired (but still refreshable) token for a new one.
pub async fn refresh(client: &StreamingClient, token: &str) -> Result<AuthToken, ApiError> {
    post(client, "/auth/refresh", &TokenBody { token })
        .await?
        .into_result()
}

/// Invalidate a token server-side.
pub async fn logout(client: &StreamingClient, token: &str) -> Result<(), ApiError> {
    post::<_, serde_json::Value>(client, "/auth/logout", &TokenBody { token })
        .await?
        .into_unit()?;
    Ok(())
}
