use std::time::Duration;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use jiff::Timestamp;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// Name of the cookie that carries the identity token.
pub const AUTH_COOKIE: &str = "auth";

/// Lifetime of a freshly issued identity token.
pub const TOKEN_TTL: Duration = Duration::from_secs(72 * 60 * 60);

/// Identity of the caller, available to handlers as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub exp: i64,
}

/// Issues and verifies HS256 identity tokens.
pub struct JwtIdentity {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtIdentity {
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, TOKEN_TTL)
    }

    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        }
    }

    /// Signs a token for `user_id` that expires after the configured TTL.
    pub fn issue(&self, user_id: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            user_id: user_id.to_owned(),
            exp: Timestamp::now().as_second() + self.ttl.as_secs() as i64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }

    /// Returns the user id of a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Option<UserId> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) if !data.claims.user_id.is_empty() => Some(UserId(data.claims.user_id)),
            Ok(_) => None,
            Err(err) => {
                trace!(error = %err, "rejected identity token");
                None
            }
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Resolves the caller's identity from the `auth` cookie.
///
/// Requests without a valid token get a new random identity and the matching
/// cookie is set on the response.
pub async fn identify(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = state.identity();

    if let Some(user_id) = jar
        .get(AUTH_COOKIE)
        .and_then(|cookie| identity.verify(cookie.value()))
    {
        request.extensions_mut().insert(user_id);
        return Ok(next.run(request).await);
    }

    let user_id = Uuid::new_v4().to_string();
    let token = identity.issue(&user_id)?;
    debug!(user_id = %user_id, "issued new identity");

    request.extensions_mut().insert(UserId(user_id));
    let response = next.run(request).await;

    let cookie = Cookie::build((AUTH_COOKIE, token))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::seconds(identity.ttl().as_secs() as i64));

    Ok((jar.add(cookie), response).into_response())
}
