//! # API Key Guard
//!
//! Optional shared secret in front of the Pactwatch API. It protects the
//! server, not the user: who the user is comes from the
//! [`AuthSession`](crate::session::AuthSession).
//!
//! Enabled by `PACTWATCH_API_KEY`. Clients then send
//! `Authorization: Bearer <key>`; `/health` stays open.

use super::types::ErrorResponse;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

const API_KEY_ENV: &str = "PACTWATCH_API_KEY";

/// Paths reachable without the key.
const OPEN_PATHS: &[&str] = &["/health"];

/// The configured key. Only its digest is kept.
#[derive(Clone)]
pub struct ApiKey {
    digest: [u8; blake3::OUT_LEN],
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

impl ApiKey {
    #[must_use]
    pub fn new(key: &str) -> Self {
        Self {
            digest: *blake3::hash(key.as_bytes()).as_bytes(),
        }
    }

    /// The key from `PACTWATCH_API_KEY`, or `None` when unset or blank.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(|key| Self::new(&key))
    }

    /// Compares fixed-length digests, so timing does not depend on the
    /// candidate's length or content.
    fn matches(&self, candidate: &str) -> bool {
        let candidate = blake3::hash(candidate.as_bytes());
        candidate.as_bytes()[..].ct_eq(&self.digest[..]).into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    MissingCredentials,
    WrongKey,
}

impl Rejection {
    fn reason(self) -> &'static str {
        match self {
            Self::MissingCredentials => "missing_bearer_token",
            Self::WrongKey => "invalid_api_key",
        }
    }
}

/// The token of a `Bearer` authorization value. The scheme is case-insensitive.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn check(key: &ApiKey, authorization: Option<&str>) -> Result<(), Rejection> {
    let token = authorization
        .and_then(bearer_token)
        .ok_or(Rejection::MissingCredentials)?;
    if key.matches(token) {
        Ok(())
    } else {
        Err(Rejection::WrongKey)
    }
}

/// Reject requests that do not carry the configured key.
pub async fn require_api_key(
    State(key): State<ApiKey>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    if OPEN_PATHS.contains(&request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match check(&key, authorization) {
        Ok(()) => Ok(next.run(request).await),
        Err(rejection) => {
            tracing::warn!(
                event = "auth_failure",
                reason = rejection.reason(),
                path = request.uri().path(),
                "Request rejected"
            );
            Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Unauthorized".to_string(),
                }),
            ))
        }
    }
}
