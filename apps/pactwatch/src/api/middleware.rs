//! # Rate Limiting
//!
//! One request budget shared by every client, set by
//! `PACTWATCH_RATE_LIMIT` in requests per second. The default is 50 and
//! `0` turns the limit off.

use super::types::ErrorResponse;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::num::NonZeroU32;
use std::sync::Arc;

const RATE_LIMIT_ENV: &str = "PACTWATCH_RATE_LIMIT";

const DEFAULT_REQUESTS_PER_SECOND: u32 = 50;

/// Budget shared by the whole router.
pub type GlobalRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Requests per second from `PACTWATCH_RATE_LIMIT`; `None` means unlimited.
#[must_use]
pub fn rate_limit_from_env() -> Option<NonZeroU32> {
    parse_rate_limit(std::env::var(RATE_LIMIT_ENV).ok().as_deref())
}

fn parse_rate_limit(raw: Option<&str>) -> Option<NonZeroU32> {
    let per_second = match raw.map(str::trim) {
        Some(value) => value.parse::<u32>().unwrap_or_else(|_| {
            tracing::warn!(value, "Ignoring unparsable {}", RATE_LIMIT_ENV);
            DEFAULT_REQUESTS_PER_SECOND
        }),
        None => DEFAULT_REQUESTS_PER_SECOND,
    };
    NonZeroU32::new(per_second)
}

#[must_use]
pub fn create_rate_limiter(per_second: NonZeroU32) -> GlobalRateLimiter {
    Arc::new(RateLimiter::direct(Quota::per_second(per_second)))
}

/// Answer 429 once the budget for the current second is spent.
pub async fn rate_limit_middleware(
    State(limiter): State<GlobalRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    if limiter.check().is_err() {
        tracing::warn!(
            event = "rate_limited",
            path = request.uri().path(),
            "Request budget exhausted"
        );
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse {
                error: "Too many requests".to_string(),
            }),
        ));
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_setting() {
        assert_eq!(parse_rate_limit(None), NonZeroU32::new(50));
        assert_eq!(parse_rate_limit(Some(" 12 ")), NonZeroU32::new(12));
        assert_eq!(parse_rate_limit(Some("0")), None);
        assert_eq!(parse_rate_limit(Some("lots")), NonZeroU32::new(50));
    }

    #[test]
    fn limiter_exhausts_burst() {
        let limiter = create_rate_limiter(NonZeroU32::MIN.saturating_add(1));
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }
}
