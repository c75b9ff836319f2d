//! # Pactwatch HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /session` - Current session
//! - `POST /session/sign-out` - End the session and clear the catalog
//! - `GET /contracts` - List contracts (`?risk=&status=&search=`)
//! - `POST /contracts` - Upload a document (base64 JSON body)
//! - `POST /contracts/refresh` - Re-fetch the catalog
//! - `GET /dashboard` - Portfolio summary
//! - `GET /classify` - Classify one date (`?expires=&today=`)
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `PACTWATCH_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `PACTWATCH_RATE_LIMIT`: Requests per second (default: 50, 0 to disable)
//! - `PACTWATCH_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::ApiKey;
pub use handlers::{
    classify_handler, dashboard_handler, health_handler, list_contracts_handler, refresh_handler,
    session_handler, sign_out_handler, upload_handler,
};
pub use middleware::{GlobalRateLimiter, create_rate_limiter, rate_limit_from_env};
pub use types::{
    ClassifyQuery, ClassifyResponse, ContractJson, ContractListResponse, ContractQuery,
    ErrorResponse, HealthResponse, RefreshResponse, SessionResponse, UploadRequest,
};

use crate::error::AppError;
use crate::store::{MAX_UPLOAD_BYTES, StoreBackend};
use crate::workspace::Workspace;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Request bodies carry base64, which inflates an upload by a third.
const MAX_BODY_BYTES: usize = MAX_UPLOAD_BYTES / 3 * 4 + 64 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the workspace.
#[derive(Clone)]
pub struct AppState {
    pub workspace: Arc<RwLock<Workspace<StoreBackend>>>,
}

impl AppState {
    #[must_use]
    pub fn new(workspace: Workspace<StoreBackend>) -> Self {
        Self {
            workspace: Arc::new(RwLock::new(workspace)),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from `PACTWATCH_CORS_ORIGINS`.
///
/// - `"*"`: allow all origins
/// - unset or no valid origin: localhost only
/// - otherwise: the comma-separated list
fn build_cors_layer() -> CorsLayer {
    match std::env::var("PACTWATCH_CORS_ORIGINS").ok().as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (PACTWATCH_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in PACTWATCH_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                cors_for(allowed_origins)
            }
        }
        None => build_localhost_cors(),
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:5173",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:5173",
    ]
    .into_iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect();
    cors_for(origins)
}

fn cors_for(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner): tracing, CORS, body limit, rate
/// limiting (if enabled), authentication (if configured).
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    let rate_limiter = match rate_limit_from_env() {
        Some(per_second) => {
            tracing::info!(per_second = per_second.get(), "Rate limiting enabled");
            Some(create_rate_limiter(per_second))
        }
        None => {
            tracing::info!("Rate limiting disabled");
            None
        }
    };

    let api_key = ApiKey::from_env();
    if api_key.is_some() {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED. Set PACTWATCH_API_KEY to require a bearer token."
        );
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/session", get(handlers::session_handler))
        .route("/session/sign-out", post(handlers::sign_out_handler))
        .route(
            "/contracts",
            get(handlers::list_contracts_handler).post(handlers::upload_handler),
        )
        .route("/contracts/refresh", post(handlers::refresh_handler))
        .route("/dashboard", get(handlers::dashboard_handler))
        .route("/classify", get(handlers::classify_handler));

    if let Some(key) = api_key {
        router = router.layer(axum_middleware::from_fn_with_state(
            key,
            auth::require_api_key,
        ));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Serve the router on `addr` until the process is stopped.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), AppError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("Pactwatch HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| AppError::Io(format!("Server error: {}", e)))
}
