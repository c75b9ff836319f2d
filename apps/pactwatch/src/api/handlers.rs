//! # API Endpoint Handlers
//!
//! Every handler takes the workspace lock for exactly the span of one
//! workspace operation, so catalog mutations are applied one at a time.

use super::{
    AppState,
    types::{
        ClassifyQuery, ClassifyResponse, ContractListResponse, ContractQuery,
        ErrorResponse, HealthResponse, RefreshResponse, SessionResponse, UploadRequest,
    },
};
use crate::error::AppError;
use crate::session::AuthSession;
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use pactwatch_core::{
    Contract, DashboardSummary, PactError, days_until_date, parse_expiration, start_of_day,
    tier_for_days,
};

/// Handler result: a JSON body with its status, or an error body.
type ApiResult<T> = Result<(StatusCode, Json<T>), (StatusCode, Json<ErrorResponse>)>;

fn reject(err: &AppError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, body) = ErrorResponse::from_app_error(err);
    (status, Json(body))
}

fn session_response(auth: &AuthSession) -> SessionResponse {
    match auth.current() {
        Some(session) => SessionResponse {
            signed_in: true,
            user_id: Some(session.user_id.to_string()),
            email: Some(session.email),
        },
        None => SessionResponse::default(),
    }
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// SESSION HANDLERS
// =============================================================================

/// Who is signed in.
pub async fn session_handler(State(state): State<AppState>) -> impl IntoResponse {
    let workspace = state.workspace.read().await;
    (StatusCode::OK, Json(session_response(workspace.auth())))
}

/// End the session. The catalog is cleared with it.
pub async fn sign_out_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut workspace = state.workspace.write().await;
    workspace.sign_out();
    (StatusCode::OK, Json(session_response(workspace.auth())))
}

// =============================================================================
// CONTRACT HANDLERS
// =============================================================================

/// List the catalog, classified against the server clock.
pub async fn list_contracts_handler(
    State(state): State<AppState>,
    Query(query): Query<ContractQuery>,
) -> ApiResult<ContractListResponse> {
    let filter = query.to_filter().map_err(|e| reject(&AppError::Core(e)))?;

    let workspace = state.workspace.read().await;
    let reference = workspace.now();
    let contracts = workspace.contracts(&filter).map_err(|e| reject(&e))?;

    Ok((
        StatusCode::OK,
        Json(ContractListResponse {
            reference,
            count: contracts.len(),
            contracts,
        }),
    ))
}

/// Upload a document and return the contract created for it.
pub async fn upload_handler(
    State(state): State<AppState>,
    Json(request): Json<UploadRequest>,
) -> ApiResult<Contract> {
    let file = request.to_upload_file().map_err(|e| reject(&e))?;

    let mut workspace = state.workspace.write().await;
    match workspace.upload(file).await {
        Ok(contract) => Ok((StatusCode::CREATED, Json(contract))),
        Err(e) => Err(reject(&e)),
    }
}

/// Re-fetch the catalog from the store.
pub async fn refresh_handler(State(state): State<AppState>) -> ApiResult<RefreshResponse> {
    let mut workspace = state.workspace.write().await;
    match workspace.refresh().await {
        Ok(count) => Ok((StatusCode::OK, Json(RefreshResponse { count }))),
        Err(e) => Err(reject(&e)),
    }
}

// =============================================================================
// DASHBOARD HANDLER
// =============================================================================

/// Portfolio summary for the dashboard.
pub async fn dashboard_handler(State(state): State<AppState>) -> ApiResult<DashboardSummary> {
    let workspace = state.workspace.read().await;
    match workspace.dashboard() {
        Ok(summary) => Ok((StatusCode::OK, Json(summary))),
        Err(e) => Err(reject(&e)),
    }
}

// =============================================================================
// CLASSIFY HANDLER
// =============================================================================

/// Classify a single expiration date without touching the catalog.
pub async fn classify_handler(
    State(state): State<AppState>,
    Query(query): Query<ClassifyQuery>,
) -> ApiResult<ClassifyResponse> {
    let invalid = |e: PactError| reject(&AppError::Core(e));
    let expiration_date = parse_expiration(&query.expires).map_err(invalid)?;
    let reference = match query.today.as_deref() {
        Some(today) => start_of_day(parse_expiration(today).map_err(invalid)?),
        None => state.workspace.read().await.now(),
    };

    let days_remaining = days_until_date(reference, expiration_date);
    Ok((
        StatusCode::OK,
        Json(ClassifyResponse {
            reference,
            expiration_date,
            days_remaining,
            risk_level: tier_for_days(days_remaining),
        }),
    ))
}
