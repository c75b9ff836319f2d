//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use crate::error::{AppError, StoreError};
use crate::store::UploadFile;
use axum::http::StatusCode;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, NaiveDate, Utc};
use pactwatch_core::{
    CatalogFilter, Contract, ContractRecord, ContractStatus, PactError, RiskLevel,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Body of every non-2xx response produced by a handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    /// Map an application error onto a status code and body.
    ///
    /// Store failures keep the store's own message.
    pub fn from_app_error(err: &AppError) -> (StatusCode, Self) {
        let status = match err {
            AppError::NoSession => StatusCode::UNAUTHORIZED,
            AppError::InvalidUpload(_)
            | AppError::Core(PactError::InvalidDate(_) | PactError::InvalidRecord(_)) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Core(PactError::DuplicateContract(_)) => StatusCode::CONFLICT,
            AppError::FetchFailure(StoreError::Rejected(_))
            | AppError::UploadFailure(StoreError::Rejected(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::FetchFailure(_) | AppError::UploadFailure(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Self {
                error: err.to_string(),
            },
        )
    }
}

// =============================================================================
// CONTRACT JSON
// =============================================================================

/// A classified contract as read back from the API.
///
/// Responses serialize [`Contract`] itself; this mirror reuses
/// [`ContractRecord`] for everything but the tier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractJson {
    #[serde(flatten)]
    pub record: ContractRecord,
    pub risk_level: RiskLevel,
}

// =============================================================================
// LIST
// =============================================================================

/// Query string of `GET /contracts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractQuery {
    pub risk: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

impl ContractQuery {
    /// Convert to a catalog filter, validating the enum fields.
    pub fn to_filter(&self) -> Result<CatalogFilter, PactError> {
        let risk = non_empty(&self.risk)
            .map(str::parse::<RiskLevel>)
            .transpose()?;
        let status = non_empty(&self.status)
            .map(str::parse::<ContractStatus>)
            .transpose()?;
        Ok(CatalogFilter {
            risk,
            status,
            search: non_empty(&self.search).map(str::to_string),
        })
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Response of `GET /contracts`. Clients read it back as
/// `ContractListResponse<ContractJson>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractListResponse<C = Contract> {
    pub reference: DateTime<Utc>,
    pub count: usize,
    pub contracts: Vec<C>,
}

// =============================================================================
// UPLOAD
// =============================================================================

/// Body of `POST /contracts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRequest {
    pub file_name: String,
    pub content_base64: String,
}

impl UploadRequest {
    /// Decode and validate the document.
    pub fn to_upload_file(&self) -> Result<UploadFile, AppError> {
        let bytes = BASE64
            .decode(self.content_base64.trim())
            .map_err(|e| AppError::InvalidUpload(format!("content is not base64: {e}")))?;
        UploadFile::new(&self.file_name, bytes)
    }
}

// =============================================================================
// REFRESH / SESSION
// =============================================================================

/// Response of `POST /contracts/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub count: usize,
}

/// Response of `GET /session` and `POST /session/sign-out`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionResponse {
    pub signed_in: bool,
    pub user_id: Option<String>,
    pub email: Option<String>,
}

// =============================================================================
// CLASSIFY
// =============================================================================

/// Query string of `GET /classify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyQuery {
    pub expires: String,
    /// Reference date; defaults to the server clock.
    pub today: Option<String>,
}

/// Response of `GET /classify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub reference: DateTime<Utc>,
    pub expiration_date: NaiveDate,
    pub days_remaining: i64,
    pub risk_level: RiskLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_to_filter_parses_enums() {
        let query = ContractQuery {
            risk: Some("high".to_string()),
            status: Some(" Draft ".to_string()),
            search: Some(String::new()),
        };
        let filter = query.to_filter().expect("valid");
        assert_eq!(filter.risk, Some(RiskLevel::High));
        assert_eq!(filter.status, Some(ContractStatus::Draft));
        assert_eq!(filter.search, None);
    }

    #[test]
    fn contract_reads_back_as_record_plus_tier() {
        let expires = NaiveDate::from_ymd_opt(2026, 1, 20).expect("valid date");
        let record = ContractRecord::new(
            pactwatch_core::ContractId::new("c-1"),
            "Lease",
            "Lease",
            "Acme",
            expires,
            ContractStatus::Active,
        );
        let reference = pactwatch_core::start_of_day(
            NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid date"),
        );
        let contract = Contract::classify(record.clone(), reference);

        let text = serde_json::to_string(&contract).expect("encode");
        let read: ContractJson = serde_json::from_str(&text).expect("decode");

        assert_eq!(read.record, record);
        assert_eq!(read.risk_level, RiskLevel::High);
    }

    #[test]
    fn query_to_filter_rejects_unknown_risk() {
        let query = ContractQuery {
            risk: Some("extreme".to_string()),
            ..ContractQuery::default()
        };
        assert!(query.to_filter().is_err());
    }

    #[test]
    fn upload_request_rejects_bad_base64() {
        let request = UploadRequest {
            file_name: "a.pdf".to_string(),
            content_base64: "***".to_string(),
        };
        assert!(matches!(
            request.to_upload_file(),
            Err(AppError::InvalidUpload(_))
        ));
    }

    #[test]
    fn store_failures_map_to_gateway_errors() {
        let (status, body) = ErrorResponse::from_app_error(&AppError::UploadFailure(
            StoreError::Unavailable("down".to_string()),
        ));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.error.contains("down"));

        let (status, body) = ErrorResponse::from_app_error(&AppError::UploadFailure(
            StoreError::Rejected("File type not allowed".to_string()),
        ));
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error, "Upload failed: File type not allowed");
    }
}
