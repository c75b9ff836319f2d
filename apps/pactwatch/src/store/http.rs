//! # Hosted Contract Store
//!
//! Client for a hosted backend that owns contract persistence and
//! document storage.
//!
//! - `GET  {base}/contracts?user_id=<id>` → `[ContractRecord]`
//! - `POST {base}/contracts` with `{user_id, file_name, content_base64}` → `ContractRecord`
//!
//! Requests run as the signed-in user: the session's access token is the
//! bearer credential. The configured API key identifies the client in an
//! `apikey` header and stands in as the bearer when the session carries no
//! token.
//!
//! Error bodies of the form `{"message": "..."}` or `{"error": "..."}` are
//! surfaced verbatim.

use super::{ContractStore, UploadFile};
use crate::error::StoreError;
use crate::session::UserSession;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use pactwatch_core::{ContractRecord, UserId};

/// Header carrying the client's API key.
const API_KEY_HEADER: &str = "apikey";
use serde::{Deserialize, Serialize};

/// Upload body sent to the hosted backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadBody {
    pub user_id: UserId,
    pub file_name: String,
    pub content_base64: String,
}

/// HTTP client for the hosted contract backend.
#[derive(Clone)]
pub struct HttpContractStore {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for HttpContractStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpContractStore")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl HttpContractStore {
    /// Create a client pointing at the given backend URL.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request authenticated as `session`.
    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        session: &UserSession,
    ) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method, &url);
        if let Some(ref key) = self.api_key {
            req = req.header(API_KEY_HEADER, key);
        }
        let token = Some(session.access_token.trim())
            .filter(|t| !t.is_empty())
            .or(self.api_key.as_deref());
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req
    }

    /// Send a request and map connection errors.
    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, StoreError> {
        req.send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", self.base_url)))
    }

    /// Check the status code and parse the JSON body.
    async fn handle_response<T>(&self, resp: reqwest::Response) -> Result<T, StoreError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(StoreError::Unauthorized);
        }
        if !status.is_success() {
            let body = match resp.text().await {
                Ok(body) => body,
                Err(e) => format!("unreadable error body: {e}"),
            };
            let message = error_message(&body).unwrap_or_else(|| {
                if body.trim().is_empty() {
                    status.to_string()
                } else {
                    body
                }
            });
            return if status.is_server_error() {
                Err(StoreError::Unavailable(format!("{}: {}", status.as_u16(), message)))
            } else {
                Err(StoreError::Rejected(message))
            };
        }
        resp.json::<T>()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))
    }
}

/// Pull a human-readable message out of a JSON error body.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error", "error_description"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

impl ContractStore for HttpContractStore {
    async fn fetch_all(&self, session: &UserSession) -> Result<Vec<ContractRecord>, StoreError> {
        let req = self
            .request(reqwest::Method::GET, "/contracts", session)
            .query(&[("user_id", session.user_id.as_str())]);
        let resp = self.send(req).await?;
        self.handle_response(resp).await
    }

    async fn upload(
        &self,
        file: &UploadFile,
        session: &UserSession,
    ) -> Result<ContractRecord, StoreError> {
        let body = UploadBody {
            user_id: session.user_id.clone(),
            file_name: file.name().to_string(),
            content_base64: BASE64.encode(file.bytes()),
        };
        let req = self
            .request(reqwest::Method::POST, "/contracts", session)
            .json(&body);
        let resp = self.send(req).await?;
        self.handle_response(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_trimmed() {
        let store = HttpContractStore::new("https://backend.example/api/", None);
        assert_eq!(store.base_url(), "https://backend.example/api");
    }

    #[test]
    fn error_message_prefers_message_field() {
        assert_eq!(
            error_message(r#"{"message":"File type not allowed","error":"bad"}"#),
            Some("File type not allowed".to_string())
        );
        assert_eq!(
            error_message(r#"{"error":"quota exceeded"}"#),
            Some("quota exceeded".to_string())
        );
        assert_eq!(error_message("plain text"), None);
    }

    fn session(token: &str) -> UserSession {
        UserSession::new(UserId::new("u-1"), "ada@example.com", token)
    }

    fn auth_headers(
        store: &HttpContractStore,
        session: &UserSession,
    ) -> reqwest::header::HeaderMap {
        store
            .request(reqwest::Method::GET, "/contracts", session)
            .build()
            .expect("request")
            .headers()
            .clone()
    }

    #[test]
    fn session_token_is_the_bearer() {
        let store = HttpContractStore::new("http://localhost", Some("project-key".to_string()));
        let headers = auth_headers(&store, &session("user-jwt"));
        assert_eq!(headers[reqwest::header::AUTHORIZATION], "Bearer user-jwt");
        assert_eq!(headers[API_KEY_HEADER], "project-key");
    }

    #[test]
    fn api_key_stands_in_without_a_token() {
        let store = HttpContractStore::new("http://localhost", Some("project-key".to_string()));
        let headers = auth_headers(&store, &session(""));
        assert_eq!(headers[reqwest::header::AUTHORIZATION], "Bearer project-key");

        let anonymous = HttpContractStore::new("http://localhost", None);
        let headers = auth_headers(&anonymous, &session(" "));
        assert!(headers.get(reqwest::header::AUTHORIZATION).is_none());
        assert!(headers.get(API_KEY_HEADER).is_none());
    }

    #[test]
    fn debug_redacts_api_key() {
        let store = HttpContractStore::new("http://localhost", Some("secret".to_string()));
        assert!(!format!("{store:?}").contains("secret"));
    }
}
