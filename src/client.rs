//! HTTP client for the DevRev REST API.
//!
//! Every DevRev endpoint is a `POST <base>/<object>.<verb>` with a JSON body
//! and a Bearer token. Non-2xx responses are translated into [`ApiError`]s
//! through [`classify`](crate::error::classify), keeping the upstream message,
//! the `x-request-id` header, `Retry-After` on 429 and `field_errors` on 400.
//!
//! # Retry Logic
//!
//! Transient failures (429, 500, 502, 503, 504 and timeouts) are retried up
//! to `max_retries` attempts in total with exponential backoff starting at
//! 500 ms. A `Retry-After` header on a 429 replaces the computed delay.
//!
//! # Beta gating
//!
//! Incidents and hybrid search only exist on the beta API. On a client
//! configured for the public API those calls fail with `BetaRequired`
//! without issuing a request.
//!
//! # Security
//!
//! The API token is never logged. Upstream messages are sanitized before
//! they are stored in an error.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::{ApiVersion, Config};
use crate::error::{ApiError, DevRevError, ErrorKind};
use crate::models::{
    unwrap_object, Account, Article, Conversation, CreateWorkRequest, DevUser, GetRequest,
    HybridSearchRequest, Incident, ListRequest, ListResponse, Part, Resource, SearchResponse,
    UpdateWorkRequest, Work,
};

/// Initial delay for exponential backoff (milliseconds).
const INITIAL_BACKOFF_MS: u64 = 500;

/// Longest non-JSON error body echoed back in a message.
const MAX_ERROR_BODY_LEN: usize = 200;

/// HTTP client for the DevRev API.
///
/// Cloning is cheap; the underlying connection pool is shared.
///
/// # Example
///
/// ```ignore
/// let config = Config::from_env()?;
/// let client = DevRevClient::new(&config)?;
///
/// let page = client.list::<Work>(&ListRequest::new().with_limit(10)).await?;
/// ```
#[derive(Clone)]
pub struct DevRevClient {
    http: Client,

    /// Base URL without trailing slash.
    base_url: String,

    /// SECURITY: Never log this value!
    api_token: String,

    api_version: ApiVersion,

    max_retries: u32,
}

impl std::fmt::Debug for DevRevClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevRevClient")
            .field("base_url", &self.base_url)
            .field("api_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl DevRevClient {
    /// Creates a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `DevRevError::HttpClient` if the HTTP client fails to initialize.
    pub fn new(config: &Config) -> Result<Self, DevRevError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(DevRevError::HttpClient)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            api_version: config.api_version,
            max_retries: config.max_retries.max(1),
        })
    }

    /// API surface this client talks to.
    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    /// Base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Redacts the API token from `message`.
    pub fn sanitize(&self, message: &str) -> String {
        DevRevError::sanitize_message(message, &self.api_token)
    }

    fn require_beta(&self, feature: &str) -> Result<(), DevRevError> {
        match self.api_version {
            ApiVersion::Beta => Ok(()),
            ApiVersion::Public => Err(ApiError::beta_required(feature).into()),
        }
    }

    fn validate_id(id: &str) -> Result<&str, DevRevError> {
        let id = id.trim();
        if id.is_empty() {
            let mut field_errors = BTreeMap::new();
            field_errors.insert("id".to_string(), "must not be empty".to_string());
            return Err(ApiError::new(
                ErrorKind::Validation { field_errors },
                "Object ID is required",
            )
            .into());
        }
        Ok(id)
    }

    // ========================================================================
    // Generic object operations
    // ========================================================================

    /// Lists one page of objects of type `T`.
    pub async fn list<T: Resource>(
        &self,
        request: &ListRequest,
    ) -> Result<ListResponse<T>, DevRevError> {
        let path = format!("/{}.list", T::ENDPOINT);
        let body: Map<String, Value> = self.post(&path, request).await?;
        ListResponse::from_body(body)
    }

    /// Fetches a single object of type `T` by ID.
    pub async fn get<T: Resource>(&self, id: &str) -> Result<T, DevRevError> {
        let id = Self::validate_id(id)?;
        let path = format!("/{}.get", T::ENDPOINT);
        let body: Map<String, Value> = self.post(&path, &GetRequest::new(id)).await?;
        unwrap_object(body)
    }

    // ========================================================================
    // Works
    // ========================================================================

    /// Creates a work item.
    pub async fn create_work(&self, request: &CreateWorkRequest) -> Result<Work, DevRevError> {
        let body: Map<String, Value> = self.post("/works.create", request).await?;
        unwrap_object(body)
    }

    /// Updates a work item. Unset fields are left unchanged.
    pub async fn update_work(&self, request: &UpdateWorkRequest) -> Result<Work, DevRevError> {
        Self::validate_id(&request.id)?;
        let body: Map<String, Value> = self.post("/works.update", request).await?;
        unwrap_object(body)
    }

    // ========================================================================
    // Typed shorthands
    // ========================================================================

    /// Lists accounts.
    pub async fn list_accounts(
        &self,
        request: &ListRequest,
    ) -> Result<ListResponse<Account>, DevRevError> {
        self.list(request).await
    }

    /// Lists knowledge-base articles.
    pub async fn list_articles(
        &self,
        request: &ListRequest,
    ) -> Result<ListResponse<Article>, DevRevError> {
        self.list(request).await
    }

    /// Lists product parts.
    pub async fn list_parts(&self, request: &ListRequest) -> Result<ListResponse<Part>, DevRevError> {
        self.list(request).await
    }

    /// Lists dev users.
    pub async fn list_dev_users(
        &self,
        request: &ListRequest,
    ) -> Result<ListResponse<DevUser>, DevRevError> {
        self.list(request).await
    }

    /// Returns the user that owns the API token.
    pub async fn dev_users_self(&self) -> Result<DevUser, DevRevError> {
        let body: Map<String, Value> = self.post("/dev-users.self", &Map::new()).await?;
        unwrap_object(body)
    }

    /// Lists conversations.
    pub async fn list_conversations(
        &self,
        request: &ListRequest,
    ) -> Result<ListResponse<Conversation>, DevRevError> {
        self.list(request).await
    }

    // ========================================================================
    // Beta API
    // ========================================================================

    /// Lists incidents (beta).
    pub async fn list_incidents(
        &self,
        request: &ListRequest,
    ) -> Result<ListResponse<Incident>, DevRevError> {
        self.require_beta("incidents")?;
        self.list(request).await
    }

    /// Fetches an incident by ID (beta).
    pub async fn get_incident(&self, id: &str) -> Result<Incident, DevRevError> {
        self.require_beta("incidents")?;
        self.get(id).await
    }

    /// Runs a hybrid keyword + semantic search (beta).
    pub async fn search_hybrid(
        &self,
        request: &HybridSearchRequest,
    ) -> Result<SearchResponse, DevRevError> {
        self.require_beta("search")?;
        self.post("/search.hybrid", request).await
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// POSTs `body` to `path` with retries and decodes the JSON response.
    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, DevRevError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_value(body)?;
        self.with_retry(path, || self.post_once(path, &payload)).await
    }

    /// Executes an operation with retry logic for transient failures.
    async fn with_retry<T, F, Fut>(&self, operation: &str, f: F) -> Result<T, DevRevError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, DevRevError>>,
    {
        let mut delay = Duration::from_millis(INITIAL_BACKOFF_MS);
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match f().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempts < self.max_retries => {
                    let actual_delay = e.retry_after().map(Duration::from_secs).unwrap_or(delay);

                    tracing::debug!(
                        operation = operation,
                        attempt = attempts,
                        max_attempts = self.max_retries,
                        delay_ms = actual_delay.as_millis() as u64,
                        error = %self.sanitize(&e.to_string()),
                        "Retrying after transient error"
                    );

                    tokio::time::sleep(actual_delay).await;
                    delay *= 2;
                }
                Err(e) => {
                    if attempts > 1 {
                        tracing::debug!(
                            operation = operation,
                            attempts = attempts,
                            "All retry attempts exhausted"
                        );
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Single POST without retry.
    async fn post_once<T>(&self, path: &str, payload: &Value) -> Result<T, DevRevError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);

        tracing::debug!(path = %path, "Making DevRev API request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_token)
            .header(header::ACCEPT, "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| self.transport_error(path, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.handle_http_error(status, response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(path, e))?;

        tracing::trace!(body = %body, "DevRev API response");

        if body.trim().is_empty() {
            return Ok(serde_json::from_value(Value::Object(Map::new()))?);
        }
        Ok(serde_json::from_str(&body)?)
    }

    fn transport_error(&self, path: &str, e: reqwest::Error) -> DevRevError {
        let message = self.sanitize(&e.to_string());
        if e.is_timeout() {
            return ApiError::timeout(format!("POST {} timed out: {}", path, message)).into();
        }
        ApiError::new(ErrorKind::Unknown, message).into()
    }

    /// Translates a non-2xx response into a classified error.
    async fn handle_http_error(&self, status: StatusCode, response: reqwest::Response) -> DevRevError {
        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok());

        let text = response.text().await.unwrap_or_default();
        let (message, field_errors) = parse_error_body(status.as_u16(), &text);
        let message = self.sanitize(&message);

        match status {
            StatusCode::TOO_MANY_REQUESTS => tracing::warn!(
                retry_after = ?retry_after,
                "Rate limited by DevRev"
            ),
            s if s.is_server_error() => tracing::warn!(
                status = %s,
                request_id = ?request_id,
                "DevRev server error"
            ),
            _ => {}
        }

        ApiError::from_status(status.as_u16(), message)
            .with_request_id(request_id)
            .with_retry_after(retry_after)
            .with_field_errors(field_errors)
            .into()
    }
}

/// Extracts the message and any field errors from an error body.
///
/// JSON bodies use `message`, then `error`, then `HTTP <status>`. Other
/// bodies are echoed after the status, truncated.
fn parse_error_body(status: u16, text: &str) -> (String, BTreeMap<String, String>) {
    let Ok(Value::Object(body)) = serde_json::from_str::<Value>(text) else {
        let snippet: String = text.chars().take(MAX_ERROR_BODY_LEN).collect();
        return (format!("HTTP {}: {}", status, snippet), BTreeMap::new());
    };

    let message = ["message", "error"]
        .iter()
        .filter_map(|key| body.get(*key).and_then(Value::as_str))
        .find(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status));

    let field_errors = body
        .get("field_errors")
        .and_then(Value::as_object)
        .map(|fields| {
            fields
                .iter()
                .map(|(k, v)| {
                    let text = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
                    (k.clone(), text)
                })
                .collect()
        })
        .unwrap_or_default();

    (message, field_errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(api_version: ApiVersion) -> DevRevClient {
        DevRevClient {
            http: Client::new(),
            base_url: "http://127.0.0.1:9".to_string(),
            api_token: "secret-token".to_string(),
            api_version,
            max_retries: 1,
        }
    }

    #[test]
    fn test_parse_error_body_message_then_error() {
        let (m, _) = parse_error_body(404, r#"{"message":"no such work"}"#);
        assert_eq!(m, "no such work");
        let (m, _) = parse_error_body(400, r#"{"error":"bad"}"#);
        assert_eq!(m, "bad");
        let (m, _) = parse_error_body(500, r#"{"detail":"x"}"#);
        assert_eq!(m, "HTTP 500");
    }

    #[test]
    fn test_parse_error_body_non_json_truncated() {
        let text = "x".repeat(500);
        let (m, fields) = parse_error_body(502, &text);
        assert!(m.starts_with("HTTP 502: "));
        assert_eq!(m.len(), "HTTP 502: ".len() + MAX_ERROR_BODY_LEN);
        assert!(fields.is_empty());
    }

    #[test]
    fn test_parse_error_body_field_errors() {
        let (_, fields) = parse_error_body(
            400,
            r#"{"message":"invalid","field_errors":{"title":"required","limit":5}}"#,
        );
        assert_eq!(fields.get("title").map(String::as_str), Some("required"));
        assert_eq!(fields.get("limit").map(String::as_str), Some("5"));
    }

    #[test]
    fn test_sanitize_hides_token() {
        let client = test_client(ApiVersion::Public);
        assert_eq!(
            client.sanitize("Bearer secret-token rejected"),
            "Bearer [REDACTED] rejected"
        );
        assert!(!format!("{:?}", client).contains("secret-token"));
    }

    #[tokio::test]
    async fn test_beta_calls_fail_fast_on_public_api() {
        let client = test_client(ApiVersion::Public);
        let err = client.list_incidents(&ListRequest::new()).await.unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::BetaRequired {
                feature_name: Some("incidents".to_string())
            }
        );

        let err = client
            .search_hybrid(&HybridSearchRequest {
                query: "login".to_string(),
                namespaces: None,
                semantic_weight: None,
                limit: None,
                cursor: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind().name(), ErrorKind::BetaRequired { feature_name: None }.name());
    }

    #[tokio::test]
    async fn test_get_rejects_blank_id() {
        let client = test_client(ApiVersion::Public);
        let err = client.get::<Work>("  ").await.unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Validation { .. }));
    }
}
