//! Error types for the DevRev MCP server.
//!
//! This module defines the closed [`ErrorKind`] taxonomy for upstream DevRev
//! failures, the [`ApiError`] value that carries one of them, and
//! [`DevRevError`], the unified error type used throughout the crate.
//!
//! Classification ([`classify`]) and rendering ([`format_error`]) are pure
//! functions: they never fail and can be called unconditionally on any
//! failure path.
//!
//! # Security
//!
//! Messages coming back from the upstream API are passed through
//! [`DevRevError::sanitize_message`] before they reach logs or tool output,
//! so the API token can never be echoed back to a caller.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Configuration flag that enables beta-only DevRev features.
pub const BETA_FLAG: &str = "DEVREV_API_VERSION=beta";

/// Classified upstream failure.
///
/// The set is closed: every failure the client can observe is mapped onto
/// exactly one of these, with [`ErrorKind::Unknown`] as the catch-all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// HTTP 401 - the API token was rejected.
    Authentication,
    /// HTTP 403 - authenticated but not allowed.
    Forbidden,
    /// HTTP 404.
    NotFound,
    /// HTTP 400 - the request was rejected, optionally with per-field reasons.
    Validation {
        /// Field name to error message, ordered by field name.
        field_errors: BTreeMap<String, String>,
    },
    /// HTTP 409.
    Conflict,
    /// HTTP 429.
    RateLimit {
        /// Seconds the server asked us to wait, if it said.
        retry_after: Option<u64>,
    },
    /// HTTP 500.
    Server,
    /// HTTP 503.
    ServiceUnavailable,
    /// The request never produced a response in time.
    Timeout,
    /// The operation needs the beta API but the client is on the public one.
    BetaRequired {
        /// Name of the gated feature, if known.
        feature_name: Option<String>,
    },
    /// Anything not matched above.
    Unknown,
}

impl ErrorKind {
    /// Short stable name, used in logs and audit events.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Authentication => "authentication",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation { .. } => "validation",
            ErrorKind::Conflict => "conflict",
            ErrorKind::RateLimit { .. } => "rate_limit",
            ErrorKind::Server => "server",
            ErrorKind::ServiceUnavailable => "service_unavailable",
            ErrorKind::Timeout => "timeout",
            ErrorKind::BetaRequired { .. } => "beta_required",
            ErrorKind::Unknown => "unknown",
        }
    }
}

/// Maps an HTTP status code to its [`ErrorKind`].
///
/// Payload-carrying kinds are returned with empty payloads; the caller fills
/// them in from the response (see [`ApiError::from_status`]).
#[must_use]
pub fn classify(status: u16) -> ErrorKind {
    match status {
        400 => ErrorKind::Validation {
            field_errors: BTreeMap::new(),
        },
        401 => ErrorKind::Authentication,
        403 => ErrorKind::Forbidden,
        404 => ErrorKind::NotFound,
        409 => ErrorKind::Conflict,
        429 => ErrorKind::RateLimit { retry_after: None },
        500 => ErrorKind::Server,
        503 => ErrorKind::ServiceUnavailable,
        _ => ErrorKind::Unknown,
    }
}

/// A classified failure reported by (or on the way to) the DevRev API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Human-readable message, usually taken from the response body.
    pub message: String,
    /// HTTP status code, when a response was received.
    pub status_code: Option<u16>,
    /// Value of the `x-request-id` response header, when present.
    pub request_id: Option<String>,
}

impl ApiError {
    /// Creates an error of the given kind with no HTTP context.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
            request_id: None,
        }
    }

    /// Creates an error classified from an HTTP status code.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: classify(status),
            message: message.into(),
            status_code: Some(status),
            request_id: None,
        }
    }

    /// Creates a timeout error for an operation that never got a response.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Creates a beta-required error for a named feature.
    pub fn beta_required(feature: impl Into<String>) -> Self {
        let feature = feature.into();
        Self::new(
            ErrorKind::BetaRequired {
                feature_name: Some(feature.clone()),
            },
            format!("The {} service requires the beta API", feature),
        )
    }

    /// Attaches the upstream request ID.
    #[must_use]
    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    /// Attaches field-level errors. No effect unless this is a validation error.
    #[must_use]
    pub fn with_field_errors(mut self, errors: BTreeMap<String, String>) -> Self {
        if let ErrorKind::Validation { field_errors } = &mut self.kind {
            *field_errors = errors;
        }
        self
    }

    /// Attaches a server-provided retry delay. No effect unless this is a rate limit.
    #[must_use]
    pub fn with_retry_after(mut self, seconds: Option<u64>) -> Self {
        if let ErrorKind::RateLimit { retry_after } = &mut self.kind {
            *retry_after = seconds;
        }
        self
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(status) = self.status_code {
            write!(f, " (HTTP {})", status)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " [request_id: {}]", request_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Unified error type for all DevRev operations.
#[derive(Error, Debug)]
pub enum DevRevError {
    /// Configuration error - missing or invalid environment variables.
    #[error("configuration error: {0}")]
    Config(String),

    /// Classified upstream failure.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// HTTP client initialization failed.
    #[error("HTTP client error: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// JSON serialization or deserialization failed.
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DevRevError {
    /// Creates a configuration error for a missing environment variable.
    pub fn missing_env(var_name: &str) -> Self {
        DevRevError::Config(format!(
            "missing required environment variable: {}",
            var_name
        ))
    }

    /// Creates a configuration error for an invalid value.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        DevRevError::Config(message.into())
    }

    /// Returns the classified API error, if this is one.
    #[must_use]
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            DevRevError::Api(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the error kind, treating non-API failures as [`ErrorKind::Unknown`].
    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        match self {
            DevRevError::Api(e) => &e.kind,
            _ => &ErrorKind::Unknown,
        }
    }

    /// Returns true if this error is transient and the request may be retried.
    ///
    /// Retryable: rate limiting, 500/502/503/504, and timeouts.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        let Some(api) = self.api() else {
            return false;
        };
        match api.kind {
            ErrorKind::RateLimit { .. } | ErrorKind::Server | ErrorKind::ServiceUnavailable => {
                true
            }
            ErrorKind::Timeout => true,
            ErrorKind::Unknown => matches!(api.status_code, Some(502 | 504)),
            _ => false,
        }
    }

    /// Returns the server-requested delay for rate-limit errors.
    #[must_use]
    pub fn retry_after(&self) -> Option<u64> {
        match self.kind() {
            ErrorKind::RateLimit { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Replaces every occurrence of `secret` in `message` with `[REDACTED]`.
    #[must_use]
    pub fn sanitize_message(message: &str, secret: &str) -> String {
        if secret.is_empty() {
            return message.to_string();
        }
        message.replace(secret, "[REDACTED]")
    }
}

/// Renders an error as a single self-contained message for an agent or user.
///
/// Structured details (field errors, retry delay, required flag) are folded
/// into the string. Failures that are not classified API errors render
/// through the `Unknown` branch, so the original message is never dropped.
#[must_use]
pub fn format_error(error: &DevRevError) -> String {
    match error {
        DevRevError::Api(api) => format_api_error(api),
        other => format!("DevRev API error: {}", other),
    }
}

fn format_api_error(error: &ApiError) -> String {
    let message = &error.message;
    match &error.kind {
        ErrorKind::Authentication => {
            format!(
                "Authentication failed: {}. Check your DEVREV_API_TOKEN.",
                message
            )
        }
        ErrorKind::Forbidden => format!("Permission denied: {}", message),
        ErrorKind::NotFound => format!("Not found: {}", message),
        ErrorKind::Validation { field_errors } => {
            let fields = if field_errors.is_empty() {
                String::new()
            } else {
                let pairs: Vec<String> = field_errors
                    .iter()
                    .map(|(field, reason)| format!("{}: {}", field, reason))
                    .collect();
                format!(" Fields: {}", pairs.join(", "))
            };
            format!("Validation error: {}.{}", message, fields)
        }
        ErrorKind::Conflict => format!("Conflict: {}", message),
        ErrorKind::RateLimit { retry_after } => {
            let retry = match retry_after {
                Some(seconds) if *seconds > 0 => format!(" Retry after {}s.", seconds),
                _ => String::new(),
            };
            format!("Rate limited: {}.{}", message, retry)
        }
        ErrorKind::Server => format!("DevRev server error: {}", message),
        ErrorKind::ServiceUnavailable => format!("DevRev service unavailable: {}", message),
        ErrorKind::Timeout => format!("Request timed out: {}", message),
        ErrorKind::BetaRequired { .. } => format!(
            "Beta API required: {}. Set {} to enable beta features.",
            message, BETA_FLAG
        ),
        ErrorKind::Unknown => format!("DevRev API error: {}", message),
    }
}
