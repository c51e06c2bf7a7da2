//! Bearer-token authentication gate.
//!
//! A single shared secret guards every non-exempt request. The outcomes are
//! deliberately split: a missing or malformed `Authorization` header is 401
//! (we do not know who you are), a well-formed header with the wrong token
//! is 403 (you are not allowed).

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{audit, is_exempt, Denial, RequestMeta};
use crate::error::DevRevError;

/// 401 body when no `Authorization` header is sent.
pub const MISSING_HEADER: &str = "Missing Authorization header";

/// 401 body when the header is not `Bearer <token>`.
pub const MALFORMED_HEADER: &str = "Invalid Authorization header format. Expected: Bearer <token>";

/// 403 body when the token does not match.
pub const INVALID_TOKEN: &str = "Invalid Bearer token";

/// Compares two byte strings without exiting early on the first difference.
///
/// Every byte of the longer input is visited and the length check is folded
/// into the result, so timing does not reveal the matching prefix length.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let len_match = a.len() == b.len();
    let max_len = a.len().max(b.len());

    let mut diff = 0u8;
    for i in 0..max_len {
        let byte_a = a.get(i).copied().unwrap_or(0);
        let byte_b = b.get(i).copied().unwrap_or(0);
        diff |= byte_a ^ byte_b;
    }

    len_match & (diff == 0)
}

/// Shared-secret Bearer authentication.
pub struct BearerAuth {
    token: String,
    bypass_paths: Vec<String>,
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth")
            .field("token", &"[REDACTED]")
            .field("bypass_paths", &self.bypass_paths)
            .finish()
    }
}

impl BearerAuth {
    /// Creates a gate accepting exactly `token`.
    ///
    /// # Errors
    ///
    /// Returns `DevRevError::Config` if the token is empty.
    pub fn new(token: impl Into<String>, bypass_paths: Vec<String>) -> Result<Self, DevRevError> {
        let token = token.into();
        if token.is_empty() {
            return Err(DevRevError::invalid_config(
                "Bearer authentication requires a non-empty token",
            ));
        }
        Ok(Self {
            token,
            bypass_paths,
        })
    }

    /// Authenticates a request.
    pub fn check(&self, meta: &RequestMeta) -> Result<(), Denial> {
        if is_exempt(meta, &self.bypass_paths) {
            return Ok(());
        }

        let client_ip = meta.client_ip();
        let user_agent = meta.header(header::USER_AGENT.as_str()).unwrap_or("");

        let Some(raw) = meta
            .headers
            .get(header::AUTHORIZATION)
            .filter(|v| !v.is_empty())
        else {
            tracing::warn!(client_ip = %client_ip, "Missing Authorization header");
            audit::auth_failure("missing_authorization_header", &client_ip, user_agent);
            return Err(Denial::unauthorized(MISSING_HEADER));
        };

        // Present but not visible ASCII is malformed, not missing.
        let provided = match raw.to_str().ok().and_then(|v| v.split_once(' ')) {
            Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
            _ => {
                tracing::warn!(client_ip = %client_ip, "Invalid Authorization header format");
                audit::auth_failure("invalid_authorization_format", &client_ip, user_agent);
                return Err(Denial::unauthorized(MALFORMED_HEADER));
            }
        };

        if !constant_time_eq(provided.as_bytes(), self.token.as_bytes()) {
            tracing::warn!(client_ip = %client_ip, "Invalid Bearer token");
            audit::auth_failure("invalid_bearer_token", &client_ip, user_agent);
            return Err(Denial::forbidden(INVALID_TOKEN));
        }

        audit::auth_success(&client_ip, user_agent);
        Ok(())
    }
}

/// Axum middleware enforcing a [`BearerAuth`] gate.
pub async fn bearer_auth_middleware(
    State(gate): State<Arc<BearerAuth>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let meta = RequestMeta::from_request(&request);
    match gate.check(&meta) {
        Ok(()) => next.run(request).await,
        Err(denial) => denial.into_response(),
    }
}
