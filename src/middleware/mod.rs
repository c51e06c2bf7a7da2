//! Request governance for the HTTP transports.
//!
//! Each gate exposes a synchronous `check(&RequestMeta) -> Result<(), Denial>`
//! so it can be exercised without a running server, plus an axum middleware
//! function that applies the check in front of any handler. A denial is
//! written straight to the wire; nothing is raised past the middleware.
//!
//! Layering (outermost first): [`auth`], [`rate_limit`], then the MCP service.
//! Both gates let bypass paths and CORS preflight (`OPTIONS`) through.

pub mod audit;
pub mod auth;
pub mod health;
pub mod rate_limit;

use std::net::SocketAddr;

use axum::{
    extract::ConnectInfo,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Header carrying the MCP session identifier.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// The parts of an inbound request the gates look at.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    /// Request path, without query string.
    pub path: String,
    /// HTTP method.
    pub method: Method,
    /// Request headers.
    pub headers: HeaderMap,
    /// Connection peer, when the server was started with connect info.
    pub peer: Option<SocketAddr>,
}

impl RequestMeta {
    /// Captures the governance-relevant parts of an axum request.
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Self {
            path: request.uri().path().to_string(),
            method: request.method().clone(),
            headers: request.headers().clone(),
            peer,
        }
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// True for CORS preflight requests.
    #[must_use]
    pub fn is_preflight(&self) -> bool {
        self.method == Method::OPTIONS
    }

    /// Peer IP as a string, or `"unknown"`.
    #[must_use]
    pub fn client_ip(&self) -> String {
        self.peer
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Identifies the subject of rate limiting.
    ///
    /// `session:<id>` when an MCP session header is present, else `ip:<peer>`.
    #[must_use]
    pub fn client_key(&self) -> String {
        match self.header(SESSION_HEADER).map(str::trim) {
            Some(session) if !session.is_empty() => format!("session:{}", session),
            _ => format!("ip:{}", self.client_ip()),
        }
    }
}

/// True when `meta` targets a bypass path or is a preflight request.
pub(crate) fn is_exempt(meta: &RequestMeta, bypass_paths: &[String]) -> bool {
    meta.is_preflight() || bypass_paths.iter().any(|p| p == &meta.path)
}

/// A request refused by a governance gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    /// HTTP status to answer with.
    pub status: StatusCode,
    /// Message placed in the `error` field of the JSON body.
    pub message: String,
    /// Whole seconds to wait before retrying (rate limiting only).
    pub retry_after: Option<u64>,
}

impl Denial {
    /// 401 with the given message.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
            retry_after: None,
        }
    }

    /// 403 with the given message.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: message.into(),
            retry_after: None,
        }
    }

    /// 429 with a retry hint.
    #[must_use]
    pub fn rate_limited(retry_after: u64) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: "Rate limit exceeded".to_string(),
            retry_after: Some(retry_after),
        }
    }
}

impl IntoResponse for Denial {
    fn into_response(self) -> Response {
        match self.retry_after {
            Some(seconds) => {
                let body = json!({"error": self.message, "retry_after": seconds});
                let mut response = (self.status, Json(body)).into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
                response
            }
            None => (self.status, Json(json!({"error": self.message}))).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn meta(builder: axum::http::request::Builder) -> RequestMeta {
        RequestMeta::from_request(&builder.body(Body::empty()).unwrap())
    }

    #[test]
    fn test_client_key_prefers_session() {
        let m = meta(Request::builder().uri("/mcp").header(SESSION_HEADER, "abc-123"));
        assert_eq!(m.client_key(), "session:abc-123");
    }

    #[test]
    fn test_client_key_falls_back_to_peer() {
        let mut request = Request::builder().uri("/mcp").body(Body::empty()).unwrap();
        let addr: SocketAddr = "10.1.2.3:5555".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(RequestMeta::from_request(&request).client_key(), "ip:10.1.2.3");
    }

    #[test]
    fn test_client_key_unknown_peer_and_blank_session() {
        let m = meta(Request::builder().uri("/mcp").header(SESSION_HEADER, "  "));
        assert_eq!(m.client_key(), "ip:unknown");
    }

    #[test]
    fn test_exempt_paths_and_preflight() {
        let bypass = vec!["/health".to_string()];
        assert!(is_exempt(&meta(Request::builder().uri("/health")), &bypass));
        assert!(is_exempt(
            &meta(Request::builder().method(Method::OPTIONS).uri("/mcp")),
            &bypass
        ));
        assert!(!is_exempt(&meta(Request::builder().uri("/mcp")), &bypass));
        assert!(!is_exempt(&meta(Request::builder().uri("/health/deep")), &bypass));
    }

    #[test]
    fn test_rate_limited_denial_sets_header() {
        let response = Denial::rate_limited(3).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "3");
    }
}
