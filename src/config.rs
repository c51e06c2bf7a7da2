//! Configuration management for the DevRev MCP server.
//!
//! Two groups of settings are loaded from the environment:
//!
//! - [`Config`] (`DEVREV_*`): how to reach the DevRev API.
//! - [`ServerConfig`] (`MCP_*`): how the MCP server presents itself, which
//!   transport it serves, and the request-governance settings (auth token,
//!   rate limit, page sizes, bypass paths).
//!
//! Both loaders take a lookup function so tests can supply values without
//! touching the process environment; `from_env` wires them to `std::env`.

use std::env;
use std::net::IpAddr;
use std::time::Duration;

use url::Url;

use crate::error::DevRevError;
use crate::pagination::PageLimits;

/// Default DevRev API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.devrev.ai";

/// DevRev API surface the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiVersion {
    /// Stable public API.
    #[default]
    Public,
    /// Beta API, required for incidents and search.
    Beta,
}

impl ApiVersion {
    fn parse(value: &str) -> Result<Self, DevRevError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(ApiVersion::Public),
            "beta" => Ok(ApiVersion::Beta),
            other => Err(DevRevError::invalid_config(format!(
                "DEVREV_API_VERSION must be 'public' or 'beta', got {:?}",
                other
            ))),
        }
    }

    /// Lower-case name as used in configuration.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::Public => "public",
            ApiVersion::Beta => "beta",
        }
    }
}

/// Configuration for connecting to the DevRev API.
///
/// The API token is stored but never logged or exposed in error messages.
#[derive(Clone)]
pub struct Config {
    /// Base URL without trailing slash (e.g., `https://api.devrev.ai`).
    pub base_url: String,

    /// Personal access token or service account token.
    /// This value must never be logged or included in error messages.
    pub api_token: String,

    /// Which API surface to use.
    pub api_version: ApiVersion,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Total attempts for retryable failures (1 disables retries).
    pub max_retries: u32,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("api_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DEVREV_API_TOKEN` (required)
    /// - `DEVREV_BASE_URL` (default `https://api.devrev.ai`)
    /// - `DEVREV_API_VERSION`: `public` or `beta` (default `public`)
    /// - `DEVREV_TIMEOUT`: seconds (default 30)
    /// - `DEVREV_MAX_RETRIES` (default 3)
    ///
    /// # Errors
    ///
    /// Returns `DevRevError::Config` if the token is missing or any value
    /// fails validation.
    pub fn from_env() -> Result<Self, DevRevError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DevRevError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_token = non_empty(&lookup, "DEVREV_API_TOKEN")
            .ok_or_else(|| DevRevError::missing_env("DEVREV_API_TOKEN"))?;
        Self::validate_api_token(&api_token)?;

        let base_url = non_empty(&lookup, "DEVREV_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Self::validate_base_url(base_url)?;

        let api_version = match non_empty(&lookup, "DEVREV_API_VERSION") {
            Some(v) => ApiVersion::parse(&v)?,
            None => ApiVersion::default(),
        };

        let timeout_secs: u64 = parse_or(&lookup, "DEVREV_TIMEOUT", 30)?;
        if timeout_secs == 0 {
            return Err(DevRevError::invalid_config(
                "DEVREV_TIMEOUT must be greater than zero",
            ));
        }
        let max_retries: u32 = parse_or(&lookup, "DEVREV_MAX_RETRIES", 3)?;

        Ok(Config {
            base_url,
            api_token,
            api_version,
            timeout: Duration::from_secs(timeout_secs),
            max_retries: max_retries.max(1),
        })
    }

    /// Validates and normalizes the base URL.
    fn validate_base_url(url: String) -> Result<String, DevRevError> {
        let url = url.trim().trim_end_matches('/').to_string();

        let parsed = Url::parse(&url).map_err(|_| {
            DevRevError::invalid_config("DEVREV_BASE_URL is not a valid URL")
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(DevRevError::invalid_config(
                "DEVREV_BASE_URL must start with http:// or https://",
            ));
        }

        Ok(url)
    }

    /// Rejects obvious placeholder tokens copied from documentation.
    fn validate_api_token(token: &str) -> Result<(), DevRevError> {
        let lower = token.to_lowercase();
        let placeholder_patterns = ["your_api_token", "your-token", "placeholder", "changeme"];

        if placeholder_patterns.iter().any(|p| lower.contains(p)) {
            return Err(DevRevError::invalid_config(
                "DEVREV_API_TOKEN appears to be a placeholder value",
            ));
        }
        Ok(())
    }
}

/// How the MCP server is exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// JSON-RPC over stdin/stdout.
    #[default]
    Stdio,
    /// MCP streamable HTTP, behind the auth gate and rate limiter.
    StreamableHttp,
}

impl Transport {
    fn parse(value: &str) -> Result<Self, DevRevError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(Transport::Stdio),
            "streamable-http" | "http" => Ok(Transport::StreamableHttp),
            other => Err(DevRevError::invalid_config(format!(
                "MCP_TRANSPORT must be 'stdio' or 'streamable-http', got {:?}",
                other
            ))),
        }
    }

    /// Name as used in configuration.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Stdio => "stdio",
            Transport::StreamableHttp => "streamable-http",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// MCP server configuration (`MCP_*` variables).
#[derive(Clone)]
pub struct ServerConfig {
    /// Display name reported to MCP clients and on `/health`.
    pub server_name: String,
    /// Default tracing level when `RUST_LOG` is unset. Always one of
    /// `trace`, `debug`, `info`, `warn` or `error`.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
    /// Whether beta-only tools (incidents, search) are served.
    pub enable_beta_tools: bool,
    /// Whether create/update tools are served.
    pub enable_destructive_tools: bool,
    /// Page-size bounds for list tools.
    pub page_limits: PageLimits,
    /// Selected transport.
    pub transport: Transport,
    /// Bind host for HTTP transports.
    pub host: String,
    /// Bind port for HTTP transports.
    pub port: u16,
    /// Shared Bearer secret. `None` disables the auth gate.
    pub auth_token: Option<String>,
    /// Requests per minute per client. 0 disables rate limiting.
    pub rate_limit_rpm: u32,
    /// Paths exempt from auth and rate limiting.
    pub bypass_paths: Vec<String>,
    /// Permit serving without an auth token on a non-loopback host.
    pub allow_unauthenticated: bool,
    /// Whether audit events are emitted.
    pub audit_log_enabled: bool,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("server_name", &self.server_name)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("enable_beta_tools", &self.enable_beta_tools)
            .field("enable_destructive_tools", &self.enable_destructive_tools)
            .field("page_limits", &self.page_limits)
            .field("transport", &self.transport)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("rate_limit_rpm", &self.rate_limit_rpm)
            .field("bypass_paths", &self.bypass_paths)
            .field("allow_unauthenticated", &self.allow_unauthenticated)
            .field("audit_log_enabled", &self.audit_log_enabled)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_name: "DevRev MCP Server".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            enable_beta_tools: true,
            enable_destructive_tools: true,
            page_limits: PageLimits::default(),
            transport: Transport::Stdio,
            host: "127.0.0.1".to_string(),
            port: 8080,
            auth_token: None,
            rate_limit_rpm: 120,
            bypass_paths: vec!["/health".to_string()],
            allow_unauthenticated: false,
            audit_log_enabled: true,
        }
    }
}

impl ServerConfig {
    /// Loads server configuration from `MCP_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `DevRevError::Config` for unparseable values, and for an HTTP
    /// transport bound to a non-loopback host without `MCP_AUTH_TOKEN`
    /// (unless `MCP_ALLOW_UNAUTHENTICATED=true`).
    pub fn from_env() -> Result<Self, DevRevError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads server configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DevRevError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let log_format = match non_empty(&lookup, "MCP_LOG_FORMAT").as_deref() {
            None => defaults.log_format,
            Some(v) if v.eq_ignore_ascii_case("text") => LogFormat::Text,
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            Some(v) => {
                return Err(DevRevError::invalid_config(format!(
                    "MCP_LOG_FORMAT must be 'text' or 'json', got {:?}",
                    v
                )))
            }
        };

        let transport = match non_empty(&lookup, "MCP_TRANSPORT") {
            Some(v) => Transport::parse(&v)?,
            None => defaults.transport,
        };

        let max_page_size: u32 = parse_or(
            &lookup,
            "MCP_MAX_PAGE_SIZE",
            defaults.page_limits.max_page_size,
        )?;
        if max_page_size == 0 {
            return Err(DevRevError::invalid_config(
                "MCP_MAX_PAGE_SIZE must be greater than zero",
            ));
        }
        let default_page_size: u32 = parse_or(
            &lookup,
            "MCP_DEFAULT_PAGE_SIZE",
            defaults.page_limits.default_page_size,
        )?;

        let bypass_paths = match non_empty(&lookup, "MCP_BYPASS_PATHS") {
            Some(v) => v
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
            None => defaults.bypass_paths,
        };

        let config = ServerConfig {
            server_name: non_empty(&lookup, "MCP_SERVER_NAME").unwrap_or(defaults.server_name),
            log_level: match non_empty(&lookup, "MCP_LOG_LEVEL") {
                Some(v) => normalize_log_level(&v)?,
                None => defaults.log_level,
            },
            log_format,
            enable_beta_tools: parse_bool_or(&lookup, "MCP_ENABLE_BETA_TOOLS", true)?,
            enable_destructive_tools: parse_bool_or(&lookup, "MCP_ENABLE_DESTRUCTIVE_TOOLS", true)?,
            page_limits: PageLimits {
                default_page_size: default_page_size.clamp(1, max_page_size),
                max_page_size,
            },
            transport,
            host: non_empty(&lookup, "MCP_HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "MCP_PORT", defaults.port)?,
            auth_token: non_empty(&lookup, "MCP_AUTH_TOKEN"),
            rate_limit_rpm: parse_or(&lookup, "MCP_RATE_LIMIT_RPM", defaults.rate_limit_rpm)?,
            bypass_paths,
            allow_unauthenticated: parse_bool_or(&lookup, "MCP_ALLOW_UNAUTHENTICATED", false)?,
            audit_log_enabled: parse_bool_or(&lookup, "MCP_AUDIT_LOG_ENABLED", true)?,
        };

        config.validate_exposure()?;
        Ok(config)
    }

    /// True when the bind host only accepts local connections.
    #[must_use]
    pub fn is_loopback_host(&self) -> bool {
        if self.host.eq_ignore_ascii_case("localhost") {
            return true;
        }
        self.host
            .parse::<IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false)
    }

    /// True when HTTP is served on a reachable address with no bearer token.
    #[must_use]
    pub fn serves_unauthenticated_publicly(&self) -> bool {
        self.transport != Transport::Stdio
            && self.auth_token.is_none()
            && !self.is_loopback_host()
    }

    /// Refuses an unauthenticated HTTP server on a reachable address.
    ///
    /// Runs before tracing is initialized, so the override is logged by the
    /// transport at startup rather than here.
    fn validate_exposure(&self) -> Result<(), DevRevError> {
        if !self.serves_unauthenticated_publicly() || self.allow_unauthenticated {
            return Ok(());
        }
        Err(DevRevError::invalid_config(format!(
            "MCP_AUTH_TOKEN is required when binding {} to non-loopback host {} \
             (set MCP_ALLOW_UNAUTHENTICATED=true to override)",
            self.transport.as_str(),
            self.host
        )))
    }
}

/// Maps `MCP_LOG_LEVEL` onto a `tracing` level name.
///
/// `WARNING` and `CRITICAL` are accepted for compatibility with
/// Python-style level names.
fn normalize_log_level(value: &str) -> Result<String, DevRevError> {
    let level = match value.to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" | "critical" => "error",
        _ => {
            return Err(DevRevError::invalid_config(format!(
                "MCP_LOG_LEVEL must be one of DEBUG, INFO, WARNING, ERROR, got {:?}",
                value
            )))
        }
    };
    Ok(level.to_string())
}

/// Returns the trimmed variable value, treating blank as unset.
fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, DevRevError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match non_empty(lookup, name) {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| {
            DevRevError::invalid_config(format!("{} has an invalid value: {:?}", name, v))
        }),
    }
}

fn parse_bool_or<F>(lookup: &F, name: &str, default: bool) -> Result<bool, DevRevError>
where
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup, name) {
        None => Ok(default),
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(DevRevError::invalid_config(format!(
                "{} must be true or false, got {:?}",
                name, v
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_config_requires_token() {
        let result = Config::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(DevRevError::Config(msg)) if msg.contains("DEVREV_API_TOKEN")));
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup_from(&[("DEVREV_API_TOKEN", "abc123")])).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api_version, ApiVersion::Public);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_config_beta_and_trailing_slash() {
        let config = Config::from_lookup(lookup_from(&[
            ("DEVREV_API_TOKEN", "abc123"),
            ("DEVREV_BASE_URL", "https://api.example.com/"),
            ("DEVREV_API_VERSION", "BETA"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.api_version, ApiVersion::Beta);
    }

    #[test]
    fn test_validate_base_url_requires_scheme() {
        assert!(Config::validate_base_url("api.devrev.ai".to_string()).is_err());
        assert!(Config::validate_base_url("ftp://api.devrev.ai".to_string()).is_err());
    }

    #[test]
    fn test_validate_api_token_rejects_placeholder() {
        assert!(Config::validate_api_token("your_api_token_here").is_err());
        assert!(Config::validate_api_token("eyJhbGciOi.real").is_ok());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = Config::from_lookup(lookup_from(&[("DEVREV_API_TOKEN", "tok-secret-9")])).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("tok-secret-9"));
    }

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.server_name, "DevRev MCP Server");
        assert_eq!(config.log_level, "info");
        assert!(config.enable_beta_tools);
        assert!(config.enable_destructive_tools);
        assert_eq!(config.page_limits.default_page_size, 25);
        assert_eq!(config.page_limits.max_page_size, 100);
        assert_eq!(config.transport, Transport::Stdio);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert!(config.auth_token.is_none());
        assert_eq!(config.rate_limit_rpm, 120);
        assert_eq!(config.bypass_paths, vec!["/health".to_string()]);
    }

    #[test]
    fn test_server_config_overrides() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("MCP_DEFAULT_PAGE_SIZE", "50"),
            ("MCP_MAX_PAGE_SIZE", "200"),
            ("MCP_ENABLE_BETA_TOOLS", "false"),
            ("MCP_RATE_LIMIT_RPM", "60"),
            ("MCP_BYPASS_PATHS", "/health, /ready"),
            ("MCP_LOG_FORMAT", "json"),
        ]))
        .unwrap();
        assert_eq!(config.page_limits.default_page_size, 50);
        assert_eq!(config.page_limits.max_page_size, 200);
        assert!(!config.enable_beta_tools);
        assert_eq!(config.rate_limit_rpm, 60);
        assert_eq!(config.bypass_paths, vec!["/health".to_string(), "/ready".to_string()]);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_default_page_size_clamped_to_max() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("MCP_DEFAULT_PAGE_SIZE", "500"),
            ("MCP_MAX_PAGE_SIZE", "100"),
        ]))
        .unwrap();
        assert_eq!(config.page_limits.default_page_size, 100);
    }

    #[test]
    fn test_rejects_invalid_bool() {
        let result = ServerConfig::from_lookup(lookup_from(&[("MCP_ENABLE_BETA_TOOLS", "maybe")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_public_http_without_token_is_rejected() {
        let result = ServerConfig::from_lookup(lookup_from(&[
            ("MCP_TRANSPORT", "streamable-http"),
            ("MCP_HOST", "0.0.0.0"),
        ]));
        assert!(matches!(result, Err(DevRevError::Config(msg)) if msg.contains("MCP_AUTH_TOKEN")));
    }

    #[test]
    fn test_public_http_with_override_or_token_is_allowed() {
        let overridden = ServerConfig::from_lookup(lookup_from(&[
            ("MCP_TRANSPORT", "streamable-http"),
            ("MCP_HOST", "0.0.0.0"),
            ("MCP_ALLOW_UNAUTHENTICATED", "true"),
        ]));
        assert!(overridden.is_ok());

        let with_token = ServerConfig::from_lookup(lookup_from(&[
            ("MCP_TRANSPORT", "streamable-http"),
            ("MCP_HOST", "0.0.0.0"),
            ("MCP_AUTH_TOKEN", "s3cret"),
        ]))
        .unwrap();
        assert_eq!(with_token.auth_token.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_loopback_http_without_token_is_allowed() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("MCP_TRANSPORT", "streamable-http"),
            ("MCP_HOST", "localhost"),
        ]))
        .unwrap();
        assert!(config.is_loopback_host());
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_log_level_is_normalized() {
        for (raw, expected) in [
            ("DEBUG", "debug"),
            ("Info", "info"),
            ("WARNING", "warn"),
            ("warn", "warn"),
            ("CRITICAL", "error"),
            ("ERROR", "error"),
        ] {
            let config =
                ServerConfig::from_lookup(lookup_from(&[("MCP_LOG_LEVEL", raw)])).unwrap();
            assert_eq!(config.log_level, expected, "MCP_LOG_LEVEL={}", raw);
        }
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        let result = ServerConfig::from_lookup(lookup_from(&[("MCP_LOG_LEVEL", "verbose")]));
        assert!(matches!(result, Err(DevRevError::Config(msg)) if msg.contains("MCP_LOG_LEVEL")));
    }

    #[test]
    fn test_unauthenticated_public_exposure_is_reported() {
        let overridden = ServerConfig::from_lookup(lookup_from(&[
            ("MCP_TRANSPORT", "streamable-http"),
            ("MCP_HOST", "0.0.0.0"),
            ("MCP_ALLOW_UNAUTHENTICATED", "true"),
        ]))
        .unwrap();
        assert!(overridden.serves_unauthenticated_publicly());

        let loopback = ServerConfig::from_lookup(lookup_from(&[
            ("MCP_TRANSPORT", "streamable-http"),
            ("MCP_HOST", "127.0.0.1"),
        ]))
        .unwrap();
        assert!(!loopback.serves_unauthenticated_publicly());

        let stdio = ServerConfig::from_lookup(lookup_from(&[("MCP_HOST", "0.0.0.0")])).unwrap();
        assert!(!stdio.serves_unauthenticated_publicly());
    }
}
