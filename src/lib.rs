//! # devrev-mcp
//!
//! An MCP (Model Context Protocol) server for the DevRev platform, with a
//! request-governance layer for its HTTP transport.
//!
//! It exposes DevRev work items, accounts, articles, parts, users,
//! conversations, incidents and hybrid search as MCP tools and resources,
//! plus a handful of support-workflow prompts.
//!
//! ## Features
//!
//! - **Read operations**: list and fetch every supported object type, with
//!   cursor pagination clamped to configured page sizes
//! - **Write operations**: create and update work items (can be disabled)
//! - **Beta API**: incidents and hybrid search, gated on `DEVREV_API_VERSION=beta`
//! - **Governance**: Bearer-token auth gate, per-client token-bucket rate
//!   limiting, `/health`, and structured audit events
//! - **Error handling**: a closed error taxonomy rendered into one readable
//!   message per failure; transient failures are retried with backoff
//! - **Security**: the API token and auth token are never logged or echoed
//!
//! ## Architecture
//!
//! - [`config`] - Configuration loading from environment variables
//! - [`error`] - Error taxonomy, classification and formatting
//! - [`pagination`] - Page-size clamping and the paginated envelope
//! - [`client`] - HTTP client for the DevRev API
//! - [`models`] - Typed DevRev objects and request bodies
//! - [`tools`] - Tool and prompt input structs
//! - [`server`] - MCP server implementation with tool, prompt and resource routing
//! - [`middleware`] - Auth gate, rate limiter, health and audit
//! - [`transport`] - stdio and streamable-HTTP serving
//!
//! ## Usage
//!
//! ```bash
//! export DEVREV_API_TOKEN=...
//!
//! # stdio, for desktop MCP clients
//! ./devrev-mcp
//!
//! # streamable HTTP on 127.0.0.1:8080/mcp
//! MCP_TRANSPORT=streamable-http MCP_AUTH_TOKEN=... ./devrev-mcp
//! ```
//!
//! ## Example
//!
//! Using the [`DevRevClient`](client::DevRevClient) directly:
//!
//! ```ignore
//! use devrev_mcp::client::DevRevClient;
//! use devrev_mcp::config::Config;
//! use devrev_mcp::models::{ListRequest, Work};
//!
//! async fn example() -> Result<(), devrev_mcp::error::DevRevError> {
//!     let config = Config::from_env()?;
//!     let client = DevRevClient::new(&config)?;
//!
//!     let page = client
//!         .list::<Work>(&ListRequest::new().with_limit(10))
//!         .await?;
//!     for work in &page.items {
//!         println!("{}: {}", work.id, work.title.as_deref().unwrap_or(""));
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod server;
pub mod tools;
pub mod transport;
