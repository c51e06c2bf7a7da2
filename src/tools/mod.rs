//! MCP tool inputs for the DevRev server.
//!
//! This module contains the input types and sanitization helpers for the
//! tools and prompts exposed by [`crate::server::DevRevServer`].

mod inputs;

pub use inputs::*;
