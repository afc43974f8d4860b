//! Model Context Protocol (MCP) server
//!
//! Exposes the documentation search and recommendation tools over a
//! stdio JSON-RPC 2.0 transport.

mod server;
mod tools;
mod types;

pub use server::McpServer;
pub use types::{McpError, McpRequest, McpResponse};
