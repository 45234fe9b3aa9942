//! Model Context Protocol server
//!
//! Speaks JSON-RPC 2.0 over stdin/stdout and exposes the tool registry.

pub mod messages;
mod server;

pub use server::{McpServer, PROTOCOL_VERSION, SERVER_NAME};
