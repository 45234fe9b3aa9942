//! Tool system for the MCP server
//!
//! Every tool is a thin adapter: it pulls typed arguments out of the JSON
//! input, calls one operation on the shared `MoorClient`, and wraps the reply
//! (or the structured error) in a `ToolResult`.

pub mod args;
mod context;
mod error;
mod registry;
mod traits;

pub mod builtin;

pub use context::ToolContext;
pub use error::ToolError;
pub use registry::{ToolDefinition, ToolRegistry, ToolRegistryBuilder};
pub use traits::{Tool, ToolResult};
