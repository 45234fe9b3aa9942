//! moormcp - MCP tools for mooR world building
//!
//! Wires the `moorrest` client into an MCP stdio server:
//!
//! - [`config`] loads YAML settings and `MOOR_*` overrides
//! - [`tools`] holds the tool registry and the `moor_*` tools
//! - [`mcp`] runs the JSON-RPC loop over stdin/stdout

pub mod cli;
pub mod config;
pub mod mcp;
pub mod tools;
