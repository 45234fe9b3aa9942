//! moor-mcp - MCP stdio server for mooR
//!
//! CLI entry point: serve MCP, list tools, or call a single tool.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result, eyre};
use serde_json::Value;
use tracing::info;

use moormcp::cli::{Cli, Command};
use moormcp::config::Config;
use moormcp::mcp::McpServer;
use moormcp::tools::{ToolContext, ToolRegistry};
use moorrest::MoorClient;

fn setup_logging(level: &str) -> Result<()> {
    // stdout carries the protocol, so logs go to a file
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("moor-mcp")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let level: tracing::Level = level
        .parse()
        .map_err(|_| eyre!("Invalid log level '{}': expected ERROR, WARN, INFO, DEBUG or TRACE", level))?;
    let log_file = fs::File::create(log_dir.join("moor-mcp.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    setup_logging(&cli.effective_log_level(config.log_level.as_deref())).context("Failed to setup logging")?;

    info!(base_url = %config.moor.base_url, "moor-mcp loaded config");

    let client = MoorClient::new(config.moor.to_client_config()).context("Failed to build HTTP client")?;
    let ctx = ToolContext::new(Arc::new(client));
    let registry = ToolRegistry::standard();

    match cli.command {
        Some(Command::Serve) | None => cmd_serve(registry, ctx).await,
        Some(Command::Tools) => cmd_tools(&registry),
        Some(Command::Call { tool, args }) => cmd_call(&registry, &ctx, &tool, &args).await,
    }
}

/// Run the MCP server on stdin/stdout until stdin closes
async fn cmd_serve(registry: ToolRegistry, ctx: ToolContext) -> Result<()> {
    info!(tools = registry.len(), "Starting MCP server on stdio");
    let server = Arc::new(McpServer::new(registry, ctx));
    server.serve(tokio::io::stdin(), tokio::io::stdout()).await
}

fn cmd_tools(registry: &ToolRegistry) -> Result<()> {
    for definition in registry.definitions() {
        println!("{}", definition.name.cyan().bold());
        println!("    {}", definition.description);
    }
    Ok(())
}

/// Execute one tool and print its result
async fn cmd_call(registry: &ToolRegistry, ctx: &ToolContext, tool: &str, args: &str) -> Result<()> {
    let input: Value = serde_json::from_str(args).context("Tool arguments must be a JSON object")?;
    if !input.is_object() {
        return Err(eyre!("Tool arguments must be a JSON object, got: {}", args));
    }

    let result = registry.execute(tool, input, ctx).await;
    println!("{}", result.text());

    if result.is_error {
        return Err(eyre!("Tool '{}' failed", tool));
    }
    Ok(())
}
