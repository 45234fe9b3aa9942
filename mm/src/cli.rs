//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// moor-mcp - MCP tools for building in mooR worlds
#[derive(Parser)]
#[command(
    name = "mm",
    about = "MCP stdio server exposing a mooR server's REST API as tools",
    version = env!("CARGO_PKG_VERSION"),
    after_help = "Logs are written to: ~/.local/share/moor-mcp/logs/moor-mcp.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (overrides the config file)
    #[arg(short, long, global = true, value_name = "LEVEL", help = "Log level: ERROR, WARN, INFO, DEBUG or TRACE")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Serve MCP over stdin/stdout (default)
    Serve,

    /// List the available tools
    Tools,

    /// Invoke a single tool and print its result
    Call {
        /// Tool name, e.g. moor_eval_expr
        #[arg(value_name = "TOOL")]
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(value_name = "ARGS_JSON", default_value = "{}")]
        args: String,
    },
}

impl Cli {
    /// Level to log at: CLI flag, then config, then INFO
    pub fn effective_log_level(&self, configured: Option<&str>) -> String {
        self.log_level
            .as_deref()
            .or(configured)
            .unwrap_or("INFO")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::parse_from(["mm"]);
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_call_with_args() {
        let cli = Cli::parse_from(["mm", "call", "moor_eval_expr", r#"{"expression":"1"}"#]);
        assert_eq!(
            cli.command,
            Some(Command::Call {
                tool: "moor_eval_expr".to_string(),
                args: r#"{"expression":"1"}"#.to_string(),
            })
        );
    }

    #[test]
    fn test_call_args_default_to_empty_object() {
        let cli = Cli::parse_from(["mm", "call", "moor_list_presentations"]);
        assert!(matches!(cli.command, Some(Command::Call { ref args, .. }) if args == "{}"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["mm", "tools", "--config", "/tmp/x.yml", "--log-level", "debug"]);
        assert_eq!(cli.command, Some(Command::Tools));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/x.yml")));
    }

    #[test]
    fn test_log_level_priority() {
        let cli = Cli::parse_from(["mm", "--log-level", "TRACE"]);
        assert_eq!(cli.effective_log_level(Some("DEBUG")), "TRACE");

        let cli = Cli::parse_from(["mm"]);
        assert_eq!(cli.effective_log_level(Some("DEBUG")), "DEBUG");
        assert_eq!(cli.effective_log_level(None), "INFO");
    }
}
