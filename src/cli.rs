//! Command-line interface for jscad-preview.
//!
//! Without a subcommand the binary runs as a stdio host: editor commands
//! arrive on stdin and panel events leave on stdout, one JSON object per
//! line. Subcommands are one-shot helpers.

use clap::{Parser, Subcommand};
use jscad_preview_config::LogLevel;
use std::path::PathBuf;

/// jscad-preview - Live preview host for OpenJSCAD modeling scripts
#[derive(Parser, Debug)]
#[command(name = "jscad-preview")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// File or directory to open a preview for on startup
    #[arg(value_name = "TARGET")]
    pub target: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", value_parser = parse_log_level, global = true)]
    pub log_level: Option<LogLevel>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a target once and print the tree the viewer would receive
    Scan {
        /// File or directory to scan
        target: String,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Print the preview panel's HTML document
    Html {
        /// Document title
        #[arg(long)]
        title: Option<String>,
    },
    /// Write the default config file
    InitConfig {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },
}

/// What the binary should do after argument parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Serve { target: Option<String> },
    Scan { target: String, pretty: bool },
    Html { title: Option<String> },
    InitConfig { force: bool },
}

/// Options shared by every action
#[derive(Clone, Debug, Default)]
pub struct RuntimeOptions {
    /// Explicit config file path
    pub config: Option<PathBuf>,
    /// Log level override; wins over RUST_LOG and the config file
    pub log_level: Option<LogLevel>,
}

/// Result of CLI processing
pub struct CliResult {
    pub action: Action,
    pub options: RuntimeOptions,
}

fn parse_log_level(value: &str) -> Result<LogLevel, String> {
    let lower = value.trim().to_ascii_lowercase();
    LogLevel::all()
        .iter()
        .copied()
        .find(|level| level.name() == lower)
        .ok_or_else(|| {
            let names: Vec<&str> = LogLevel::all().iter().map(|l| l.name()).collect();
            format!("invalid log level '{}', expected one of: {}", value, names.join(", "))
        })
}

impl Cli {
    pub fn into_result(self) -> CliResult {
        let action = match self.command {
            Some(Commands::Scan { target, pretty }) => Action::Scan { target, pretty },
            Some(Commands::Html { title }) => Action::Html { title },
            Some(Commands::InitConfig { force }) => Action::InitConfig { force },
            None => Action::Serve {
                target: self.target,
            },
        };
        CliResult {
            action,
            options: RuntimeOptions {
                config: self.config,
                log_level: self.log_level,
            },
        }
    }
}

/// Parse process arguments
pub fn process_cli() -> CliResult {
    Cli::parse().into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliResult {
        Cli::try_parse_from(args).unwrap().into_result()
    }

    #[test]
    fn test_default_is_serve() {
        let result = parse(&["jscad-preview"]);
        assert_eq!(result.action, Action::Serve { target: None });
        assert!(result.options.log_level.is_none());
    }

    #[test]
    fn test_serve_with_target_and_options() {
        let result = parse(&[
            "jscad-preview",
            "model/main.js",
            "--log-level",
            "DEBUG",
            "--config",
            "/tmp/c.yaml",
        ]);
        assert_eq!(
            result.action,
            Action::Serve {
                target: Some("model/main.js".to_string())
            }
        );
        assert_eq!(result.options.log_level, Some(LogLevel::Debug));
        assert_eq!(result.options.config, Some(PathBuf::from("/tmp/c.yaml")));
    }

    #[test]
    fn test_subcommands() {
        assert_eq!(
            parse(&["jscad-preview", "scan", "dir", "--pretty"]).action,
            Action::Scan {
                target: "dir".to_string(),
                pretty: true
            }
        );
        assert_eq!(
            parse(&["jscad-preview", "init-config", "-f"]).action,
            Action::InitConfig { force: true }
        );
        assert_eq!(
            parse(&["jscad-preview", "html"]).action,
            Action::Html { title: None }
        );
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        assert!(Cli::try_parse_from(["jscad-preview", "--log-level", "loud"]).is_err());
    }
}
