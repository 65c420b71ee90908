//! CLI command definitions and subcommands

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// termagent - tool execution engine for a terminal AI agent
#[derive(Parser)]
#[command(
    name = "ta",
    about = "Tool execution engine for a terminal AI agent",
    version = env!("CARGO_PKG_VERSION"),
    after_help = "Logs are written to: ~/.local/share/termagent/logs/termagent.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable debug logging (including full tool payloads)
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Approve every confirmation prompt automatically
    #[arg(long, global = true)]
    pub yolo: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Print the tool catalog
    Tools {
        /// Only the read-only toolkit
        #[arg(long)]
        read_only: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Run one tool and print its JSON result
    Exec {
        /// Tool name (e.g. read_file)
        tool: String,

        /// Arguments as a JSON object
        #[arg(default_value = "{}")]
        args: String,
    },

    /// Replay recorded model events through the dispatch loop
    Replay {
        /// JSON file holding an array of model events
        script: PathBuf,

        /// Override the configured step limit
        #[arg(short, long)]
        max_steps: Option<u32>,
    },
}

/// Output format for catalog listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Path of the log file written by the binary
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("termagent")
        .join("logs")
        .join("termagent.log")
}
