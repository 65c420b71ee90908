//! TurnObserver - display hooks for a running turn

use colored::Colorize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::tools::{ToolInvocation, ToolResult};

/// Receives the narrative of a turn as it happens
///
/// All methods default to doing nothing.
pub trait TurnObserver: Send + Sync {
    fn on_text(&self, _text: &str) {}

    /// `summary` is the call's arguments with hidden args removed
    fn on_tool_call(&self, _call: &ToolInvocation, _summary: &Value) {}

    fn on_tool_result(&self, _call: &ToolInvocation, _result: &ToolResult, _rendered: Option<&str>) {}

    fn on_model_error(&self, _message: &str) {}
}

/// Observer that writes the narrative to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl TurnObserver for LogObserver {
    fn on_text(&self, text: &str) {
        debug!(%text, "model text");
    }

    fn on_tool_call(&self, call: &ToolInvocation, summary: &Value) {
        info!(id = %call.id, name = %call.name, args = %summary, "tool call");
    }

    fn on_tool_result(&self, call: &ToolInvocation, result: &ToolResult, rendered: Option<&str>) {
        match result.error_message() {
            Some(error) => info!(id = %call.id, name = %call.name, %error, "tool failed"),
            None => info!(id = %call.id, name = %call.name, rendered = rendered.unwrap_or(""), "tool finished"),
        }
    }

    fn on_model_error(&self, message: &str) {
        warn!(%message, "model error");
    }
}

/// Observer that prints the narrative to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleObserver;

impl TurnObserver for ConsoleObserver {
    fn on_text(&self, text: &str) {
        print!("{}", text);
    }

    fn on_tool_call(&self, call: &ToolInvocation, summary: &Value) {
        println!("\n{} {}", format!("▶ {}", call.name).cyan().bold(), summary.to_string().dimmed());
    }

    fn on_tool_result(&self, _call: &ToolInvocation, result: &ToolResult, rendered: Option<&str>) {
        match (result.error_message(), rendered) {
            (Some(error), _) => println!("{} {}", "✗".red(), error.red()),
            (None, Some(line)) => println!("{} {}", "✓".green(), line),
            (None, None) if result.is_error => println!("{} {}", "✗".red(), result.content().dimmed()),
            (None, None) => println!("{} {}", "✓".green(), result.content().dimmed()),
        }
    }

    fn on_model_error(&self, message: &str) {
        println!("\n{} {}", "model error:".red().bold(), message);
    }
}
