//! cd tool - change the engine's working directory

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::Path;
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolError, ToolResult};

use super::parse_params;

#[derive(Debug, Deserialize)]
struct Params {
    dir: String,
}

/// Change the working directory used to resolve later paths
///
/// Always asks for confirmation, even for subdirectories.
pub struct CdTool;

#[async_trait]
impl Tool for CdTool {
    fn name(&self) -> &'static str {
        "cd"
    }

    fn description(&self) -> &'static str {
        "Change the current working directory (cwd). Requires confirmation."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "dir": {
                    "type": "string",
                    "description": "The directory to change to"
                }
            },
            "required": ["dir"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "CdTool::execute: called");
        let params: Params = match parse_params(input) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(e),
        };

        let resolved = ctx.resolve(Path::new(&params.dir)).await;
        let context = json!({ "dir": resolved });

        match tokio::fs::metadata(&resolved).await {
            Ok(m) if m.is_dir() => {}
            Ok(_) => {
                return ToolResult::error_with(
                    context,
                    ToolError::invalid(format!("Target path is not a directory: {}", resolved.display())),
                );
            }
            Err(e) => return ToolResult::error_with(context, ToolError::from_io(&resolved, e)),
        }

        let prompt = format!("Allow agent to change directory to \"{}\"?", resolved.display());
        if !ctx.gate.confirm(&prompt).await {
            return ToolResult::error_with(
                context,
                ToolError::NotConfirmed {
                    action: format!("Changing directory to \"{}\"", resolved.display()),
                },
            );
        }

        ctx.set_cwd(resolved.clone()).await;
        ToolResult::success(json!({
            "dir": resolved,
            "cwd": ctx.cwd().await,
        }))
    }
}
