//! mkdir tool

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::Path;
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolError, ToolResult};

use super::parse_params;

fn default_recursive() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct Params {
    dir: String,
    #[serde(default = "default_recursive")]
    recursive: bool,
}

/// Create a directory, with parents by default
pub struct MkdirTool;

#[async_trait]
impl Tool for MkdirTool {
    fn name(&self) -> &'static str {
        "mkdir"
    }

    fn description(&self) -> &'static str {
        "Create a directory (recursively)"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "dir": {
                    "type": "string",
                    "description": "The directory to create"
                },
                "recursive": {
                    "type": "boolean",
                    "default": true
                }
            },
            "required": ["dir"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "MkdirTool::execute: called");
        let params: Params = match parse_params(input) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(e),
        };
        let context = json!({ "dir": params.dir });

        let action = format!("Creating directory \"{}\"", params.dir);
        let path = match ctx.authorize_path(Path::new(&params.dir), &action).await {
            Ok(p) => p,
            Err(e) => return ToolResult::error_with(context, e),
        };

        let created = if params.recursive {
            tokio::fs::create_dir_all(&path).await
        } else {
            tokio::fs::create_dir(&path).await
        };
        if let Err(e) = created {
            debug!(%e, "MkdirTool::execute: create failed");
            return ToolResult::error_with(context, ToolError::from_io(&path, e));
        }
        ToolResult::success(context)
    }
}
