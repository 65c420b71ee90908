//! delete_file tool

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::Path;
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolError, ToolResult};

use super::parse_params;

#[derive(Debug, Deserialize)]
struct Params {
    file: String,
}

/// Delete a single file
pub struct DeleteFileTool;

#[async_trait]
impl Tool for DeleteFileTool {
    fn name(&self) -> &'static str {
        "delete_file"
    }

    fn description(&self) -> &'static str {
        "Delete a file"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file": {
                    "type": "string",
                    "description": "The file to delete"
                }
            },
            "required": ["file"]
        })
    }

    fn render(&self, result: &ToolResult) -> Option<String> {
        result.payload["file"].as_str().map(|file| format!("Deleted file: {}", file))
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "DeleteFileTool::execute: called");
        let params: Params = match parse_params(input) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(e),
        };
        let context = json!({ "file": params.file });

        let action = format!("Deleting \"{}\"", params.file);
        let path = match ctx.authorize_path(Path::new(&params.file), &action).await {
            Ok(p) => p,
            Err(e) => return ToolResult::error_with(context, e),
        };

        if let Err(e) = tokio::fs::remove_file(&path).await {
            debug!(%e, "DeleteFileTool::execute: remove failed");
            return ToolResult::error_with(context, ToolError::from_io(&path, e));
        }
        ToolResult::success(context)
    }
}
