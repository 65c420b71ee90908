//! write_file tool - create or overwrite a file

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::Path;
use tracing::debug;

use crate::text::Encoding;
use crate::tools::{Tool, ToolContext, ToolError, ToolResult};

use super::parse_params;

#[derive(Debug, Deserialize)]
struct Params {
    file: String,
    content: String,
    encoding: Option<String>,
}

/// Write content to a file (overwrites if exists)
pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &'static str {
        "write_file"
    }

    fn description(&self) -> &'static str {
        "Write content to a file (overwrites if exists)"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file": {
                    "type": "string",
                    "description": "The file to write to"
                },
                "content": {
                    "type": "string",
                    "description": "The content to write"
                },
                "encoding": {
                    "type": "string",
                    "default": "utf8",
                    "description": "utf8 or latin1"
                }
            },
            "required": ["file", "content"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "WriteFileTool::execute: called");
        let params: Params = match parse_params(input) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(e),
        };
        let context = json!({ "file": params.file });

        let action = format!("Writing \"{}\"", params.file);
        let path = match ctx.authorize_path(Path::new(&params.file), &action).await {
            Ok(p) => p,
            Err(e) => return ToolResult::error_with(context, e),
        };

        let encoding = Encoding::from_name(params.encoding.as_deref());
        if let Err(e) = tokio::fs::write(&path, encoding.encode(&params.content)).await {
            debug!(%e, "WriteFileTool::execute: write failed");
            return ToolResult::error_with(context, ToolError::from_io(&path, e));
        }

        ToolResult::success(json!({
            "file": params.file,
            "contentLength": params.content.chars().count(),
        }))
    }
}
