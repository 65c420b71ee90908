//! stat_file tool - file or directory metadata

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::Path;
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolError, ToolResult};

use super::parse_params;

#[derive(Debug, Deserialize)]
struct Params {
    path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Stat {
    path: String,
    is_file: bool,
    is_directory: bool,
    size: u64,
    mtime: Option<String>,
}

/// Get file or directory stats
pub struct StatFileTool;

#[async_trait]
impl Tool for StatFileTool {
    fn name(&self) -> &'static str {
        "stat_file"
    }

    fn description(&self) -> &'static str {
        "Get file or directory stats"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The file or directory to stat"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "StatFileTool::execute: called");
        let params: Params = match parse_params(input) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(e),
        };
        let context = json!({ "path": params.path });

        let action = format!("Reading metadata of \"{}\"", params.path);
        let path = match ctx.authorize_path(Path::new(&params.path), &action).await {
            Ok(p) => p,
            Err(e) => return ToolResult::error_with(context, e),
        };

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) => return ToolResult::error_with(context, ToolError::from_io(&path, e)),
        };

        ToolResult::success(Stat {
            path: params.path,
            is_file: metadata.is_file(),
            is_directory: metadata.is_dir(),
            size: metadata.len(),
            mtime: metadata
                .modified()
                .ok()
                .map(|t| DateTime::<Utc>::from(t).to_rfc3339()),
        })
    }
}
