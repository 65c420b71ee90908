//! list_directory tool - ignore-aware recursive file listing

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::Path;
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolResult};
use crate::walk::{IgnoreFilter, walk};

use super::parse_params;

#[derive(Debug, Deserialize)]
struct Params {
    dir: String,
    #[serde(default)]
    recursive_depth: usize,
    #[serde(default)]
    include_vc_and_pkg_dirs: bool,
}

/// List files under a directory, honoring the project ignore file
pub struct ListDirectoryTool;

#[async_trait]
impl Tool for ListDirectoryTool {
    fn name(&self) -> &'static str {
        "list_directory"
    }

    fn description(&self) -> &'static str {
        "List files in a directory. By default respects .gitignore and excludes version control and \
         package manager directories (node_modules, .git, etc); set include_vc_and_pkg_dirs to list everything."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "dir": {
                    "type": "string",
                    "description": "The directory to list"
                },
                "recursive_depth": {
                    "type": "integer",
                    "default": 0,
                    "description": "How deep to recurse into subdirectories. 0 means no recursion"
                },
                "include_vc_and_pkg_dirs": {
                    "type": "boolean",
                    "default": false,
                    "description": "Whether to include version control and package management directories"
                }
            },
            "required": ["dir"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "ListDirectoryTool::execute: called");
        let params: Params = match parse_params(input) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(e),
        };

        let action = format!("Listing files in \"{}\"", params.dir);
        let root = match ctx.authorize_path(Path::new(&params.dir), &action).await {
            Ok(p) => p,
            Err(e) => {
                debug!(%e, "ListDirectoryTool::execute: not authorized");
                return ToolResult::error_with(json!({ "rootDir": params.dir, "files": [] }), e);
            }
        };

        let filter = if params.include_vc_and_pkg_dirs {
            IgnoreFilter::disabled(&root)
        } else {
            IgnoreFilter::new(&root, &ctx.ignore_file)
        };
        let files: Vec<String> = walk(&root, params.recursive_depth, &filter)
            .await
            .iter()
            .map(|f| f.strip_prefix(&root).unwrap_or(f).to_string_lossy().into_owned())
            .collect();
        debug!(count = files.len(), "ListDirectoryTool::execute: files collected");

        ToolResult::success(json!({
            "rootDir": root,
            "files": files,
        }))
    }
}
