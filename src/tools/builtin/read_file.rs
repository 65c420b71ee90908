//! read_file tool - read file contents

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
    encoding: Option<String>,
}

/// Read a file's contents
pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn description(&self) -> &'static str {
        "Read the contents of a file"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file": {
                    "type": "string",
                    "description": "The file to read"
                },
                "encoding": {
                    "type": "string",
                    "default": "utf8",
                    "description": "utf8 or latin1"
                }
            },
            "required": ["file"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "ReadFileTool::execute: called");
        let params: Params = match parse_params(input) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(e),
        };
        let context = json!({ "file": params.file });

        let action = format!("Reading \"{}\"", params.file);
        let path = match ctx.authorize_path(Path::new(&params.file), &action).await {
            Ok(p) => p,
            Err(e) => return ToolResult::error_with(context, e),
        };

        let encoding = Encoding::from_name(params.encoding.as_deref());
        let content = match tokio::fs::read(&path).await.and_then(|bytes| encoding.decode(bytes)) {
            Ok(c) => c,
            Err(e) => {
                debug!(%e, "ReadFileTool::execute: read failed");
                return ToolResult::error_with(context, ToolError::from_io(&path, e));
            }
        };

        ToolResult::success(json!({
            "file": params.file,
            "content": content,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::ConfirmationGate;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_read_file_basic() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("test.txt"), "line 1\nline 2").unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), ConfirmationGate::auto_approve());

        let result = ReadFileTool.execute(json!({ "file": "test.txt" }), &ctx).await;

        assert!(!result.is_error);
        assert_eq!(result.payload["content"], "line 1\nline 2");
        assert_eq!(result.payload["file"], "test.txt");
    }

    #[tokio::test]
    async fn test_read_file_latin1() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("latin.txt"), [0x63, 0x61, 0x66, 0xe9]).unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), ConfirmationGate::auto_approve());

        let result = ReadFileTool
            .execute(json!({ "file": "latin.txt", "encoding": "latin1" }), &ctx)
            .await;
        assert_eq!(result.payload["content"], "café");

        let result = ReadFileTool.execute(json!({ "file": "latin.txt" }), &ctx).await;
        assert_eq!(result.error_kind(), Some("io"));
    }

    #[tokio::test]
    async fn test_read_file_not_found() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), ConfirmationGate::auto_approve());

        let result = ReadFileTool.execute(json!({ "file": "missing.txt" }), &ctx).await;

        assert!(result.is_error);
        assert_eq!(result.error_kind(), Some("not_found"));
        assert_eq!(result.payload["file"], "missing.txt");
    }
}
