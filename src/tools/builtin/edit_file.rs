//! edit_file tool - pattern, block, and line-range edits

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::Path;
use tracing::debug;

use crate::edit::{EditError, EditSpec, edit_file};
use crate::text::Encoding;
use crate::tools::{Tool, ToolContext, ToolError, ToolResult};

use super::parse_params;

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct Params {
    file: String,
    mode: String,
    replacement: String,
    encoding: Option<String>,

    // find_replace
    pattern: Option<String>,
    #[serde(default = "default_true")]
    all: bool,

    // block
    start: Option<String>,
    end: Option<String>,
    #[serde(default)]
    include_markers: bool,

    // line_range
    start_line: Option<i64>,
    end_line: Option<i64>,
    #[serde(default = "default_true")]
    inclusive: bool,
}

impl Params {
    fn into_spec(self) -> Result<EditSpec, ToolError> {
        let Params {
            mode,
            replacement,
            pattern,
            all,
            start,
            end,
            include_markers,
            start_line,
            end_line,
            inclusive,
            ..
        } = self;

        match mode.as_str() {
            "find_replace" => Ok(EditSpec::FindReplace {
                pattern: required(pattern, "pattern", &mode)?,
                replacement,
                all,
            }),
            "block" => Ok(EditSpec::Block {
                start: required(start, "start", &mode)?,
                end: required(end, "end", &mode)?,
                replacement,
                include_markers,
            }),
            "line_range" => Ok(EditSpec::LineRange {
                start_line: required(start_line, "start_line", &mode)?,
                end_line: required(end_line, "end_line", &mode)?,
                replacement,
                inclusive,
            }),
            other => Err(ToolError::invalid(format!("unknown edit mode '{}'", other))),
        }
    }
}

fn required<T>(value: Option<T>, field: &str, mode: &str) -> Result<T, ToolError> {
    value.ok_or_else(|| ToolError::invalid(format!("missing required field '{}' for mode {}", field, mode)))
}

/// Edit a segment of a file
pub struct EditFileTool;

#[async_trait]
impl Tool for EditFileTool {
    fn name(&self) -> &'static str {
        "edit_file"
    }

    fn description(&self) -> &'static str {
        "Edit a segment of a file. Modes:\n\
         - find_replace: replace regex `pattern` with `replacement`, every occurrence unless `all` is false.\n\
         - block: replace the text between the first `start` match and the next `end` match; \
         `include_markers` also replaces the markers.\n\
         - line_range: replace lines `start_line` to `end_line` (1-based); `inclusive` controls whether \
         `end_line` itself is replaced.\n\
         Fails with no changes when nothing matches."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file": { "type": "string", "description": "The file to edit" },
                "mode": { "type": "string", "enum": ["find_replace", "block", "line_range"] },
                "replacement": { "type": "string", "description": "The content to replace with" },
                "encoding": { "type": "string", "default": "utf8" },
                "pattern": { "type": "string", "description": "find_replace: regex to find" },
                "all": { "type": "boolean", "default": true },
                "start": { "type": "string", "description": "block: start marker regex" },
                "end": { "type": "string", "description": "block: end marker regex" },
                "include_markers": { "type": "boolean", "default": false },
                "start_line": { "type": "integer", "description": "line_range: first line (1-based)" },
                "end_line": { "type": "integer", "description": "line_range: last line (1-based)" },
                "inclusive": { "type": "boolean", "default": true }
            },
            "required": ["file", "mode", "replacement"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "EditFileTool::execute: called");
        let params: Params = match parse_params(input) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(e),
        };
        let file = params.file.clone();
        let encoding = Encoding::from_name(params.encoding.as_deref());
        let context = json!({ "file": file, "mode": params.mode, "matches": 0 });

        let spec = match params.into_spec() {
            Ok(s) => s,
            Err(e) => return ToolResult::error_with(context, e),
        };

        let action = format!("Editing \"{}\"", file);
        let path = match ctx.authorize_path(Path::new(&file), &action).await {
            Ok(p) => p,
            Err(e) => return ToolResult::error_with(context, e),
        };

        match edit_file(&path, &spec, encoding).await {
            Ok(outcome) if outcome.matches > 0 => {
                debug!(matches = outcome.matches, "EditFileTool::execute: edited");
                ToolResult::success(json!({
                    "file": file,
                    "mode": spec.mode(),
                    "matches": outcome.matches,
                }))
            }
            Ok(_) => ToolResult::error_with(context, ToolError::NoMatches),
            Err(EditError::InvalidPattern { pattern, source }) => {
                ToolResult::error_with(context, ToolError::InvalidPattern { pattern, source })
            }
            Err(EditError::Io(e)) => ToolResult::error_with(context, ToolError::from_io(&path, e)),
        }
    }
}
