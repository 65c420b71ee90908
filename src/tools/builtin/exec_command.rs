//! exec_command tool - run a command behind the confirmation gate

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::process::{ProcessRequest, ProcessRunner, Truncation};
use crate::tools::{Tool, ToolContext, ToolError, ToolResult};

use super::parse_params;

fn default_shell() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct Params {
    command: String,
    #[serde(default)]
    args: Vec<String>,
    cwd: Option<String>,
    env: Option<BTreeMap<String, String>>,
    #[serde(default = "default_shell")]
    shell: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecOutput {
    command: String,
    args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cwd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    env: Option<BTreeMap<String, String>>,
    shell: bool,
    exit_code: Option<i32>,
    stdout: String,
    stderr: String,
    truncated: Truncation,
}

/// Execute a command, with output capped and a wall-clock deadline
pub struct ExecCommandTool;

#[async_trait]
impl Tool for ExecCommandTool {
    fn name(&self) -> &'static str {
        "exec_command"
    }

    fn description(&self) -> &'static str {
        "Execute a shell command. Requires confirmation before running. Output is truncated to 8k \
         characters per stream (so filter or sort to reduce the output size). Default timeout is 20s. \
         Does NOT support interactive commands."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The command to execute (e.g. 'ls')"
                },
                "args": {
                    "type": "array",
                    "items": { "type": "string" },
                    "default": [],
                    "description": "Arguments to pass to the command"
                },
                "cwd": {
                    "type": "string",
                    "description": "Working directory to run the command in"
                },
                "env": {
                    "type": "object",
                    "additionalProperties": { "type": "string" },
                    "description": "Environment variables to set"
                },
                "shell": {
                    "type": "boolean",
                    "default": true,
                    "description": "Run command in a shell (default true)"
                }
            },
            "required": ["command"]
        })
    }

    fn hidden_args(&self) -> &'static [&'static str] {
        &["cwd", "shell", "env"]
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "ExecCommandTool::execute: called");
        let params: Params = match parse_params(input) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(e),
        };

        let cwd = match &params.cwd {
            Some(dir) => ctx.resolve(Path::new(dir)).await,
            None => ctx.cwd().await,
        };
        let request = ProcessRequest {
            command: params.command.clone(),
            args: params.args.clone(),
            cwd: Some(cwd),
            env: params.env.clone().unwrap_or_default(),
            shell: params.shell,
        };

        let runner = ProcessRunner::new(ctx.limits);
        let output = match runner.run(&request, &ctx.gate).await {
            Ok(o) => o,
            Err(e) => {
                debug!(%e, "ExecCommandTool::execute: not run");
                return ToolResult::error_with(json!({ "command": params.command, "args": params.args }), e);
            }
        };

        let success = output.success();
        let timed_out = output.timed_out;
        let body = ExecOutput {
            command: params.command,
            args: params.args,
            cwd: params.cwd,
            env: params.env,
            shell: params.shell,
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
            truncated: output.truncated,
        };

        if timed_out {
            return ToolResult::error_with(
                body,
                ToolError::Timeout {
                    timeout: runner.limits().timeout,
                },
            );
        }
        ToolResult::from_output(body, success)
    }
}
