//! ToolRegistry - the immutable tool catalog and its dispatch entry point

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::ProfileName;

use super::builtin::{
    CdTool, DeleteFileTool, EditFileTool, ExecCommandTool, ListDirectoryTool, MkdirTool, ReadFileTool, StatFileTool,
    WriteFileTool,
};
use super::schema::validate_args;
use super::{Tool, ToolContext, ToolError, ToolInvocation, ToolResult};

/// Which subset of the catalog gets registered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToolProfile {
    /// Every built-in tool
    #[default]
    Full,
    /// Listing, reading and stat only
    ReadOnly,
}

impl From<ProfileName> for ToolProfile {
    fn from(name: ProfileName) -> Self {
        match name {
            ProfileName::Full => ToolProfile::Full,
            ProfileName::ReadOnly => ToolProfile::ReadOnly,
        }
    }
}

/// Tool description as advertised to the model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Name-keyed tool catalog, built once at startup and shared by reference
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Registry with every built-in tool
    pub fn standard() -> Self {
        Self::with_profile(ToolProfile::Full)
    }

    /// Registry with the tools of `profile`
    pub fn with_profile(profile: ToolProfile) -> Self {
        debug!(?profile, "ToolRegistry::with_profile: called");
        let mut registry = Self::empty();

        // Read-only toolkit
        registry.add_tool(Box::new(ListDirectoryTool));
        registry.add_tool(Box::new(ReadFileTool));
        registry.add_tool(Box::new(StatFileTool));

        if profile == ToolProfile::Full {
            registry.add_tool(Box::new(WriteFileTool));
            registry.add_tool(Box::new(DeleteFileTool));
            registry.add_tool(Box::new(MkdirTool));
            registry.add_tool(Box::new(EditFileTool));
            registry.add_tool(Box::new(ExecCommandTool));
            registry.add_tool(Box::new(CdTool));
        }

        registry
    }

    /// Create an empty registry (for testing)
    pub fn empty() -> Self {
        Self { tools: HashMap::new() }
    }

    /// Add a tool, replacing any tool with the same name
    pub fn add_tool(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Definitions for every registered tool, sorted by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(|t| definition(t.as_ref())).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Definitions for a subset of tools by name
    pub fn definitions_for(&self, tool_names: &[String]) -> Vec<ToolDefinition> {
        tool_names
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| definition(t.as_ref()))
            .collect()
    }

    /// Look up, validate, and execute one call
    ///
    /// Never fails: unknown tools and invalid arguments come back as
    /// failed results so the conversation can continue.
    pub async fn dispatch(&self, call: &ToolInvocation, ctx: &ToolContext) -> ToolResult {
        debug!(id = %call.id, name = %call.name, "ToolRegistry::dispatch: called");
        let Some(tool) = self.tools.get(&call.name) else {
            debug!(name = %call.name, "ToolRegistry::dispatch: unknown tool");
            return ToolResult::error(ToolError::UnknownTool {
                name: call.name.clone(),
            });
        };

        let mut input = call.input.clone();
        if let Err(violations) = validate_args(&tool.input_schema(), &mut input) {
            debug!(?violations, "ToolRegistry::dispatch: invalid arguments");
            return ToolResult::error(ToolError::InvalidArguments { violations });
        }

        let result = tool.execute(input, ctx).await;
        if ctx.debug {
            debug!(name = %call.name, payload = %result.payload, "ToolRegistry::dispatch: result");
        }
        result
    }

    /// Arguments of `call` with the tool's hidden args removed, for display
    pub fn summarize_call(&self, call: &ToolInvocation) -> Value {
        let hidden = self.tools.get(&call.name).map(|t| t.hidden_args()).unwrap_or(&[]);
        match &call.input {
            Value::Object(map) => Value::Object(
                map.iter()
                    .filter(|(key, _)| !hidden.contains(&key.as_str()))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Tool-specific rendering of a result, if the tool has one
    pub fn render(&self, name: &str, result: &ToolResult) -> Option<String> {
        self.tools.get(name).and_then(|t| t.render(result))
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get tool names, sorted
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tool_names())
            .finish()
    }
}

fn definition(tool: &dyn Tool) -> ToolDefinition {
    ToolDefinition {
        name: tool.name().to_string(),
        description: tool.description().to_string(),
        input_schema: tool.input_schema(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::ConfirmationGate;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_standard_registry_has_full_catalog() {
        let registry = ToolRegistry::standard();
        assert_eq!(
            registry.tool_names(),
            vec![
                "cd",
                "delete_file",
                "edit_file",
                "exec_command",
                "list_directory",
                "mkdir",
                "read_file",
                "stat_file",
                "write_file",
            ]
        );
    }

    #[test]
    fn test_read_only_profile() {
        let registry = ToolRegistry::with_profile(ToolProfile::ReadOnly);
        assert_eq!(registry.tool_names(), vec!["list_directory", "read_file", "stat_file"]);
        assert!(!registry.has_tool("exec_command"));
    }

    #[test]
    fn test_definitions_for_subset() {
        let registry = ToolRegistry::standard();
        let defs = registry.definitions_for(&["read_file".to_string(), "write_file".to_string()]);

        assert_eq!(defs.len(), 2);
        assert!(defs.iter().any(|d| d.name == "read_file"));
        assert!(defs.iter().all(|d| d.input_schema["type"] == "object"));
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool() {
        let registry = ToolRegistry::standard();
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), ConfirmationGate::auto_approve());

        let result = registry
            .dispatch(&ToolInvocation::new("unknown_tool", json!({})), &ctx)
            .await;
        assert!(result.is_error);
        assert_eq!(result.error_kind(), Some("unknown_tool"));
        assert!(result.error_message().unwrap().contains("unknown_tool"));
    }

    #[tokio::test]
    async fn test_dispatch_rejects_invalid_arguments() {
        let registry = ToolRegistry::standard();
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), ConfirmationGate::auto_approve());

        let result = registry
            .dispatch(&ToolInvocation::new("list_directory", json!({ "dir": ".", "bogus": 1 })), &ctx)
            .await;
        assert_eq!(result.error_kind(), Some("invalid_arguments"));
        assert!(result.error_message().unwrap().contains("bogus"));

        let result = registry
            .dispatch(&ToolInvocation::new("read_file", json!({})), &ctx)
            .await;
        assert!(result.error_message().unwrap().contains("missing required field 'file'"));
    }

    #[tokio::test]
    async fn test_dispatch_coerces_and_defaults() {
        let registry = ToolRegistry::standard();
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("sub").join("a.txt"), "a").unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), ConfirmationGate::auto_approve());

        let result = registry
            .dispatch(
                &ToolInvocation::new("list_directory", json!({ "dir": ".", "recursive_depth": "1" })),
                &ctx,
            )
            .await;
        assert!(!result.is_error, "{}", result.content());
        assert_eq!(result.payload["files"], json!(["sub/a.txt"]));
    }

    #[test]
    fn test_summarize_call_hides_args() {
        let registry = ToolRegistry::standard();
        let call = ToolInvocation::new(
            "exec_command",
            json!({ "command": "ls", "cwd": "/tmp", "env": { "A": "1" }, "shell": true }),
        );
        assert_eq!(registry.summarize_call(&call), json!({ "command": "ls" }));
    }

    #[test]
    fn test_render_delegates_to_tool() {
        let registry = ToolRegistry::standard();
        let result = ToolResult::success(json!({ "file": "gone.txt" }));
        assert_eq!(
            registry.render("delete_file", &result).as_deref(),
            Some("Deleted file: gone.txt")
        );
        assert_eq!(registry.render("read_file", &result), None);
    }
}
