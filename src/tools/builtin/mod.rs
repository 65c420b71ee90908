//! Built-in tools

mod cd;
mod delete_file;
mod edit_file;
mod exec_command;
mod list_directory;
mod mkdir;
mod read_file;
mod stat_file;
mod write_file;

pub use cd::CdTool;
pub use delete_file::DeleteFileTool;
pub use edit_file::EditFileTool;
pub use exec_command::ExecCommandTool;
pub use list_directory::ListDirectoryTool;
pub use mkdir::MkdirTool;
pub use read_file::ReadFileTool;
pub use stat_file::StatFileTool;
pub use write_file::WriteFileTool;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::ToolError;

/// Deserialize already-validated arguments into a tool's parameter struct
fn parse_params<T: DeserializeOwned>(input: Value) -> Result<T, ToolError> {
    serde_json::from_value(input).map_err(|e| ToolError::invalid(e.to_string()))
}
