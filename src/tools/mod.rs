//! Tool system
//!
//! Tools provide file system access, text editing, and command execution
//! to the agent. Each run shares one `ToolContext` holding the engine's
//! working directory and the confirmation gate; anything outside the
//! working directory needs the operator's approval.

mod context;
mod error;
mod registry;
pub mod schema;
mod traits;

pub mod builtin;

pub use context::ToolContext;
pub use error::ToolError;
pub use registry::{ToolDefinition, ToolProfile, ToolRegistry};
pub use traits::{Tool, ToolInvocation, ToolResult};
