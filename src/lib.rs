//! termagent - Tool Execution Engine for a terminal AI agent
//!
//! A catalog of local operations (file I/O, directory listing, text
//! patching, command execution) that a model-driven conversation invokes
//! one call at a time, inspecting each result before choosing the next.
//!
//! # Core Concepts
//!
//! - **Failures are data**: every tool returns a [`ToolResult`]; nothing a
//!   tool does can abort the conversation
//! - **One gate**: paths outside the working directory and every command
//!   go through the [`ConfirmationGate`] unless auto-approve is on
//! - **Strict ordering**: the model always sees tool N's result before
//!   tool N+1 is dispatched
//!
//! # Modules
//!
//! - [`agent`] - Dispatch loop, model sessions, turn observers
//! - [`tools`] - Tool trait, registry, schema validation, built-in tools
//! - [`walk`] - Ignore-aware bounded directory traversal
//! - [`edit`] - Find/replace, block, and line-range edits
//! - [`process`] - Time-bounded, output-capped process runner
//! - [`confirm`] - Interactive confirmation gate
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod agent;
pub mod cli;
pub mod config;
pub mod confirm;
pub mod edit;
pub mod process;
pub mod text;
pub mod tools;
pub mod walk;

// Re-export commonly used types
pub use agent::{
    ChannelSession, ConversationStep, DispatchError, DispatchLoop, ModelEvent, ModelSession, ScriptedSession,
    TurnObserver, TurnOutcome, TurnReport,
};
pub use config::Config;
pub use confirm::ConfirmationGate;
pub use edit::{EditError, EditOutcome, EditSpec};
pub use process::{ProcessLimits, ProcessOutput, ProcessRequest, ProcessRunner};
pub use tools::{Tool, ToolContext, ToolError, ToolInvocation, ToolProfile, ToolRegistry, ToolResult};
pub use walk::IgnoreFilter;
