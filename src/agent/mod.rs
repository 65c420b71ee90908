//! AgentDispatchLoop - turns model events into executed tool calls
//!
//! A turn is a sequence of [`ModelEvent`]s pulled from a [`ModelSession`].
//! Text is relayed to the [`TurnObserver`]; each tool call is dispatched
//! through the [`ToolRegistry`](crate::tools::ToolRegistry) and its result
//! is submitted back before the next event is read.

mod engine;
mod events;
mod observer;
mod session;

pub use engine::{DispatchError, DispatchLoop, TurnOutcome, TurnReport};
pub use events::{ConversationStep, ModelEvent, StepEntry, ToolReply};
pub use observer::{ConsoleObserver, LogObserver, TurnObserver};
pub use session::{ChannelSession, ClientEnd, Exchange, ModelSession, ScriptedSession};
