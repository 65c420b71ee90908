//! ModelSession - the seam to the external model client

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use crate::tools::ToolResult;

use super::{DispatchError, ModelEvent, ToolReply};

/// Source of model events for one turn, and sink for tool results
///
/// The dispatch loop never asks for the next event until the previous
/// tool result has been submitted.
#[async_trait]
pub trait ModelSession: Send {
    /// Next event, or `None` once the model has finished the turn
    async fn next_event(&mut self) -> Option<ModelEvent>;

    /// Hand a tool result back to the model client
    async fn submit_tool_result(&mut self, call_id: &str, result: &ToolResult) -> Result<(), DispatchError>;
}

/// Session backed by channels to a model-client task
pub struct ChannelSession {
    events: mpsc::Receiver<ModelEvent>,
    results: mpsc::Sender<ToolReply>,
}

/// The model-client side of a [`ChannelSession`]
pub struct ClientEnd {
    pub events: mpsc::Sender<ModelEvent>,
    pub results: mpsc::Receiver<ToolReply>,
}

impl ChannelSession {
    /// Create a session and the client end that feeds it
    pub fn pair(buffer: usize) -> (Self, ClientEnd) {
        let (event_tx, event_rx) = mpsc::channel(buffer);
        let (result_tx, result_rx) = mpsc::channel(buffer);
        (
            Self {
                events: event_rx,
                results: result_tx,
            },
            ClientEnd {
                events: event_tx,
                results: result_rx,
            },
        )
    }
}

#[async_trait]
impl ModelSession for ChannelSession {
    async fn next_event(&mut self) -> Option<ModelEvent> {
        self.events.recv().await
    }

    async fn submit_tool_result(&mut self, call_id: &str, result: &ToolResult) -> Result<(), DispatchError> {
        self.results
            .send(ToolReply {
                call_id: call_id.to_string(),
                result: result.clone(),
            })
            .await
            .map_err(|_| DispatchError::SessionClosed)
    }
}

/// What happened on a [`ScriptedSession`], in order
#[derive(Debug, Clone, PartialEq)]
pub enum Exchange {
    Pulled(ModelEvent),
    Submitted(ToolReply),
}

/// Session replaying pre-recorded events
///
/// Keeps a transcript of every pull and submit so callers can check the
/// order the loop used.
#[derive(Debug, Default)]
pub struct ScriptedSession {
    events: VecDeque<ModelEvent>,
    transcript: Vec<Exchange>,
}

impl ScriptedSession {
    pub fn new(events: impl IntoIterator<Item = ModelEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
            transcript: Vec::new(),
        }
    }

    /// Parse a JSON array of events
    pub fn from_json(script: &str) -> Result<Self, serde_json::Error> {
        let events: Vec<ModelEvent> = serde_json::from_str(script)?;
        debug!(count = events.len(), "ScriptedSession::from_json: loaded");
        Ok(Self::new(events))
    }

    pub fn transcript(&self) -> &[Exchange] {
        &self.transcript
    }

    /// Results submitted so far
    pub fn replies(&self) -> Vec<&ToolReply> {
        self.transcript
            .iter()
            .filter_map(|x| match x {
                Exchange::Submitted(reply) => Some(reply),
                Exchange::Pulled(_) => None,
            })
            .collect()
    }

    /// Events not yet pulled
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

#[async_trait]
impl ModelSession for ScriptedSession {
    async fn next_event(&mut self) -> Option<ModelEvent> {
        let event = self.events.pop_front()?;
        self.transcript.push(Exchange::Pulled(event.clone()));
        Some(event)
    }

    async fn submit_tool_result(&mut self, call_id: &str, result: &ToolResult) -> Result<(), DispatchError> {
        self.transcript.push(Exchange::Submitted(ToolReply {
            call_id: call_id.to_string(),
            result: result.clone(),
        }));
        Ok(())
    }
}
