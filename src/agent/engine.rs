//! DispatchLoop - runs one turn of model events against the tool registry
//!
//! The loop is strictly sequential: pull an event, and for a tool call run
//! it to completion and submit its result before pulling the next event.
//! Tool failures are results, not errors; only a misconfigured loop or a
//! dead session is a [`DispatchError`].

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::tools::{ToolContext, ToolInvocation, ToolRegistry};

use super::{ConversationStep, LogObserver, ModelEvent, ModelSession, StepEntry, TurnObserver};

/// Fatal dispatch errors
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Tool registry is empty")]
    EmptyRegistry,

    #[error("Step limit must be at least 1")]
    InvalidStepLimit,

    #[error("Model session closed before the tool result could be delivered")]
    SessionClosed,
}

/// How a turn ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model finished on its own
    Completed,
    /// The model asked for more tool calls than allowed
    StepLimitExceeded { limit: u32 },
    /// The turn was cancelled between events
    Cancelled,
    /// The model client reported an error
    ModelError(String),
}

/// Everything a turn produced
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub outcome: TurnOutcome,
    pub step: ConversationStep,
    /// Tool calls executed
    pub rounds: u32,
}

/// Sequential consumer of model events
pub struct DispatchLoop {
    registry: Arc<ToolRegistry>,
    ctx: ToolContext,
    max_steps: u32,
    observer: Arc<dyn TurnObserver>,
    // Replaced with a fresh token once a turn ends cancelled
    cancel: Mutex<CancellationToken>,
}

impl DispatchLoop {
    /// Create a loop; an empty registry or a zero step limit is fatal
    pub fn new(registry: Arc<ToolRegistry>, ctx: ToolContext, max_steps: u32) -> Result<Self, DispatchError> {
        debug!(tools = registry.len(), %max_steps, "DispatchLoop::new: called");
        if registry.is_empty() {
            return Err(DispatchError::EmptyRegistry);
        }
        if max_steps == 0 {
            return Err(DispatchError::InvalidStepLimit);
        }
        Ok(Self {
            registry,
            ctx,
            max_steps,
            observer: Arc::new(LogObserver),
            cancel: Mutex::new(CancellationToken::new()),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn TurnObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_cancellation(self, cancel: CancellationToken) -> Self {
        *self.cancel.lock().unwrap_or_else(PoisonError::into_inner) = cancel;
        self
    }

    /// Token that cancels the running turn, or the next one if none is running
    ///
    /// A token only ever cancels one turn; fetch it again after a cancelled turn.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn context(&self) -> &ToolContext {
        &self.ctx
    }

    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    /// Run one turn to completion
    ///
    /// The step count starts at zero for every turn.
    pub async fn run_turn(&self, session: &mut dyn ModelSession) -> Result<TurnReport, DispatchError> {
        info!("Starting turn (max_steps: {})", self.max_steps);
        let cancel = self.cancellation_token();
        let mut step = ConversationStep::default();
        let mut rounds = 0u32;

        let outcome = loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => break TurnOutcome::Cancelled,
                event = session.next_event() => event,
            };

            match event {
                None => break TurnOutcome::Completed,
                Some(ModelEvent::Text { text }) => {
                    self.observer.on_text(&text);
                    step.push(StepEntry::Text { text });
                }
                Some(ModelEvent::Error { message }) => {
                    warn!(%message, "Model error, ending turn");
                    self.observer.on_model_error(&message);
                    step.push(StepEntry::Error {
                        message: message.clone(),
                    });
                    break TurnOutcome::ModelError(message);
                }
                Some(ModelEvent::ToolCall(call)) => {
                    if rounds >= self.max_steps {
                        warn!(name = %call.name, "Step limit ({}) reached, not executing", self.max_steps);
                        break TurnOutcome::StepLimitExceeded { limit: self.max_steps };
                    }
                    rounds += 1;
                    self.run_call(&call, &mut step, session).await?;
                }
            }
        };

        if outcome == TurnOutcome::Cancelled {
            *self.cancel.lock().unwrap_or_else(PoisonError::into_inner) = CancellationToken::new();
        }

        info!("Turn finished after {} tool call(s): {:?}", rounds, outcome);
        Ok(TurnReport { outcome, step, rounds })
    }

    async fn run_call(
        &self,
        call: &ToolInvocation,
        step: &mut ConversationStep,
        session: &mut dyn ModelSession,
    ) -> Result<(), DispatchError> {
        let summary = self.registry.summarize_call(call);
        self.observer.on_tool_call(call, &summary);
        step.push(StepEntry::ToolCall {
            id: call.id.clone(),
            name: call.name.clone(),
            summary,
        });

        let result = self.registry.dispatch(call, &self.ctx).await;
        let rendered = self.registry.render(&call.name, &result);
        self.observer.on_tool_result(call, &result, rendered.as_deref());
        step.push(StepEntry::ToolResult {
            id: call.id.clone(),
            payload: result.payload.clone(),
            is_error: result.is_error,
            rendered,
        });

        session.submit_tool_result(&call.id, &result).await
    }
}

impl std::fmt::Debug for DispatchLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchLoop")
            .field("registry", &self.registry)
            .field("max_steps", &self.max_steps)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{ChannelSession, Exchange, ScriptedSession};
    use crate::confirm::ConfirmationGate;
    use crate::tools::{Tool, ToolResult};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    /// Counts executions and returns the running count
    struct CounterTool {
        count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Tool for CounterTool {
        fn name(&self) -> &'static str {
            "count"
        }

        fn description(&self) -> &'static str {
            "Count calls"
        }

        fn input_schema(&self) -> Value {
            json!({ "type": "object", "properties": {} })
        }

        async fn execute(&self, _input: Value, _ctx: &ToolContext) -> ToolResult {
            let n = self.count.fetch_add(1, Ordering::SeqCst) + 1;
            ToolResult::success(json!({ "count": n }))
        }
    }

    fn counter_loop(max_steps: u32) -> (DispatchLoop, Arc<AtomicUsize>, tempfile::TempDir) {
        let temp = tempdir().unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::empty();
        registry.add_tool(Box::new(CounterTool { count: count.clone() }));
        let ctx = ToolContext::new(temp.path().to_path_buf(), ConfirmationGate::auto_approve());
        let dispatch = DispatchLoop::new(Arc::new(registry), ctx, max_steps).unwrap();
        (dispatch, count, temp)
    }

    fn calls(n: usize) -> Vec<ModelEvent> {
        (0..n)
            .map(|i| {
                ModelEvent::ToolCall(ToolInvocation {
                    id: format!("c{}", i),
                    name: "count".to_string(),
                    input: json!({}),
                })
            })
            .collect()
    }

    #[test]
    fn test_empty_registry_is_fatal() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), ConfirmationGate::auto_approve());
        let err = DispatchLoop::new(Arc::new(ToolRegistry::empty()), ctx, 5).unwrap_err();
        assert!(matches!(err, DispatchError::EmptyRegistry));
    }

    #[tokio::test]
    async fn test_results_submitted_before_next_pull() {
        let (dispatch, _count, _temp) = counter_loop(10);
        let mut events = vec![ModelEvent::text("start ")];
        events.extend(calls(3));
        events.push(ModelEvent::text("done"));
        let mut session = ScriptedSession::new(events);

        let report = dispatch.run_turn(&mut session).await.unwrap();

        assert_eq!(report.outcome, TurnOutcome::Completed);
        assert_eq!(report.rounds, 3);
        assert_eq!(report.step.text(), "start done");

        // Every pulled tool call is immediately followed by its own result
        let transcript = session.transcript();
        for (i, exchange) in transcript.iter().enumerate() {
            if let Exchange::Pulled(ModelEvent::ToolCall(call)) = exchange {
                match transcript.get(i + 1) {
                    Some(Exchange::Submitted(reply)) => assert_eq!(reply.call_id, call.id),
                    other => panic!("expected result for {}, got {:?}", call.id, other),
                }
            }
        }
        let counts: Vec<Value> = session.replies().iter().map(|r| r.result.payload["count"].clone()).collect();
        assert_eq!(counts, vec![json!(1), json!(2), json!(3)]);
    }

    #[tokio::test]
    async fn test_step_limit_stops_turn() {
        let (dispatch, count, _temp) = counter_loop(2);
        let mut session = ScriptedSession::new(calls(5));

        let report = dispatch.run_turn(&mut session).await.unwrap();

        assert_eq!(report.outcome, TurnOutcome::StepLimitExceeded { limit: 2 });
        assert_eq!(report.rounds, 2);
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(session.replies().len(), 2);
        assert_eq!(session.remaining(), 2);
    }

    #[tokio::test]
    async fn test_exactly_at_limit_completes() {
        let (dispatch, _count, _temp) = counter_loop(3);
        let mut session = ScriptedSession::new(calls(3));

        let report = dispatch.run_turn(&mut session).await.unwrap();
        assert_eq!(report.outcome, TurnOutcome::Completed);
    }

    #[tokio::test]
    async fn test_step_count_is_per_turn() {
        let (dispatch, count, _temp) = counter_loop(2);

        for _ in 0..3 {
            let mut session = ScriptedSession::new(calls(2));
            let report = dispatch.run_turn(&mut session).await.unwrap();
            assert_eq!(report.outcome, TurnOutcome::Completed);
            assert_eq!(report.rounds, 2);
        }
        assert_eq!(count.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_tool_failures_do_not_end_turn() {
        let (dispatch, count, _temp) = counter_loop(10);
        let mut events = vec![
            ModelEvent::tool_call("no_such_tool", json!({})),
            ModelEvent::tool_call("count", json!("not an object")),
        ];
        events.extend(calls(1));
        let mut session = ScriptedSession::new(events);

        let report = dispatch.run_turn(&mut session).await.unwrap();

        assert_eq!(report.outcome, TurnOutcome::Completed);
        let replies = session.replies();
        assert_eq!(replies[0].result.error_kind(), Some("unknown_tool"));
        assert_eq!(replies[1].result.error_kind(), Some("invalid_arguments"));
        assert!(!replies[2].result.is_error);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_model_error_ends_turn() {
        let (dispatch, count, _temp) = counter_loop(10);
        let mut events = vec![ModelEvent::error("connection reset")];
        events.extend(calls(1));
        let mut session = ScriptedSession::new(events);

        let report = dispatch.run_turn(&mut session).await.unwrap();

        assert_eq!(report.outcome, TurnOutcome::ModelError("connection reset".to_string()));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(matches!(report.step.entries()[0], StepEntry::Error { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_turn_runs_nothing() {
        let (dispatch, count, _temp) = counter_loop(10);
        dispatch.cancellation_token().cancel();
        let mut session = ScriptedSession::new(calls(2));

        let report = dispatch.run_turn(&mut session).await.unwrap();

        assert_eq!(report.outcome, TurnOutcome::Cancelled);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_turn_after_cancelled_turn_runs() {
        let (dispatch, count, _temp) = counter_loop(10);
        let stale = dispatch.cancellation_token();
        stale.cancel();

        let mut first = ScriptedSession::new(calls(2));
        let report = dispatch.run_turn(&mut first).await.unwrap();
        assert_eq!(report.outcome, TurnOutcome::Cancelled);

        let mut second = ScriptedSession::new(calls(2));
        let report = dispatch.run_turn(&mut second).await.unwrap();
        assert_eq!(report.outcome, TurnOutcome::Completed);
        assert_eq!(report.rounds, 2);
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(!dispatch.cancellation_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_during_turn_stops_before_next_event() {
        let (dispatch, count, _temp) = counter_loop(10);
        let (mut session, client) = ChannelSession::pair(4);
        let cancel = dispatch.cancellation_token();

        let model = tokio::spawn(async move {
            let mut client = client;
            client.events.send(ModelEvent::tool_call("count", json!({}))).await.unwrap();
            client.results.recv().await.unwrap();
            cancel.cancel();
            // Keep the session open so only the token can end the turn
            client
        });

        let report = dispatch.run_turn(&mut session).await.unwrap();
        let _client = model.await.unwrap();

        assert_eq!(report.outcome, TurnOutcome::Cancelled);
        assert_eq!(report.rounds, 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_real_tools_see_previous_effects() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("work")).unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), ConfirmationGate::auto_approve());
        let dispatch = DispatchLoop::new(Arc::new(ToolRegistry::standard()), ctx, 5).unwrap();
        let mut session = ScriptedSession::new(vec![
            ModelEvent::tool_call("cd", json!({ "dir": "work" })),
            ModelEvent::tool_call("write_file", json!({ "file": "a.txt", "content": "x" })),
            ModelEvent::tool_call("read_file", json!({ "file": "a.txt" })),
        ]);

        let report = dispatch.run_turn(&mut session).await.unwrap();

        assert_eq!(report.rounds, 3);
        assert!(temp.path().join("work").join("a.txt").exists());
        assert_eq!(session.replies()[2].result.payload["content"], "x");
    }
}
