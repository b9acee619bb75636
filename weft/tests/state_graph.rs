//! Integration tests for StateGraph / CompiledStateGraph with a toy state.
//!
//! A counter loops through an `inc` node until a conditional router sends it to
//! END; covers cycles, the step ceiling, cancellation, stream modes and middleware.

mod init_logging;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use weft::graph::{NodeMiddleware, NodeRunFn};
use weft::{
    AgentError, CompiledStateGraph, GraphState, Node, RunContext, StateGraph, StreamEvent,
    StreamMode, END, START,
};

#[derive(Clone, Debug, Default, PartialEq)]
struct Tally {
    count: i32,
    trail: Vec<String>,
}

impl GraphState for Tally {
    type Update = (i32, String);

    fn apply_update(&mut self, (delta, who): (i32, String)) {
        self.count += delta;
        self.trail.push(who);
    }
}

struct Inc;

#[async_trait]
impl Node<Tally> for Inc {
    fn id(&self) -> &str {
        "inc"
    }

    async fn run(&self, _state: &Tally) -> Result<(i32, String), AgentError> {
        Ok((1, "inc".to_string()))
    }
}

/// Loops `inc` while count < `stop`.
fn looping_graph(stop: i32) -> CompiledStateGraph<Tally> {
    let path_map: HashMap<String, String> = [
        ("again".to_string(), "inc".to_string()),
        ("done".to_string(), END.to_string()),
    ]
    .into_iter()
    .collect();
    let mut graph = StateGraph::<Tally>::new();
    graph
        .add_node("inc", Arc::new(Inc))
        .add_edge(START, "inc")
        .add_conditional_edges(
            "inc",
            Arc::new(move |s: &Tally| {
                let next = if s.count < stop { "again" } else { "done" };
                next.to_string()
            }),
            Some(path_map),
        );
    graph.compile().expect("valid graph")
}

/// **Scenario**: a conditional self-loop runs until the router picks END.
#[tokio::test]
async fn conditional_cycle_runs_to_end() {
    let compiled = looping_graph(3);
    let out = compiled
        .invoke(Tally::default(), &RunContext::new())
        .await
        .unwrap();
    assert_eq!(out.count, 3);
    assert_eq!(out.trail.len(), 3);
}

/// **Scenario**: the step ceiling stops a loop and run_in_place keeps the progress made.
#[tokio::test]
async fn recursion_limit_stops_loop_with_partial_state() {
    let compiled = looping_graph(100);
    let mut state = Tally::default();
    let err = compiled
        .run_in_place(&mut state, &RunContext::new().with_recursion_limit(5))
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::RecursionLimit { limit: 5 }));
    assert_eq!(state.count, 5);
}

/// **Scenario**: a cancelled context runs no step at all.
#[tokio::test]
async fn cancelled_context_runs_nothing() {
    let compiled = looping_graph(3);
    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut state = Tally::default();
    let err = compiled
        .run_in_place(&mut state, &RunContext::new().with_cancel(cancel))
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::Cancelled));
    assert_eq!(state, Tally::default());
}

/// **Scenario**: Tasks mode brackets each step with start/end events.
#[tokio::test]
async fn tasks_stream_brackets_each_step() {
    let compiled = looping_graph(2);
    let events: Vec<StreamEvent<Tally>> = compiled
        .stream(Tally::default(), RunContext::new(), [StreamMode::Tasks])
        .collect()
        .await;
    let kinds: Vec<&str> = events
        .iter()
        .map(|e| match e {
            StreamEvent::TaskStart { .. } => "start",
            StreamEvent::TaskEnd { .. } => "end",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["start", "end", "start", "end"]);
}

/// **Scenario**: only the requested stream modes are emitted.
#[tokio::test]
async fn updates_mode_emits_only_updates() {
    let compiled = looping_graph(2);
    let (tx, mut rx) = mpsc::channel(16);
    let ctx = RunContext::new().with_stream(tx, [StreamMode::Updates]);
    compiled.invoke(Tally::default(), &ctx).await.unwrap();
    drop(ctx);

    let mut updates = Vec::new();
    while let Some(event) = rx.recv().await {
        match event {
            StreamEvent::Updates { node_id, update } => updates.push((node_id, update.0)),
            other => panic!("unexpected event {:?}", other),
        }
    }
    assert_eq!(updates, vec![("inc".to_string(), 1), ("inc".to_string(), 1)]);
}

struct CountingMiddleware {
    calls: AtomicUsize,
}

#[async_trait]
impl NodeMiddleware<Tally> for CountingMiddleware {
    async fn around_run(
        &self,
        node_id: &str,
        state: Tally,
        inner: NodeRunFn<Tally>,
    ) -> Result<(i32, String), AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (delta, _) = inner(state).await?;
        Ok((delta * 10, format!("wrapped:{}", node_id)))
    }
}

/// **Scenario**: middleware wraps every node run and may rewrite the update.
#[tokio::test]
async fn middleware_wraps_each_node_run() {
    let middleware = Arc::new(CountingMiddleware {
        calls: AtomicUsize::new(0),
    });
    let mut graph = StateGraph::<Tally>::new();
    graph.add_node("inc", Arc::new(Inc)).add_edge(START, "inc").add_edge("inc", END);
    let compiled = graph
        .with_middleware(middleware.clone())
        .compile()
        .unwrap();

    let out = compiled
        .invoke(Tally::default(), &RunContext::new())
        .await
        .unwrap();

    assert_eq!(middleware.calls.load(Ordering::SeqCst), 1);
    assert_eq!(out.count, 10);
    assert_eq!(out.trail, vec!["wrapped:inc".to_string()]);
}
