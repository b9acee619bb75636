//! State graph: nodes + explicit edges (from → to) and optional conditional edges.
//!
//! Add nodes with `add_node`, define edges with `add_edge(from, to)` using `START`
//! and `END` for graph entry/exit, and `add_conditional_edges` to route on state.
//! Then `compile` to get a `CompiledStateGraph`.
//!
//! # Conditional edges
//!
//! From a source node, a routing function `(state) -> key` is called after the
//! node's update is applied; the key is used as the next node id, or looked up in
//! an optional path map. A node must have either one outgoing `add_edge` or
//! `add_conditional_edges`, not both. Cycles are allowed; termination is enforced
//! at run time by the run context's recursion limit.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::graph::compile_error::CompilationError;
use crate::graph::compiled::CompiledStateGraph;
use crate::graph::conditional::{ConditionalRouter, ConditionalRouterFn, NextEntry};
use crate::graph::node::Node;
use crate::graph::node_middleware::NodeMiddleware;
use crate::graph::GraphState;

/// Sentinel for graph entry: use as `from_id` in `add_edge(START, first_node_id)`.
pub const START: &str = "__start__";

/// Sentinel for graph exit: use as `to_id` in `add_edge(last_node_id, END)`.
pub const END: &str = "__end__";

/// State graph: nodes plus explicit edges and optional conditional edges.
///
/// **Interaction**: Accepts `Arc<dyn Node<S>>`; produces `CompiledStateGraph<S>`.
pub struct StateGraph<S>
where
    S: GraphState,
{
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    /// Edges (from_id, to_id). A node may have one outgoing edge or conditional edges, not both.
    edges: Vec<(String, String)>,
    conditional_edges: HashMap<String, ConditionalRouter<S>>,
    middleware: Option<Arc<dyn NodeMiddleware<S>>>,
}

impl<S> Default for StateGraph<S>
where
    S: GraphState,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> StateGraph<S>
where
    S: GraphState,
{
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: Vec::new(),
            conditional_edges: HashMap::new(),
            middleware: None,
        }
    }

    /// Attaches node middleware; the compiled graph wraps every node.run with it.
    pub fn with_middleware(self, middleware: Arc<dyn NodeMiddleware<S>>) -> Self {
        Self {
            middleware: Some(middleware),
            ..self
        }
    }

    /// Adds a node; replaces any node registered under the same id.
    pub fn add_node(&mut self, id: impl Into<String>, node: Arc<dyn Node<S>>) -> &mut Self {
        self.nodes.insert(id.into(), node);
        self
    }

    /// Adds an edge from `from_id` to `to_id`. Use `START` / `END` for entry / exit.
    pub fn add_edge(&mut self, from_id: impl Into<String>, to_id: impl Into<String>) -> &mut Self {
        self.edges.push((from_id.into(), to_id.into()));
        self
    }

    /// Adds conditional edges from `source`: the next node is determined by `path(state)`.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// graph.add_conditional_edges(
    ///     "agent",
    ///     Arc::new(|s: &AgentState| route(s).as_str().to_string()),
    ///     Some([("continue".into(), "tools".into()), ("end".into(), END.into())].into_iter().collect()),
    /// );
    /// ```
    pub fn add_conditional_edges(
        &mut self,
        source: impl Into<String>,
        path: ConditionalRouterFn<S>,
        path_map: Option<HashMap<String, String>>,
    ) -> &mut Self {
        self.conditional_edges
            .insert(source.into(), ConditionalRouter::new(path, path_map));
        self
    }

    /// Builds the executable graph.
    ///
    /// Validates that every edge endpoint exists, exactly one edge leaves START,
    /// something reaches END, and every node has at most one way out.
    pub fn compile(self) -> Result<CompiledStateGraph<S>, CompilationError> {
        for (from, to) in &self.edges {
            if from != START && !self.nodes.contains_key(from) {
                return Err(CompilationError::NodeNotFound(from.clone()));
            }
            if to != END && !self.nodes.contains_key(to) {
                return Err(CompilationError::NodeNotFound(to.clone()));
            }
        }
        for (source, router) in &self.conditional_edges {
            if !self.nodes.contains_key(source) {
                return Err(CompilationError::NodeNotFound(source.clone()));
            }
            if let Some(path_map) = &router.path_map {
                for target in path_map.values() {
                    if target != END && !self.nodes.contains_key(target) {
                        return Err(CompilationError::InvalidConditionalPathMap(target.clone()));
                    }
                }
            }
        }

        let mut start_edges = self
            .edges
            .iter()
            .filter(|(f, _)| f == START)
            .map(|(_, t)| t.clone());
        let head = start_edges.next();
        let first = match (head, start_edges.count()) {
            (None, _) => return Err(CompilationError::MissingStart),
            (Some(first), 0) => first,
            (Some(_), rest) => return Err(CompilationError::MultipleStart(rest + 1)),
        };

        let has_end = self.edges.iter().any(|(_, t)| t == END)
            || self.conditional_edges.values().any(|r| {
                r.path_map
                    .as_ref()
                    .map_or(true, |m| m.values().any(|v| v == END))
            });
        if !has_end {
            return Err(CompilationError::MissingEnd);
        }

        let mut edge_froms = HashSet::new();
        for (from, _) in self.edges.iter().filter(|(f, _)| f != START) {
            if !edge_froms.insert(from.clone()) {
                return Err(CompilationError::DuplicateEdge(from.clone()));
            }
        }
        for source in self.conditional_edges.keys() {
            if edge_froms.contains(source) {
                return Err(CompilationError::NodeHasBothEdgeAndConditional(
                    source.clone(),
                ));
            }
        }

        let mut next_map: HashMap<String, NextEntry<S>> = self
            .edges
            .iter()
            .filter(|(f, _)| f != START)
            .map(|(f, t)| (f.clone(), NextEntry::Unconditional(t.clone())))
            .collect();
        for (source, router) in self.conditional_edges {
            next_map.insert(source, NextEntry::Conditional(router));
        }

        Ok(CompiledStateGraph {
            nodes: self.nodes,
            first_node_id: first,
            next_map,
            middleware: self.middleware,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;
    use async_trait::async_trait;

    #[derive(Clone, Debug, Default)]
    struct Log(Vec<&'static str>);

    impl GraphState for Log {
        type Update = &'static str;

        fn apply_update(&mut self, update: Self::Update) {
            self.0.push(update);
        }
    }

    struct Named(&'static str);

    #[async_trait]
    impl Node<Log> for Named {
        fn id(&self) -> &str {
            self.0
        }

        async fn run(&self, _state: &Log) -> Result<&'static str, AgentError> {
            Ok(self.0)
        }
    }

    fn graph_with(ids: &[&'static str]) -> StateGraph<Log> {
        let mut g = StateGraph::new();
        for id in ids {
            g.add_node(*id, Arc::new(Named(id)));
        }
        g
    }

    /// **Scenario**: an edge to an unregistered node fails with NodeNotFound.
    #[test]
    fn compile_rejects_unknown_node() {
        let mut g = graph_with(&["a"]);
        g.add_edge(START, "a").add_edge("a", "b");
        assert!(matches!(g.compile(), Err(CompilationError::NodeNotFound(id)) if id == "b"));
    }

    /// **Scenario**: no edge from START fails with MissingStart.
    #[test]
    fn compile_rejects_missing_start() {
        let mut g = graph_with(&["a"]);
        g.add_edge("a", END);
        assert!(matches!(g.compile(), Err(CompilationError::MissingStart)));
    }

    /// **Scenario**: two edges from START fail with MultipleStart(2).
    #[test]
    fn compile_rejects_two_starts() {
        let mut g = graph_with(&["a", "b"]);
        g.add_edge(START, "a")
            .add_edge(START, "b")
            .add_edge("a", END)
            .add_edge("b", END);
        assert!(matches!(g.compile(), Err(CompilationError::MultipleStart(2))));
    }

    /// **Scenario**: a pure cycle with no way to END fails with MissingEnd.
    #[test]
    fn compile_rejects_cycle_without_end() {
        let mut g = graph_with(&["a", "b"]);
        g.add_edge(START, "a").add_edge("a", "b").add_edge("b", "a");
        assert!(matches!(g.compile(), Err(CompilationError::MissingEnd)));
    }

    /// **Scenario**: a node with an edge and conditional edges is rejected.
    #[test]
    fn compile_rejects_edge_and_conditional_on_same_node() {
        let mut g = graph_with(&["a"]);
        g.add_edge(START, "a").add_edge("a", END);
        g.add_conditional_edges("a", Arc::new(|_: &Log| END.to_string()), None);
        assert!(matches!(
            g.compile(),
            Err(CompilationError::NodeHasBothEdgeAndConditional(id)) if id == "a"
        ));
    }

    /// **Scenario**: a path map pointing at an unknown node is rejected.
    #[test]
    fn compile_rejects_bad_path_map_target() {
        let mut g = graph_with(&["a"]);
        g.add_edge(START, "a");
        g.add_conditional_edges(
            "a",
            Arc::new(|_: &Log| "go".to_string()),
            Some([("go".to_string(), "missing".to_string())].into_iter().collect()),
        );
        assert!(matches!(
            g.compile(),
            Err(CompilationError::InvalidConditionalPathMap(t)) if t == "missing"
        ));
    }

    /// **Scenario**: a cycle with a conditional exit compiles.
    #[test]
    fn compile_accepts_cycle_with_conditional_exit() {
        let mut g = graph_with(&["agent", "tools"]);
        g.add_edge(START, "agent").add_edge("tools", "agent");
        g.add_conditional_edges(
            "agent",
            Arc::new(|_: &Log| "end".to_string()),
            Some(
                [
                    ("continue".to_string(), "tools".to_string()),
                    ("end".to_string(), END.to_string()),
                ]
                .into_iter()
                .collect(),
            ),
        );
        assert!(g.compile().is_ok());
    }
}
