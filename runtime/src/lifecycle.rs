//! Component lifecycle states and transition legality.
//!
//! The host drives every component along this graph:
//!
//! ```text
//! Launched -> Created -> Started -> Resumed <-> Paused -> Stopped -> Destroyed
//!                           ^                                |
//!                           +-------- Restarted <------------+
//! ```
//!
//! The graph is the single source of truth for which hops are legal; the
//! host composes multi-hop sequences (launch, finish, resume-from-stopped)
//! out of legal single hops and fails fast on anything else.

use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur while driving a lifecycle
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// Invalid lifecycle transition
    #[error("Invalid transition from {from:?} to {to:?}: {reason}")]
    InvalidTransition {
        from: LifecycleState,
        to: LifecycleState,
        reason: String,
    },
}

/// States a host-managed component moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Accepted by the host, no callback delivered yet
    Launched,
    Created,
    Started,
    Resumed,
    Paused,
    Stopped,
    Restarted,
    Destroyed,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LifecycleState::Launched => "launched",
            LifecycleState::Created => "created",
            LifecycleState::Started => "started",
            LifecycleState::Resumed => "resumed",
            LifecycleState::Paused => "paused",
            LifecycleState::Stopped => "stopped",
            LifecycleState::Restarted => "restarted",
            LifecycleState::Destroyed => "destroyed",
        };
        write!(f, "{}", name)
    }
}

/// Legal transitions between lifecycle states.
///
/// Edges carry the name of the callback the host delivers when taking
/// that hop.
#[derive(Debug)]
pub struct TransitionGraph {
    graph: DiGraph<LifecycleState, &'static str>,
    node_index: HashMap<LifecycleState, NodeIndex>,
}

impl TransitionGraph {
    pub fn new() -> Self {
        let mut this = Self {
            graph: DiGraph::new(),
            node_index: HashMap::new(),
        };
        this.initialize();
        this
    }

    fn initialize(&mut self) {
        for state in [
            LifecycleState::Launched,
            LifecycleState::Created,
            LifecycleState::Started,
            LifecycleState::Resumed,
            LifecycleState::Paused,
            LifecycleState::Stopped,
            LifecycleState::Restarted,
            LifecycleState::Destroyed,
        ] {
            let idx = self.graph.add_node(state);
            self.node_index.insert(state, idx);
        }

        self.add_edge(LifecycleState::Launched, LifecycleState::Created, "on_create");
        self.add_edge(LifecycleState::Created, LifecycleState::Started, "on_start");
        self.add_edge(LifecycleState::Started, LifecycleState::Resumed, "on_resume");
        self.add_edge(LifecycleState::Resumed, LifecycleState::Paused, "on_pause");
        self.add_edge(LifecycleState::Paused, LifecycleState::Resumed, "on_resume");
        self.add_edge(LifecycleState::Paused, LifecycleState::Stopped, "on_stop");
        self.add_edge(LifecycleState::Stopped, LifecycleState::Restarted, "on_restart");
        self.add_edge(LifecycleState::Restarted, LifecycleState::Started, "on_start");
        self.add_edge(LifecycleState::Stopped, LifecycleState::Destroyed, "on_destroy");
    }

    fn add_edge(&mut self, from: LifecycleState, to: LifecycleState, hook: &'static str) {
        if let (Some(&from_idx), Some(&to_idx)) =
            (self.node_index.get(&from), self.node_index.get(&to))
        {
            self.graph.add_edge(from_idx, to_idx, hook);
        }
    }

    /// Check whether a single hop is legal
    pub fn is_valid_transition(&self, from: LifecycleState, to: LifecycleState) -> bool {
        self.find_edge(from, to).is_some()
    }

    /// The callback delivered when taking the hop, if the hop is legal
    pub fn transition_hook(&self, from: LifecycleState, to: LifecycleState) -> Option<&'static str> {
        self.find_edge(from, to)
            .and_then(|edge| self.graph.edge_weight(edge).copied())
    }

    fn find_edge(
        &self,
        from: LifecycleState,
        to: LifecycleState,
    ) -> Option<petgraph::graph::EdgeIndex> {
        match (self.node_index.get(&from), self.node_index.get(&to)) {
            (Some(&from_idx), Some(&to_idx)) => self.graph.find_edge(from_idx, to_idx),
            _ => None,
        }
    }
}

impl Default for TransitionGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-component lifecycle tracker
#[derive(Debug)]
pub struct Lifecycle {
    state: LifecycleState,
}

impl Lifecycle {
    /// A freshly accepted component
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Launched,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Move to `to`, rejecting hops the graph does not allow
    pub fn advance(
        &mut self,
        graph: &TransitionGraph,
        to: LifecycleState,
    ) -> Result<(), LifecycleError> {
        if !graph.is_valid_transition(self.state, to) {
            return Err(LifecycleError::InvalidTransition {
                from: self.state,
                to,
                reason: "no such edge in the lifecycle graph".to_string(),
            });
        }
        self.state = to;
        Ok(())
    }

    pub fn is_destroyed(&self) -> bool {
        self.state == LifecycleState::Destroyed
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_has_all_states_and_edges() {
        let graph = TransitionGraph::new();
        assert_eq!(graph.graph.node_count(), 8);
        assert_eq!(graph.graph.edge_count(), 9);
    }

    #[test]
    fn valid_transitions() {
        let graph = TransitionGraph::new();

        assert!(graph.is_valid_transition(LifecycleState::Launched, LifecycleState::Created));
        assert!(graph.is_valid_transition(LifecycleState::Resumed, LifecycleState::Paused));
        assert!(graph.is_valid_transition(LifecycleState::Paused, LifecycleState::Resumed));
        assert!(graph.is_valid_transition(LifecycleState::Stopped, LifecycleState::Restarted));
        assert!(graph.is_valid_transition(LifecycleState::Stopped, LifecycleState::Destroyed));

        assert!(!graph.is_valid_transition(LifecycleState::Resumed, LifecycleState::Destroyed));
        assert!(!graph.is_valid_transition(LifecycleState::Destroyed, LifecycleState::Created));
        assert!(!graph.is_valid_transition(LifecycleState::Created, LifecycleState::Resumed));
    }

    #[test]
    fn hooks_name_the_delivered_callback() {
        let graph = TransitionGraph::new();
        assert_eq!(
            graph.transition_hook(LifecycleState::Launched, LifecycleState::Created),
            Some("on_create")
        );
        assert_eq!(
            graph.transition_hook(LifecycleState::Paused, LifecycleState::Resumed),
            Some("on_resume")
        );
        assert_eq!(
            graph.transition_hook(LifecycleState::Resumed, LifecycleState::Stopped),
            None
        );
    }

    #[test]
    fn tracker_rejects_illegal_hops() {
        let graph = TransitionGraph::new();
        let mut lifecycle = Lifecycle::new();

        lifecycle.advance(&graph, LifecycleState::Created).unwrap();
        lifecycle.advance(&graph, LifecycleState::Started).unwrap();
        lifecycle.advance(&graph, LifecycleState::Resumed).unwrap();

        let err = lifecycle
            .advance(&graph, LifecycleState::Destroyed)
            .unwrap_err();
        match err {
            LifecycleError::InvalidTransition { from, to, .. } => {
                assert_eq!(from, LifecycleState::Resumed);
                assert_eq!(to, LifecycleState::Destroyed);
            }
        }
        // state unchanged after a rejected hop
        assert_eq!(lifecycle.state(), LifecycleState::Resumed);
    }

    #[test]
    fn full_restart_path_is_legal() {
        let graph = TransitionGraph::new();
        let mut lifecycle = Lifecycle::new();
        for state in [
            LifecycleState::Created,
            LifecycleState::Started,
            LifecycleState::Resumed,
            LifecycleState::Paused,
            LifecycleState::Stopped,
            LifecycleState::Restarted,
            LifecycleState::Started,
            LifecycleState::Resumed,
            LifecycleState::Paused,
            LifecycleState::Stopped,
            LifecycleState::Destroyed,
        ] {
            lifecycle.advance(&graph, state).unwrap();
        }
        assert!(lifecycle.is_destroyed());
    }
}
