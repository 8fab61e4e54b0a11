//! State Machine Runtime
//!
//! Flat, typed state machines for lifecycle states (animation handles,
//! trigger arming). States and events are small `Copy` enums; transitions are
//! a lookup table, and a state with no outgoing transitions is terminal.

use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Bound shared by state and event types
pub trait FsmKey: Copy + Eq + Hash + Debug {}

impl<T: Copy + Eq + Hash + Debug> FsmKey for T {}

/// Number of transitions kept in a machine's history
pub const HISTORY_LIMIT: usize = 8;

/// Builder for creating state machines
pub struct StateMachineBuilder<S, E> {
    initial_state: S,
    transitions: Vec<(S, E, S)>,
}

impl<S: FsmKey, E: FsmKey> StateMachineBuilder<S, E> {
    pub fn new(initial_state: S) -> Self {
        Self {
            initial_state,
            transitions: Vec::new(),
        }
    }

    /// Add a simple transition (from, event, to)
    pub fn on(mut self, from: S, event: E, to: S) -> Self {
        self.transitions.push((from, event, to));
        self
    }

    /// Build the state machine
    pub fn build(self) -> StateMachine<S, E> {
        StateMachine::new(self.initial_state, self.transitions)
    }
}

/// A state machine instance
#[derive(Clone, Debug)]
pub struct StateMachine<S, E> {
    current_state: S,
    table: FxHashMap<(S, E), S>,
    /// Most recent transitions, oldest first, at most [`HISTORY_LIMIT`]
    history: SmallVec<[(S, E, S); HISTORY_LIMIT]>,
}

impl<S: FsmKey, E: FsmKey> StateMachine<S, E> {
    /// Create a new state machine with an initial state and `(from, event, to)`
    /// transitions.
    ///
    /// A later transition for the same `(from, event)` pair replaces an
    /// earlier one.
    pub fn new(initial_state: S, transitions: impl IntoIterator<Item = (S, E, S)>) -> Self {
        let table = transitions
            .into_iter()
            .map(|(from, event, to)| ((from, event), to))
            .collect();
        Self {
            current_state: initial_state,
            table,
            history: SmallVec::new(),
        }
    }

    /// Create a builder for a state machine
    pub fn builder(initial_state: S) -> StateMachineBuilder<S, E> {
        StateMachineBuilder::new(initial_state)
    }

    /// Get the current state
    pub fn current_state(&self) -> S {
        self.current_state
    }

    /// Check if we're in a specific state
    pub fn is_in(&self, state: S) -> bool {
        self.current_state == state
    }

    /// Whether the current state has no outgoing transitions
    pub fn is_terminal(&self) -> bool {
        !self.table.keys().any(|(from, _)| *from == self.current_state)
    }

    /// Recent transitions, oldest first
    pub fn history(&self) -> &[(S, E, S)] {
        &self.history
    }

    /// Clear transition history
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Send an event, returning the new state if a transition happened
    pub fn try_send(&mut self, event: E) -> Option<S> {
        let from = self.current_state;
        let to = *self.table.get(&(from, event))?;
        self.current_state = to;
        if self.history.len() == HISTORY_LIMIT {
            self.history.remove(0);
        }
        self.history.push((from, event, to));
        tracing::trace!(?from, ?event, ?to, "fsm transition");
        Some(to)
    }

    /// Send an event to the state machine, returning the (possibly unchanged) state
    pub fn send(&mut self, event: E) -> S {
        self.try_send(event).unwrap_or(self.current_state)
    }
}
