//! Progress events for workflow runs.
//!
//! The runner emits via [`EventBus::emit`]; displays subscribe via
//! [`EventBus::subscribe`]. Built on [`tokio::sync::broadcast`] so a
//! run can be rendered while it is still going.

use tokio::sync::broadcast;

use crate::completion::TokenUsage;

/// Default channel capacity. Streamed deltas are small and many.
pub const DEFAULT_CAPACITY: usize = 1024;

/// What happened during a run. Task indices are zero-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    WorkflowStarted { tasks: usize },
    TaskStarted { index: usize },
    /// A piece of model output as it streams in.
    TaskDelta { index: usize, text: String },
    TaskFinished {
        index: usize,
        output: String,
        usage: Option<TokenUsage>,
    },
    WorkflowFinished { completed: usize },
    WorkflowFailed { index: usize, error: String },
}

/// A broadcast channel that any component can emit to or subscribe from.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all current subscribers.
    /// Returns the number of receivers that will see it.
    pub fn emit(&self, event: Event) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Subscribe to events. Returns a receiver that yields all
    /// future events (does not replay past ones).
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
