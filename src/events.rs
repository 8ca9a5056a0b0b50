//! Pipeline progress events.
//!
//! The engine reports field resolution and generator calls here so the
//! CLI can drive its progress line without the engine knowing about it.

use std::fmt;

use tokio::sync::broadcast;
use tracing::trace;

use crate::ingest::FieldKind;

/// The two generation stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Plan,
    Final,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Plan => f.write_str("plan"),
            Stage::Final => f.write_str("final assessment"),
        }
    }
}

/// Events that flow out of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// One input field finished resolving.
    FieldResolved {
        field: FieldKind,
        provided: bool,
        failed: bool,
    },
    /// A generation call is about to be made.
    StageStarted { stage: Stage },
    /// A generation call returned.
    StageFinished { stage: Stage, ok: bool },
}

/// Fan-out of [`Event`]s. Slow listeners lag and skip events; the engine
/// never waits on them.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            sender: broadcast::Sender::new(capacity),
        }
    }

    /// Returns how many listeners were handed the event.
    pub fn emit(&self, event: Event) -> usize {
        trace!(?event, "event");
        self.sender.send(event).unwrap_or_default()
    }

    /// Listen from now on. Earlier events are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(32)
    }
}
