//! Debug channel of the reconciliation loop.
//!
//! Events only flow when the engine's debug flag is set. Without an explicit
//! sink they go to [`TracingSink`], which forwards them to `tracing` at debug
//! level; [`NoopSink`] drops them.

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;

/// Per-sweep change map: field path -> `"<old> --> <new>"` or `"Inactive"`.
pub type ChangeMap = IndexMap<String, String>;

pub const INACTIVE_MARKER: &str = "Inactive";

#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    /// External data changed and reached the engine.
    DataChanged { snapshot: Value },
    /// Schema was replaced.
    SchemaChanged { snapshot: Value },
    /// Mode switched.
    ModeChanged { mode: String, snapshot: Value },
    /// Registry rebuilt.
    Initialized { records: usize },
    /// A reconciliation pass started.
    Update { snapshot: Value },
    /// Incoming data is the engine's own last write.
    SkippedOwnWrite,
    /// Defaults changed nothing.
    SkippedUnchanged,
    /// Outcome of one application sweep.
    Changes { changes: ChangeMap },
    /// Reconciled data replaced the external data.
    Pushed { snapshot: Value },
}

impl TraceEvent {
    pub fn name(&self) -> &'static str {
        match self {
            TraceEvent::DataChanged { .. } => "data-changed",
            TraceEvent::SchemaChanged { .. } => "schema-changed",
            TraceEvent::ModeChanged { .. } => "mode-changed",
            TraceEvent::Initialized { .. } => "initialized",
            TraceEvent::Update { .. } => "update",
            TraceEvent::SkippedOwnWrite => "skipped-own-write",
            TraceEvent::SkippedUnchanged => "skipped-unchanged",
            TraceEvent::Changes { .. } => "changes",
            TraceEvent::Pushed { .. } => "pushed",
        }
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceEvent::DataChanged { snapshot }
            | TraceEvent::SchemaChanged { snapshot }
            | TraceEvent::Update { snapshot }
            | TraceEvent::Pushed { snapshot } => write!(f, "{} {}", self.name(), snapshot),
            TraceEvent::ModeChanged { mode, snapshot } => {
                write!(f, "{} {} {}", self.name(), mode, snapshot)
            }
            TraceEvent::Initialized { records } => write!(f, "{} {} records", self.name(), records),
            TraceEvent::SkippedOwnWrite | TraceEvent::SkippedUnchanged => {
                write!(f, "{}", self.name())
            }
            TraceEvent::Changes { changes } => {
                write!(f, "{} ", self.name())?;
                f.debug_map().entries(changes.iter()).finish()
            }
        }
    }
}

/// Receiver of debug events. `tag` identifies the emitting form (or loop).
pub trait TraceSink {
    fn record(&self, tag: &str, event: &TraceEvent);
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl TraceSink for NoopSink {
    fn record(&self, _tag: &str, _event: &TraceEvent) {}
}

/// Forwards events to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn record(&self, tag: &str, event: &TraceEvent) {
        tracing::debug!(target: "form_defaults::trace", tag, event = event.name(), "{event}");
    }
}
