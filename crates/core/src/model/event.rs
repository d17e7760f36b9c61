use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracescope_protocol::SharedStr;

/// Stable identity of an event within one `TraceModel`.
///
/// Ids are dense ordinals in layout order: processes by id, threads by id,
/// events by start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub u64);

/// Event phase, from the `ph` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// `"X"`: a span with a start and (usually) a duration.
    Complete,
    /// `"M"`: names a process or thread.
    Metadata,
    /// Any other phase code; kept for display, never interpreted.
    Other(String),
}

impl Phase {
    pub fn from_code(code: &str) -> Self {
        match code {
            "X" => Self::Complete,
            "M" => Self::Metadata,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::Complete => "X",
            Self::Metadata => "M",
            Self::Other(code) => code,
        }
    }
}

/// One timed span or point on a thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    pub id: EventId,
    pub name: SharedStr,
    pub category: Option<SharedStr>,
    pub phase: Phase,
    /// Start time in microseconds.
    pub start_time: f64,
    /// Duration in microseconds; `None` for instantaneous events.
    pub duration: Option<f64>,
    pub process_id: u64,
    pub thread_id: u64,
    pub args: Option<Map<String, Value>>,
    /// Nesting level among overlapping events on the same thread.
    pub depth: u32,
}

impl TraceEvent {
    /// End time; equal to the start for point events.
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration.unwrap_or(0.0)
    }

    pub fn is_instant(&self) -> bool {
        self.duration.is_none()
    }

    /// `args` rendered as indented JSON, for detail views.
    pub fn pretty_args(&self) -> Option<String> {
        let args = self.args.as_ref()?;
        serde_json::to_string_pretty(args).ok()
    }
}
