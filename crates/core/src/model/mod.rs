pub mod event;
pub mod trace;

pub use event::{EventId, Phase, TraceEvent};
pub use trace::{Process, Thread, TraceModel};
