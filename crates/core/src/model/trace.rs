use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::event::{EventId, TraceEvent};

/// One thread's track: its events sorted by start time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub thread_id: u64,
    pub name: String,
    pub events: Vec<TraceEvent>,
    /// Largest `depth` among `events`, 0 when empty.
    pub max_depth: u32,
}

impl Thread {
    pub fn new(thread_id: u64) -> Self {
        Self {
            thread_id,
            name: format!("Thread {thread_id}"),
            events: Vec::new(),
            max_depth: 0,
        }
    }

    /// Number of depth rows this thread's track needs.
    pub fn row_count(&self) -> u32 {
        self.max_depth + 1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Process {
    pub process_id: u64,
    pub name: String,
    pub threads: BTreeMap<u64, Thread>,
}

impl Process {
    pub fn new(process_id: u64) -> Self {
        Self {
            process_id,
            name: format!("Process {process_id}"),
            threads: BTreeMap::new(),
        }
    }

    pub fn thread(&self, thread_id: u64) -> Option<&Thread> {
        self.threads.get(&thread_id)
    }
}

/// The normalized trace: processes → threads → events.
///
/// Built once by [`crate::ingest`] and never mutated afterwards. Processes and
/// threads iterate in ascending id order, which is also the vertical layout
/// order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceModel {
    pub processes: BTreeMap<u64, Process>,
    pub min_time: f64,
    pub max_time: f64,
}

impl TraceModel {
    pub fn duration(&self) -> f64 {
        self.max_time - self.min_time
    }

    pub fn is_empty(&self) -> bool {
        self.event_count() == 0
    }

    pub fn process(&self, process_id: u64) -> Option<&Process> {
        self.processes.get(&process_id)
    }

    pub fn processes(&self) -> impl Iterator<Item = &Process> {
        self.processes.values()
    }

    /// All threads in layout order.
    pub fn threads(&self) -> impl Iterator<Item = &Thread> {
        self.processes.values().flat_map(|p| p.threads.values())
    }

    pub fn thread_count(&self) -> usize {
        self.processes.values().map(|p| p.threads.len()).sum()
    }

    pub fn event_count(&self) -> usize {
        self.threads().map(|t| t.events.len()).sum()
    }

    /// All drawable events in layout order.
    pub fn events(&self) -> impl Iterator<Item = &TraceEvent> {
        self.threads().flat_map(|t| &t.events)
    }

    /// Resolve an id handed out by this model.
    pub fn event(&self, id: EventId) -> Option<&TraceEvent> {
        let mut remaining = id.0;
        for thread in self.threads() {
            let len = thread.events.len() as u64;
            if remaining < len {
                return thread.events.get(remaining as usize);
            }
            remaining -= len;
        }
        None
    }
}
