//! Trace ingestion: raw JSON → [`TraceModel`].
//!
//! Accepts the Chrome trace event format in both shapes: a bare array of
//! events, or an object carrying the array under `traceEvents` (or `events`).

mod depth;
mod record;

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;
use tracescope_protocol::SharedStr;

use crate::model::{EventId, Phase, Process, Thread, TraceEvent, TraceModel};
use record::{Numeric, RawEvent};

/// Object keys that may hold the event array.
const EVENT_ARRAY_KEYS: &[&str] = &["traceEvents", "events"];

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("expected an array of trace events or an object containing one, found {0}")]
    NotATrace(&'static str),
    #[error("object has no `traceEvents` or `events` array")]
    MissingEventArray,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Why a record did not make it into the model.
#[derive(Debug, Default)]
struct Dropped {
    malformed: usize,
    unattributed: usize,
    bad_time: usize,
}

impl Dropped {
    fn total(&self) -> usize {
        self.malformed + self.unattributed + self.bad_time
    }
}

/// Parse bytes as JSON and ingest them.
pub fn ingest_slice(data: &[u8]) -> Result<TraceModel, IngestError> {
    let value: Value = serde_json::from_slice(data)?;
    Ok(ingest(value)?)
}

/// Build a [`TraceModel`] from an already-parsed JSON value.
pub fn ingest(raw: Value) -> Result<TraceModel, FormatError> {
    let records = event_array(raw)?;

    let mut processes: BTreeMap<u64, Process> = BTreeMap::new();
    let mut min_time = f64::INFINITY;
    let mut max_time = f64::NEG_INFINITY;
    let mut dropped = Dropped::default();

    for value in records {
        let mut raw: RawEvent = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed trace record");
                dropped.malformed += 1;
                continue;
            }
        };

        let pid = raw.process_id();
        let tid = raw.thread_id();
        if pid.unwrap_or(0) == 0 && tid.unwrap_or(0) == 0 {
            dropped.unattributed += 1;
            continue;
        }
        let pid = pid.unwrap_or(0);
        let tid = tid.unwrap_or(0);

        let phase = Phase::from_code(&raw.ph);
        if phase == Phase::Metadata && apply_naming(&mut processes, &raw, pid, tid) {
            continue;
        }

        let Some(start_time) = raw.ts.as_ref().and_then(Numeric::to_f64) else {
            tracing::debug!(name = %raw.name, "dropping record without a numeric `ts`");
            dropped.bad_time += 1;
            continue;
        };
        let duration = match &raw.dur {
            None => None,
            Some(dur) => match dur.to_f64() {
                Some(d) if d >= 0.0 => Some(d),
                _ => {
                    tracing::debug!(name = %raw.name, "dropping record with an invalid `dur`");
                    dropped.bad_time += 1;
                    continue;
                }
            },
        };

        let end_time = start_time + duration.unwrap_or(0.0);
        min_time = min_time.min(start_time);
        max_time = max_time.max(end_time);

        let args = raw.take_args();
        let event = TraceEvent {
            id: EventId(0),
            name: SharedStr::from(raw.name),
            category: raw.cat.filter(|c| !c.is_empty()).map(SharedStr::from),
            phase,
            start_time,
            duration,
            process_id: pid,
            thread_id: tid,
            args,
            depth: 0,
        };
        thread_entry(&mut processes, pid, tid).events.push(event);
    }

    let mut next_id = 0u64;
    for thread in processes.values_mut().flat_map(|p| p.threads.values_mut()) {
        // `sort_by` is stable: equal starts keep input order.
        thread
            .events
            .sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        thread.max_depth = depth::assign_depths(&mut thread.events);
        for event in &mut thread.events {
            event.id = EventId(next_id);
            next_id += 1;
        }
    }

    let (min_time, max_time) = if min_time.is_finite() && max_time.is_finite() {
        (min_time, max_time)
    } else {
        (0.0, 0.0)
    };

    let model = TraceModel {
        processes,
        min_time,
        max_time,
    };

    if dropped.total() > 0 {
        tracing::debug!(
            malformed = dropped.malformed,
            unattributed = dropped.unattributed,
            bad_time = dropped.bad_time,
            "dropped trace records"
        );
    }
    tracing::info!(
        processes = model.processes.len(),
        threads = model.thread_count(),
        events = next_id,
        dropped = dropped.total(),
        "ingested trace"
    );

    Ok(model)
}

/// Flatten the two accepted top-level shapes into one record list.
fn event_array(raw: Value) -> Result<Vec<Value>, FormatError> {
    match raw {
        Value::Array(records) => Ok(records),
        Value::Object(mut map) => {
            for key in EVENT_ARRAY_KEYS {
                if let Some(Value::Array(records)) = map.remove(*key) {
                    return Ok(records);
                }
            }
            tracing::debug!(
                keys = ?map.keys().take(8).collect::<Vec<_>>(),
                "object has no event array"
            );
            Err(FormatError::MissingEventArray)
        }
        Value::Null => Err(FormatError::NotATrace("null")),
        Value::Bool(_) => Err(FormatError::NotATrace("a boolean")),
        Value::Number(_) => Err(FormatError::NotATrace("a number")),
        Value::String(_) => Err(FormatError::NotATrace("a string")),
    }
}

/// Apply a `process_name` / `thread_name` record. Returns `false` if the
/// record is not a recognized naming event.
fn apply_naming(
    processes: &mut BTreeMap<u64, Process>,
    raw: &RawEvent,
    pid: u64,
    tid: u64,
) -> bool {
    let Some(name) = raw.args_name() else {
        return false;
    };
    match raw.name.as_str() {
        "process_name" => {
            process_entry(processes, pid).name = name.to_string();
            true
        }
        "thread_name" => {
            thread_entry(processes, pid, tid).name = name.to_string();
            true
        }
        _ => false,
    }
}

fn process_entry(processes: &mut BTreeMap<u64, Process>, pid: u64) -> &mut Process {
    processes.entry(pid).or_insert_with(|| Process::new(pid))
}

fn thread_entry(processes: &mut BTreeMap<u64, Process>, pid: u64, tid: u64) -> &mut Thread {
    process_entry(processes, pid)
        .threads
        .entry(tid)
        .or_insert_with(|| Thread::new(tid))
}
