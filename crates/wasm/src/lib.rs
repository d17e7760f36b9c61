use std::sync::Mutex;

use serde_json::json;
use tracescope_core::views::{hit_test as hit_test_view, render_timeline};
use tracescope_core::{EventId, LayoutConfig, TimeWindow, TraceModel, ingest_slice};
use tracescope_protocol::{Point, Viewport};
use wasm_bindgen::prelude::*;

/// Loaded traces; a handle is an index into this list. Releasing a trace
/// frees its slot for the next load, so a host that loads one trace at a
/// time keeps a single model alive.
static TRACES: Mutex<Vec<Option<TraceModel>>> = Mutex::new(Vec::new());

fn with_trace<T>(handle: usize, f: impl FnOnce(&TraceModel) -> Result<T, String>) -> Result<T, String> {
    let traces = TRACES.lock().map_err(|_| "trace store poisoned".to_string())?;
    let model = traces
        .get(handle)
        .and_then(Option::as_ref)
        .ok_or_else(|| format!("invalid trace handle {handle}"))?;
    f(model)
}

fn load(data: &[u8]) -> Result<usize, String> {
    let model = ingest_slice(data).map_err(|e| e.to_string())?;
    let mut traces = TRACES.lock().map_err(|_| "trace store poisoned".to_string())?;
    match traces.iter().position(Option::is_none) {
        Some(free) => {
            traces[free] = Some(model);
            Ok(free)
        }
        None => {
            traces.push(Some(model));
            Ok(traces.len() - 1)
        }
    }
}

fn frame(
    handle: usize,
    window: TimeWindow,
    viewport: Viewport,
    selected: Option<u64>,
) -> Result<String, String> {
    with_trace(handle, |model| {
        let commands = render_timeline(
            model,
            &window,
            &viewport,
            &LayoutConfig::default(),
            selected.map(EventId),
        );
        serde_json::to_string(&commands).map_err(|e| e.to_string())
    })
}

fn hit(handle: usize, window: TimeWindow, viewport: Viewport, point: Point) -> Result<String, String> {
    with_trace(handle, |model| {
        let event = hit_test_view(model, &window, &viewport, &LayoutConfig::default(), point);
        serde_json::to_string(&event).map_err(|e| e.to_string())
    })
}

fn bounds(handle: usize) -> Result<String, String> {
    with_trace(handle, |model| {
        Ok(json!({
            "min_time": model.min_time,
            "max_time": model.max_time,
            "processes": model.processes.len(),
            "threads": model.thread_count(),
            "events": model.event_count(),
        })
        .to_string())
    })
}

/// Parse a trace from bytes (JSON). Returns a handle for later calls.
#[wasm_bindgen]
pub fn load_trace(data: &[u8]) -> Result<usize, JsError> {
    load(data).map_err(|e| JsError::new(&e))
}

fn release(handle: usize) -> Result<(), String> {
    let mut traces = TRACES.lock().map_err(|_| "trace store poisoned".to_string())?;
    match traces.get_mut(handle) {
        Some(slot) if slot.is_some() => {
            *slot = None;
            // Drop trailing free slots so the store shrinks back.
            while matches!(traces.last(), Some(None)) {
                traces.pop();
            }
            Ok(())
        }
        _ => Err(format!("invalid trace handle {handle}")),
    }
}

/// Free a loaded trace. The handle is invalid until a later load reuses it.
#[wasm_bindgen]
pub fn release_trace(handle: usize) -> Result<(), JsError> {
    release(handle).map_err(|e| JsError::new(&e))
}

/// Render one frame of the timeline, returning render commands as JSON.
#[wasm_bindgen]
pub fn render_frame(
    handle: usize,
    start: f64,
    end: f64,
    scroll_y: f64,
    width: f64,
    height: f64,
    selected_event: Option<u64>,
) -> Result<String, JsError> {
    let viewport = Viewport::new(width, height).with_scroll(scroll_y);
    frame(handle, TimeWindow::new(start, end), viewport, selected_event)
        .map_err(|e| JsError::new(&e))
}

/// The event under canvas point `(x, y)` as JSON, or `null`.
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn hit_test(
    handle: usize,
    start: f64,
    end: f64,
    scroll_y: f64,
    width: f64,
    height: f64,
    x: f64,
    y: f64,
) -> Result<String, JsError> {
    let viewport = Viewport::new(width, height).with_scroll(scroll_y);
    hit(handle, TimeWindow::new(start, end), viewport, Point::new(x, y))
        .map_err(|e| JsError::new(&e))
}

/// Time bounds and sizes of a loaded trace as JSON.
#[wasm_bindgen]
pub fn trace_bounds(handle: usize) -> Result<String, JsError> {
    bounds(handle).map_err(|e| JsError::new(&e))
}
