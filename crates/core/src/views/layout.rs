use std::collections::btree_map;

use serde::{Deserialize, Serialize};
use tracescope_protocol::Viewport;

use crate::model::{Process, Thread, TraceModel};

/// Narrowest rectangle drawn for an event; instants and sub-pixel spans are
/// widened to this.
pub const MIN_RECT_WIDTH: f64 = 1.0;

/// Fixed layout constants, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Height of one depth row inside a thread track.
    pub row_height: f64,
    /// Width of the label column on the left; events never draw there.
    pub label_width: f64,
    /// Height of a process header band.
    pub header_height: f64,
    /// Gap after each thread track.
    pub track_padding: f64,
    /// Rectangles narrower than this get no text.
    pub min_label_width: f64,
    pub font_size: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            row_height: 20.0,
            label_width: 150.0,
            header_height: 24.0,
            track_padding: 4.0,
            min_label_width: 30.0,
            font_size: 11.0,
        }
    }
}

impl LayoutConfig {
    pub fn track_height(&self, thread: &Thread) -> f64 {
        f64::from(thread.row_count()) * self.row_height
    }

    /// Total stacked height of the whole model, unscrolled.
    pub fn content_height(&self, model: &TraceModel) -> f64 {
        let headers = model.processes.len() as f64 * self.header_height;
        let tracks: f64 = model
            .threads()
            .map(|t| self.track_height(t) + self.track_padding)
            .sum();
        headers + tracks
    }
}

/// The visible time range, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn full(model: &TraceModel) -> Self {
        Self::new(model.min_time, model.max_time)
    }

    pub fn range(&self) -> f64 {
        self.end - self.start
    }

    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    /// Zero, negative or non-finite ranges cannot be mapped to pixels.
    pub fn is_degenerate(&self) -> bool {
        let range = self.range();
        !(range > 0.0 && range.is_finite() && self.start.is_finite())
    }

    /// Whether the closed interval `[start, end]` overlaps the window.
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        end >= self.start && start <= self.end
    }
}

/// The affine time ↔ x mapping for one frame:
/// `x(t) = left + (t - window.start) / range * width`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    start: f64,
    range: f64,
    left: f64,
    width: f64,
}

impl TimeScale {
    /// `None` when the window is degenerate or there is no room right of the
    /// label column.
    pub fn new(window: &TimeWindow, viewport: &Viewport, layout: &LayoutConfig) -> Option<Self> {
        let width = viewport.width - layout.label_width;
        if window.is_degenerate() || !(width > 0.0) {
            return None;
        }
        Some(Self {
            start: window.start,
            range: window.range(),
            left: layout.label_width,
            width,
        })
    }

    pub fn x(&self, t: f64) -> f64 {
        self.left + (t - self.start) / self.range * self.width
    }

    pub fn time_at(&self, x: f64) -> f64 {
        self.start + (x - self.left) / self.width * self.range
    }

    /// Horizontal extent `(x, w)` of the rectangle drawn for `[start, end]`:
    /// clipped to the track area, at least [`MIN_RECT_WIDTH`] wide.
    pub fn span(&self, start: f64, end: f64) -> (f64, f64) {
        let x0 = self.x(start).max(self.left);
        let x1 = self.x(end).min(self.left + self.width);
        (x0, (x1 - x0).max(MIN_RECT_WIDTH))
    }
}

/// One band of the vertical layout.
#[derive(Debug, Clone, Copy)]
pub enum LayoutItem<'a> {
    ProcessHeader {
        process: &'a Process,
        top: f64,
        height: f64,
    },
    Track {
        process: &'a Process,
        thread: &'a Thread,
        top: f64,
        height: f64,
    },
}

impl LayoutItem<'_> {
    pub fn top(&self) -> f64 {
        match self {
            Self::ProcessHeader { top, .. } | Self::Track { top, .. } => *top,
        }
    }

    pub fn height(&self) -> f64 {
        match self {
            Self::ProcessHeader { height, .. } | Self::Track { height, .. } => *height,
        }
    }

    /// Whether the band intersects `[0, canvas_height]`.
    pub fn is_visible(&self, canvas_height: f64) -> bool {
        let top = self.top();
        top < canvas_height && top + self.height() > 0.0
    }
}

/// Walks the model top to bottom, yielding each process header and thread
/// track with its y position.
///
/// The cursor starts at `-scroll_y` and only ever accumulates, whether or not
/// a caller draws the band. Rendering and hit-testing both go through this
/// walk so their geometry cannot drift apart.
pub struct TrackLayout<'a> {
    layout: LayoutConfig,
    processes: btree_map::Values<'a, u64, Process>,
    current: Option<(&'a Process, btree_map::Values<'a, u64, Thread>)>,
    cursor: f64,
}

impl<'a> TrackLayout<'a> {
    pub fn new(model: &'a TraceModel, layout: &LayoutConfig, scroll_y: f64) -> Self {
        Self {
            layout: *layout,
            processes: model.processes.values(),
            current: None,
            cursor: -scroll_y,
        }
    }
}

impl<'a> Iterator for TrackLayout<'a> {
    type Item = LayoutItem<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some((process, threads)) = &mut self.current {
            if let Some(thread) = threads.next() {
                let top = self.cursor;
                let height = self.layout.track_height(thread);
                self.cursor += height + self.layout.track_padding;
                return Some(LayoutItem::Track {
                    process: *process,
                    thread,
                    top,
                    height,
                });
            }
            self.current = None;
        }

        let process = self.processes.next()?;
        let top = self.cursor;
        let height = self.layout.header_height;
        self.cursor += height;
        self.current = Some((process, process.threads.values()));
        Some(LayoutItem::ProcessHeader {
            process,
            top,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest;
    use serde_json::json;

    fn two_process_model() -> TraceModel {
        ingest(json!([
            {"name":"a","ph":"X","ts":0,"dur":100,"pid":1,"tid":1},
            {"name":"b","ph":"X","ts":10,"dur":10,"pid":1,"tid":1},
            {"name":"c","ph":"X","ts":0,"dur":10,"pid":1,"tid":2},
            {"name":"d","ph":"X","ts":0,"dur":10,"pid":2,"tid":5}
        ]))
        .expect("trace")
    }

    fn bands(model: &TraceModel, scroll: f64) -> Vec<(char, f64, f64)> {
        let layout = LayoutConfig::default();
        TrackLayout::new(model, &layout, scroll)
            .map(|item| match item {
                LayoutItem::ProcessHeader { top, height, .. } => ('P', top, height),
                LayoutItem::Track { top, height, .. } => ('T', top, height),
            })
            .collect()
    }

    #[test]
    fn stacks_headers_and_tracks() {
        let m = two_process_model();
        assert_eq!(
            bands(&m, 0.0),
            vec![
                ('P', 0.0, 24.0),
                ('T', 24.0, 40.0),
                ('T', 68.0, 20.0),
                ('P', 92.0, 24.0),
                ('T', 116.0, 20.0),
            ]
        );
    }

    #[test]
    fn scrolling_translates_everything() {
        let m = two_process_model();
        let base = bands(&m, 0.0);
        let scrolled = bands(&m, 30.0);
        for (a, b) in base.iter().zip(&scrolled) {
            assert_eq!(a.0, b.0);
            assert!((a.1 - 30.0 - b.1).abs() < 1e-9);
            assert_eq!(a.2, b.2);
        }
    }

    #[test]
    fn content_height_matches_walk() {
        let m = two_process_model();
        let layout = LayoutConfig::default();
        assert_eq!(layout.content_height(&m), 140.0);
        assert_eq!(layout.content_height(&TraceModel::default()), 0.0);
    }

    #[test]
    fn band_visibility() {
        let m = two_process_model();
        let layout = LayoutConfig::default();
        let visible: Vec<bool> = TrackLayout::new(&m, &layout, 50.0)
            .map(|item| item.is_visible(40.0))
            .collect();
        // Bands at -50, -26, 18, 42, 66 with a 40px canvas.
        assert_eq!(visible, vec![false, true, true, false, false]);
    }

    #[test]
    fn time_scale_round_trips() {
        let vp = Viewport::new(1150.0, 600.0);
        let layout = LayoutConfig::default();
        let scale = TimeScale::new(&TimeWindow::new(100.0, 200.0), &vp, &layout).expect("scale");
        assert_eq!(scale.x(100.0), 150.0);
        assert_eq!(scale.x(200.0), 1150.0);
        assert!((scale.time_at(scale.x(137.5)) - 137.5).abs() < 1e-9);
    }

    #[test]
    fn spans_are_clipped_and_widened() {
        let vp = Viewport::new(1150.0, 600.0);
        let layout = LayoutConfig::default();
        let scale = TimeScale::new(&TimeWindow::new(100.0, 200.0), &vp, &layout).expect("scale");
        assert_eq!(scale.span(110.0, 120.0), (250.0, 100.0));
        assert_eq!(scale.span(150.0, 150.0), (650.0, MIN_RECT_WIDTH));
        assert_eq!(scale.span(50.0, 300.0), (150.0, 1000.0));
    }

    #[test]
    fn walk_outlives_a_temporary_config() {
        let m = two_process_model();
        let tracks: Vec<&Thread> = TrackLayout::new(&m, &LayoutConfig::default(), 0.0)
            .filter_map(|item| match item {
                LayoutItem::Track { thread, .. } => Some(thread),
                LayoutItem::ProcessHeader { .. } => None,
            })
            .collect();
        assert_eq!(tracks.len(), 3);
    }

    #[test]
    fn degenerate_windows_have_no_scale() {
        let vp = Viewport::new(800.0, 600.0);
        let layout = LayoutConfig::default();
        assert!(TimeScale::new(&TimeWindow::new(5.0, 5.0), &vp, &layout).is_none());
        assert!(TimeScale::new(&TimeWindow::new(9.0, 5.0), &vp, &layout).is_none());
        assert!(TimeScale::new(&TimeWindow::new(0.0, f64::NAN), &vp, &layout).is_none());
        assert!(TimeScale::new(&TimeWindow::new(0.0, 1.0), &Viewport::new(100.0, 10.0), &layout).is_none());
    }
}
