use serde::{Deserialize, Serialize};
use tracescope_protocol::{Point, RenderCommand, Viewport};

use super::config::NavigationConfig;
use crate::model::{EventId, TraceEvent, TraceModel};
use crate::views::{self, LayoutConfig, TimeWindow};

/// Continuous keyboard intents, applied once per tick while held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyIntent {
    ZoomIn,
    ZoomOut,
    PanLeft,
    PanRight,
}

impl KeyIntent {
    pub const ALL: [KeyIntent; 4] = [
        KeyIntent::ZoomIn,
        KeyIntent::ZoomOut,
        KeyIntent::PanLeft,
        KeyIntent::PanRight,
    ];

    /// WASD mapping, case-insensitive.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'w' => Some(Self::ZoomIn),
            's' => Some(Self::ZoomOut),
            'a' => Some(Self::PanLeft),
            'd' => Some(Self::PanRight),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Everything the controller mutates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub visible_start: f64,
    pub visible_end: f64,
    pub scroll_y: f64,
    pub dragging: bool,
    pub last_pointer: Option<Point>,
    pub drag_origin: Option<Point>,
    pub hovered: Option<EventId>,
    /// Screen position for the hover tooltip.
    pub tooltip_anchor: Option<Point>,
}

impl ViewState {
    fn initial(window: TimeWindow) -> Self {
        Self {
            visible_start: window.start,
            visible_end: window.end,
            scroll_y: 0.0,
            dragging: false,
            last_pointer: None,
            drag_origin: None,
            hovered: None,
            tooltip_anchor: None,
        }
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.visible_start, self.visible_end)
    }

    fn set_window(&mut self, window: TimeWindow) {
        self.visible_start = window.start;
        self.visible_end = window.end;
    }
}

/// How a pointer-up resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerRelease {
    /// Short gesture: select whatever was hovered (possibly nothing).
    Click(Option<EventId>),
    /// The gesture moved the view; selection is unchanged.
    Pan,
    /// No drag was in progress.
    Ignored,
}

/// Owns the view state of one viewing session.
///
/// All changes go through the transition methods below, called from the
/// host's UI thread: `tick` once per frame, the pointer/wheel/key methods as
/// input arrives. A new trace gets a new `Navigator`.
#[derive(Debug, Clone)]
pub struct Navigator {
    state: ViewState,
    held: [bool; 4],
    config: NavigationConfig,
    layout: LayoutConfig,
    canvas_width: f64,
    canvas_height: f64,
    /// `[min_time, max_time]` of the trace this session views.
    trace_bounds: TimeWindow,
}

impl Navigator {
    pub fn new(model: &TraceModel, layout: LayoutConfig, config: NavigationConfig) -> Self {
        let trace_bounds = TimeWindow::full(model);
        let mut nav = Self {
            state: ViewState::initial(trace_bounds),
            held: [false; 4],
            config,
            layout,
            canvas_width: 0.0,
            canvas_height: 0.0,
            trace_bounds,
        };
        nav.constrain();
        nav
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn window(&self) -> TimeWindow {
        self.state.window()
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    /// Canvas size plus the current scroll offset.
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.canvas_width, self.canvas_height).with_scroll(self.state.scroll_y)
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.canvas_width = width;
        self.canvas_height = height;
    }

    /// Back to the whole trace, scrolled to the top.
    pub fn reset(&mut self) {
        self.state.set_window(self.trace_bounds);
        self.state.scroll_y = 0.0;
        self.constrain();
    }

    // --- keyboard ---

    pub fn set_key(&mut self, intent: KeyIntent, held: bool) {
        self.held[intent.index()] = held;
    }

    pub fn is_held(&self, intent: KeyIntent) -> bool {
        self.held[intent.index()]
    }

    pub fn release_all_keys(&mut self) {
        self.held = [false; 4];
    }

    /// Whether another tick would move the view.
    pub fn is_animating(&self) -> bool {
        self.held.iter().any(|h| *h)
    }

    /// Per-frame update from held keys. Returns `true` if the window moved.
    ///
    /// Each held key applies a fixed fraction of the current range, so the
    /// speed depends on the frame rate.
    pub fn tick(&mut self) -> bool {
        if !self.is_animating() {
            return false;
        }
        let step = self.config.zoom_step;
        if self.is_held(KeyIntent::ZoomIn) {
            self.zoom_centered(1.0 - step);
        }
        if self.is_held(KeyIntent::ZoomOut) && step < 1.0 {
            self.zoom_centered(1.0 / (1.0 - step));
        }
        let pan = self.config.pan_step * self.window().range();
        if self.is_held(KeyIntent::PanLeft) {
            self.shift(-pan);
        }
        if self.is_held(KeyIntent::PanRight) {
            self.shift(pan);
        }
        self.constrain();
        true
    }

    // --- wheel ---

    /// Wheel input. With the zoom modifier (Ctrl/Cmd) the range rescales
    /// around the pointer; otherwise the dominant axis pans or scrolls.
    /// Positive `delta_y` zooms out / scrolls down.
    pub fn wheel(&mut self, pointer: Point, delta_x: f64, delta_y: f64, zoom_modifier: bool) {
        if zoom_modifier {
            let factor = 2f64.powf(delta_y * self.config.wheel_zoom_sensitivity);
            self.zoom_at(pointer.x, factor);
        } else if delta_x.abs() > delta_y.abs() {
            self.pan_pixels(delta_x);
        } else {
            self.scroll_by(delta_y);
        }
    }

    /// Rescale the range by `factor` keeping the time under `x` fixed.
    pub fn zoom_at(&mut self, x: f64, factor: f64) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        let anchor = self.time_at(x);
        let w = self.window();
        self.state.set_window(TimeWindow::new(
            anchor - (anchor - w.start) * factor,
            anchor + (w.end - anchor) * factor,
        ));
        self.constrain();
    }

    /// Timestamp under canvas x-coordinate `x`. Falls back to the window
    /// center when there is no track area.
    pub fn time_at(&self, x: f64) -> f64 {
        let w = self.window();
        let track = self.track_width();
        if track > 0.0 {
            w.start + (x - self.layout.label_width) / track * w.range()
        } else {
            w.center()
        }
    }

    // --- pointer ---

    pub fn pointer_down(&mut self, pos: Point) {
        self.state.dragging = true;
        self.state.drag_origin = Some(pos);
        self.state.last_pointer = Some(pos);
    }

    /// Pointer motion. Dragging pans both axes and freezes hover; otherwise
    /// the hovered event is re-resolved. Returns `true` if the hover changed.
    pub fn pointer_move(&mut self, model: &TraceModel, pos: Point) -> bool {
        let last = self.state.last_pointer.replace(pos);

        if self.state.dragging {
            if let Some(last) = last {
                self.pan_pixels(-(pos.x - last.x));
                self.scroll_by(-(pos.y - last.y));
            }
            return false;
        }

        let hit = views::hit_test(
            model,
            &self.window(),
            &self.viewport(),
            &self.layout,
            pos,
        )
        .map(|e| e.id);
        let changed = hit != self.state.hovered;
        self.state.hovered = hit;
        self.state.tooltip_anchor = hit.map(|_| pos);
        changed
    }

    /// End of a press. A short gesture is a click on the hovered event.
    pub fn pointer_up(&mut self, pos: Point) -> PointerRelease {
        if !self.state.dragging {
            return PointerRelease::Ignored;
        }
        let origin = self.state.drag_origin.take();
        self.state.dragging = false;
        self.state.last_pointer = Some(pos);

        let travel = origin.map_or(0.0, |o| o.distance(pos));
        if travel < self.config.click_threshold_px {
            PointerRelease::Click(self.state.hovered)
        } else {
            PointerRelease::Pan
        }
    }

    pub fn pointer_leave(&mut self) {
        self.state.dragging = false;
        self.state.drag_origin = None;
        self.state.last_pointer = None;
        self.state.hovered = None;
        self.state.tooltip_anchor = None;
    }

    /// Hovered event and where to anchor its tooltip; hidden while dragging.
    pub fn tooltip(&self) -> Option<(EventId, Point)> {
        if self.state.dragging {
            return None;
        }
        self.state.hovered.zip(self.state.tooltip_anchor)
    }

    pub fn hovered_event<'a>(&self, model: &'a TraceModel) -> Option<&'a TraceEvent> {
        self.state.hovered.and_then(|id| model.event(id))
    }

    /// Render the current frame.
    pub fn render(&self, model: &TraceModel, selected: Option<EventId>) -> Vec<RenderCommand> {
        views::render_timeline(model, &self.window(), &self.viewport(), &self.layout, selected)
    }

    // --- primitives ---

    fn track_width(&self) -> f64 {
        self.canvas_width - self.layout.label_width
    }

    fn zoom_centered(&mut self, factor: f64) {
        let w = self.window();
        let center = w.center();
        let half = w.range() / 2.0 * factor;
        self.state
            .set_window(TimeWindow::new(center - half, center + half));
    }

    fn shift(&mut self, dt: f64) {
        self.state.visible_start += dt;
        self.state.visible_end += dt;
    }

    /// Pan by a horizontal pixel distance; positive moves toward later times.
    fn pan_pixels(&mut self, dx: f64) {
        let track = self.track_width();
        if track > 0.0 {
            self.shift(dx / track * self.window().range());
            self.constrain();
        }
    }

    fn scroll_by(&mut self, dy: f64) {
        self.state.scroll_y = (self.state.scroll_y + dy).max(0.0);
    }

    /// Apply the opt-in window limits from the config.
    fn constrain(&mut self) {
        let mut w = self.window();

        if let Some(min_range) = self.config.min_range
            && w.range() < min_range
        {
            let center = w.center();
            w = TimeWindow::new(center - min_range / 2.0, center + min_range / 2.0);
        }

        let bounds = self.trace_bounds;
        if self.config.clamp_to_trace && !bounds.is_degenerate() {
            if w.range() >= bounds.range() {
                w = bounds;
            } else if w.start < bounds.start {
                w = TimeWindow::new(bounds.start, bounds.start + w.range());
            } else if w.end > bounds.end {
                w = TimeWindow::new(bounds.end - w.range(), bounds.end);
            }
        }

        self.state.set_window(w);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest;
    use serde_json::json;

    fn model() -> TraceModel {
        ingest(json!([
            {"name":"outer","ph":"X","ts":0,"dur":1000,"pid":1,"tid":1},
            {"name":"inner","ph":"X","ts":100,"dur":200,"pid":1,"tid":1}
        ]))
        .expect("trace")
    }

    /// 1000px track starting at x=150, so 1px per µs initially.
    fn nav(config: NavigationConfig) -> Navigator {
        let mut nav = Navigator::new(&model(), LayoutConfig::default(), config);
        nav.resize(1150.0, 600.0);
        nav
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn starts_at_full_trace() {
        let n = nav(NavigationConfig::default());
        assert_eq!(n.window(), TimeWindow::new(0.0, 1000.0));
        assert_eq!(n.state().scroll_y, 0.0);
    }

    #[test]
    fn held_zoom_keeps_center() {
        let mut n = nav(NavigationConfig::default());
        n.set_key(KeyIntent::ZoomIn, true);
        assert!(n.tick());
        let w = n.window();
        assert!(approx(w.center(), 500.0));
        assert!(approx(w.range(), 970.0));
        n.tick();
        assert!(approx(n.window().range(), 970.0 * 0.97));

        n.set_key(KeyIntent::ZoomIn, false);
        n.set_key(KeyIntent::ZoomOut, true);
        n.tick();
        assert!(approx(n.window().range(), 970.0));
    }

    #[test]
    fn held_pan_is_linear_in_range() {
        let mut n = nav(NavigationConfig::default());
        n.set_key(KeyIntent::PanRight, true);
        n.tick();
        n.tick();
        assert!(approx(n.window().start, 30.0));
        assert!(approx(n.window().range(), 1000.0));
        n.set_key(KeyIntent::PanRight, false);
        n.set_key(KeyIntent::PanLeft, true);
        n.tick();
        assert!(approx(n.window().start, 15.0));
    }

    #[test]
    fn idle_tick_is_a_no_op() {
        let mut n = nav(NavigationConfig::default());
        assert!(!n.is_animating());
        assert!(!n.tick());
        assert_eq!(n.window(), TimeWindow::new(0.0, 1000.0));
        n.set_key(KeyIntent::PanLeft, true);
        assert!(n.is_animating());
        n.release_all_keys();
        assert!(!n.is_animating());
    }

    #[test]
    fn wheel_zoom_is_anchored_at_pointer() {
        let mut n = nav(NavigationConfig::default());
        let pointer = Point::new(400.0, 50.0);
        let before = n.time_at(pointer.x);
        n.wheel(pointer, 0.0, -500.0, true);
        assert!(n.window().range() < 1000.0);
        assert!(approx(n.time_at(pointer.x), before));
        n.wheel(pointer, 0.0, 800.0, true);
        assert!(n.window().range() > 1000.0);
        assert!(approx(n.time_at(pointer.x), before));
    }

    #[test]
    fn wheel_without_modifier_pans_or_scrolls() {
        let mut n = nav(NavigationConfig::default());
        n.wheel(Point::new(500.0, 50.0), 100.0, 10.0, false);
        assert!(approx(n.window().start, 100.0));
        assert_eq!(n.state().scroll_y, 0.0);

        n.wheel(Point::new(500.0, 50.0), 0.0, 60.0, false);
        assert_eq!(n.state().scroll_y, 60.0);
        n.wheel(Point::new(500.0, 50.0), 0.0, -100.0, false);
        assert_eq!(n.state().scroll_y, 0.0);
    }

    #[test]
    fn drag_pans_both_axes() {
        let m = model();
        let mut n = nav(NavigationConfig::default());
        n.wheel(Point::new(0.0, 0.0), 0.0, 100.0, false);
        n.pointer_down(Point::new(500.0, 100.0));
        n.pointer_move(&m, Point::new(450.0, 80.0));
        assert!(approx(n.window().start, 50.0));
        assert_eq!(n.state().scroll_y, 120.0);
        n.pointer_move(&m, Point::new(450.0, 300.0));
        assert_eq!(n.state().scroll_y, 0.0);
        assert_eq!(n.pointer_up(Point::new(450.0, 300.0)), PointerRelease::Pan);
        assert!(!n.state().dragging);
    }

    #[test]
    fn hover_and_click_select() {
        let m = model();
        let mut n = nav(NavigationConfig::default());
        // Depth-1 row of thread 1: y in 44..64; inner spans x 250..450.
        assert!(n.pointer_move(&m, Point::new(300.0, 50.0)));
        let inner = n.hovered_event(&m).map(|e| e.name.to_string());
        assert_eq!(inner.as_deref(), Some("inner"));
        assert!(n.tooltip().is_some());
        assert!(!n.pointer_move(&m, Point::new(301.0, 50.0)));

        n.pointer_down(Point::new(301.0, 50.0));
        assert!(n.tooltip().is_none());
        let release = n.pointer_up(Point::new(302.0, 51.0));
        assert_eq!(release, PointerRelease::Click(n.state().hovered));
        assert!(matches!(release, PointerRelease::Click(Some(_))));
    }

    #[test]
    fn click_selects_an_instant_marker() {
        let m = ingest(json!([
            {"name":"outer","ph":"X","ts":0,"dur":1000,"pid":1,"tid":1},
            {"name":"mark","ph":"i","ts":500,"pid":1,"tid":1}
        ]))
        .expect("trace");
        let mut n = Navigator::new(&m, LayoutConfig::default(), NavigationConfig::default());
        n.resize(1150.0, 600.0);

        // The marker draws as x 650..651 on the depth-1 row.
        let at = Point::new(650.5, 54.0);
        n.pointer_move(&m, at);
        n.pointer_down(at);
        let PointerRelease::Click(Some(id)) = n.pointer_up(at) else {
            panic!("expected a click on the marker");
        };
        assert_eq!(m.event(id).map(|e| e.name.to_string()).as_deref(), Some("mark"));
    }

    #[test]
    fn click_on_empty_space_clears_selection() {
        let m = model();
        let mut n = nav(NavigationConfig::default());
        n.pointer_move(&m, Point::new(300.0, 500.0));
        n.pointer_down(Point::new(300.0, 500.0));
        assert_eq!(n.pointer_up(Point::new(300.0, 500.0)), PointerRelease::Click(None));
    }

    #[test]
    fn hover_frozen_while_dragging() {
        let m = model();
        let mut n = nav(NavigationConfig::default());
        n.pointer_move(&m, Point::new(300.0, 50.0));
        let hovered = n.state().hovered;
        n.pointer_down(Point::new(300.0, 50.0));
        assert!(!n.pointer_move(&m, Point::new(200.0, 500.0)));
        assert_eq!(n.state().hovered, hovered);
    }

    #[test]
    fn pointer_leave_ends_drag_and_hover() {
        let m = model();
        let mut n = nav(NavigationConfig::default());
        n.pointer_move(&m, Point::new(300.0, 50.0));
        n.pointer_down(Point::new(300.0, 50.0));
        n.pointer_leave();
        assert!(!n.state().dragging);
        assert_eq!(n.state().hovered, None);
        assert_eq!(n.pointer_up(Point::new(300.0, 50.0)), PointerRelease::Ignored);
    }

    #[test]
    fn unbounded_by_default() {
        let mut n = nav(NavigationConfig::default());
        n.set_key(KeyIntent::PanLeft, true);
        for _ in 0..200 {
            n.tick();
        }
        assert!(n.window().end < 0.0);

        n.reset();
        n.zoom_at(500.0, 0.0001);
        n.zoom_at(500.0, 0.0001);
        assert!(n.window().range() < 1e-3);
    }

    #[test]
    fn clamp_to_trace_keeps_window_inside() {
        let mut n = nav(NavigationConfig {
            clamp_to_trace: true,
            ..NavigationConfig::default()
        });
        n.set_key(KeyIntent::ZoomOut, true);
        n.tick();
        assert_eq!(n.window(), TimeWindow::new(0.0, 1000.0));
        n.release_all_keys();

        n.zoom_at(650.0, 0.5);
        n.wheel(Point::new(0.0, 0.0), 5000.0, 0.0, false);
        assert!(approx(n.window().end, 1000.0));
        assert!(approx(n.window().range(), 500.0));
    }

    #[test]
    fn min_range_limits_zoom_in() {
        let mut n = nav(NavigationConfig {
            min_range: Some(10.0),
            ..NavigationConfig::default()
        });
        n.zoom_at(650.0, 1e-6);
        assert!(approx(n.window().range(), 10.0));
    }

    #[test]
    fn degenerate_window_survives_input() {
        let m = TraceModel::default();
        let mut n = Navigator::new(&m, LayoutConfig::default(), NavigationConfig::default());
        n.resize(800.0, 600.0);
        n.set_key(KeyIntent::ZoomOut, true);
        n.tick();
        n.wheel(Point::new(400.0, 10.0), 0.0, 120.0, true);
        n.pointer_move(&m, Point::new(400.0, 10.0));
        assert_eq!(n.window().range(), 0.0);
        assert_eq!(n.render(&m, None).len(), 1);
    }

    #[test]
    fn key_mapping() {
        assert_eq!(KeyIntent::from_char('W'), Some(KeyIntent::ZoomIn));
        assert_eq!(KeyIntent::from_char('s'), Some(KeyIntent::ZoomOut));
        assert_eq!(KeyIntent::from_char('a'), Some(KeyIntent::PanLeft));
        assert_eq!(KeyIntent::from_char('D'), Some(KeyIntent::PanRight));
        assert_eq!(KeyIntent::from_char('q'), None);
    }
}
