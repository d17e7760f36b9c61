use tracescope_protocol::{Point, Rect, RenderCommand, SharedStr, TextAlign, ThemeToken, Viewport};

use super::grid;
use super::layout::{LayoutConfig, LayoutItem, TimeScale, TimeWindow, TrackLayout};
use super::palette;
use crate::model::{EventId, Process, Thread, TraceModel};

/// Horizontal inset of text inside rects and label cells.
const TEXT_INSET: f64 = 4.0;

/// Render one frame of the flame-graph timeline.
///
/// Processes stack top to bottom, each a header band followed by one track
/// per thread; event rectangles sit at `depth * row_height` inside their
/// track. Bands outside the canvas and events outside `window` are culled.
/// A degenerate window still draws headers and labels.
pub fn render_timeline(
    model: &TraceModel,
    window: &TimeWindow,
    viewport: &Viewport,
    layout: &LayoutConfig,
    selected: Option<EventId>,
) -> Vec<RenderCommand> {
    let scale = TimeScale::new(window, viewport, layout);
    let mut commands = Vec::with_capacity(64 + model.thread_count() * 8);
    let mut drawn = 0usize;

    commands.push(RenderCommand::Clear {
        color: ThemeToken::Background,
    });

    for item in TrackLayout::new(model, layout, viewport.y) {
        if !item.is_visible(viewport.height) {
            continue;
        }
        match item {
            LayoutItem::ProcessHeader {
                process,
                top,
                height,
            } => draw_process_header(process, top, height, viewport, layout, &mut commands),
            LayoutItem::Track {
                process,
                thread,
                top,
                height,
            } => {
                commands.push(RenderCommand::BeginGroup {
                    id: SharedStr::from(format!("thread-{}-{}", process.process_id, thread.thread_id)),
                    label: Some(SharedStr::from(thread.name.as_str())),
                });
                draw_thread_label(thread, top, height, viewport, layout, &mut commands);
                if let Some(scale) = &scale {
                    drawn += draw_events(
                        thread,
                        top,
                        window,
                        scale,
                        viewport,
                        layout,
                        selected,
                        &mut commands,
                    );
                }
                commands.push(RenderCommand::EndGroup);
            }
        }
    }

    if let Some(scale) = &scale {
        grid::render_grid(window, scale, viewport, &mut commands);
    }

    tracing::trace!(
        commands = commands.len(),
        events_drawn = drawn,
        events_total = model.event_count(),
        "rendered timeline frame"
    );
    commands
}

fn draw_process_header(
    process: &Process,
    top: f64,
    height: f64,
    viewport: &Viewport,
    layout: &LayoutConfig,
    commands: &mut Vec<RenderCommand>,
) {
    commands.push(RenderCommand::BeginGroup {
        id: SharedStr::from(format!("process-{}", process.process_id)),
        label: Some(SharedStr::from(process.name.as_str())),
    });
    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(0.0, top, viewport.width, height),
        color: ThemeToken::ProcessHeaderBackground,
        border_color: Some(ThemeToken::Border),
        label: None,
        frame_id: None,
    });
    commands.push(RenderCommand::DrawText {
        position: Point::new(TEXT_INSET, top + height / 2.0),
        text: SharedStr::from(format!("{} (pid {})", process.name, process.process_id)),
        color: ThemeToken::ProcessHeaderText,
        font_size: layout.font_size,
        align: TextAlign::Left,
    });
    commands.push(RenderCommand::EndGroup);
}

fn draw_thread_label(
    thread: &Thread,
    top: f64,
    height: f64,
    viewport: &Viewport,
    layout: &LayoutConfig,
    commands: &mut Vec<RenderCommand>,
) {
    let label_width = layout.label_width.min(viewport.width);
    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(label_width, top, (viewport.width - label_width).max(0.0), height),
        color: ThemeToken::TrackBackground,
        border_color: None,
        label: None,
        frame_id: None,
    });

    let cell = Rect::new(0.0, top, label_width, height);
    commands.push(RenderCommand::DrawRect {
        rect: cell,
        color: ThemeToken::ThreadLabelBackground,
        border_color: Some(ThemeToken::Border),
        label: None,
        frame_id: None,
    });
    commands.push(RenderCommand::SetClip { rect: cell });
    commands.push(RenderCommand::DrawText {
        position: Point::new(TEXT_INSET, top + layout.row_height.min(height) / 2.0),
        text: SharedStr::from(thread.name.as_str()),
        color: ThemeToken::ThreadLabelText,
        font_size: layout.font_size,
        align: TextAlign::Left,
    });
    commands.push(RenderCommand::ClearClip);
}

/// Emit rectangles for the thread's events inside `window`. Returns how many
/// were drawn.
#[allow(clippy::too_many_arguments)]
fn draw_events(
    thread: &Thread,
    top: f64,
    window: &TimeWindow,
    scale: &TimeScale,
    viewport: &Viewport,
    layout: &LayoutConfig,
    selected: Option<EventId>,
    commands: &mut Vec<RenderCommand>,
) -> usize {
    let mut drawn = 0;
    let row_h = layout.row_height;

    for event in &thread.events {
        // Sorted by start: nothing after this can be visible.
        if event.start_time > window.end {
            break;
        }
        if !window.overlaps(event.start_time, event.end_time()) {
            continue;
        }

        let y = top + f64::from(event.depth) * row_h;
        if y >= viewport.height || y + row_h <= 0.0 {
            continue;
        }

        let (x0, w) = scale.span(event.start_time, event.end_time());
        let rect = Rect::new(x0, y, w, (row_h - 1.0).max(1.0));

        let border_color = (selected == Some(event.id)).then_some(ThemeToken::SelectionHighlight);
        commands.push(RenderCommand::DrawRect {
            rect,
            color: palette::color_for_name(&event.name),
            border_color,
            label: Some(event.name.clone()),
            frame_id: Some(event.id.0),
        });

        if w > layout.min_label_width {
            commands.push(RenderCommand::SetClip { rect });
            commands.push(RenderCommand::DrawText {
                position: Point::new(x0 + TEXT_INSET, y + rect.h / 2.0),
                text: event.name.clone(),
                color: ThemeToken::EventText,
                font_size: layout.font_size,
                align: TextAlign::Left,
            });
            commands.push(RenderCommand::ClearClip);
        }
        drawn += 1;
    }

    drawn
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::layout::MIN_RECT_WIDTH;
    use crate::ingest;
    use serde_json::json;

    fn model() -> TraceModel {
        ingest(json!([
            {"name":"process_name","ph":"M","pid":1,"tid":0,"args":{"name":"Browser"}},
            {"name":"thread_name","ph":"M","pid":1,"tid":1,"args":{"name":"Main"}},
            {"name":"outer","ph":"X","ts":0,"dur":100,"pid":1,"tid":1},
            {"name":"inner","ph":"X","ts":10,"dur":20,"pid":1,"tid":1},
            {"name":"tick","ph":"i","ts":50,"pid":1,"tid":1},
            {"name":"late","ph":"X","ts":900,"dur":100,"pid":1,"tid":1}
        ]))
        .expect("trace")
    }

    fn rects(cmds: &[RenderCommand]) -> Vec<(Rect, u64, ThemeToken, Option<ThemeToken>)> {
        cmds.iter()
            .filter_map(|c| match c {
                RenderCommand::DrawRect {
                    rect,
                    frame_id: Some(id),
                    color,
                    border_color,
                    ..
                } => Some((*rect, *id, *color, *border_color)),
                _ => None,
            })
            .collect()
    }

    fn texts(cmds: &[RenderCommand]) -> Vec<String> {
        cmds.iter()
            .filter_map(|c| match c {
                RenderCommand::DrawText { text, .. } => Some(text.to_string()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn starts_with_clear() {
        let cmds = render_timeline(
            &model(),
            &TimeWindow::new(0.0, 1000.0),
            &Viewport::new(1150.0, 400.0),
            &LayoutConfig::default(),
            None,
        );
        assert!(matches!(cmds.first(), Some(RenderCommand::Clear { .. })));
    }

    #[test]
    fn maps_events_to_pixels() {
        let cmds = render_timeline(
            &model(),
            &TimeWindow::new(0.0, 1000.0),
            &Viewport::new(1150.0, 400.0),
            &LayoutConfig::default(),
            None,
        );
        let r = rects(&cmds);
        assert_eq!(r.len(), 4);
        // outer: x = 150 + 0 / 1000 * 1000, header 24px above the track.
        assert_eq!(r[0].0, Rect::new(150.0, 24.0, 100.0, 19.0));
        // inner at depth 1.
        assert_eq!(r[1].0, Rect::new(160.0, 44.0, 20.0, 19.0));
        // instant event widened to one pixel.
        assert_eq!(r[2].0.w, 1.0);
        assert_eq!(r[2].0.x, 200.0);
    }

    #[test]
    fn culls_events_outside_window() {
        let cmds = render_timeline(
            &model(),
            &TimeWindow::new(200.0, 800.0),
            &Viewport::new(1150.0, 400.0),
            &LayoutConfig::default(),
            None,
        );
        assert!(rects(&cmds).is_empty());
        // Labels still drawn.
        let t = texts(&cmds);
        assert!(t.iter().any(|s| s == "Main"));
        assert!(t.iter().any(|s| s.starts_with("Browser")));
    }

    #[test]
    fn clips_rects_to_track_area() {
        let cmds = render_timeline(
            &model(),
            &TimeWindow::new(50.0, 950.0),
            &Viewport::new(1050.0, 400.0),
            &LayoutConfig::default(),
            None,
        );
        for (rect, ..) in rects(&cmds) {
            assert!(rect.x >= 150.0, "{rect:?}");
            assert!(rect.right() <= 1050.0 + MIN_RECT_WIDTH, "{rect:?}");
        }
    }

    #[test]
    fn colors_follow_names() {
        let cmds = render_timeline(
            &model(),
            &TimeWindow::new(0.0, 1000.0),
            &Viewport::new(1150.0, 400.0),
            &LayoutConfig::default(),
            None,
        );
        let r = rects(&cmds);
        assert_eq!(r[0].2, palette::color_for_name("outer"));
        assert_eq!(r[1].2, palette::color_for_name("inner"));
    }

    #[test]
    fn labels_only_on_wide_rects() {
        let cmds = render_timeline(
            &model(),
            &TimeWindow::new(0.0, 1000.0),
            &Viewport::new(1150.0, 400.0),
            &LayoutConfig::default(),
            None,
        );
        let t = texts(&cmds);
        // outer is 100px, inner 20px, tick 1px, late 100px.
        assert!(t.iter().any(|s| s == "outer"));
        assert!(t.iter().any(|s| s == "late"));
        assert!(!t.iter().any(|s| s == "inner"));
        assert!(!t.iter().any(|s| s == "tick"));
    }

    #[test]
    fn selected_event_gets_border() {
        let m = model();
        let inner = m.events().find(|e| e.name == "inner").map(|e| e.id);
        let cmds = render_timeline(
            &m,
            &TimeWindow::new(0.0, 1000.0),
            &Viewport::new(1150.0, 400.0),
            &LayoutConfig::default(),
            inner,
        );
        let bordered: Vec<_> = rects(&cmds)
            .into_iter()
            .filter(|r| r.3 == Some(ThemeToken::SelectionHighlight))
            .map(|r| r.1)
            .collect();
        assert_eq!(bordered, inner.map(|id| vec![id.0]).unwrap_or_default());
    }

    #[test]
    fn scrolled_off_tracks_are_culled() {
        let cmds = render_timeline(
            &model(),
            &TimeWindow::new(0.0, 1000.0),
            &Viewport::new(1150.0, 400.0).with_scroll(500.0),
            &LayoutConfig::default(),
            None,
        );
        assert!(rects(&cmds).is_empty());
        assert!(!texts(&cmds).iter().any(|s| s == "Main"));
    }

    #[test]
    fn degenerate_window_draws_no_events_or_grid() {
        for window in [TimeWindow::new(10.0, 10.0), TimeWindow::new(10.0, -10.0)] {
            let cmds = render_timeline(
                &model(),
                &window,
                &Viewport::new(1150.0, 400.0),
                &LayoutConfig::default(),
                None,
            );
            assert!(rects(&cmds).is_empty());
            assert!(
                !cmds
                    .iter()
                    .any(|c| matches!(c, RenderCommand::DrawLine { .. }))
            );
            assert!(texts(&cmds).iter().any(|s| s == "Main"));
        }
    }

    #[test]
    fn grid_spans_canvas_height() {
        let cmds = render_timeline(
            &model(),
            &TimeWindow::new(0.0, 1000.0),
            &Viewport::new(1150.0, 400.0),
            &LayoutConfig::default(),
            None,
        );
        let lines: Vec<_> = cmds
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawLine { from, to, .. } => Some((*from, *to)),
                _ => None,
            })
            .collect();
        assert_eq!(lines.len(), 11);
        assert_eq!(lines[0].0, Point::new(150.0, 0.0));
        assert_eq!(lines[0].1, Point::new(150.0, 400.0));
    }

    #[test]
    fn grid_is_drawn_over_the_tracks() {
        let cmds = render_timeline(
            &model(),
            &TimeWindow::new(0.0, 1000.0),
            &Viewport::new(1150.0, 400.0),
            &LayoutConfig::default(),
            None,
        );
        let last_rect = cmds
            .iter()
            .rposition(|c| matches!(c, RenderCommand::DrawRect { .. }))
            .expect("rects");
        let first_line = cmds
            .iter()
            .position(|c| matches!(c, RenderCommand::DrawLine { .. }))
            .expect("grid");
        assert!(first_line > last_rect);
    }

    #[test]
    fn empty_model_renders_clear_only() {
        let cmds = render_timeline(
            &TraceModel::default(),
            &TimeWindow::new(0.0, 0.0),
            &Viewport::new(800.0, 600.0),
            &LayoutConfig::default(),
            None,
        );
        assert_eq!(cmds.len(), 1);
    }
}
