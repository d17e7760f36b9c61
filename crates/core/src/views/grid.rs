use tracescope_protocol::{Point, RenderCommand, SharedStr, TextAlign, ThemeToken, Viewport};

use super::layout::{TimeScale, TimeWindow};

/// Aim for about this many gridlines across the window.
const TARGET_LINES: f64 = 10.0;
/// Upper bound on emitted lines, whatever the float rounding does.
const MAX_LINES: usize = 32;
const LABEL_FONT_SIZE: f64 = 10.0;

/// Smallest `k * 10^n` with `k ∈ {1, 2, 5}` that is at least `range / 10`.
pub fn nice_step(range: f64) -> Option<f64> {
    let target = range / TARGET_LINES;
    if !(target > 0.0 && target.is_finite()) {
        return None;
    }
    let magnitude = 10f64.powf(target.log10().floor());
    // 10 is the next decade's 1.
    [1.0, 2.0, 5.0, 10.0]
        .into_iter()
        .map(|k| k * magnitude)
        .find(|step| *step >= target)
}

/// Gridline timestamps: multiples of the step, from the first one at or
/// after `window.start` up to `window.end`.
pub fn gridlines(window: &TimeWindow) -> Vec<f64> {
    if window.is_degenerate() {
        return Vec::new();
    }
    let Some(step) = nice_step(window.range()) else {
        return Vec::new();
    };
    let first = (window.start / step).ceil() * step;
    (0..MAX_LINES)
        .map(|i| first + i as f64 * step)
        .take_while(|t| *t <= window.end)
        .collect()
}

/// Vertical gridlines with a time label at the bottom edge.
pub(crate) fn render_grid(
    window: &TimeWindow,
    scale: &TimeScale,
    viewport: &Viewport,
    commands: &mut Vec<RenderCommand>,
) {
    let step = nice_step(window.range()).unwrap_or(0.0);
    for t in gridlines(window) {
        let x = scale.x(t);
        commands.push(RenderCommand::DrawLine {
            from: Point::new(x, 0.0),
            to: Point::new(x, viewport.height),
            color: ThemeToken::GridLine,
            width: 0.5,
        });
        commands.push(RenderCommand::DrawText {
            position: Point::new(x + 3.0, viewport.height - LABEL_FONT_SIZE),
            text: SharedStr::from(format_time_label(t, step)),
            color: ThemeToken::GridText,
            font_size: LABEL_FONT_SIZE,
            align: TextAlign::Left,
        });
    }
}

/// Format a timestamp in microseconds, picking the unit from the step so
/// neighbouring labels stay distinguishable.
pub fn format_time_label(us: f64, step: f64) -> String {
    let step = step.abs();
    if step >= 1_000_000.0 {
        format!("{:.0}s", us / 1_000_000.0)
    } else if step >= 100_000.0 {
        format!("{:.1}s", us / 1_000_000.0)
    } else if step >= 1_000.0 {
        format!("{:.0}ms", us / 1_000.0)
    } else if step >= 100.0 {
        format!("{:.1}ms", us / 1_000.0)
    } else if step >= 1.0 {
        format!("{:.0}µs", us)
    } else {
        format!("{:.0}ns", us * 1_000.0)
    }
}

/// Human-readable duration for status lines and detail panels.
pub fn format_duration(us: f64) -> String {
    if us < 1_000.0 {
        format!("{us:.1}µs")
    } else if us < 1_000_000.0 {
        format!("{:.2}ms", us / 1_000.0)
    } else {
        format!("{:.2}s", us / 1_000_000.0)
    }
}
