//! Paints `RenderCommand`s into a ratatui buffer, one command unit per cell.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier},
};
use tracescope_core::LayoutConfig;
use tracescope_protocol::{RenderCommand, TextAlign, ThemeToken};

/// Layout in terminal cells: one row per depth level, one-row headers.
pub fn cell_layout() -> LayoutConfig {
    LayoutConfig {
        row_height: 1.0,
        label_width: 16.0,
        header_height: 1.0,
        track_padding: 0.0,
        min_label_width: 3.0,
        font_size: 1.0,
    }
}

const PALETTE: [Color; 12] = [
    Color::Rgb(0xf3, 0x8b, 0xa8),
    Color::Rgb(0xfa, 0xb3, 0x87),
    Color::Rgb(0xf9, 0xe2, 0xaf),
    Color::Rgb(0xa6, 0xe3, 0xa1),
    Color::Rgb(0x94, 0xe2, 0xd5),
    Color::Rgb(0x89, 0xdc, 0xeb),
    Color::Rgb(0x74, 0xc7, 0xec),
    Color::Rgb(0x89, 0xb4, 0xfa),
    Color::Rgb(0xb4, 0xbe, 0xfe),
    Color::Rgb(0xcb, 0xa6, 0xf7),
    Color::Rgb(0xf5, 0xc2, 0xe7),
    Color::Rgb(0xeb, 0xa0, 0xac),
];

pub fn theme_to_color(token: ThemeToken) -> Color {
    match token {
        ThemeToken::Palette(slot) => PALETTE[usize::from(slot) % PALETTE.len()],
        ThemeToken::Background => Color::Black,
        ThemeToken::Border => Color::DarkGray,
        ThemeToken::ProcessHeaderBackground => Color::DarkGray,
        ThemeToken::ProcessHeaderText => Color::White,
        ThemeToken::ThreadLabelBackground => Color::Rgb(30, 30, 46),
        ThemeToken::ThreadLabelText => Color::Gray,
        ThemeToken::TrackBackground => Color::Rgb(24, 24, 37),
        ThemeToken::EventText => Color::Black,
        ThemeToken::GridLine => Color::Rgb(69, 71, 90),
        ThemeToken::GridText => Color::Gray,
        ThemeToken::SelectionHighlight => Color::White,
    }
}

/// Paint `commands` into `area` of `buf`. Command coordinates are cells
/// relative to `area`'s top-left corner.
///
/// Grid lines only show through empty track cells, and grid labels go on the
/// bottom row of the area.
pub fn paint_commands(buf: &mut Buffer, area: Rect, commands: &[RenderCommand]) {
    let mut clip_stack: Vec<Rect> = Vec::new();
    let open_bg = [
        theme_to_color(ThemeToken::Background),
        theme_to_color(ThemeToken::TrackBackground),
    ];

    for cmd in commands {
        let clip = clip_stack.last().copied().unwrap_or(area);
        match cmd {
            RenderCommand::Clear { color } => {
                let bg = theme_to_color(*color);
                for (x, y) in cells(area) {
                    if let Some(cell) = buf.cell_mut((x, y)) {
                        cell.reset();
                        cell.set_bg(bg);
                    }
                }
            }

            RenderCommand::DrawRect {
                rect,
                color,
                border_color,
                ..
            } => {
                let Some(target) = to_cells(area, rect.x, rect.y, rect.w.max(1.0), rect.h.max(1.0))
                else {
                    continue;
                };
                let bg = theme_to_color(*color);
                for (x, y) in cells(target.intersection(clip)) {
                    if let Some(cell) = buf.cell_mut((x, y)) {
                        cell.set_char(' ').set_bg(bg);
                        cell.modifier = Modifier::empty();
                        if border_color.is_some() {
                            cell.modifier = Modifier::REVERSED | Modifier::BOLD;
                        }
                    }
                }
            }

            RenderCommand::DrawText {
                position,
                text,
                color,
                align,
                ..
            } => {
                let row = if *color == ThemeToken::GridText {
                    f64::from(area.height.saturating_sub(1))
                } else {
                    position.y
                };
                let len = text.chars().count() as f64;
                let col = match align {
                    TextAlign::Left => position.x,
                    TextAlign::Center => position.x - len / 2.0,
                    TextAlign::Right => position.x - len,
                };
                let fg = theme_to_color(*color);
                let y = area.y as f64 + row.floor();
                if y < f64::from(clip.top()) || y >= f64::from(clip.bottom()) {
                    continue;
                }
                for (i, ch) in text.chars().enumerate() {
                    let x = area.x as f64 + col.floor() + i as f64;
                    if x < f64::from(clip.left()) {
                        continue;
                    }
                    if x >= f64::from(clip.right()) {
                        break;
                    }
                    if let Some(cell) = buf.cell_mut((x as u16, y as u16)) {
                        cell.set_char(ch).set_fg(fg);
                    }
                }
            }

            RenderCommand::DrawLine { from, to, color, .. } => {
                // Only vertical rules have a cell rendition.
                if from.x.floor() != to.x.floor() {
                    continue;
                }
                let (top, bottom) = (from.y.min(to.y), from.y.max(to.y));
                let Some(line) = to_cells(area, from.x, top, 1.0, bottom - top) else {
                    continue;
                };
                let fg = theme_to_color(*color);
                for (x, y) in cells(line.intersection(clip)) {
                    if let Some(cell) = buf.cell_mut((x, y))
                        && cell.symbol() == " "
                        && open_bg.contains(&cell.bg)
                    {
                        cell.set_char('┊').set_fg(fg);
                    }
                }
            }

            RenderCommand::SetClip { rect } => {
                let next = to_cells(area, rect.x, rect.y, rect.w, rect.h)
                    .map_or(Rect::default(), |r| r.intersection(clip));
                clip_stack.push(next);
            }

            RenderCommand::ClearClip => {
                clip_stack.pop();
            }

            RenderCommand::BeginGroup { .. } | RenderCommand::EndGroup => {}
        }
    }
}

/// Cell rectangle covering `[x, x + w) × [y, y + h)`, clamped to `area`.
fn to_cells(area: Rect, x: f64, y: f64, w: f64, h: f64) -> Option<Rect> {
    if !(x.is_finite() && y.is_finite() && w > 0.0 && h > 0.0) {
        return None;
    }
    let left = x.floor().max(0.0);
    let top = y.floor().max(0.0);
    let right = (x + w).ceil().min(f64::from(area.width));
    let bottom = (y + h).ceil().min(f64::from(area.height));
    if right <= left || bottom <= top {
        return None;
    }
    Some(Rect::new(
        area.x + left as u16,
        area.y + top as u16,
        (right - left) as u16,
        (bottom - top) as u16,
    ))
}

fn cells(rect: Rect) -> impl Iterator<Item = (u16, u16)> {
    (rect.top()..rect.bottom()).flat_map(move |y| (rect.left()..rect.right()).map(move |x| (x, y)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tracescope_core::{TimeWindow, ingest, views::render_timeline};
    use tracescope_protocol::Viewport;

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn paints_timeline_into_cells() {
        let model = ingest(json!([
            {"name":"process_name","ph":"M","pid":1,"tid":0,"args":{"name":"app"}},
            {"name":"thread_name","ph":"M","pid":1,"tid":1,"args":{"name":"main"}},
            {"name":"outer","ph":"X","ts":0,"dur":40,"pid":1,"tid":1},
            {"name":"inner","ph":"X","ts":0,"dur":10,"pid":1,"tid":1}
        ]))
        .expect("trace");
        let area = Rect::new(0, 0, 56, 8);
        let cmds = render_timeline(
            &model,
            &TimeWindow::new(0.0, 40.0),
            &Viewport::new(56.0, 8.0),
            &cell_layout(),
            None,
        );
        let mut buf = Buffer::empty(area);
        paint_commands(&mut buf, area, &cmds);

        // Text sits four cells in from its box.
        assert!(row(&buf, 0)[4..].starts_with("app (pid 1)"));
        // Track starts on row 1: label column, then events from column 16.
        assert_eq!(&row(&buf, 1)[4..8], "main");
        assert_eq!(
            buf[(16, 1)].bg,
            theme_to_color(tracescope_core::views::palette::color_for_name("outer"))
        );
        assert_eq!(&row(&buf, 1)[20..25], "outer");
        assert_eq!(&row(&buf, 2)[20..25], "inner");
    }

    #[test]
    fn clip_limits_text() {
        let area = Rect::new(0, 0, 20, 2);
        let cmds = vec![
            RenderCommand::SetClip {
                rect: tracescope_protocol::Rect::new(2.0, 0.0, 3.0, 1.0),
            },
            RenderCommand::DrawText {
                position: tracescope_protocol::Point::new(2.0, 0.5),
                text: "abcdef".into(),
                color: ThemeToken::EventText,
                font_size: 1.0,
                align: TextAlign::Left,
            },
            RenderCommand::ClearClip,
        ];
        let mut buf = Buffer::empty(area);
        paint_commands(&mut buf, area, &cmds);
        assert_eq!(row(&buf, 0).trim_end(), "  abc");
    }

    #[test]
    fn selected_rect_is_highlighted() {
        let area = Rect::new(0, 0, 10, 1);
        let cmds = vec![RenderCommand::DrawRect {
            rect: tracescope_protocol::Rect::new(1.0, 0.0, 3.0, 1.0),
            color: ThemeToken::Palette(2),
            border_color: Some(ThemeToken::SelectionHighlight),
            label: None,
            frame_id: Some(0),
        }];
        let mut buf = Buffer::empty(area);
        paint_commands(&mut buf, area, &cmds);
        assert!(buf[(2, 0)].modifier.contains(Modifier::REVERSED));
        assert!(!buf[(5, 0)].modifier.contains(Modifier::REVERSED));
    }

    #[test]
    fn out_of_area_geometry_is_ignored() {
        assert_eq!(to_cells(Rect::new(0, 0, 10, 10), 20.0, 0.0, 5.0, 1.0), None);
        assert_eq!(to_cells(Rect::new(0, 0, 10, 10), 0.0, 0.0, 0.0, 1.0), None);
        assert_eq!(
            to_cells(Rect::new(2, 3, 10, 10), -4.0, 1.5, 6.0, 1.0),
            Some(Rect::new(2, 4, 2, 2))
        );
    }
}
