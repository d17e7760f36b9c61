//! Static SVG export of a rendered timeline frame.

use tracescope_protocol::{RenderCommand, TextAlign, ThemeToken};

/// What a `</g>` closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Open {
    Group,
    Clip,
}

/// Serialize one frame of commands into a standalone `<svg>` document of
/// `width` × `height` user units, using the dark or light palette.
pub fn render_svg(commands: &[RenderCommand], width: f64, height: f64, dark: bool) -> String {
    let mut svg = String::with_capacity(commands.len() * 160);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}" style="font-family:system-ui,-apple-system,sans-serif">"#,
    ));

    let mut open: Vec<Open> = Vec::new();
    let mut clip_ids = 0usize;

    for cmd in commands {
        match cmd {
            RenderCommand::Clear { color } => {
                svg.push_str(&format!(
                    r#"<rect width="{width}" height="{height}" fill="{}"/>"#,
                    resolve_color(*color, dark),
                ));
            }
            RenderCommand::DrawRect {
                rect,
                color,
                border_color,
                label,
                ..
            } => {
                let fill = resolve_color(*color, dark);
                svg.push_str(&format!(
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{fill}""#,
                    rect.x, rect.y, rect.w, rect.h,
                ));
                if let Some(border) = border_color {
                    svg.push_str(&format!(
                        r#" stroke="{}" stroke-width="1""#,
                        resolve_color(*border, dark)
                    ));
                }
                match label {
                    // Hover tooltip only; visible text comes as DrawText.
                    Some(label) => {
                        svg.push_str(&format!("><title>{}</title></rect>", escape_xml(label)));
                    }
                    None => svg.push_str("/>"),
                }
            }
            RenderCommand::DrawLine {
                from,
                to,
                color,
                width: line_width,
            } => {
                let stroke = resolve_color(*color, dark);
                svg.push_str(&format!(
                    r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{stroke}" stroke-width="{line_width}"/>"#,
                    from.x, from.y, to.x, to.y,
                ));
            }
            RenderCommand::DrawText {
                text,
                position,
                color,
                font_size,
                align,
            } => {
                let fill = resolve_color(*color, dark);
                let anchor = match align {
                    TextAlign::Left => "start",
                    TextAlign::Center => "middle",
                    TextAlign::Right => "end",
                };
                svg.push_str(&format!(
                    r#"<text x="{}" y="{}" fill="{fill}" font-size="{font_size}" text-anchor="{anchor}" dominant-baseline="central">{}</text>"#,
                    position.x,
                    position.y,
                    escape_xml(text),
                ));
            }
            RenderCommand::SetClip { rect } => {
                let id = format!("clip{clip_ids}");
                clip_ids += 1;
                svg.push_str(&format!(
                    r#"<clipPath id="{id}"><rect x="{}" y="{}" width="{}" height="{}"/></clipPath><g clip-path="url(#{id})">"#,
                    rect.x, rect.y, rect.w, rect.h,
                ));
                open.push(Open::Clip);
            }
            RenderCommand::ClearClip => {
                if open.last() == Some(&Open::Clip) {
                    open.pop();
                    svg.push_str("</g>");
                }
            }
            RenderCommand::BeginGroup { id, .. } => {
                svg.push_str(&format!(r#"<g data-id="{}">"#, escape_xml(id)));
                open.push(Open::Group);
            }
            RenderCommand::EndGroup => {
                // Drop clips left open inside the group.
                while let Some(kind) = open.pop() {
                    svg.push_str("</g>");
                    if kind == Open::Group {
                        break;
                    }
                }
            }
        }
    }

    for _ in open {
        svg.push_str("</g>");
    }
    svg.push_str("</svg>");
    svg
}

/// Twelve hues for `ThemeToken::Palette` slots, one table per mode.
const PALETTE_DARK: [&str; 12] = [
    "#f38ba8", "#fab387", "#f9e2af", "#a6e3a1", "#94e2d5", "#89dceb", "#74c7ec", "#89b4fa",
    "#b4befe", "#cba6f7", "#f5c2e7", "#eba0ac",
];
const PALETTE_LIGHT: [&str; 12] = [
    "#e06c75", "#e5955a", "#d9b44a", "#7cb36b", "#4fb3a6", "#4ba3c7", "#5b8fd9", "#7a7fe0",
    "#9a73d6", "#c06fc0", "#d9739b", "#c98a5e",
];

fn resolve_color(token: ThemeToken, dark: bool) -> &'static str {
    if let ThemeToken::Palette(slot) = token {
        let table = if dark { &PALETTE_DARK } else { &PALETTE_LIGHT };
        return table[usize::from(slot) % table.len()];
    }
    if dark {
        match token {
            ThemeToken::Background => "#11111b",
            ThemeToken::Border => "#313244",
            ThemeToken::ProcessHeaderBackground => "#181825",
            ThemeToken::ThreadLabelBackground => "#1e1e2e",
            ThemeToken::TrackBackground => "#1e1e2e",
            ThemeToken::ProcessHeaderText | ThemeToken::ThreadLabelText => "#cdd6f4",
            ThemeToken::EventText => "#11111b",
            ThemeToken::GridLine => "#45475a",
            ThemeToken::GridText => "#a6adc8",
            ThemeToken::SelectionHighlight => "#ffffff",
            ThemeToken::Palette(_) => "#9399b2",
        }
    } else {
        match token {
            ThemeToken::Background => "#ffffff",
            ThemeToken::Border => "#d2d2dc",
            ThemeToken::ProcessHeaderBackground => "#ebebf0",
            ThemeToken::ThreadLabelBackground => "#f5f5f8",
            ThemeToken::TrackBackground => "#fafafc",
            ThemeToken::ProcessHeaderText | ThemeToken::ThreadLabelText => "#282832",
            ThemeToken::EventText => "#14141e",
            ThemeToken::GridLine => "#dcdce4",
            ThemeToken::GridText => "#646478",
            ThemeToken::SelectionHighlight => "#14141e",
            ThemeToken::Palette(_) => "#999999",
        }
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
