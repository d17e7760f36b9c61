use egui::{Align2, CornerRadius, FontId, Pos2, Rect, Stroke, StrokeKind};
use tracescope_protocol::{RenderCommand, TextAlign};

use crate::theme::{self, ThemeMode};

/// Paint a list of `RenderCommand` into an egui `Painter`.
///
/// `offset` is the top-left pixel position of the canvas. Command
/// coordinates are canvas-relative logical pixels.
pub fn render_commands(
    painter: &mut egui::Painter,
    commands: &[RenderCommand],
    offset: Pos2,
    mode: ThemeMode,
) {
    let base_clip = painter.clip_rect();
    let mut clip_stack: Vec<Rect> = Vec::new();

    let to_rect = |r: &tracescope_protocol::Rect| {
        Rect::from_min_size(
            Pos2::new(r.x as f32 + offset.x, r.y as f32 + offset.y),
            egui::vec2(r.w as f32, r.h as f32),
        )
    };
    let to_pos = |p: &tracescope_protocol::Point| Pos2::new(p.x as f32 + offset.x, p.y as f32 + offset.y);

    for cmd in commands {
        match cmd {
            RenderCommand::Clear { color } => {
                painter.rect_filled(base_clip, CornerRadius::ZERO, theme::resolve(*color, mode));
            }

            RenderCommand::DrawRect {
                rect,
                color,
                border_color,
                ..
            } => {
                let egui_rect = to_rect(rect);
                if egui_rect.width() < 0.5 || egui_rect.height() < 0.5 {
                    continue;
                }
                if !painter.clip_rect().intersects(egui_rect) {
                    continue;
                }

                painter.rect_filled(egui_rect, CornerRadius::ZERO, theme::resolve(*color, mode));

                if let Some(bc) = border_color {
                    painter.rect_stroke(
                        egui_rect,
                        CornerRadius::ZERO,
                        Stroke::new(1.5, theme::resolve(*bc, mode)),
                        StrokeKind::Inside,
                    );
                }
            }

            RenderCommand::DrawText {
                position,
                text,
                color,
                font_size,
                align,
            } => {
                let size = *font_size as f32;
                if size < 1.0 {
                    continue;
                }
                let anchor = match align {
                    TextAlign::Left => Align2::LEFT_CENTER,
                    TextAlign::Center => Align2::CENTER_CENTER,
                    TextAlign::Right => Align2::RIGHT_CENTER,
                };
                painter.text(
                    to_pos(position),
                    anchor,
                    text.as_ref(),
                    FontId::proportional(size),
                    theme::resolve(*color, mode),
                );
            }

            RenderCommand::DrawLine {
                from,
                to,
                color,
                width,
            } => {
                painter.line_segment(
                    [to_pos(from), to_pos(to)],
                    Stroke::new(*width as f32, theme::resolve(*color, mode)),
                );
            }

            RenderCommand::SetClip { rect } => {
                clip_stack.push(painter.clip_rect());
                let intersected = painter.clip_rect().intersect(to_rect(rect));
                painter.set_clip_rect(intersected);
            }

            RenderCommand::ClearClip => {
                if let Some(prev) = clip_stack.pop() {
                    painter.set_clip_rect(prev);
                }
            }

            RenderCommand::BeginGroup { .. } | RenderCommand::EndGroup => {
                // Groups carry no visual effect in egui.
            }
        }
    }

    painter.set_clip_rect(base_clip);
}
