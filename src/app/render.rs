use crate::editor::{EditorState, Interaction, ResizeHandle, Selection, arrows};
use crate::model;
use eframe::egui;

const SELECTION_BLUE: egui::Color32 = egui::Color32::from_rgb(90, 160, 255);
const BLOCK_FILL: egui::Color32 = egui::Color32::from_rgba_premultiplied(30, 60, 110, 70);
const BLOCK_STROKE: egui::Color32 = egui::Color32::from_rgb(40, 90, 200);

fn to_screen(origin: egui::Pos2, p: egui::Pos2) -> egui::Pos2 {
    origin + p.to_vec2()
}

pub(super) fn draw_background(painter: &egui::Painter, rect: egui::Rect) {
    let bg = painter.ctx().style().visuals.extreme_bg_color;
    painter.rect_filled(rect, 0.0, bg);
}

/// Background raster, or a placeholder frame while none is decoded.
pub(super) fn draw_image(
    painter: &egui::Painter,
    origin: egui::Pos2,
    display_rect: egui::Rect,
    texture: Option<&egui::TextureHandle>,
    placeholder: &str,
) {
    let rect = display_rect.translate(origin.to_vec2());
    match texture {
        Some(texture) => {
            painter.image(
                texture.id(),
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
        None => {
            let faint = painter.ctx().style().visuals.weak_text_color();
            painter.rect_stroke(rect, 0.0, egui::Stroke::new(1.0, faint), egui::StrokeKind::Middle);
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                placeholder,
                egui::FontId::proportional(16.0),
                faint,
            );
        }
    }
}

/// Blocks and arrows. With `show_words` off, blocks are labelled by id only.
pub(super) fn draw_shapes<'a>(
    painter: &egui::Painter,
    origin: egui::Pos2,
    shapes: impl Iterator<Item = model::Shape<'a>>,
    selection: Option<Selection>,
    show_words: bool,
) {
    for shape in shapes {
        match shape {
            model::Shape::Block { block, word } => {
                let selected = selection == Some(Selection::Block(block.id));
                let label = if show_words && !word.trim().is_empty() {
                    word.to_string()
                } else {
                    format!("#{}", block.id)
                };
                draw_block(painter, origin, block, &label, selected);
            }
            model::Shape::Arrow(arrow) => {
                let selected = selection == Some(Selection::Arrow(arrow.id));
                draw_arrow(painter, origin, arrow, selected);
            }
        }
    }
}

fn draw_block(painter: &egui::Painter, origin: egui::Pos2, block: &model::Block, label: &str, selected: bool) {
    let rect = block.rect().translate(origin.to_vec2());
    painter.rect_filled(rect, 2.0, BLOCK_FILL);
    let stroke = if selected {
        egui::Stroke::new(2.0, SELECTION_BLUE)
    } else {
        egui::Stroke::new(1.5, BLOCK_STROKE)
    };
    painter.rect_stroke(rect, 2.0, stroke, egui::StrokeKind::Middle);
    let font_size = (rect.height() * 0.45).clamp(10.0, 22.0);
    let galley = painter.layout(
        label.to_string(),
        egui::FontId::proportional(font_size),
        egui::Color32::WHITE,
        rect.width().max(1.0),
    );
    let pos = rect.center() - galley.size() * 0.5;
    painter.with_clip_rect(rect).galley(pos, galley, egui::Color32::WHITE);
}

fn draw_arrow(painter: &egui::Painter, origin: egui::Pos2, arrow: &model::Arrow, selected: bool) {
    let a = to_screen(origin, arrow.start.to_pos2());
    let b = to_screen(origin, arrow.end.to_pos2());
    let color = arrow.style.color.to_color32();
    let stroke = egui::Stroke::new(arrow.style.stroke_width, color);
    if selected {
        painter.line_segment(
            [a, b],
            egui::Stroke::new(arrow.style.stroke_width + 4.0, SELECTION_BLUE.gamma_multiply(0.5)),
        );
    }
    painter.line_segment([a, b], stroke);
    draw_arrowhead(painter, a, b, color, arrow.style.pointer_length, arrow.style.pointer_width);

    // Association indicator on the anchored end.
    let anchor = to_screen(origin, arrow.anchored_point());
    painter.circle(anchor, 4.0, color, egui::Stroke::new(1.5, egui::Color32::WHITE));
}

pub(super) fn draw_handles(painter: &egui::Painter, origin: egui::Pos2, block: &model::Block) {
    let rect = block.rect().translate(origin.to_vec2());
    let size = 8.0;
    for handle in ResizeHandle::ALL {
        let center = handle.anchor(rect);
        let r = egui::Rect::from_center_size(center, egui::vec2(size, size));
        painter.rect_filled(r, 1.0, egui::Color32::WHITE);
        painter.rect_stroke(r, 1.0, egui::Stroke::new(1.0, SELECTION_BLUE), egui::StrokeKind::Middle);
    }
}

/// Dashed previews and the snap indicator for the interaction in progress.
pub(super) fn draw_interaction(painter: &egui::Painter, origin: egui::Pos2, editor: &EditorState) {
    let preview = egui::Stroke::new(1.5, SELECTION_BLUE);
    match editor.interaction() {
        Interaction::Previewing { start, current } => {
            let rect = egui::Rect::from_two_pos(to_screen(origin, start), to_screen(origin, current));
            draw_dashed_rect(painter, rect, preview);
        }
        Interaction::DrawingPreview { start, current } => {
            let valid = arrows::validate_placement(
                editor.blocks().blocks(),
                start,
                editor.config.snap_radius,
            );
            let color = if valid {
                editor.arrow_style.color.to_color32()
            } else {
                painter.ctx().style().visuals.weak_text_color()
            };
            let stroke = egui::Stroke::new(editor.arrow_style.stroke_width, color);
            let a = to_screen(origin, start);
            let b = to_screen(origin, current);
            draw_dashed_line(painter, a, b, stroke, 10.0, 5.0);
            draw_arrowhead(
                painter,
                a,
                b,
                color,
                editor.arrow_style.pointer_length,
                editor.arrow_style.pointer_width,
            );
            if let Some(block) = editor.snap_candidate() {
                let center = to_screen(origin, block.center());
                painter.circle_stroke(center, editor.config.snap_radius, egui::Stroke::new(1.0, color.gamma_multiply(0.5)));
                painter.circle_filled(center, 5.0, color);
            }
        }
        Interaction::Idle | Interaction::Dragging { .. } | Interaction::Resizing { .. } => {}
    }
}

fn draw_dashed_rect(painter: &egui::Painter, rect: egui::Rect, stroke: egui::Stroke) {
    let corners = [rect.left_top(), rect.right_top(), rect.right_bottom(), rect.left_bottom()];
    for i in 0..4 {
        draw_dashed_line(painter, corners[i], corners[(i + 1) % 4], stroke, 6.0, 4.0);
    }
}

fn draw_dashed_line(
    painter: &egui::Painter,
    a: egui::Pos2,
    b: egui::Pos2,
    stroke: egui::Stroke,
    dash_len: f32,
    gap_len: f32,
) {
    let v = b - a;
    let len = v.length();
    if len <= f32::EPSILON {
        return;
    }
    let dir = v / len;
    let mut pos = 0.0;
    let mut drawing = true;
    while pos < len {
        let seg_len = if drawing { dash_len } else { gap_len };
        let next_pos = (pos + seg_len).min(len);
        if drawing {
            painter.line_segment([a + dir * pos, a + dir * next_pos], stroke);
        }
        pos = next_pos;
        drawing = !drawing;
    }
}

fn draw_arrowhead(
    painter: &egui::Painter,
    a: egui::Pos2,
    b: egui::Pos2,
    color: egui::Color32,
    length: f32,
    width: f32,
) {
    let v = b - a;
    if v.length_sq() <= f32::EPSILON {
        return;
    }
    let dir = v.normalized();
    let perp = egui::vec2(-dir.y, dir.x);
    let base = b - dir * length;
    let left = base + perp * (width * 0.5);
    let right = base - perp * (width * 0.5);
    painter.add(egui::Shape::convex_polygon(vec![b, left, right], color, egui::Stroke::NONE));
}
