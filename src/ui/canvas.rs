// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for image display and annotation.
//!
//! This module paints the background image and the live scene through the
//! viewport transform, and forwards raw pointer, wheel and double-click
//! input to the editor. All interaction logic lives in the editor.

use labelcanvas::editor::scene::{LiveShape, Primitive};
use labelcanvas::editor::{Editor, ToolMode};
use labelcanvas::models::annotation::{Color, Point};
use labelcanvas::util::transform::Affine;
use std::time::Instant;

const HANDLE_RADIUS: f32 = 5.0;
const CIRCLE_SEGMENTS: usize = 48;
const SELECTED_COLOR: egui::Color32 = egui::Color32::YELLOW;

/// Display the main canvas area and feed its input to the editor.
pub fn show(
    ui: &mut egui::Ui,
    editor: &mut Editor,
    image_texture: &Option<egui::TextureHandle>,
    image_size: Option<(u32, u32)>,
) {
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);

    let available = ui.available_size();
    let (rect, response) = ui.allocate_exact_size(available, egui::Sense::click_and_drag());
    editor
        .scene_mut()
        .viewport
        .set_size(Point::new(rect.width() as f64, rect.height() as f64));

    handle_input(ui, editor, &response, rect);

    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, egui::Color32::from_gray(40));

    match (image_texture, image_size) {
        (Some(texture), Some((w, h))) => {
            let min = to_screen(editor, rect, Point::ORIGIN);
            let max = to_screen(editor, rect, Point::new(w as f64, h as f64));
            painter.image(
                texture.id(),
                egui::Rect::from_min_max(min, max),
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
        _ => {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Open an image to begin annotating (File → Open Image...)",
                egui::FontId::proportional(16.0),
                egui::Color32::from_gray(180),
            );
        }
    }

    let view = *editor.viewport().transform();
    let offset = rect.min.to_vec2();
    let selection = editor.selection().to_vec();
    for shape in editor.scene().shapes() {
        let selected = selection.contains(&shape.id) || editor.polygon_editor().is_active(&shape.id);
        draw_shape(&painter, shape, &view, offset, selected, editor.viewport().zoom());
    }

    draw_overlays(&painter, editor, rect, &response);

    if editor.scene_mut().take_redraw() {
        ui.ctx().request_repaint();
    }
}

fn handle_input(ui: &egui::Ui, editor: &mut Editor, response: &egui::Response, rect: egui::Rect) {
    let now = Instant::now();
    let (pressed, released, moving, latest, scroll) = ui.input(|i| {
        (
            i.pointer.primary_pressed(),
            i.pointer.primary_released(),
            i.pointer.is_moving(),
            i.pointer.latest_pos(),
            i.smooth_scroll_delta.y,
        )
    });
    let Some(pos) = latest else {
        return;
    };
    let local = Point::new((pos.x - rect.min.x) as f64, (pos.y - rect.min.y) as f64);

    if pressed && response.hovered() {
        editor.pointer_down(local, now);
    }
    if moving {
        editor.pointer_move(local, now);
    }
    if released {
        editor.pointer_up(local, now);
    }
    if response.double_clicked() {
        editor.double_click(local);
    }
    if response.hovered() && scroll != 0.0 {
        // egui reports scrolling up as positive
        editor.wheel(-scroll as f64, local);
    }
}

fn to_screen(editor: &Editor, rect: egui::Rect, world: Point) -> egui::Pos2 {
    let p = editor.viewport().to_screen(world);
    rect.min + egui::vec2(p.x as f32, p.y as f32)
}

fn color32(color: Color) -> egui::Color32 {
    let [r, g, b, a] = color.0;
    egui::Color32::from_rgba_unmultiplied(r, g, b, a)
}

fn draw_shape(
    painter: &egui::Painter,
    shape: &LiveShape,
    view: &Affine,
    offset: egui::Vec2,
    selected: bool,
    zoom: f64,
) {
    let matrix = view.multiply(&shape.matrix());
    let project = |p: Point| {
        let s = matrix.apply(p);
        egui::pos2(s.x as f32, s.y as f32) + offset
    };
    let stroke_color = if selected {
        SELECTED_COLOR
    } else {
        color32(shape.style.stroke)
    };
    let stroke = egui::Stroke::new(shape.style.stroke_width as f32, stroke_color);
    let fill = color32(shape.style.fill);

    match &shape.primitive {
        Primitive::Rect { width, height } => {
            let corners = [
                Point::ORIGIN,
                Point::new(*width, 0.0),
                Point::new(*width, *height),
                Point::new(0.0, *height),
            ];
            let points = corners.into_iter().map(project).collect();
            painter.add(egui::Shape::convex_polygon(points, fill, stroke));
        }
        Primitive::Circle { radius } => {
            let points = (0..CIRCLE_SEGMENTS)
                .map(|i| {
                    let t = i as f64 / CIRCLE_SEGMENTS as f64 * std::f64::consts::TAU;
                    project(Point::new(radius * t.cos(), radius * t.sin()))
                })
                .collect();
            painter.add(egui::Shape::convex_polygon(points, fill, stroke));
        }
        Primitive::Polygon { points } => {
            let points = points.iter().copied().map(project).collect();
            painter.add(egui::Shape::closed_line(points, stroke));
        }
        Primitive::Dot { radius } => {
            let center = project(Point::ORIGIN);
            painter.circle(center, *radius as f32, stroke_color, egui::Stroke::new(1.0, egui::Color32::BLACK));
        }
        Primitive::Text { content, font_size } => {
            let size = (font_size * zoom * shape.transform.scale_y.abs()).max(1.0) as f32;
            let galley =
                painter.layout_no_wrap(content.clone(), egui::FontId::proportional(size), stroke_color);
            let text = egui::epaint::TextShape::new(project(Point::ORIGIN), galley, stroke_color)
                .with_angle(shape.transform.angle.to_radians() as f32);
            painter.add(text);
        }
        Primitive::Path { points } => {
            let points = points.iter().copied().map(project).collect();
            painter.add(egui::Shape::line(points, stroke));
        }
    }

    if let Some(label) = &shape.label {
        painter.text(
            project(Point::ORIGIN) - egui::vec2(0.0, 4.0),
            egui::Align2::LEFT_BOTTOM,
            label,
            egui::FontId::proportional(13.0),
            stroke_color,
        );
    }
}

/// Vertex handles, the polygon draft and the free-draw stroke in progress.
fn draw_overlays(painter: &egui::Painter, editor: &Editor, rect: egui::Rect, response: &egui::Response) {
    let polygons = editor.polygon_editor();
    for handle in polygons.handles() {
        let pos = to_screen(editor, rect, handle.position);
        painter.circle(
            pos,
            HANDLE_RADIUS,
            egui::Color32::WHITE,
            egui::Stroke::new(1.0, egui::Color32::BLACK),
        );
    }

    let draft = polygons.draft_points();
    if !draft.is_empty() {
        let mut points: Vec<egui::Pos2> = draft.iter().map(|p| to_screen(editor, rect, *p)).collect();
        if let Some(hover) = response.hover_pos() {
            points.push(hover);
        }
        painter.add(egui::Shape::line(
            points,
            egui::Stroke::new(2.0, egui::Color32::LIGHT_BLUE),
        ));
        let first = to_screen(editor, rect, draft[0]);
        painter.circle_stroke(
            first,
            editor.config().close_radius_px as f32,
            egui::Stroke::new(1.0, egui::Color32::LIGHT_BLUE),
        );
        for p in draft {
            painter.circle_filled(to_screen(editor, rect, *p), 3.0, egui::Color32::WHITE);
        }
    }

    if let Some(stroke) = editor.scene().stroke() {
        let points = stroke.iter().map(|p| to_screen(editor, rect, *p)).collect();
        painter.add(egui::Shape::line(
            points,
            egui::Stroke::new(2.0, egui::Color32::LIGHT_GREEN),
        ));
    }

    if matches!(editor.mode(), ToolMode::Pan) && response.hovered() {
        painter.ctx().set_cursor_icon(egui::CursorIcon::Grab);
    }
}
