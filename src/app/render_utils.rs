use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2, vec2};

use crate::deps::Direction;
use crate::view::FieldParticle;

pub(super) const LEAF_COLOR: Color32 = Color32::from_rgb(222, 226, 232);
pub(super) const OUTLINE_COLOR: Color32 = Color32::from_rgb(222, 226, 232);
const COLLAPSED_FILL: Color32 = Color32::from_rgb(0xd7, 0xea, 0xe2);
const COLLAPSED_MUTUAL_FILL: Color32 = Color32::from_rgb(0xec, 0xd4, 0xd4);
const TEXT_OFFSET_THRESHOLD_RADIUS: f32 = 60.0;
const BASE_FONT_SIZE: f32 = 15.0;

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let mut x = origin.x.rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = origin.y.rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}

/// Expanded fields are drawn as outlines only.
pub(super) fn field_fill(field: &FieldParticle) -> Color32 {
    if field.is_expanded {
        Color32::TRANSPARENT
    } else if field.include_both_direction {
        COLLAPSED_MUTUAL_FILL
    } else {
        COLLAPSED_FILL
    }
}

pub(super) fn fiber_stroke(direction: Direction, zoom: f32) -> Stroke {
    match direction {
        Direction::Mutual => Stroke::new(3.0 * zoom.sqrt(), Color32::from_rgb(220, 60, 60)),
        Direction::Either => Stroke::new(zoom.sqrt(), Color32::from_rgb(70, 170, 90)),
    }
}

/// Font size for a particle label in world units, and the vertical offset of
/// the label from the particle centre. Small particles get the label above
/// the circle, large ones just inside its top edge.
pub(super) fn label_layout(radius: f32) -> (f32, f32) {
    let font_size = (BASE_FONT_SIZE * radius / TEXT_OFFSET_THRESHOLD_RADIUS).max(BASE_FONT_SIZE);
    let offset = if radius <= TEXT_OFFSET_THRESHOLD_RADIUS {
        -radius - font_size / 2.0
    } else {
        -radius + font_size
    };
    (font_size, offset)
}

/// Moves both endpoints of a segment from the circle centres onto the circle
/// boundaries.
pub(super) fn trim_to_boundaries(
    source: Vec2,
    target: Vec2,
    source_radius: f32,
    target_radius: f32,
) -> (Vec2, Vec2) {
    let delta = source - target;
    let distance = delta.length();
    if distance <= f32::EPSILON {
        return (source, target);
    }
    let direction = delta / distance;
    (source - direction * source_radius, target + direction * target_radius)
}

pub(super) fn draw_arrow_head(painter: &Painter, tip: Pos2, from: Pos2, size: f32, stroke: Stroke) {
    let delta = tip - from;
    let length = delta.length();
    if length <= f32::EPSILON {
        return;
    }
    let back = delta / length * size;
    let side = vec2(-back.y, back.x) * 0.5;
    painter.line_segment([tip, tip - back + side], stroke);
    painter.line_segment([tip, tip - back - side], stroke);
}

pub(super) fn distance_to_segment(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_sq();
    if length_sq <= f32::EPSILON {
        return point.distance(start);
    }
    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    point.distance(start + segment * t)
}
