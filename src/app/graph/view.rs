use eframe::egui::{self, Align2, Color32, FontId, Painter, Rect, Sense, Stroke, Ui, Vec2, vec2};

use crate::deps::Direction;
use crate::view::{FieldParticle, Geometry, Particle};

use super::super::render_utils::{
    LEAF_COLOR, OUTLINE_COLOR, circle_visible, draw_arrow_head, draw_background, fiber_stroke,
    field_fill, label_layout, trim_to_boundaries, world_to_screen,
};
use super::super::{SelectedFiber, ViewModel};
use super::HitTargets;

const LABEL_COLOR: Color32 = Color32::from_rgb(236, 239, 244);

struct Frame {
    rect: Rect,
    pan: Vec2,
    zoom: f32,
    geometry: Geometry,
}

impl Frame {
    fn to_screen(&self, world: Vec2) -> egui::Pos2 {
        world_to_screen(self.rect, self.pan, self.zoom, world)
    }
}

fn local_position(particle: &Particle) -> Vec2 {
    let motion = particle.motion();
    vec2(motion.x, motion.y)
}

/// Paints `field`'s fibers and particles around `origin` (world space), then
/// recurses into expanded sub-fields.
fn paint_field(
    painter: &Painter,
    frame: &Frame,
    field: &FieldParticle,
    origin: Vec2,
    selected: Option<&SelectedFiber>,
    hits: &mut HitTargets,
) {
    for fiber in &field.fibers {
        let Some((source, target)) = field.fiber_endpoints(fiber) else {
            continue;
        };
        let (start, end) = trim_to_boundaries(
            origin + local_position(source),
            origin + local_position(target),
            fiber.source_radius,
            fiber.target_radius,
        );
        let (start, end) = (frame.to_screen(start), frame.to_screen(end));

        let selection = SelectedFiber {
            field_id: field.id.clone(),
            fiber_id: fiber.id.clone(),
        };
        let mut stroke = fiber_stroke(fiber.direction, frame.zoom);
        if selected == Some(&selection) {
            stroke.width *= 2.0;
        }

        painter.line_segment([start, end], stroke);
        let head = 6.0 * frame.zoom.sqrt() + stroke.width;
        draw_arrow_head(painter, end, start, head, stroke);
        if fiber.direction == Direction::Mutual {
            draw_arrow_head(painter, start, end, head, stroke);
        }
        hits.push_fiber(start, end, selection);
    }

    for particle in &field.particles {
        let center_world = origin + local_position(particle);
        let center = frame.to_screen(center_world);
        let radius = frame
            .geometry
            .particle_radius(particle)
            .unwrap_or(frame.geometry.particle_radius_unit);
        let (font_size, label_offset) = label_layout(radius);
        let visible = circle_visible(
            frame.rect,
            center,
            (radius + font_size.abs() + label_offset.abs()) * frame.zoom,
        );

        match particle {
            Particle::Leaf(_) => {
                if visible {
                    painter.circle_filled(center, radius * frame.zoom, LEAF_COLOR);
                }
            }
            Particle::Field(child) => {
                if visible {
                    painter.circle(
                        center,
                        radius * frame.zoom,
                        field_fill(child),
                        Stroke::new(3.0 * frame.zoom.sqrt(), OUTLINE_COLOR),
                    );
                }
                if child.is_expanded {
                    paint_field(painter, frame, child, center_world, selected, hits);
                }
            }
        }

        if visible {
            let label_rect = painter.text(
                frame.to_screen(center_world + vec2(0.0, label_offset)),
                Align2::CENTER_CENTER,
                particle.name(),
                FontId::proportional((font_size * frame.zoom).clamp(6.0, 64.0)),
                LABEL_COLOR,
            );
            if let Particle::Field(child) = particle {
                hits.push_label(label_rect, &child.id);
            }
        }
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.pan, self.zoom);

        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);

        let frame = Frame {
            rect,
            pan: self.pan,
            zoom: self.zoom,
            geometry: *self.session.geometry(),
        };
        let field = self.session.present();

        if self.live_physics && self.simulations.step(field, &frame.geometry, self.physics) {
            ui.ctx().request_repaint();
        }

        let mut hits = HitTargets::default();
        paint_field(
            &painter,
            &frame,
            field,
            Vec2::ZERO,
            self.selected_fiber.as_ref(),
            &mut hits,
        );

        let hovering_label = ui
            .input(|input| input.pointer.hover_pos())
            .is_some_and(|pointer| hits.field_at(pointer).is_some());
        if hovering_label {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        self.handle_graph_click(&response, &hits);
    }
}
