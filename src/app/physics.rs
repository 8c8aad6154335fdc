use std::collections::{HashMap, HashSet};
use std::f32::consts::PI;

use crate::view::{FieldParticle, Geometry, Motion, Particle, ParticleKey};

const ALPHA_START: f32 = 0.5;
const ALPHA_DECAY: f32 = 0.1;
const ALPHA_MIN: f32 = 0.001;
const INITIAL_RADIUS: f32 = 10.0;

/// Force parameters shared by every field simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct PhysicsConfig {
    pub(super) link_strength: f32,
    pub(super) link_distance: f32,
    pub(super) center_strength: f32,
    pub(super) collide_strength: f32,
    pub(super) velocity_decay: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            link_strength: 0.1,
            link_distance: 30.0,
            center_strength: 0.3,
            collide_strength: 1.0,
            velocity_decay: 0.6,
        }
    }
}

/// One cooling simulation per rendered field: the root and every expanded
/// field. Each works in its field's local coordinates.
#[derive(Default)]
pub(super) struct Simulations {
    alphas: HashMap<String, f32>,
    placed: HashSet<ParticleKey>,
    scratch: Vec<Motion>,
    radii: Vec<f32>,
}

impl Simulations {
    /// Drops every running simulation and starts one for each field of the
    /// new tree. Particles seen for the first time get an initial spot on a
    /// phyllotaxis spiral; reused ones keep their position. Particles held by
    /// collapsed fields stay placed.
    pub(super) fn restart(&mut self, root: &mut FieldParticle) {
        self.alphas.clear();
        self.start_field(root);

        let mut alive = HashSet::new();
        root.walk_retained(&mut |particle| {
            alive.insert(particle.key());
        });
        self.placed.retain(|key| alive.contains(key));
    }

    fn start_field(&mut self, field: &mut FieldParticle) {
        if !field.is_expanded {
            return;
        }
        self.alphas.insert(field.id.clone(), ALPHA_START);

        for (index, particle) in field.particles.iter_mut().enumerate() {
            if self.placed.insert(particle.key()) {
                let radius = INITIAL_RADIUS * (0.5 + index as f32).sqrt();
                let angle = index as f32 * PI * (3.0 - 5.0_f32.sqrt());
                let motion = particle.motion_mut();
                motion.x = radius * angle.cos();
                motion.y = radius * angle.sin();
            }
            if let Particle::Field(child) = particle {
                self.start_field(child);
            }
        }
    }

    pub(super) fn reheat(&mut self) {
        for alpha in self.alphas.values_mut() {
            *alpha = ALPHA_START;
        }
    }

    /// Advances every field that has not cooled down yet. Returns whether
    /// anything moved.
    pub(super) fn step(
        &mut self,
        field: &mut FieldParticle,
        geometry: &Geometry,
        config: PhysicsConfig,
    ) -> bool {
        let mut moving = false;

        if let Some(alpha) = self.alphas.get(&field.id).copied()
            && alpha >= ALPHA_MIN
        {
            self.tick(field, alpha, geometry, config);
            self.alphas
                .insert(field.id.clone(), alpha * (1.0 - ALPHA_DECAY));
            moving = true;
        }

        for particle in &mut field.particles {
            if let Particle::Field(child) = particle {
                moving |= self.step(child, geometry, config);
            }
        }
        moving
    }

    fn tick(
        &mut self,
        field: &mut FieldParticle,
        alpha: f32,
        geometry: &Geometry,
        config: PhysicsConfig,
    ) {
        let count = field.particles.len();
        if count == 0 {
            return;
        }

        self.scratch.clear();
        self.radii.clear();
        for particle in &field.particles {
            self.scratch.push(*particle.motion());
            self.radii.push(
                geometry
                    .collision_radius(particle)
                    .unwrap_or(geometry.particle_radius_unit + geometry.field_margin),
            );
        }
        let motions = &mut self.scratch;

        for fiber in &field.fibers {
            let (source, target) = (fiber.source, fiber.target);
            if source >= count || target >= count {
                continue;
            }
            let mut dx = (motions[target].x + motions[target].vx)
                - (motions[source].x + motions[source].vx);
            let mut dy = (motions[target].y + motions[target].vy)
                - (motions[source].y + motions[source].vy);
            if dx == 0.0 && dy == 0.0 {
                (dx, dy) = jiggle(target);
            }
            let length = (dx * dx + dy * dy).sqrt();
            let scale = (length - config.link_distance) / length * alpha * config.link_strength;
            dx *= scale;
            dy *= scale;
            motions[target].vx -= dx * 0.5;
            motions[target].vy -= dy * 0.5;
            motions[source].vx += dx * 0.5;
            motions[source].vy += dy * 0.5;
        }

        for motion in motions.iter_mut() {
            motion.vx -= motion.x * config.center_strength * alpha;
            motion.vy -= motion.y * config.center_strength * alpha;
        }

        for first in 0..count {
            for second in (first + 1)..count {
                let reach = self.radii[first] + self.radii[second];
                let mut dx = (motions[first].x + motions[first].vx)
                    - (motions[second].x + motions[second].vx);
                let mut dy = (motions[first].y + motions[first].vy)
                    - (motions[second].y + motions[second].vy);
                if dx == 0.0 && dy == 0.0 {
                    (dx, dy) = jiggle(first + second);
                }
                let distance_sq = dx * dx + dy * dy;
                if distance_sq >= reach * reach {
                    continue;
                }

                let distance = distance_sq.sqrt();
                let push = (reach - distance) / distance * config.collide_strength;
                let first_sq = self.radii[first] * self.radii[first];
                let second_sq = self.radii[second] * self.radii[second];
                let share = second_sq / (first_sq + second_sq);
                motions[first].vx += dx * push * share;
                motions[first].vy += dy * push * share;
                motions[second].vx -= dx * push * (1.0 - share);
                motions[second].vy -= dy * push * (1.0 - share);
            }
        }

        let keep = 1.0 - config.velocity_decay;
        for (particle, motion) in field.particles.iter_mut().zip(motions.iter()) {
            let target = particle.motion_mut();
            target.vx = motion.vx * keep;
            target.vy = motion.vy * keep;
            target.x = motion.x + target.vx;
            target.y = motion.y + target.vy;
        }
    }
}

/// Tiny deterministic offset used when two particles sit on the same spot.
fn jiggle(seed: usize) -> (f32, f32) {
    let angle = seed as f32 * 2.399_963;
    (angle.cos() * 1e-3, angle.sin() * 1e-3)
}
