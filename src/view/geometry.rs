use serde::{Deserialize, Serialize};

use super::error::GeometryError;
use super::particle::{FieldParticle, Particle};

/// Sizing constants shared by the view stage and the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub particle_radius_unit: f32,
    pub particle_margin: f32,
    pub field_min_padding: f32,
    pub field_padding_ratio: f32,
    /// Extra clearance the simulation keeps around every particle.
    pub field_margin: f32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            particle_radius_unit: 10.0,
            particle_margin: 10.0,
            field_min_padding: 20.0,
            field_padding_ratio: 0.1,
            field_margin: 20.0,
        }
    }
}

impl Geometry {
    pub fn particle_radius(&self, particle: &Particle) -> Result<f32, GeometryError> {
        match particle {
            Particle::Leaf(_) => Ok(self.particle_radius_unit),
            Particle::Field(field) => field.radius(),
        }
    }

    pub fn collision_radius(&self, particle: &Particle) -> Result<f32, GeometryError> {
        Ok(self.particle_radius(particle)? + self.field_margin)
    }

    /// Packs the children as if their padded discs were laid out by area,
    /// then adds padding proportional to that base radius.
    pub fn field_radius(&self, particles: &[Particle]) -> Result<f32, GeometryError> {
        let mut area = 0.0;
        for particle in particles {
            let padded = self.particle_radius(particle)? + self.particle_margin;
            area += padded * padded;
        }

        let base = f32::sqrt(area);
        Ok(base + self.field_min_padding.max(base * self.field_padding_ratio))
    }

    /// Computes the radius of `field` from its already-sized children and
    /// copies endpoint radii onto its fibers.
    pub(super) fn finalize(&self, field: &mut FieldParticle) -> Result<(), GeometryError> {
        field.radius = Some(self.field_radius(&field.particles)?);

        for fiber in &mut field.fibers {
            let (source, target) = (&field.particles[fiber.source], &field.particles[fiber.target]);
            fiber.source_radius = self.particle_radius(source)?;
            fiber.target_radius = self.particle_radius(target)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::particle::LeafParticle;
    use crate::deps::{NodeKind, PathNode};

    fn leaf(id: &str) -> Particle {
        Particle::Leaf(LeafParticle::new(&PathNode {
            id: id.to_owned(),
            name: id.to_owned(),
            kind: NodeKind::Leaf,
            children: Vec::new(),
            parent: None,
            include_both_direction: false,
        }))
    }

    #[test]
    fn empty_field_is_pure_padding() {
        let geometry = Geometry::default();
        assert_eq!(geometry.field_radius(&[]), Ok(geometry.field_min_padding));
    }

    #[test]
    fn radius_grows_with_children() {
        let geometry = Geometry::default();
        let one = geometry.field_radius(&[leaf("a")]).expect("sized");
        let three = geometry
            .field_radius(&[leaf("a"), leaf("b"), leaf("c")])
            .expect("sized");

        assert_eq!(one, 20.0 + 20.0);
        assert!(three > one);
        assert!(three > geometry.particle_radius_unit + geometry.particle_margin);
    }

    #[test]
    fn proportional_padding_takes_over_for_large_fields() {
        let geometry = Geometry::default();
        let particles = (0..400).map(|index| leaf(&format!("m{index}"))).collect::<Vec<_>>();
        let radius = geometry.field_radius(&particles).expect("sized");

        let base = (400.0_f32 * 20.0 * 20.0).sqrt();
        assert!((radius - base * 1.1).abs() < 1e-3);
    }

    #[test]
    fn unsized_field_cannot_be_read() {
        let geometry = Geometry::default();
        let field = Particle::Field(FieldParticle::new("lib", "lib", false));

        assert_eq!(
            geometry.particle_radius(&field),
            Err(GeometryError::RadiusNotComputed("lib".to_owned()))
        );
        assert!(geometry.field_radius(&[field]).is_err());
    }
}
