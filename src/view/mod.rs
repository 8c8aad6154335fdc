mod error;
mod expansion;
mod geometry;
mod particle;
mod synth;

pub use error::ViewError;
pub use expansion::ExpansionSet;
pub use geometry::Geometry;
pub use particle::{FieldParticle, Fiber, Motion, Particle, ParticleKey};
pub use synth::synthesize;
