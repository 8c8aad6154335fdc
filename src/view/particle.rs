use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::deps::{Direction, EdgeKey, Origin, PathNode, ROOT_FIELD_ID};

use super::error::GeometryError;

/// Identity of a particle object. Reusing a particle across rebuilds keeps
/// its key; a freshly allocated particle always gets a new one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ParticleKey(u64);

impl ParticleKey {
    fn fresh() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Position and velocity owned by the simulation, relative to the centre of
/// the enclosing field. The view stage never reads these; it only zeroes the
/// velocity on rebuild.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Motion {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Particle {
    Leaf(LeafParticle),
    Field(FieldParticle),
}

impl Particle {
    pub fn id(&self) -> &str {
        match self {
            Self::Leaf(leaf) => &leaf.id,
            Self::Field(field) => &field.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Leaf(leaf) => &leaf.name,
            Self::Field(field) => &field.name,
        }
    }

    pub fn key(&self) -> ParticleKey {
        match self {
            Self::Leaf(leaf) => leaf.key,
            Self::Field(field) => field.key,
        }
    }

    pub fn motion(&self) -> &Motion {
        match self {
            Self::Leaf(leaf) => &leaf.motion,
            Self::Field(field) => &field.motion,
        }
    }

    pub fn motion_mut(&mut self) -> &mut Motion {
        match self {
            Self::Leaf(leaf) => &mut leaf.motion,
            Self::Field(field) => &mut field.motion,
        }
    }

    pub fn as_field(&self) -> Option<&FieldParticle> {
        match self {
            Self::Field(field) => Some(field),
            Self::Leaf(_) => None,
        }
    }

    pub fn as_field_mut(&mut self) -> Option<&mut FieldParticle> {
        match self {
            Self::Field(field) => Some(field),
            Self::Leaf(_) => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LeafParticle {
    pub(super) key: ParticleKey,
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub motion: Motion,
}

impl LeafParticle {
    pub(super) fn new(node: &PathNode) -> Self {
        Self {
            key: ParticleKey::fresh(),
            id: node.id.clone(),
            name: node.name.clone(),
            motion: Motion::default(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldParticle {
    pub(super) key: ParticleKey,
    pub id: String,
    pub name: String,
    pub particles: Vec<Particle>,
    pub fibers: Vec<Fiber>,
    pub is_expanded: bool,
    pub(super) radius: Option<f32>,
    pub include_both_direction: bool,
    pub is_root: bool,
    #[serde(flatten)]
    pub motion: Motion,
    /// Children set aside while the field is collapsed, picked up again on
    /// the next expansion.
    #[serde(skip)]
    pub(super) dormant: Vec<Particle>,
}

impl FieldParticle {
    pub(super) fn new(id: &str, name: &str, include_both_direction: bool) -> Self {
        Self {
            key: ParticleKey::fresh(),
            id: id.to_owned(),
            name: name.to_owned(),
            particles: Vec::new(),
            fibers: Vec::new(),
            is_expanded: false,
            radius: None,
            include_both_direction,
            is_root: false,
            motion: Motion::default(),
            dormant: Vec::new(),
        }
    }

    pub fn key(&self) -> ParticleKey {
        self.key
    }

    pub fn radius(&self) -> Result<f32, GeometryError> {
        self.radius
            .ok_or_else(|| GeometryError::RadiusNotComputed(self.id.clone()))
    }

    pub fn fiber_endpoints(&self, fiber: &Fiber) -> Option<(&Particle, &Particle)> {
        Some((self.particles.get(fiber.source)?, self.particles.get(fiber.target)?))
    }

    /// Visits every descendant particle, parents before their children.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Particle)) {
        for particle in &self.particles {
            visit(particle);
            if let Particle::Field(field) = particle {
                field.walk(visit);
            }
        }
    }

    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut Particle)) {
        for particle in &mut self.particles {
            visit(particle);
            if let Particle::Field(field) = particle {
                field.walk_mut(visit);
            }
        }
    }

    /// Like [`walk`](Self::walk), but also descends into the children that
    /// collapsed fields keep for their next expansion.
    pub fn walk_retained<'a>(&'a self, visit: &mut impl FnMut(&'a Particle)) {
        for particle in self.particles.iter().chain(&self.dormant) {
            visit(particle);
            if let Particle::Field(field) = particle {
                field.walk_retained(visit);
            }
        }
    }

    /// Finds the field with `id` in this subtree, including this field.
    pub fn find_field(&self, id: &str) -> Option<&FieldParticle> {
        if self.id == id {
            return Some(self);
        }
        self.particles
            .iter()
            .filter_map(Particle::as_field)
            .find_map(|field| field.find_field(id))
    }
}

/// An empty, unsized root field. Stands in while a tree is being rebuilt.
impl Default for FieldParticle {
    fn default() -> Self {
        let mut field = Self::new(ROOT_FIELD_ID, ROOT_FIELD_ID, false);
        field.is_root = true;
        field
    }
}

/// An edge between two direct children of one field.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fiber {
    pub id: EdgeKey,
    pub direction: Direction,
    /// Index into the owning field's `particles`.
    #[serde(skip)]
    pub source: usize,
    #[serde(skip)]
    pub target: usize,
    #[serde(rename = "source")]
    pub source_id: String,
    #[serde(rename = "target")]
    pub target_id: String,
    pub source_radius: f32,
    pub target_radius: f32,
    pub origins: Vec<Origin>,
}
