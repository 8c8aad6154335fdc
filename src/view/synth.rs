use crate::deps::{DependencyModel, ModelError, PathNode, ROOT_FIELD_ID};

use super::error::ViewError;
use super::expansion::ExpansionSet;
use super::geometry::Geometry;
use super::particle::{FieldParticle, Fiber, LeafParticle, Particle};

/// Builds the particle tree for `expansions`, reusing particles from
/// `previous` where possible.
///
/// Reuse is positional: the particle at index `i` of a previous field is
/// reused for the child at index `i` of the same field only when both carry
/// the same id and kind. Children that move to another index without
/// changing id get fresh particles. A collapsed field keeps its last
/// children aside, so collapsing and re-expanding a group hands back the
/// same particles.
pub fn synthesize(
    model: &DependencyModel,
    expansions: &ExpansionSet,
    geometry: &Geometry,
    previous: Option<FieldParticle>,
) -> Result<FieldParticle, ViewError> {
    let synthesizer = Synthesizer {
        model,
        expansions,
        geometry,
    };

    let roots = model.roots().map(|node| node.id.clone()).collect::<Vec<_>>();
    let spec = FieldSpec {
        id: ROOT_FIELD_ID,
        name: ROOT_FIELD_ID,
        children: &roots,
        include_both_direction: false,
    };
    let previous = previous.filter(|field| field.id == ROOT_FIELD_ID);

    let mut root = synthesizer.field(spec, previous)?;
    root.is_root = true;
    Ok(root)
}

struct FieldSpec<'a> {
    id: &'a str,
    name: &'a str,
    children: &'a [String],
    include_both_direction: bool,
}

impl<'a> From<&'a PathNode> for FieldSpec<'a> {
    fn from(node: &'a PathNode) -> Self {
        Self {
            id: &node.id,
            name: &node.name,
            children: &node.children,
            include_both_direction: node.include_both_direction,
        }
    }
}

struct Synthesizer<'a> {
    model: &'a DependencyModel,
    expansions: &'a ExpansionSet,
    geometry: &'a Geometry,
}

impl Synthesizer<'_> {
    fn is_expanded(&self, id: &str) -> bool {
        id == ROOT_FIELD_ID || self.expansions.contains(id)
    }

    fn field(
        &self,
        spec: FieldSpec<'_>,
        previous: Option<FieldParticle>,
    ) -> Result<FieldParticle, ViewError> {
        let is_expanded = self.is_expanded(spec.id);
        let mut field = merge_field(previous, &spec);
        let mut retained = std::mem::take(&mut field.particles);
        if retained.is_empty() {
            retained = std::mem::take(&mut field.dormant);
        }

        let mut particles = Vec::new();
        if !is_expanded {
            field.dormant = retained;
        } else {
            field.dormant.clear();
            let mut previous_children = retained.into_iter();
            particles.reserve(spec.children.len());
            for child_id in spec.children {
                let base = previous_children.next();
                let node = self
                    .model
                    .node(child_id)
                    .ok_or_else(|| ModelError::MissingNode(child_id.clone()))?;

                let particle = if node.is_group() {
                    let base = match base {
                        Some(Particle::Field(base)) if base.id == node.id => Some(base),
                        _ => None,
                    };
                    Particle::Field(self.field(FieldSpec::from(node), base)?)
                } else {
                    merge_leaf(base, node)
                };
                particles.push(particle);
            }
        }

        field.fibers = self.fibers(&particles);
        field.particles = particles;
        field.is_expanded = is_expanded;
        self.geometry.finalize(&mut field)?;
        Ok(field)
    }

    /// One fiber per pair of sibling particles that share an edge, in pair
    /// order.
    fn fibers(&self, particles: &[Particle]) -> Vec<Fiber> {
        let mut fibers = Vec::new();
        for (first_index, first) in particles.iter().enumerate() {
            for (offset, second) in particles[first_index + 1..].iter().enumerate() {
                let second_index = first_index + 1 + offset;
                let Some(edge) = self.model.edge_between(first.id(), second.id()) else {
                    continue;
                };

                let (source, target) = if edge.source == first.id() {
                    (first_index, second_index)
                } else {
                    (second_index, first_index)
                };
                fibers.push(Fiber {
                    id: edge.id.clone(),
                    direction: edge.direction,
                    source,
                    target,
                    source_id: edge.source.clone(),
                    target_id: edge.target.clone(),
                    source_radius: 0.0,
                    target_radius: 0.0,
                    origins: edge.origins.iter().cloned().collect(),
                });
            }
        }
        fibers
    }
}

/// Returns `previous` when it is the same leaf, otherwise a fresh one.
fn merge_leaf(previous: Option<Particle>, node: &PathNode) -> Particle {
    match previous {
        Some(Particle::Leaf(leaf)) if leaf.id == node.id => Particle::Leaf(leaf),
        _ => Particle::Leaf(LeafParticle::new(node)),
    }
}

/// Returns `previous` with its derived state cleared, or a fresh field.
fn merge_field(previous: Option<FieldParticle>, spec: &FieldSpec<'_>) -> FieldParticle {
    match previous {
        Some(mut field) if field.id == spec.id => {
            field.fibers.clear();
            field.radius = None;
            field
        }
        _ => FieldParticle::new(spec.id, spec.name, spec.include_both_direction),
    }
}
