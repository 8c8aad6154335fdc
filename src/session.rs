use thiserror::Error;
use tracing::{debug, info, warn};

use crate::deps::{DependencyModel, ModelError};
use crate::view::{ExpansionSet, FieldParticle, Geometry, Particle, ViewError, synthesize};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no node with id {0:?}")]
    UnknownNode(String),

    #[error("node {0:?} has no children to expand")]
    NotAGroup(String),

    #[error("the current particle tree has not been handed to the renderer yet")]
    ToggleWhileRendering,

    #[error(transparent)]
    View(#[from] ViewError),
}

impl From<ModelError> for SessionError {
    fn from(error: ModelError) -> Self {
        Self::View(ViewError::Model(error))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// A tree was just produced and not yet picked up by the renderer.
    Rendering,
    /// The renderer owns the current tree; one toggle may be applied.
    WaitingForToggle,
}

/// One visualization session: the model, the expansion set and the particle
/// tree currently shown.
///
/// Toggles are applied one at a time and each runs a full rebuild before the
/// next one is accepted.
pub struct Session {
    model: DependencyModel,
    geometry: Geometry,
    expansions: ExpansionSet,
    field: FieldParticle,
    state: SessionState,
}

impl Session {
    pub fn new(
        model: DependencyModel,
        geometry: Geometry,
        expansions: ExpansionSet,
    ) -> Result<Self, SessionError> {
        for id in expansions.iter() {
            ensure_group(&model, id)?;
        }

        let field = synthesize(&model, &expansions, &geometry, None)?;
        Ok(Self {
            model,
            geometry,
            expansions,
            field,
            state: SessionState::Rendering,
        })
    }

    #[cfg(test)]
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn model(&self) -> &DependencyModel {
        &self.model
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn expansions(&self) -> &ExpansionSet {
        &self.expansions
    }

    pub fn field(&self) -> &FieldParticle {
        &self.field
    }

    /// Hands the current tree to the renderer, which may then move its
    /// particles, and starts waiting for the next toggle.
    pub fn present(&mut self) -> &mut FieldParticle {
        self.state = SessionState::WaitingForToggle;
        &mut self.field
    }

    /// Flips `id` in the expansion set and rebuilds the tree on top of the
    /// previous one.
    pub fn toggle(&mut self, id: &str) -> Result<&FieldParticle, SessionError> {
        self.ensure_waiting()?;
        self.rebuild(id)?;
        Ok(&self.field)
    }

    /// Expands every collapsed ancestor of `id`, one rebuild at a time.
    /// Returns the number of rebuilds applied.
    pub fn reveal(&mut self, id: &str) -> Result<usize, SessionError> {
        self.ensure_waiting()?;
        if self.model.node(id).is_none() {
            return Err(SessionError::UnknownNode(id.to_owned()));
        }

        let collapsed = self
            .model
            .ancestors(id)
            .into_iter()
            .filter(|ancestor| !self.expansions.contains(&ancestor.id))
            .map(|ancestor| ancestor.id.clone())
            .collect::<Vec<_>>();

        for ancestor in &collapsed {
            self.rebuild(ancestor)?;
        }
        Ok(collapsed.len())
    }

    /// Collapses every expanded group, most recently expanded first.
    pub fn collapse_all(&mut self) -> Result<(), SessionError> {
        self.ensure_waiting()?;
        let expanded = self.expansions.iter().map(str::to_owned).collect::<Vec<_>>();
        for id in expanded.iter().rev() {
            self.rebuild(id)?;
        }
        Ok(())
    }

    fn ensure_waiting(&self) -> Result<(), SessionError> {
        if self.state == SessionState::WaitingForToggle {
            Ok(())
        } else {
            Err(SessionError::ToggleWhileRendering)
        }
    }

    /// Builds the tree for the expansion set with `id` flipped and commits
    /// both only once the build succeeds. On failure the expansion set is
    /// left as it was and the tree is built again from scratch for it.
    fn rebuild(&mut self, id: &str) -> Result<(), SessionError> {
        ensure_group(&self.model, id)?;

        let mut expansions = self.expansions.clone();
        let expanded = expansions.toggle(id);
        let previous = std::mem::take(&mut self.field);
        let field = match synthesize(&self.model, &expansions, &self.geometry, Some(previous)) {
            Ok(field) => field,
            Err(error) => {
                warn!(node = id, "rebuild failed, restoring previous expansions: {error}");
                self.field = synthesize(&self.model, &self.expansions, &self.geometry, None)?;
                self.state = SessionState::Rendering;
                return Err(error.into());
            }
        };

        self.expansions = expansions;
        self.field = field;
        reset_velocity(&mut self.field);
        self.state = SessionState::Rendering;

        info!(node = id, expanded, "toggled group");
        debug!(
            expanded_groups = self.expansions.len(),
            particles = count_particles(&self.field),
            "rebuilt particle tree"
        );
        Ok(())
    }
}

fn ensure_group(model: &DependencyModel, id: &str) -> Result<(), SessionError> {
    match model.node(id) {
        None => Err(SessionError::UnknownNode(id.to_owned())),
        Some(node) if !node.is_group() => Err(SessionError::NotAGroup(id.to_owned())),
        Some(_) => Ok(()),
    }
}

fn reset_velocity(field: &mut FieldParticle) {
    field.walk_mut(&mut |particle: &mut Particle| {
        let motion = particle.motion_mut();
        motion.vx = 0.0;
        motion.vy = 0.0;
    });
}

fn count_particles(field: &FieldParticle) -> usize {
    let mut count = 0;
    field.walk(&mut |_| count += 1);
    count
}
