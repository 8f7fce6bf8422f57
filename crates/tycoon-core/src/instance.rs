//! Placed occurrences of catalog structures.

use std::sync::Arc;

use hecs::Entity;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::Structure;
use crate::components::Transform;
use crate::world::HostWorld;

/// One placement of a [`Structure`] on a plot.
#[derive(Debug, Clone)]
pub struct StructureInstance {
    id: Uuid,
    structure: Arc<Structure>,
    /// Spawned model, set once the instance is placed
    model: Option<Entity>,
}

/// Persisted form of a placed structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedStructureInstance {
    pub id: Uuid,
    pub structure_id: String,
    pub transform: Transform,
}

impl StructureInstance {
    pub fn new(id: Uuid, structure: Arc<Structure>) -> Self {
        Self {
            id,
            structure,
            model: None,
        }
    }

    /// New instance with a random v4 id drawn from `rng`
    pub fn generate<R: Rng>(structure: Arc<Structure>, rng: &mut R) -> Self {
        let id = uuid::Builder::from_random_bytes(rng.gen()).into_uuid();
        Self::new(id, structure)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn structure(&self) -> &Arc<Structure> {
        &self.structure
    }

    pub fn model(&self) -> Option<Entity> {
        self.model
    }

    pub(crate) fn attach(&mut self, model: Entity) {
        self.model = Some(model);
    }

    /// Snapshot relative to `reference`, or in world space without one.
    /// `None` if the instance has no live model.
    pub fn serialize(
        &self,
        world: &HostWorld,
        reference: Option<&Transform>,
    ) -> Option<SerializedStructureInstance> {
        let absolute = world.transform(self.model?)?;
        let transform = match reference {
            Some(reference) => absolute.relative_to(reference),
            None => absolute,
        };
        Some(SerializedStructureInstance {
            id: self.id,
            structure_id: self.structure.id.clone(),
            transform,
        })
    }
}
