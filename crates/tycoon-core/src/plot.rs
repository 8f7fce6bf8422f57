//! Plots - land parcels a player owns while connected.
//!
//! A plot cycles `Unassigned → Assigned → Unassigned` and is never
//! destroyed; on leave its structures are wiped and it goes back to the
//! pool. Placed structures live under the plot's `Structures` folder in the
//! host world and are tracked in insertion order keyed by instance id.

use std::sync::Arc;

use hecs::Entity;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{Catalog, Structure};
use crate::collision::{CollisionOracle, Footprint};
use crate::components::{Body, PlayerId, PlotId, Transform};
use crate::error::PlotError;
use crate::instance::{SerializedStructureInstance, StructureInstance};
use crate::ordered_map::OrderedMap;
use crate::world::HostWorld;

/// Well-known child holding a plot's placed structures
pub const STRUCTURES_FOLDER: &str = "Structures";
/// Well-known child whose transform placements can be expressed against
pub const PLATFORM: &str = "Platform";

/// How far a footprint may overhang the platform edge
const EDGE_TOLERANCE: f32 = 0.01;

/// Persisted form of a plot's contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SerializedPlot {
    pub structures: Vec<SerializedStructureInstance>,
}

/// A land parcel
#[derive(Debug)]
pub struct Plot {
    id: PlotId,
    player: Option<PlayerId>,
    /// The plot's object in the host world
    instance: Entity,
    structures: OrderedMap<Uuid, StructureInstance>,
}

impl Plot {
    pub fn new(id: PlotId, instance: Entity) -> Self {
        Self {
            id,
            player: None,
            instance,
            structures: OrderedMap::new(),
        }
    }

    pub fn id(&self) -> PlotId {
        self.id
    }

    pub fn player(&self) -> Option<PlayerId> {
        self.player
    }

    pub fn instance(&self) -> Entity {
        self.instance
    }

    pub fn is_assigned(&self) -> bool {
        self.player.is_some()
    }

    pub fn structures(&self) -> &OrderedMap<Uuid, StructureInstance> {
        &self.structures
    }

    pub fn structure_count(&self) -> usize {
        self.structures.len()
    }

    pub fn assign_player(&mut self, player: PlayerId) -> Result<(), PlotError> {
        if let Some(current) = self.player {
            return Err(PlotError::AlreadyAssigned {
                plot: self.id,
                player: current,
            });
        }
        self.player = Some(player);
        log::info!("{} assigned to {}", self.id, player);
        Ok(())
    }

    /// Clear the plot and release it. Does nothing on an unassigned plot.
    ///
    /// The plot is unassigned even if clearing reports a leak; the leak is
    /// still returned so the caller can record it.
    pub fn unassign_player(&mut self, world: &mut HostWorld) -> Result<(), PlotError> {
        let Some(player) = self.player else {
            return Ok(());
        };
        let cleared = self.clear(world);
        self.player = None;
        log::info!("{} released by {}", self.id, player);
        cleared
    }

    pub fn platform(&self, world: &HostWorld) -> Option<Entity> {
        world.find_first_child(self.instance, PLATFORM)
    }

    pub fn platform_transform(&self, world: &HostWorld) -> Option<Transform> {
        world.transform(self.platform(world)?)
    }

    /// Place a structure instance.
    ///
    /// Every check (anchor geometry, platform, plot bounds, collision) runs
    /// before anything is spawned, so a failure leaves both the plot and the
    /// world untouched. When the plot has a platform the footprint must lie
    /// on it; plots without one accept any position.
    pub fn add_structure(
        &mut self,
        world: &mut HostWorld,
        oracle: &dyn CollisionOracle,
        mut instance: StructureInstance,
        transform: Transform,
        relative_to_platform: bool,
    ) -> Result<Uuid, PlotError> {
        let structure = Arc::clone(instance.structure());
        let id = instance.id();
        if self.structures.contains_key(&id) {
            return Err(PlotError::DuplicateInstance {
                plot: self.id,
                instance: id,
            });
        }

        let anchor = structure
            .template
            .anchor
            .ok_or_else(|| PlotError::MissingAnchorGeometry {
                structure: structure.id.clone(),
            })?;

        let platform = self.platform(world);
        let target = if relative_to_platform {
            let platform = platform
                .and_then(|entity| world.transform(entity))
                .ok_or(PlotError::MissingPlatform { plot: self.id })?;
            platform * transform
        } else {
            transform
        };

        let footprint = Footprint::new(target, structure.template.size, anchor);
        if let Some(area) = platform.and_then(|entity| world.world_bounds(entity)) {
            if !area.contains_xz(&footprint.bounds(), EDGE_TOLERANCE) {
                return Err(PlotError::OutOfBounds {
                    plot: self.id,
                    structure: structure.id.clone(),
                });
            }
        }

        let excluded: Vec<Entity> = platform.into_iter().collect();
        if oracle.is_collided(world, &footprint, self.instance, &excluded) {
            return Err(PlotError::PlacementCollision {
                plot: self.id,
                structure: structure.id.clone(),
            });
        }

        let folder = self.structures_folder(world)?;
        let body = Body::solid(structure.template.size)
            .with_offset(anchor)
            .decor();
        let model = world.spawn_body(
            structure.template.model.clone(),
            Some(folder),
            body,
            Transform::IDENTITY,
        );
        world.set_transform(model, target);
        instance.attach(model);

        self.structures.replace(id, instance);
        log::debug!("{} placed '{}' as {}", self.id, structure.id, id);
        Ok(id)
    }

    /// Destroy one placed structure
    pub fn remove_structure(
        &mut self,
        world: &mut HostWorld,
        id: Uuid,
    ) -> Result<StructureInstance, PlotError> {
        let instance = self
            .structures
            .remove(&id)
            .ok_or(PlotError::InstanceNotFound {
                plot: self.id,
                instance: id,
            })?;
        if let Some(model) = instance.model() {
            world.destroy(model);
        }
        log::debug!("{} removed {}", self.id, id);
        Ok(instance)
    }

    /// Destroy every placed structure, then verify the structures folder is
    /// empty. Anything left behind is logged, destroyed and reported.
    pub fn clear(&mut self, world: &mut HostWorld) -> Result<(), PlotError> {
        for (_, instance) in self.structures.drain() {
            if let Some(model) = instance.model() {
                world.destroy(model);
            }
        }

        let Some(folder) = world.find_first_child(self.instance, STRUCTURES_FOLDER) else {
            return Ok(());
        };
        let leaked = world.children(folder);
        if leaked.is_empty() {
            return Ok(());
        }

        log::error!(
            "{} leaked {} object(s) in its structures folder after clearing",
            self.id,
            leaked.len()
        );
        for entity in &leaked {
            world.destroy(*entity);
        }
        Err(PlotError::ObjectLeakDetected {
            plot: self.id,
            leaked: leaked.len(),
        })
    }

    /// Snapshot in insertion order, relative to the platform when there is
    /// one.
    pub fn serialize(&self, world: &HostWorld) -> SerializedPlot {
        let reference = self.platform_transform(world);
        let structures = self
            .structures
            .values()
            .filter_map(|instance| {
                let entry = instance.serialize(world, reference.as_ref());
                if entry.is_none() {
                    log::warn!("{} lost the model of {}", self.id, instance.id());
                }
                entry
            })
            .collect();
        SerializedPlot { structures }
    }

    /// Re-place a snapshot's structures, all or nothing.
    ///
    /// Every structure id is resolved before anything is placed. If a
    /// placement then fails, the instances placed by this call are removed
    /// again and the error is returned. Returns how many were placed.
    pub fn restore(
        &mut self,
        world: &mut HostWorld,
        oracle: &dyn CollisionOracle,
        catalog: &Catalog,
        snapshot: &SerializedPlot,
    ) -> Result<usize, PlotError> {
        let resolved = snapshot
            .structures
            .iter()
            .map(|entry| {
                catalog
                    .find_structure(&entry.structure_id)
                    .map(|structure| (entry, Arc::clone(structure)))
                    .ok_or_else(|| PlotError::StructureNotFound(entry.structure_id.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let relative = self.platform(world).is_some();
        let mut placed = Vec::with_capacity(resolved.len());
        for (entry, structure) in resolved {
            let instance = StructureInstance::new(entry.id, structure);
            match self.add_structure(world, oracle, instance, entry.transform, relative) {
                Ok(id) => placed.push(id),
                Err(e) => {
                    for id in placed {
                        // just placed by this call, so always present
                        let _ = self.remove_structure(world, id);
                    }
                    log::warn!("{} restore rolled back: {}", self.id, e);
                    return Err(e);
                }
            }
        }
        Ok(placed.len())
    }

    /// Place a fresh instance of a catalog structure
    pub fn place<R: Rng>(
        &mut self,
        world: &mut HostWorld,
        oracle: &dyn CollisionOracle,
        structure: &Arc<Structure>,
        transform: Transform,
        relative_to_platform: bool,
        rng: &mut R,
    ) -> Result<Uuid, PlotError> {
        let instance = StructureInstance::generate(Arc::clone(structure), rng);
        self.add_structure(world, oracle, instance, transform, relative_to_platform)
    }

    fn structures_folder(&self, world: &mut HostWorld) -> Result<Entity, PlotError> {
        if !world.contains(self.instance) {
            return Err(PlotError::InvalidWorld(format!(
                "{} has no object in the world",
                self.id
            )));
        }
        Ok(match world.find_first_child(self.instance, STRUCTURES_FOLDER) {
            Some(folder) => folder,
            None => world.spawn_folder(STRUCTURES_FOLDER, Some(self.instance)),
        })
    }
}
