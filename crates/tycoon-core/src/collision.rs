//! Placement collision queries.
//!
//! The plot never does geometry itself; it hands a [`Footprint`] to a
//! [`CollisionOracle`] and acts on the yes/no answer. The host engine
//! normally provides the oracle; [`AabbOracle`] answers from the
//! in-process [`HostWorld`].

use glam::Vec3;
use hecs::Entity;

use crate::components::{Bounds, Transform};
use crate::plot::STRUCTURES_FOLDER;
use crate::world::HostWorld;

/// A structure template's anchor box positioned at a candidate transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub transform: Transform,
    pub size: Vec3,
    /// Anchor box centre relative to `transform`
    pub offset: Vec3,
}

impl Footprint {
    pub fn new(transform: Transform, size: Vec3, offset: Vec3) -> Self {
        Self {
            transform,
            size,
            offset,
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::of_box(&self.transform, self.offset, self.size)
    }
}

/// Answers whether a footprint would intersect existing geometry or a
/// character inside a plot.
pub trait CollisionOracle {
    fn is_collided(
        &self,
        world: &HostWorld,
        footprint: &Footprint,
        plot: Entity,
        excluded: &[Entity],
    ) -> bool;
}

impl<F> CollisionOracle for F
where
    F: Fn(&HostWorld, &Footprint, Entity, &[Entity]) -> bool,
{
    fn is_collided(
        &self,
        world: &HostWorld,
        footprint: &Footprint,
        plot: Entity,
        excluded: &[Entity],
    ) -> bool {
        self(world, footprint, plot, excluded)
    }
}

/// Axis-aligned overlap test against placed structures and characters.
#[derive(Debug, Clone, Copy)]
pub struct AabbOracle {
    /// Overlap below this depth counts as touching
    pub tolerance: f32,
}

impl Default for AabbOracle {
    fn default() -> Self {
        Self { tolerance: 0.01 }
    }
}

impl CollisionOracle for AabbOracle {
    fn is_collided(
        &self,
        world: &HostWorld,
        footprint: &Footprint,
        plot: Entity,
        excluded: &[Entity],
    ) -> bool {
        let candidate = footprint.bounds();

        let placed = world
            .find_first_child(plot, STRUCTURES_FOLDER)
            .map(|folder| world.descendants(folder))
            .unwrap_or_default();

        placed
            .into_iter()
            .chain(world.characters())
            .filter(|entity| !excluded.contains(entity))
            .filter_map(|entity| world.world_bounds(entity))
            .any(|bounds| candidate.intersects(&bounds, self.tolerance))
    }
}
