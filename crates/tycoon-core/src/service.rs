//! Plot service - main entry point. Owns the world, the plot pool and the
//! collision oracle, and routes player events and placement requests to
//! the right plot.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::collision::CollisionOracle;
use crate::components::{PlayerId, PlotId, Transform};
use crate::config::GameConfig;
use crate::error::{ConfigError, PlotError};
use crate::generation::PlotFactory;
use crate::ordered_map::OrderedMap;
use crate::persistence::{self, SaveError, SavedPlot};
use crate::plot::{Plot, SerializedPlot};
use crate::world::HostWorld;

/// Assigns plots to players and handles their placement requests.
///
/// Access is single-threaded: every mutating call takes `&mut self`, which
/// serializes work per plot. Wrap the service in a mutex to share it.
pub struct PlotService {
    world: HostWorld,
    catalog: Arc<Catalog>,
    oracle: Box<dyn CollisionOracle>,
    plots: OrderedMap<PlotId, Plot>,
    /// One plot per player
    owners: HashMap<PlayerId, PlotId>,
    /// Source of instance ids
    rng: StdRng,
}

impl PlotService {
    /// Lay out a fresh world from `config`
    pub fn new(
        config: &GameConfig,
        catalog: Arc<Catalog>,
        oracle: Box<dyn CollisionOracle>,
    ) -> Result<Self, ConfigError> {
        config.check()?;
        let mut world = HostWorld::new();
        PlotFactory::populate(&mut world, config);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self::from_world(world, catalog, oracle, rng)?)
    }

    /// Adopt a world that already holds plot placeholders
    pub fn from_world(
        world: HostWorld,
        catalog: Arc<Catalog>,
        oracle: Box<dyn CollisionOracle>,
        rng: StdRng,
    ) -> Result<Self, PlotError> {
        let plots = PlotFactory::discover(&world)?
            .into_iter()
            .map(|plot| (plot.id(), plot))
            .collect();
        Ok(Self {
            world,
            catalog,
            oracle,
            plots,
            owners: HashMap::new(),
            rng,
        })
    }

    pub fn world(&self) -> &HostWorld {
        &self.world
    }

    /// Direct world access for host-side objects such as avatars
    pub fn world_mut(&mut self) -> &mut HostWorld {
        &mut self.world
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn plots(&self) -> &OrderedMap<PlotId, Plot> {
        &self.plots
    }

    pub fn plot(&self, id: PlotId) -> Option<&Plot> {
        self.plots.get(&id)
    }

    pub fn plot_of(&self, player: PlayerId) -> Option<&Plot> {
        self.plots.get(self.owners.get(&player)?)
    }

    pub fn free_plot_count(&self) -> usize {
        self.plots.values().filter(|p| !p.is_assigned()).count()
    }

    /// Give a joining player the first free plot
    pub fn on_player_join(&mut self, player: PlayerId) -> Result<PlotId, PlotError> {
        let free = self
            .plots
            .values()
            .find(|p| !p.is_assigned())
            .map(Plot::id);
        let plot_id = match free {
            Some(plot_id) => plot_id,
            None => {
                log::warn!("No free plot for {}", player);
                return Err(PlotError::NoFreePlot { player });
            }
        };
        self.assign(player, plot_id)?;
        log::info!("{} joined and received {}", player, plot_id);
        Ok(plot_id)
    }

    /// Give a player one specific plot
    pub fn assign(&mut self, player: PlayerId, plot_id: PlotId) -> Result<(), PlotError> {
        if let Some(&owned) = self.owners.get(&player) {
            log::warn!("{} already owns {}", player, owned);
            return Err(PlotError::PlayerAlreadyHasPlot {
                player,
                plot: owned,
            });
        }
        let plot = self
            .plots
            .get_mut(&plot_id)
            .ok_or_else(|| PlotError::InvalidWorld(format!("unknown {}", plot_id)))?;
        plot.assign_player(player)?;
        self.owners.insert(player, plot_id);
        Ok(())
    }

    /// Release a leaving player's plot. Leaks are logged, not returned;
    /// the plot goes back to the pool either way.
    pub fn on_player_leave(&mut self, player: PlayerId) -> Option<PlotId> {
        let Some(plot_id) = self.owners.remove(&player) else {
            log::debug!("{} left without a plot", player);
            return None;
        };
        if let Some(plot) = self.plots.get_mut(&plot_id) {
            if let Err(e) = plot.unassign_player(&mut self.world) {
                log::error!("Integrity violation while releasing {}: {}", plot_id, e);
            }
        }
        log::info!("{} left, {} is free again", player, plot_id);
        Some(plot_id)
    }

    /// Place a catalog structure on the player's plot
    pub fn place_structure(
        &mut self,
        player: PlayerId,
        structure_id: &str,
        transform: Transform,
        relative_to_platform: bool,
    ) -> Result<Uuid, PlotError> {
        let result = self.try_place(player, structure_id, transform, relative_to_platform);
        if let Err(e) = &result {
            log::warn!("{} could not place '{}': {}", player, structure_id, e);
        }
        result
    }

    fn try_place(
        &mut self,
        player: PlayerId,
        structure_id: &str,
        transform: Transform,
        relative_to_platform: bool,
    ) -> Result<Uuid, PlotError> {
        let structure = self
            .catalog
            .find_structure(structure_id)
            .cloned()
            .ok_or_else(|| PlotError::StructureNotFound(structure_id.to_string()))?;
        let plot_id = *self
            .owners
            .get(&player)
            .ok_or(PlotError::PlotNotFound { player })?;
        let plot = self
            .plots
            .get_mut(&plot_id)
            .ok_or(PlotError::PlotNotFound { player })?;

        plot.place(
            &mut self.world,
            self.oracle.as_ref(),
            &structure,
            transform,
            relative_to_platform,
            &mut self.rng,
        )
    }

    /// Remove one of the player's placed structures
    pub fn remove_structure(&mut self, player: PlayerId, instance: Uuid) -> Result<(), PlotError> {
        let plot_id = *self
            .owners
            .get(&player)
            .ok_or(PlotError::PlotNotFound { player })?;
        let plot = self
            .plots
            .get_mut(&plot_id)
            .ok_or(PlotError::PlotNotFound { player })?;
        plot.remove_structure(&mut self.world, instance)?;
        Ok(())
    }

    pub fn serialize_plot(&self, player: PlayerId) -> Result<SerializedPlot, PlotError> {
        self.plot_of(player)
            .map(|plot| plot.serialize(&self.world))
            .ok_or(PlotError::PlotNotFound { player })
    }

    /// Re-place a saved snapshot on the player's current plot
    pub fn restore_plot(
        &mut self,
        player: PlayerId,
        snapshot: &SerializedPlot,
    ) -> Result<usize, PlotError> {
        let plot_id = *self
            .owners
            .get(&player)
            .ok_or(PlotError::PlotNotFound { player })?;
        let plot = self
            .plots
            .get_mut(&plot_id)
            .ok_or(PlotError::PlotNotFound { player })?;
        let placed = plot.restore(&mut self.world, self.oracle.as_ref(), &self.catalog, snapshot)?;
        log::info!("Restored {} structure(s) on {} for {}", placed, plot_id, player);
        Ok(placed)
    }

    /// Release every assigned plot
    pub fn release_all(&mut self) {
        let players: Vec<PlayerId> = self.owners.keys().copied().collect();
        for player in players {
            self.on_player_leave(player);
        }
    }

    /// Save every plot to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), SaveError> {
        persistence::save_plots(writer, self)
    }

    /// Replace all plot state with a save.
    ///
    /// The save is checked before any current player is released: every
    /// structure id must resolve and no player or plot may appear twice.
    /// Entries whose plot no longer exists are skipped with a warning. If
    /// applying still fails partway (a placement collides), the plots held
    /// before the load are put back and the error is returned.
    pub fn load<R: std::io::Read>(&mut self, reader: R) -> Result<(), SaveError> {
        let saved = persistence::load_plots(reader)?;
        let entries = self.check_save(saved)?;

        let previous = self.assignments();
        self.release_all();
        if let Err(e) = self.apply(&entries) {
            log::warn!("Load failed, putting previous plots back: {}", e);
            self.release_all();
            if let Err(undo) = self.apply(&previous) {
                log::error!("Could not put previous plots back: {}", undo);
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Current owner and contents of every assigned plot
    fn assignments(&self) -> Vec<SavedPlot> {
        self.plots
            .values()
            .filter(|plot| plot.is_assigned())
            .map(|plot| SavedPlot {
                plot_id: plot.id(),
                player: plot.player(),
                snapshot: plot.serialize(&self.world),
            })
            .collect()
    }

    /// Keep the assigned entries that fit this world, rejecting saves that
    /// could only be applied in part.
    fn check_save(&self, saved: Vec<SavedPlot>) -> Result<Vec<SavedPlot>, PlotError> {
        let mut players = HashSet::new();
        let mut plots = HashSet::new();
        let mut entries = Vec::new();
        for entry in saved {
            let Some(player) = entry.player else {
                continue;
            };
            if self.plots.get(&entry.plot_id).is_none() {
                log::warn!("Save references missing {}, skipping", entry.plot_id);
                continue;
            }
            if !players.insert(player) {
                return Err(PlotError::PlayerAlreadyHasPlot {
                    player,
                    plot: entry.plot_id,
                });
            }
            if !plots.insert(entry.plot_id) {
                return Err(PlotError::AlreadyAssigned {
                    plot: entry.plot_id,
                    player,
                });
            }
            if let Some(missing) = entry
                .snapshot
                .structures
                .iter()
                .find(|s| self.catalog.find_structure(&s.structure_id).is_none())
            {
                return Err(PlotError::StructureNotFound(missing.structure_id.clone()));
            }
            entries.push(entry);
        }
        Ok(entries)
    }

    fn apply(&mut self, entries: &[SavedPlot]) -> Result<(), PlotError> {
        for entry in entries {
            let Some(player) = entry.player else {
                continue;
            };
            self.assign(player, entry.plot_id)?;
            self.restore_plot(player, &entry.snapshot)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::AabbOracle;

    fn service(plot_count: u32) -> PlotService {
        let config = GameConfig {
            plot_count,
            seed: Some(11),
            ..Default::default()
        };
        let catalog = Arc::new(Catalog::builtin().unwrap());
        PlotService::new(&config, catalog, Box::new(AabbOracle::default())).unwrap()
    }

    #[test]
    fn test_join_assigns_free_plots_in_order() {
        let mut svc = service(2);
        assert_eq!(svc.on_player_join(PlayerId(1)), Ok(PlotId(1)));
        assert_eq!(svc.on_player_join(PlayerId(2)), Ok(PlotId(2)));
        assert_eq!(
            svc.on_player_join(PlayerId(3)),
            Err(PlotError::NoFreePlot {
                player: PlayerId(3)
            })
        );
        assert_eq!(svc.free_plot_count(), 0);
    }

    #[test]
    fn test_player_cannot_hold_two_plots() {
        let mut svc = service(3);
        svc.on_player_join(PlayerId(1)).unwrap();
        assert_eq!(
            svc.assign(PlayerId(1), PlotId(2)),
            Err(PlotError::PlayerAlreadyHasPlot {
                player: PlayerId(1),
                plot: PlotId(1)
            })
        );
        assert!(!svc.plot(PlotId(2)).unwrap().is_assigned());
    }

    #[test]
    fn test_leave_frees_and_clears_plot() {
        let mut svc = service(1);
        svc.on_player_join(PlayerId(1)).unwrap();
        svc.place_structure(PlayerId(1), "oak-tree", Transform::IDENTITY, true)
            .unwrap();
        let nodes_with_tree = svc.world().node_count();

        assert_eq!(svc.on_player_leave(PlayerId(1)), Some(PlotId(1)));
        assert_eq!(svc.on_player_leave(PlayerId(1)), None);
        assert_eq!(svc.world().node_count(), nodes_with_tree - 1);
        assert_eq!(svc.plot(PlotId(1)).unwrap().structure_count(), 0);
        assert_eq!(svc.on_player_join(PlayerId(2)), Ok(PlotId(1)));
    }

    #[test]
    fn test_place_errors() {
        let mut svc = service(1);
        assert_eq!(
            svc.place_structure(PlayerId(1), "oak-tree", Transform::IDENTITY, true),
            Err(PlotError::PlotNotFound {
                player: PlayerId(1)
            })
        );
        svc.on_player_join(PlayerId(1)).unwrap();
        assert_eq!(
            svc.place_structure(PlayerId(1), "nonexistent", Transform::IDENTITY, true),
            Err(PlotError::StructureNotFound("nonexistent".into()))
        );
        svc.place_structure(PlayerId(1), "small-house", Transform::IDENTITY, true)
            .unwrap();
        let nudged = Transform::from_xyz(3.0, 0.0, 0.0);
        assert!(matches!(
            svc.place_structure(PlayerId(1), "small-house", nudged, true),
            Err(PlotError::PlacementCollision { .. })
        ));
        assert_eq!(svc.plot_of(PlayerId(1)).unwrap().structure_count(), 1);
    }

    #[test]
    fn test_remove_and_serialize() {
        let mut svc = service(1);
        svc.on_player_join(PlayerId(1)).unwrap();
        let west = Transform::from_xyz(-20.0, 0.0, 0.0);
        let east = Transform::from_xyz(20.0, 0.0, 0.0);
        let tree = svc
            .place_structure(PlayerId(1), "oak-tree", west, true)
            .unwrap();
        let lamp = svc
            .place_structure(PlayerId(1), "street-lamp", east, true)
            .unwrap();

        svc.remove_structure(PlayerId(1), tree).unwrap();
        let snapshot = svc.serialize_plot(PlayerId(1)).unwrap();
        assert_eq!(snapshot.structures.len(), 1);
        assert_eq!(snapshot.structures[0].id, lamp);
        assert!(svc.serialize_plot(PlayerId(9)).is_err());
    }

    #[test]
    fn test_character_blocks_placement() {
        let mut svc = service(1);
        svc.on_player_join(PlayerId(1)).unwrap();
        let spot = svc.plot(PlotId(1)).unwrap().platform_transform(svc.world()).unwrap();
        svc.world_mut()
            .spawn_character(PlayerId(1), spot, glam::Vec3::new(2.0, 5.0, 1.0));

        assert!(matches!(
            svc.place_structure(PlayerId(1), "oak-tree", Transform::IDENTITY, true),
            Err(PlotError::PlacementCollision { .. })
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = GameConfig {
            plot_count: 0,
            ..Default::default()
        };
        let catalog = Arc::new(Catalog::builtin().unwrap());
        assert!(matches!(
            PlotService::new(&config, catalog, Box::new(AabbOracle::default())),
            Err(ConfigError::Invalid(_))
        ));
    }
}
