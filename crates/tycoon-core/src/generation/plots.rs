//! Plot layout - lays out plot placeholders in the world and discovers
//! them again as [`Plot`]s.

use glam::Vec3;
use hecs::Entity;

use crate::components::{Body, PlotId, Transform};
use crate::config::GameConfig;
use crate::error::PlotError;
use crate::plot::{Plot, PLATFORM, STRUCTURES_FOLDER};
use crate::world::HostWorld;

/// Root folder holding every plot placeholder
pub const PLOTS_FOLDER: &str = "Plots";

/// Builds plots for a world
pub struct PlotFactory;

impl PlotFactory {
    /// Lay out `config.plot_count` placeholders in a row along +x.
    ///
    /// Each placeholder gets a platform whose top face sits at the plot's
    /// height, and an empty structures folder. Returns the `Plots` folder.
    pub fn populate(world: &mut HostWorld, config: &GameConfig) -> Entity {
        let root = world.spawn_folder(PLOTS_FOLDER, None);
        let thickness = config.platform_size.y;

        for i in 0..config.plot_count {
            let centre = config.origin + Vec3::new(i as f32 * config.plot_spacing, 0.0, 0.0);
            let plot = world.spawn_folder(format!("Plot{}", i + 1), Some(root));
            world.set_transform(plot, Transform::from_translation(centre));

            let platform = Body::solid(config.platform_size)
                .with_offset(Vec3::new(0.0, -thickness * 0.5, 0.0));
            world.spawn_body(PLATFORM, Some(plot), platform, Transform::from_translation(centre));
            world.spawn_folder(STRUCTURES_FOLDER, Some(plot));
        }

        log::info!(
            "Laid out {} plots ({} apart)",
            config.plot_count,
            config.plot_spacing
        );
        root
    }

    /// One [`Plot`] per placeholder under the `Plots` folder, in world
    /// order. Ids start at 1.
    ///
    /// A placeholder needs a `Platform` or a `Structures` child; anything
    /// else under `Plots` is skipped.
    pub fn discover(world: &HostWorld) -> Result<Vec<Plot>, PlotError> {
        let root = world
            .find_root(PLOTS_FOLDER)
            .ok_or_else(|| PlotError::InvalidWorld(format!("no '{}' folder", PLOTS_FOLDER)))?;

        let plots: Vec<Plot> = world
            .children(root)
            .into_iter()
            .filter(|entity| {
                let placeholder = world.find_first_child(*entity, PLATFORM).is_some()
                    || world.find_first_child(*entity, STRUCTURES_FOLDER).is_some();
                if !placeholder {
                    log::warn!(
                        "Skipping '{}' under '{}': not a plot",
                        world.name(*entity).unwrap_or_default(),
                        PLOTS_FOLDER
                    );
                }
                placeholder
            })
            .enumerate()
            .map(|(i, entity)| Plot::new(PlotId(i as u32 + 1), entity))
            .collect();

        if plots.is_empty() {
            return Err(PlotError::InvalidWorld("world has no plots".into()));
        }
        Ok(plots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_populate_then_discover() {
        let mut world = HostWorld::new();
        let config = GameConfig {
            plot_count: 3,
            ..Default::default()
        };
        PlotFactory::populate(&mut world, &config);

        let plots = PlotFactory::discover(&world).unwrap();
        assert_eq!(plots.len(), 3);
        assert_eq!(
            plots.iter().map(Plot::id).collect::<Vec<_>>(),
            vec![PlotId(1), PlotId(2), PlotId(3)]
        );

        let second = &plots[1];
        assert_eq!(world.name(second.instance()).as_deref(), Some("Plot2"));
        let platform = second.platform_transform(&world).unwrap();
        assert_eq!(platform.translation, Vec3::new(config.plot_spacing, 0.0, 0.0));
        assert!(world.find_first_child(second.instance(), STRUCTURES_FOLDER).is_some());

        // platform top face is flush with the plot height
        let bounds = world.world_bounds(second.platform(&world).unwrap()).unwrap();
        assert_eq!(bounds.max.y, 0.0);
        assert!(plots.iter().all(|p| !p.is_assigned()));
    }

    #[test]
    fn test_discover_requires_plots() {
        let mut world = HostWorld::new();
        assert!(matches!(
            PlotFactory::discover(&world),
            Err(PlotError::InvalidWorld(_))
        ));
        world.spawn_folder(PLOTS_FOLDER, None);
        assert!(matches!(
            PlotFactory::discover(&world),
            Err(PlotError::InvalidWorld(_))
        ));
    }

    #[test]
    fn test_discover_skips_stray_objects() {
        let mut world = HostWorld::new();
        let config = GameConfig {
            plot_count: 2,
            ..Default::default()
        };
        let root = PlotFactory::populate(&mut world, &config);
        let stray = world.spawn_folder("Signpost", Some(root));
        // a platform alone is enough
        let bare = world.spawn_folder("Bare", Some(root));
        world.spawn_body(PLATFORM, Some(bare), Body::solid(Vec3::ONE), Transform::IDENTITY);

        let plots = PlotFactory::discover(&world).unwrap();
        assert_eq!(plots.len(), 3);
        assert!(plots.iter().all(|p| p.instance() != stray));
        assert_eq!(plots[2].instance(), bare);
        assert_eq!(plots[2].id(), PlotId(3));

        let mut only_stray = HostWorld::new();
        let root = only_stray.spawn_folder(PLOTS_FOLDER, None);
        only_stray.spawn_folder("Signpost", Some(root));
        assert!(matches!(
            PlotFactory::discover(&only_stray),
            Err(PlotError::InvalidWorld(_))
        ));
    }
}
