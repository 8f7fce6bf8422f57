//! Tycoon Core - plot and structure gameplay logic
//!
//! Players are handed land plots when they join, place structures from a
//! catalog onto them, and have their plot contents serialized for
//! persistence. On leave the plot is wiped and returned to the pool.
//!
//! # Architecture
//!
//! The host engine is reached only through narrow seams:
//! - **World**: a scene graph of named, parented objects. [`world::HostWorld`]
//!   implements it headless on top of `hecs`.
//! - **Collision**: a yes/no [`collision::CollisionOracle`] answered before
//!   anything is spawned.
//! - **Player events**: join/leave calls into [`service::PlotService`].
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`ordered_map`] | Insertion-ordered keyed container |
//! | [`catalog`] | Read-only structure registry grouped into categories |
//! | [`instance`] | Placed structure instances and their snapshots |
//! | [`plot`] | Plot state machine, placement, clearing, serialization |
//! | [`collision`] | Placement footprints and collision oracles |
//! | [`world`] | In-process host world |
//! | [`generation`] | Plot layout at world load |
//! | [`service`] | Orchestration of players, plots and placement requests |
//! | [`persistence`] | Save/load of every plot |
//! | [`config`] | World configuration and validation |
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tycoon_core::prelude::*;
//!
//! let catalog = Arc::new(Catalog::builtin().unwrap());
//! let mut service = PlotService::new(
//!     &GameConfig::default(),
//!     catalog,
//!     Box::new(AabbOracle::default()),
//! )
//! .unwrap();
//!
//! let player = PlayerId(1);
//! service.on_player_join(player).unwrap();
//! service
//!     .place_structure(player, "road-intersection", Transform::IDENTITY, true)
//!     .unwrap();
//! assert_eq!(service.serialize_plot(player).unwrap().structures.len(), 1);
//! service.on_player_leave(player);
//! ```

pub mod catalog;
pub mod collision;
pub mod components;
pub mod config;
pub mod error;
pub mod generation;
pub mod instance;
pub mod ordered_map;
pub mod persistence;
pub mod plot;
pub mod service;
pub mod world;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::catalog::{Catalog, Currency, Price, Structure, StructureCategory};
    pub use crate::collision::{AabbOracle, CollisionOracle, Footprint};
    pub use crate::components::*;
    pub use crate::config::GameConfig;
    pub use crate::error::PlotError;
    pub use crate::instance::StructureInstance;
    pub use crate::ordered_map::OrderedMap;
    pub use crate::plot::{Plot, SerializedPlot};
    pub use crate::service::PlotService;
    pub use crate::world::HostWorld;
}
