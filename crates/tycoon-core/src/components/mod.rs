//! Component definitions for the host world.
//!
//! Components are plain data attached to world entities. Behaviour lives
//! in the world wrapper, the plots and the service.

mod common;
mod scene;

pub use common::*;
pub use scene::*;
