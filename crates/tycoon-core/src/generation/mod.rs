//! Generation - world layout at load time.

mod plots;

pub use plots::*;
