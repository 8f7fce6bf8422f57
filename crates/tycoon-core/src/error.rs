//! Error types for catalog loading, configuration and plot operations.

use std::fmt;
use uuid::Uuid;

use crate::components::{PlayerId, PlotId};

/// Failures raised by plot and orchestration operations.
///
/// None of these are retried internally; callers log them and carry on.
#[derive(Debug, Clone, PartialEq)]
pub enum PlotError {
    AlreadyAssigned { plot: PlotId, player: PlayerId },
    /// The structure template has no anchor box to place by
    MissingAnchorGeometry { structure: String },
    PlacementCollision { plot: PlotId, structure: String },
    MissingPlatform { plot: PlotId },
    /// The footprint reaches past the edge of the plot's platform
    OutOfBounds { plot: PlotId, structure: String },
    /// Objects were left in the structures container after a clear
    ObjectLeakDetected { plot: PlotId, leaked: usize },
    StructureNotFound(String),
    PlotNotFound { player: PlayerId },
    InstanceNotFound { plot: PlotId, instance: Uuid },
    DuplicateInstance { plot: PlotId, instance: Uuid },
    NoFreePlot { player: PlayerId },
    PlayerAlreadyHasPlot { player: PlayerId, plot: PlotId },
    InvalidWorld(String),
}

impl fmt::Display for PlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlotError::AlreadyAssigned { plot, player } => {
                write!(f, "{} is already assigned to {}", plot, player)
            }
            PlotError::MissingAnchorGeometry { structure } => {
                write!(f, "Structure '{}' has no anchor geometry", structure)
            }
            PlotError::PlacementCollision { plot, structure } => {
                write!(f, "Placing '{}' on {} collides with existing geometry", structure, plot)
            }
            PlotError::MissingPlatform { plot } => write!(f, "{} has no platform", plot),
            PlotError::OutOfBounds { plot, structure } => {
                write!(f, "Placing '{}' would extend past the edge of {}", structure, plot)
            }
            PlotError::ObjectLeakDetected { plot, leaked } => {
                write!(f, "{} leaked {} object(s) after clearing", plot, leaked)
            }
            PlotError::StructureNotFound(id) => write!(f, "Unknown structure '{}'", id),
            PlotError::PlotNotFound { player } => write!(f, "No plot assigned to {}", player),
            PlotError::InstanceNotFound { plot, instance } => {
                write!(f, "{} has no structure instance {}", plot, instance)
            }
            PlotError::DuplicateInstance { plot, instance } => {
                write!(f, "{} already holds structure instance {}", plot, instance)
            }
            PlotError::NoFreePlot { player } => write!(f, "No free plot left for {}", player),
            PlotError::PlayerAlreadyHasPlot { player, plot } => {
                write!(f, "{} already owns {}", player, plot)
            }
            PlotError::InvalidWorld(reason) => write!(f, "Invalid world: {}", reason),
        }
    }
}

impl std::error::Error for PlotError {}

/// Errors building the structure catalog
#[derive(Debug)]
pub enum CatalogError {
    Parse(serde_json::Error),
    DuplicateStructure { category: String, structure: String },
    DuplicateCategory(String),
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Parse(e)
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Parse(e) => write!(f, "Catalog parse error: {}", e),
            CatalogError::DuplicateStructure {
                category,
                structure,
            } => write!(
                f,
                "Duplicate structure '{}' in category '{}'",
                structure, category
            ),
            CatalogError::DuplicateCategory(id) => write!(f, "Duplicate category '{}'", id),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

/// Errors loading or validating a [`GameConfig`](crate::config::GameConfig)
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid(Vec<String>),
    World(PlotError),
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<PlotError> for ConfigError {
    fn from(e: PlotError) -> Self {
        ConfigError::World(e)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(e) => write!(f, "Config parse error: {}", e),
            ConfigError::Invalid(problems) => {
                write!(f, "Invalid config: {}", problems.join("; "))
            }
            ConfigError::World(e) => write!(f, "World setup failed: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
