//! Save/Load functionality for persisting plot state
//!
//! Uses bincode for the full save of every plot, and JSON for single-plot
//! snapshots exchanged with the host's data store.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::components::{PlayerId, PlotId};
use crate::error::PlotError;
use crate::plot::SerializedPlot;
use crate::service::PlotService;

/// Version number for save file format (increment when format changes)
pub(crate) const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of every plot
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    /// Save format version
    pub version: u32,
    pub plots: Vec<SavedPlot>,
}

/// One plot's owner and contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPlot {
    pub plot_id: PlotId,
    pub player: Option<PlayerId>,
    pub snapshot: SerializedPlot,
}

/// Save every plot of a service to a writer
pub fn save_plots<W: Write>(writer: W, service: &PlotService) -> Result<(), SaveError> {
    let plots = service
        .plots()
        .values()
        .map(|plot| SavedPlot {
            plot_id: plot.id(),
            player: plot.player(),
            snapshot: plot.serialize(service.world()),
        })
        .collect();

    let save_data = SaveData {
        version: SAVE_VERSION,
        plots,
    };

    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

/// Load saved plots from a reader
pub fn load_plots<R: Read>(reader: R) -> Result<Vec<SavedPlot>, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    Ok(save_data.plots)
}

/// JSON form of a single plot snapshot
pub fn snapshot_to_json(snapshot: &SerializedPlot) -> Result<String, SaveError> {
    Ok(serde_json::to_string(snapshot)?)
}

pub fn snapshot_from_json(json: &str) -> Result<SerializedPlot, SaveError> {
    Ok(serde_json::from_str(json)?)
}

/// Errors that can occur during save/load
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Bincode(Box<bincode::ErrorKind>),
    Json(serde_json::Error),
    VersionMismatch { expected: u32, found: u32 },
    /// The save could not be applied to the current world
    Plot(PlotError),
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for SaveError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        SaveError::Bincode(e)
    }
}

impl From<serde_json::Error> for SaveError {
    fn from(e: serde_json::Error) -> Self {
        SaveError::Json(e)
    }
}

impl From<PlotError> for SaveError {
    fn from(e: PlotError) -> Self {
        SaveError::Plot(e)
    }
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "IO error: {}", e),
            SaveError::Bincode(e) => write!(f, "Serialization error: {}", e),
            SaveError::Json(e) => write!(f, "JSON error: {}", e),
            SaveError::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Save version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            SaveError::Plot(e) => write!(f, "Could not apply save: {}", e),
        }
    }
}

impl std::error::Error for SaveError {}
