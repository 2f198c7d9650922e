//! World snapshots
//!
//! A snapshot captures the terrain and the state vector of every body. Hosts
//! send them to followers, which replace their own state wholesale instead of
//! merging physics. Snapshots can also be saved to and loaded from RON files.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use craterkit_physics::BodyState;

use crate::terrain::TerrainData;
use crate::world::EntityKey;

/// Saved state of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Key of the entity in the world the snapshot was taken from
    pub key: EntityKey,
    /// Entity name, kept for diagnostics
    #[serde(default)]
    pub name: Option<String>,
    /// Body state tagged with its kind
    pub state: BodyState,
}

/// Terrain and body states of a whole world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Terrain without entity footprints
    pub terrain: TerrainData,
    /// One entry per entity
    pub entities: Vec<EntitySnapshot>,
}

impl WorldSnapshot {
    /// Load a snapshot from a RON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SnapshotLoadError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| SnapshotLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot: WorldSnapshot =
            ron::from_str(&contents).map_err(|source| SnapshotLoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        log::info!(
            "Loaded snapshot with {} entities from {}",
            snapshot.entities.len(),
            path.display()
        );
        Ok(snapshot)
    }

    /// Save a snapshot to a RON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SnapshotSaveError> {
        let path = path.as_ref();
        let pretty = ron::ser::PrettyConfig::new()
            .struct_names(true)
            .enumerate_arrays(false);
        let contents = ron::ser::to_string_pretty(self, pretty).map_err(|source| {
            SnapshotSaveError::Serialize {
                entities: self.entities.len(),
                source,
            }
        })?;
        fs::write(path, contents).map_err(|source| SnapshotSaveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Saved snapshot to {}", path.display());
        Ok(())
    }
}

/// Error loading a snapshot
#[derive(Debug)]
pub enum SnapshotLoadError {
    /// The snapshot file could not be read
    Io { path: PathBuf, source: io::Error },
    /// The file is not a valid RON snapshot
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
}

impl SnapshotLoadError {
    /// File the load was attempted from
    pub fn path(&self) -> &Path {
        match self {
            SnapshotLoadError::Io { path, .. } | SnapshotLoadError::Parse { path, .. } => path,
        }
    }
}

impl std::fmt::Display for SnapshotLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotLoadError::Io { path, source } => {
                write!(f, "cannot read snapshot {}: {}", path.display(), source)
            }
            SnapshotLoadError::Parse { path, source } => {
                write!(f, "snapshot {} is malformed: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for SnapshotLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotLoadError::Io { source, .. } => Some(source),
            SnapshotLoadError::Parse { source, .. } => Some(source),
        }
    }
}

/// Error saving a snapshot
#[derive(Debug)]
pub enum SnapshotSaveError {
    /// The snapshot file could not be written
    Io { path: PathBuf, source: io::Error },
    /// The snapshot could not be encoded
    Serialize { entities: usize, source: ron::Error },
}

impl std::fmt::Display for SnapshotSaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotSaveError::Io { path, source } => {
                write!(f, "cannot write snapshot {}: {}", path.display(), source)
            }
            SnapshotSaveError::Serialize { entities, source } => {
                write!(f, "cannot encode snapshot of {} entities: {}", entities, source)
            }
        }
    }
}

impl std::error::Error for SnapshotSaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotSaveError::Io { source, .. } => Some(source),
            SnapshotSaveError::Serialize { source, .. } => Some(source),
        }
    }
}
