//! Core types for craterkit
//!
//! This crate ties rasters and bodies together into a simulation:
//!
//! - [`Terrain`] - Destructible ground plus the character layer bodies collide with
//! - [`Entity`] - A body with a name, tags and a footprint
//! - [`World`] - Container for terrain and entities that steps the simulation
//! - [`EntityKey`] - Generational key to an entity in the world
//! - [`WorldSnapshot`] - Loadable/saveable capture of terrain and body states

mod entity;
mod snapshot;
mod terrain;
mod world;

pub use entity::Entity;
pub use snapshot::{EntitySnapshot, SnapshotLoadError, SnapshotSaveError, WorldSnapshot};
pub use terrain::{EditOp, RasterLayers, Terrain, TerrainData, TerrainError};
pub use world::{EntityKey, StepReport, World};

// Re-export physics types for convenient access through craterkit_core
pub use craterkit_physics::{Body, BodyKind, BodyState, Impact, PhysicsBody, Vec2};
pub use craterkit_raster::BitRaster;
