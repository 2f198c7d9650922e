//! Destructible terrain
//!
//! Terrain keeps two rasters of the same size. The solid layer is the ground
//! itself. The character layer starts as a copy of it and additionally holds
//! the footprints of entities, so bodies collide with each other as well as
//! with the ground.

use std::fmt;

use bitflags::bitflags;
use craterkit_raster::{BitRaster, RasterData, RasterError};
use serde::{Deserialize, Serialize};

bitflags! {
    /// Which terrain layers an edit or query touches
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct RasterLayers: u8 {
        /// No layer
        const NONE = 0;
        /// The ground
        const SOLID = 1 << 0;
        /// Ground plus entity footprints
        const CHARACTERS = 1 << 1;
        /// Both layers
        const ALL = Self::SOLID.bits() | Self::CHARACTERS.bits();
    }
}

/// A masked raster edit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditOp {
    /// Set the covered pixels
    Add,
    /// Clear the covered pixels
    Subtract,
}

/// Ground and character rasters
#[derive(Clone, Debug, PartialEq)]
pub struct Terrain {
    solid: BitRaster,
    characters: BitRaster,
}

impl Terrain {
    /// Create terrain whose character layer starts as a copy of `solid`
    pub fn new(solid: BitRaster) -> Self {
        let characters = solid.clone();
        Self { solid, characters }
    }

    /// Empty terrain of the given size
    pub fn empty(width: usize, height: usize) -> Self {
        Self::new(BitRaster::new(width, height))
    }

    pub fn width(&self) -> usize {
        self.solid.width()
    }

    pub fn height(&self) -> usize {
        self.solid.height()
    }

    /// The ground layer
    pub fn solid(&self) -> &BitRaster {
        &self.solid
    }

    /// The ground plus entity footprints, which bodies tick against
    pub fn characters(&self) -> &BitRaster {
        &self.characters
    }

    /// Apply `op` with `mask` at `(x, y)` to the selected layers
    pub fn edit(&mut self, mask: &BitRaster, x: i32, y: i32, layers: RasterLayers, op: EditOp) {
        for (layer, raster) in [
            (RasterLayers::SOLID, &mut self.solid),
            (RasterLayers::CHARACTERS, &mut self.characters),
        ] {
            if !layers.contains(layer) {
                continue;
            }
            match op {
                EditOp::Add => raster.add(mask, x, y),
                EditOp::Subtract => raster.subtract(mask, x, y),
            }
        }
    }

    /// Remove ground under `mask`, as an explosion or a digging tool does
    pub fn carve(&mut self, mask: &BitRaster, x: i32, y: i32) {
        log::debug!("carve {}x{} at ({}, {})", mask.width(), mask.height(), x, y);
        self.edit(mask, x, y, RasterLayers::ALL, EditOp::Subtract);
    }

    /// Add ground under `mask`
    pub fn deposit(&mut self, mask: &BitRaster, x: i32, y: i32) {
        log::debug!("deposit {}x{} at ({}, {})", mask.width(), mask.height(), x, y);
        self.edit(mask, x, y, RasterLayers::ALL, EditOp::Add);
    }

    /// Add an entity footprint to the character layer
    pub fn stamp(&mut self, mask: &BitRaster, x: i32, y: i32) {
        self.characters.add(mask, x, y);
    }

    /// Remove an entity footprint from the character layer
    pub fn erase(&mut self, mask: &BitRaster, x: i32, y: i32) {
        self.characters.subtract(mask, x, y);
    }

    /// Whether `mask` at `(x, y)` overlaps any of the selected layers
    pub fn collides(&self, mask: &BitRaster, x: i32, y: i32, layers: RasterLayers) -> bool {
        (layers.contains(RasterLayers::SOLID) && self.solid.collides_with(mask, x, y))
            || (layers.contains(RasterLayers::CHARACTERS) && self.characters.collides_with(mask, x, y))
    }

    /// Raw form of both layers
    pub fn to_data(&self) -> TerrainData {
        TerrainData {
            solid: self.solid.to_data(),
            characters: self.characters.to_data(),
        }
    }

    /// Rebuild terrain from [`Terrain::to_data`] output
    pub fn from_data(data: &TerrainData) -> Result<Self, TerrainError> {
        let solid = BitRaster::from_data(&data.solid)?;
        let characters = BitRaster::from_data(&data.characters)?;
        if solid.width() != characters.width() || solid.height() != characters.height() {
            return Err(TerrainError::LayerSize {
                solid: (solid.width(), solid.height()),
                characters: (characters.width(), characters.height()),
            });
        }
        Ok(Self { solid, characters })
    }
}

/// Serializable form of [`Terrain`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainData {
    pub solid: RasterData,
    pub characters: RasterData,
}

/// Error rebuilding terrain from raw data
#[derive(Clone, Debug, PartialEq)]
pub enum TerrainError {
    /// One of the layers is malformed
    Raster(RasterError),
    /// The layers disagree on size
    LayerSize {
        solid: (usize, usize),
        characters: (usize, usize),
    },
}

impl From<RasterError> for TerrainError {
    fn from(e: RasterError) -> Self {
        TerrainError::Raster(e)
    }
}

impl fmt::Display for TerrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerrainError::Raster(e) => write!(f, "Raster error: {}", e),
            TerrainError::LayerSize { solid, characters } => write!(
                f,
                "Layer size mismatch: solid is {}x{}, characters is {}x{}",
                solid.0, solid.1, characters.0, characters.1
            ),
        }
    }
}

impl std::error::Error for TerrainError {}
