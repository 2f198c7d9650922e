//! Bit-packed collision rasters for craterkit
//!
//! This crate provides the pixel-exact collision structure every body and the
//! terrain are built from.
//!
//! ## Core Types
//!
//! - [`BitRaster`] - 2D grid of occupancy bits packed into 32-bit words
//! - [`RasterData`] - Serializable raw form of a raster
//! - [`Channel`] - Image channel used when thresholding images
//!
//! ## Shapes
//!
//! - [`shapes`] - Circles, ellipses, rotated rectangles and triangles

mod data;
mod raster;
mod threshold;
pub mod shapes;

pub use data::{RasterData, RasterError};
pub use raster::{BitRaster, WORD_BITS};
pub use threshold::{Channel, ALPHA_THRESHOLD};
