//! Scene construction utilities
//!
//! This module provides a declarative API for building worlds.

mod scene_builder;

pub use scene_builder::{generated_terrain, terrain_from_image, SceneBuilder, SceneError};
