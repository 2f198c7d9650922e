//! craterkit - pixel-exact artillery physics
//!
//! The application layer over the craterkit crates: layered configuration,
//! scene construction and a fixed-step simulation driver.

pub mod config;
pub mod scene;
pub mod systems;
