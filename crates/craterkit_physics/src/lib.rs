//! Pixel-exact body physics for craterkit
//!
//! Bodies move with continuous positions and velocities but collide against a
//! [`craterkit_raster::BitRaster`] world one pixel cell at a time:
//! - Walking bodies for characters (gravity, friction, step climbing, jumps)
//! - Bouncing bodies for debris and projectiles
//! - Sticky bodies that crawl along surfaces
//! - Static bodies for movable obstacles

pub mod body;
pub mod bouncing;
pub mod motion;
pub mod static_body;
pub mod sticky;
pub mod vec2;
pub mod walking;

// Re-export commonly used types
pub use body::{Axis, Body, BodyKind, BodyState, Impact, ImpactCallback, PhysicsBody, StateError, DEFAULT_GRAVITY};
pub use bouncing::{BouncingBody, BouncingConfig, BOUNCE_SLEEP_SPEED};
pub use motion::{converge, quantize, snap};
pub use static_body::StaticBody;
pub use sticky::{StickDirection, StickyBody, StickyConfig, DEFAULT_CRAWL_SPEED};
pub use vec2::Vec2;
pub use walking::{WalkingBody, WalkingConfig, DEFAULT_JUMP_IMPULSE, WALK_SLEEP_SPEED};
