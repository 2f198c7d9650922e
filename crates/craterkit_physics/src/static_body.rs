//! Immovable obstacles
//!
//! Static bodies never integrate. Gameplay code moves them explicitly and the
//! owner re-stamps their footprint when the rounded position changed.

use std::sync::Arc;

use craterkit_raster::BitRaster;

use crate::body::{check_len, BodyKind, PhysicsBody, StateError};
use crate::vec2::Vec2;

/// A fixed obstacle such as a crate or a door
#[derive(Clone, Debug)]
pub struct StaticBody {
    position: Vec2,
    cell: (i32, i32),
    moved: bool,
    mask: Arc<BitRaster>,
}

impl StaticBody {
    pub fn new(mask: Arc<BitRaster>) -> Self {
        Self {
            position: Vec2::ZERO,
            cell: (0, 0),
            moved: false,
            mask,
        }
    }

    /// Whether the rounded position changed since the last call
    pub fn take_moved(&mut self) -> bool {
        std::mem::take(&mut self.moved)
    }
}

impl PhysicsBody for StaticBody {
    fn kind(&self) -> BodyKind {
        BodyKind::Static
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn velocity(&self) -> Vec2 {
        Vec2::ZERO
    }

    fn quantized(&self) -> (i32, i32) {
        self.cell
    }

    fn mask(&self) -> &Arc<BitRaster> {
        &self.mask
    }

    fn is_active(&self) -> bool {
        false
    }

    fn move_to(&mut self, x: f32, y: f32) {
        let cell = (x.trunc() as i32, y.trunc() as i32);
        self.moved |= cell != self.cell;
        self.cell = cell;
        self.position = Vec2::new(x, y);
    }

    fn tick(&mut self, _dt: f32, _world: &BitRaster) -> bool {
        false
    }

    fn add_velocity(&mut self, _vx: f32, _vy: f32) {}

    fn serialize(&self) -> Vec<f32> {
        vec![self.position.x, self.position.y]
    }

    fn deserialize(&mut self, state: &[f32]) -> Result<(), StateError> {
        check_len(BodyKind::Static, state)?;
        self.move_to(state[0], state[1]);
        Ok(())
    }
}
