//! Bodies that cling to surfaces and crawl along them
//!
//! A sticky body flies ballistically until it touches terrain. From then on
//! it crawls along the surface at a constant speed, turning inward at
//! concave corners and wrapping around convex ones. Velocity while stuck is
//! the crawl vector along the surface tangent.
//!
//! Crawling is computed on whole cells. Progress toward the next cell is kept
//! in the fractional part of the position so a body restored from its
//! serialized state continues exactly where the original would.

use std::f32::consts::SQRT_2;
use std::sync::Arc;

use craterkit_raster::BitRaster;
use serde::{Deserialize, Serialize};

use crate::body::{check_len, BodyKind, PhysicsBody, StateError, DEFAULT_GRAVITY};
use crate::motion::{quantize, snap};
use crate::vec2::Vec2;

/// Default crawl speed along surfaces in px/s
pub const DEFAULT_CRAWL_SPEED: f32 = 12.0;

/// Concave turns allowed in one tick without moving
const MAX_ROTATIONS: usize = 4;

/// Budget shortfall still counted as a whole step
const STEP_EPSILON: f32 = 1e-3;

/// Side of the body the surface is on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StickDirection {
    /// Not touching anything
    #[default]
    None,
    /// Surface to the right
    PosX,
    /// Surface below
    PosY,
    /// Surface to the left
    NegX,
    /// Surface above
    NegY,
}

impl StickDirection {
    /// Numeric code used in the serialized state (0 through 4)
    pub fn code(self) -> f32 {
        match self {
            StickDirection::None => 0.0,
            StickDirection::PosX => 1.0,
            StickDirection::PosY => 2.0,
            StickDirection::NegX => 3.0,
            StickDirection::NegY => 4.0,
        }
    }

    pub fn from_code(code: f32) -> Option<Self> {
        match code as i32 {
            _ if code.fract() != 0.0 => None,
            0 => Some(StickDirection::None),
            1 => Some(StickDirection::PosX),
            2 => Some(StickDirection::PosY),
            3 => Some(StickDirection::NegX),
            4 => Some(StickDirection::NegY),
            _ => None,
        }
    }

    /// Unit step from the body into the surface
    pub fn normal(self) -> Option<(i32, i32)> {
        match self {
            StickDirection::None => None,
            StickDirection::PosX => Some((1, 0)),
            StickDirection::PosY => Some((0, 1)),
            StickDirection::NegX => Some((-1, 0)),
            StickDirection::NegY => Some((0, -1)),
        }
    }

    fn from_normal(normal: (i32, i32)) -> Self {
        match normal {
            (1, 0) => StickDirection::PosX,
            (0, 1) => StickDirection::PosY,
            (-1, 0) => StickDirection::NegX,
            (0, -1) => StickDirection::NegY,
            _ => StickDirection::None,
        }
    }
}

/// Tuning for [`StickyBody`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StickyConfig {
    /// Downward acceleration while flying, in px/s²
    pub gravity: f32,
    /// Speed along surfaces in px/s
    pub crawl_speed: f32,
}

impl Default for StickyConfig {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            crawl_speed: DEFAULT_CRAWL_SPEED,
        }
    }
}

/// A crawler that sticks to the first surface it touches
#[derive(Debug)]
pub struct StickyBody {
    position: Vec2,
    velocity: Vec2,
    mask: Arc<BitRaster>,
    stick: StickDirection,
    pub config: StickyConfig,
}

fn offset(a: (i32, i32), b: (i32, i32)) -> (i32, i32) {
    (a.0 + b.0, a.1 + b.1)
}

fn negate(a: (i32, i32)) -> (i32, i32) {
    (-a.0, -a.1)
}

/// Dominant axis direction of a velocity as a unit step
fn tangent_of(velocity: Vec2) -> Option<(i32, i32)> {
    if velocity.x == 0.0 && velocity.y == 0.0 {
        None
    } else if velocity.x.abs() >= velocity.y.abs() {
        Some((velocity.x.signum() as i32, 0))
    } else {
        Some((0, velocity.y.signum() as i32))
    }
}

/// Committed cell along one axis and the progress made past it toward `step`
fn split_progress(position: f32, step: i32) -> (i32, f32) {
    match step {
        1 => {
            let cell = position.floor();
            (cell as i32, position - cell)
        }
        -1 => {
            let cell = position.ceil();
            (cell as i32, cell - position)
        }
        _ => (position.round() as i32, 0.0),
    }
}

impl StickyBody {
    pub fn new(mask: Arc<BitRaster>) -> Self {
        Self::with_config(mask, StickyConfig::default())
    }

    pub fn with_config(mask: Arc<BitRaster>, config: StickyConfig) -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            mask,
            stick: StickDirection::None,
            config,
        }
    }

    /// Which side the surface currently is on
    pub fn stick(&self) -> StickDirection {
        self.stick
    }

    fn blocked(&self, world: &BitRaster, cell: (i32, i32)) -> bool {
        world.collides_with(&self.mask, cell.0, cell.1)
    }

    fn set_crawl(&mut self, normal: (i32, i32), tangent: (i32, i32)) {
        self.stick = StickDirection::from_normal(normal);
        self.velocity = Vec2::new(tangent.0 as f32, tangent.1 as f32) * self.config.crawl_speed;
    }

    /// Attach to the surface at `normal` and start crawling
    fn attach(&mut self, normal: (i32, i32)) {
        self.position = Vec2::new(
            snap(self.position.x, self.velocity.x),
            snap(self.position.y, self.velocity.y),
        );
        let tangent = if normal.1 != 0 {
            // Floors and ceilings: keep heading sideways, default right
            (if self.velocity.x < 0.0 { -1 } else { 1 }, 0)
        } else {
            // Walls: climb
            (0, -1)
        };
        self.set_crawl(normal, tangent);
        log::trace!(
            "crawler stuck {:?} at ({}, {})",
            self.stick,
            self.position.x,
            self.position.y
        );
    }

    /// Ballistic flight in sub-steps of at most one pixel per axis
    fn fly(&mut self, dt: f32, world: &BitRaster) {
        let gravity_step = self.config.gravity * dt;
        self.velocity.y += gravity_step;
        let delta = Vec2::new(
            self.velocity.x * dt,
            (self.velocity.y - 0.5 * gravity_step) * dt,
        );
        let steps = delta.x.abs().max(delta.y.abs()).ceil().max(1.0) as usize;
        let step = delta * (1.0 / steps as f32);

        for _ in 0..steps {
            if step.x != 0.0 {
                let next = self.position.x + step.x;
                let qy = quantize(self.position.y, self.velocity.y);
                if self.blocked(world, (quantize(next, self.velocity.x), qy)) {
                    self.attach((step.x.signum() as i32, 0));
                    return;
                }
                self.position.x = next;
            }
            if step.y != 0.0 {
                let next = self.position.y + step.y;
                let qx = quantize(self.position.x, self.velocity.x);
                if self.blocked(world, (qx, quantize(next, self.velocity.y))) {
                    self.attach((0, step.y.signum() as i32));
                    return;
                }
                self.position.y = next;
            }
        }
    }

    /// Crawl along the surface for `dt` seconds
    fn crawl(&mut self, dt: f32, world: &BitRaster, mut normal: (i32, i32)) {
        let Some(mut tangent) = tangent_of(self.velocity) else {
            return;
        };

        let (cx, fx) = split_progress(self.position.x, tangent.0);
        let (cy, fy) = split_progress(self.position.y, tangent.1);
        let mut cell = (cx, cy);
        let mut carried = fx.max(fy);
        let mut budget = self.config.crawl_speed * dt;
        let mut rotations = 0;
        let mut fraction = 0.0;

        loop {
            if !self.blocked(world, offset(cell, normal)) {
                self.stick = StickDirection::None;
                self.position = Vec2::new(cell.0 as f32, cell.1 as f32);
                log::trace!("crawler lost contact at {:?}", cell);
                return;
            }

            let ahead = offset(cell, tangent);
            if self.blocked(world, ahead) {
                // Concave corner: the blocking surface becomes the new floor
                rotations += 1;
                if rotations > MAX_ROTATIONS {
                    break;
                }
                let turned = negate(normal);
                normal = tangent;
                tangent = turned;
                carried = 0.0;
                self.set_crawl(normal, tangent);
                continue;
            }

            let around = offset(ahead, normal);
            let (target, cost, wraps) = if self.blocked(world, around) {
                (ahead, 1.0, false)
            } else {
                (around, SQRT_2, true)
            };

            budget += carried * cost;
            carried = 0.0;
            if budget + STEP_EPSILON < cost {
                fraction = budget / cost;
                break;
            }
            budget = (budget - cost).max(0.0);
            cell = target;
            rotations = 0;
            if wraps {
                // Convex corner: wrap around onto the face we just passed
                let turned = negate(tangent);
                tangent = normal;
                normal = turned;
                self.set_crawl(normal, tangent);
            }
        }

        self.position = Vec2::new(
            cell.0 as f32 + tangent.0 as f32 * fraction,
            cell.1 as f32 + tangent.1 as f32 * fraction,
        );
    }
}

impl PhysicsBody for StickyBody {
    fn kind(&self) -> BodyKind {
        BodyKind::Sticky
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn velocity(&self) -> Vec2 {
        self.velocity
    }

    fn mask(&self) -> &Arc<BitRaster> {
        &self.mask
    }

    fn is_active(&self) -> bool {
        true
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.position = Vec2::new(x, y);
    }

    fn tick(&mut self, dt: f32, world: &BitRaster) -> bool {
        match self.stick.normal() {
            Some(normal) => self.crawl(dt, world, normal),
            None => self.fly(dt, world),
        }
        true
    }

    fn add_velocity(&mut self, vx: f32, vy: f32) {
        self.velocity += Vec2::new(vx, vy);
        self.stick = StickDirection::None;
    }

    fn serialize(&self) -> Vec<f32> {
        vec![
            self.stick.code(),
            self.velocity.x,
            self.velocity.y,
            self.position.x,
            self.position.y,
        ]
    }

    fn deserialize(&mut self, state: &[f32]) -> Result<(), StateError> {
        check_len(BodyKind::Sticky, state)?;
        let stick = StickDirection::from_code(state[0]).ok_or(StateError::InvalidStick(state[0]))?;
        self.stick = stick;
        self.velocity = Vec2::new(state[1], state[2]);
        self.move_to(state[3], state[4]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 30.0;

    fn pixel() -> Arc<BitRaster> {
        Arc::new(BitRaster::solid_rectangle(1, 1))
    }

    fn floor_world() -> BitRaster {
        BitRaster::from_fn(200, 100, |_, y| y >= 80)
    }

    #[test]
    fn test_stick_codes() {
        for stick in [
            StickDirection::None,
            StickDirection::PosX,
            StickDirection::PosY,
            StickDirection::NegX,
            StickDirection::NegY,
        ] {
            assert_eq!(StickDirection::from_code(stick.code()), Some(stick));
        }
        assert_eq!(StickDirection::from_code(5.0), None);
        assert_eq!(StickDirection::from_code(1.5), None);
    }

    #[test]
    fn test_lands_and_crawls_right() {
        let world = floor_world();
        let mut body = StickyBody::new(pixel());
        body.move_to(50.0, 70.0);
        for _ in 0..30 {
            body.tick(DT, &world);
        }
        assert_eq!(body.stick(), StickDirection::PosY);
        assert_eq!(body.velocity(), Vec2::new(DEFAULT_CRAWL_SPEED, 0.0));
        assert_eq!(body.position().y, 79.0);
        assert!(body.position().x > 50.0);
    }

    #[test]
    fn test_side_impact_crawls_up_the_wall() {
        let world = BitRaster::from_fn(200, 100, |x, _| x >= 100);
        let config = StickyConfig {
            gravity: 0.0,
            ..StickyConfig::default()
        };
        let mut body = StickyBody::with_config(pixel(), config);
        body.move_to(90.0, 50.0);
        body.add_velocity(60.0, 0.0);
        for _ in 0..10 {
            body.tick(DT, &world);
        }
        assert_eq!(body.stick(), StickDirection::PosX);
        assert_eq!(body.velocity(), Vec2::new(0.0, -DEFAULT_CRAWL_SPEED));
        assert_eq!(body.position().x, 99.0);
    }

    #[test]
    fn test_ceiling_landing_keeps_heading() {
        let world = BitRaster::from_fn(200, 100, |_, y| y < 20);
        let config = StickyConfig {
            gravity: 0.0,
            ..StickyConfig::default()
        };
        let mut body = StickyBody::with_config(pixel(), config);
        body.move_to(100.0, 30.0);
        body.add_velocity(-5.0, -60.0);
        for _ in 0..10 {
            body.tick(DT, &world);
        }
        assert_eq!(body.stick(), StickDirection::NegY);
        assert_eq!(body.velocity(), Vec2::new(-DEFAULT_CRAWL_SPEED, 0.0));
        assert_eq!(body.position().y, 20.0);
    }

    #[test]
    fn test_crawl_speed_is_steady() {
        let world = floor_world();
        let mut body = StickyBody::new(pixel());
        body.deserialize(&[2.0, DEFAULT_CRAWL_SPEED, 0.0, 20.0, 79.0]).unwrap();
        for _ in 0..30 {
            body.tick(DT, &world);
        }
        assert!((body.position().x - 32.0).abs() < 1e-3);
    }

    #[test]
    fn test_climbs_wall_at_concave_corner() {
        // Floor plus a wall from column 60
        let world = BitRaster::from_fn(200, 100, |x, y| y >= 80 || x >= 60);
        let mut body = StickyBody::new(pixel());
        body.deserialize(&[2.0, DEFAULT_CRAWL_SPEED, 0.0, 55.0, 79.0]).unwrap();
        for _ in 0..60 {
            body.tick(DT, &world);
            assert!(!body.collides(&world));
        }
        assert_eq!(body.stick(), StickDirection::PosX);
        assert_eq!(body.velocity(), Vec2::new(0.0, -DEFAULT_CRAWL_SPEED));
        assert_eq!(body.position().x, 59.0);
        assert!(body.position().y < 79.0);
    }

    #[test]
    fn test_wraps_convex_corner() {
        // A block with its top-right corner at (69, 60)
        let world = BitRaster::from_fn(200, 100, |x, y| x < 70 && y >= 60);
        let mut body = StickyBody::new(pixel());
        body.deserialize(&[2.0, DEFAULT_CRAWL_SPEED, 0.0, 65.0, 59.0]).unwrap();
        for _ in 0..60 {
            body.tick(DT, &world);
            assert!(!body.collides(&world));
        }
        assert_eq!(body.stick(), StickDirection::NegX);
        assert_eq!(body.velocity(), Vec2::new(0.0, DEFAULT_CRAWL_SPEED));
        assert_eq!(body.position().x, 70.0);
        assert!(body.position().y > 60.0);
    }

    #[test]
    fn test_falls_when_surface_removed() {
        let world = floor_world();
        let mut body = StickyBody::new(pixel());
        body.deserialize(&[2.0, DEFAULT_CRAWL_SPEED, 0.0, 20.0, 79.0]).unwrap();

        let empty = BitRaster::new(200, 100);
        body.tick(DT, &empty);
        assert_eq!(body.stick(), StickDirection::None);
        assert_eq!(body.position(), Vec2::new(20.0, 79.0));
        body.tick(DT, &empty);
        assert!(body.velocity().y > 0.0);
        assert!(body.position().y > 79.0);
    }

    #[test]
    fn test_add_velocity_unsticks() {
        let mut body = StickyBody::new(pixel());
        body.deserialize(&[2.0, DEFAULT_CRAWL_SPEED, 0.0, 20.0, 79.0]).unwrap();
        body.add_velocity(0.0, -20.0);
        assert_eq!(body.stick(), StickDirection::None);
    }

    #[test]
    fn test_deserialize_rejects_bad_stick() {
        let mut body = StickyBody::new(pixel());
        assert_eq!(
            body.deserialize(&[7.0, 0.0, 0.0, 0.0, 0.0]),
            Err(StateError::InvalidStick(7.0))
        );
    }

    #[test]
    fn test_fast_flight_does_not_tunnel() {
        // One pixel thick wall
        let world = BitRaster::from_fn(200, 100, |x, _| x == 100);
        let config = StickyConfig {
            gravity: 0.0,
            ..StickyConfig::default()
        };
        let mut body = StickyBody::with_config(pixel(), config);
        body.move_to(10.0, 50.0);
        body.add_velocity(3000.0, 0.0);
        body.tick(DT, &world);
        assert_eq!(body.stick(), StickDirection::PosX);
        assert_eq!(body.position().x, 99.0);
    }
}
