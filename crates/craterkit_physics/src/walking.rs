//! Gravity-affected walking bodies
//!
//! Characters walk on terrain, climb small steps, slide under friction and
//! jump. The body sleeps once it rests on the ground with negligible
//! horizontal speed and wakes on any impulse.

use std::fmt;
use std::sync::Arc;

use craterkit_raster::BitRaster;
use serde::{Deserialize, Serialize};

use crate::body::{check_len, Axis, BodyKind, Impact, ImpactCallback, PhysicsBody, StateError, DEFAULT_GRAVITY};
use crate::motion::{converge, decay, quantize, snap};
use crate::vec2::Vec2;

/// Horizontal speed below which a grounded walker falls asleep
pub const WALK_SLEEP_SPEED: f32 = 0.05;

/// Default upward velocity applied by a jump
pub const DEFAULT_JUMP_IMPULSE: f32 = 30.0;

/// Tuning for [`WalkingBody`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkingConfig {
    /// Downward acceleration in px/s²
    pub gravity: f32,
    /// Horizontal acceleration of a full walk input in px/s²
    pub walk_acceleration: f32,
    /// Upward velocity added by a jump
    pub jump_impulse: f32,
    /// Exponential decay rate of horizontal speed on the ground (1/s)
    pub ground_friction: f32,
    /// Exponential decay rate of horizontal speed in the air (1/s)
    pub air_friction: f32,
    /// Fraction of the walk acceleration available while airborne
    pub air_control: f32,
    /// Acceleration (px/s²) rolling the body off slope apexes; 0 disables it
    pub roundness: f32,
    /// Impacts fire only above `gravity * impact_factor` px/s
    pub impact_factor: f32,
    /// Tallest ledge climbed without stopping, in px
    pub max_step: i32,
}

impl Default for WalkingConfig {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            walk_acceleration: 50.0,
            jump_impulse: DEFAULT_JUMP_IMPULSE,
            ground_friction: 2.0,
            air_friction: 0.5,
            air_control: 0.3,
            roundness: 0.0,
            impact_factor: 0.75,
            max_step: 2,
        }
    }
}

/// A character that walks, climbs steps and jumps
pub struct WalkingBody {
    position: Vec2,
    velocity: Vec2,
    mask: Arc<BitRaster>,
    active: bool,
    grounded: bool,
    jumped: bool,
    /// Direction of the last roll off an apex, -1, 0 or 1
    roll_direction: i32,
    last_impact: Option<Impact>,
    on_impact: Option<ImpactCallback>,
    /// Motion tuning
    pub config: WalkingConfig,
}

impl WalkingBody {
    /// Create a resting walker at the origin with default tuning
    pub fn new(mask: Arc<BitRaster>) -> Self {
        Self::with_config(mask, WalkingConfig::default())
    }

    /// Create a walker with custom tuning
    pub fn with_config(mask: Arc<BitRaster>, config: WalkingConfig) -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            mask,
            active: true,
            grounded: false,
            jumped: false,
            roll_direction: 0,
            last_impact: None,
            on_impact: None,
            config,
        }
    }

    /// Invoke `callback` for every impact above the threshold
    pub fn on_impact(mut self, callback: impl FnMut(&Impact) + Send + 'static) -> Self {
        self.on_impact = Some(Box::new(callback));
        self
    }

    /// Whether the body stood on terrain after its last tick
    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// Accelerate horizontally; `direction` is usually -1, 0 or 1
    ///
    /// Airborne bodies only get `air_control` of the acceleration.
    pub fn walk(&mut self, dt: f32, direction: f32) {
        let control = if self.grounded { 1.0 } else { self.config.air_control };
        self.velocity.x += direction * self.config.walk_acceleration * control * dt;
        if direction != 0.0 {
            self.active = true;
        }
    }

    /// Launch upward, at most once per tick
    ///
    /// Returns false when a jump was already requested since the last tick.
    pub fn jump(&mut self) -> bool {
        if self.jumped {
            return false;
        }
        self.velocity.y -= self.config.jump_impulse;
        self.jumped = true;
        self.active = true;
        true
    }

    fn blocked(&self, world: &BitRaster, x: i32, y: i32) -> bool {
        world.collides_with(&self.mask, x, y)
    }

    fn impact_threshold(&self) -> f32 {
        self.config.gravity.abs() * self.config.impact_factor
    }

    fn report(&mut self, impact: Impact) {
        if impact.speed() <= self.impact_threshold() {
            return;
        }
        log::trace!("walker impact at {:?} speed {:.2}", impact.cell, impact.speed());
        self.last_impact = Some(impact);
        if let Some(callback) = self.on_impact.as_mut() {
            callback(&impact);
        }
    }

    /// Height of the lowest free spot at column `target`, within `max_step` px
    fn climb_height(&self, world: &BitRaster, from_x: i32, target_x: i32, y: i32) -> Option<i32> {
        (1..=self.config.max_step).find(|&h| {
            !self.blocked(world, from_x, y - h) && !self.blocked(world, target_x, y - h)
        })
    }

    /// Nudge horizontal speed toward a free diagonal while resting on an apex
    fn roll(&mut self, world: &BitRaster, x: i32, y: i32, dt: f32) {
        if self.config.roundness <= 0.0 {
            return;
        }
        let left_free = !self.blocked(world, x - 1, y + 1);
        let right_free = !self.blocked(world, x + 1, y + 1);
        let direction = match (left_free, right_free) {
            (true, false) => -1,
            (false, true) => 1,
            (true, true) if self.roll_direction != 0 => self.roll_direction,
            (true, true) if self.velocity.x < 0.0 => -1,
            (true, true) => 1,
            (false, false) => {
                self.roll_direction = 0;
                return;
            }
        };
        self.roll_direction = direction;
        self.velocity.x += direction as f32 * self.config.roundness * dt;
    }
}

impl fmt::Debug for WalkingBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalkingBody")
            .field("position", &self.position)
            .field("velocity", &self.velocity)
            .field("active", &self.active)
            .field("grounded", &self.grounded)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PhysicsBody for WalkingBody {
    fn kind(&self) -> BodyKind {
        BodyKind::Walking
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
        self.active
    }

    fn wake(&mut self) {
        self.active = true;
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.position = Vec2::new(x, y);
        self.grounded = false;
        self.roll_direction = 0;
        self.active = true;
    }

    fn tick(&mut self, dt: f32, world: &BitRaster) -> bool {
        if !self.active {
            return false;
        }

        let gravity_step = self.config.gravity * dt;
        self.velocity.y += gravity_step;
        // Average of the old and new velocity keeps free fall exact at any dt
        let mut dy = (self.velocity.y - 0.5 * gravity_step) * dt;

        let (mut qx, _) = self.quantized();
        let embedded = self.collides(world);
        if embedded {
            // Embedded by terrain edits: back out against the motion
            if self.velocity.x != 0.0 {
                self.position.x -= self.velocity.x.signum();
            } else {
                self.position.y -= 1.0;
            }
            log::trace!("walker unstuck to ({:.2}, {:.2})", self.position.x, self.position.y);
            qx = self.quantized().0;
        }

        let target_y = quantize(self.position.y + dy, self.velocity.y);
        if self.velocity.y > 0.0 {
            if self.blocked(world, qx, target_y) {
                let before = self.velocity;
                self.report(Impact {
                    velocity: before,
                    cell: (qx, target_y),
                    axis: Axis::Vertical,
                });
                let settled = converge(self.position.y, dy, |y| {
                    self.blocked(world, qx, quantize(y, before.y))
                });
                self.position.y = snap(settled, before.y);
                self.velocity.y = 0.0;
                dy = 0.0;
                self.grounded = true;

                let y = quantize(self.position.y, 0.0);
                self.roll(world, qx, y, dt);
                self.velocity.x *= decay(self.config.ground_friction, dt);
            } else {
                self.grounded = false;
                self.velocity.x *= decay(self.config.air_friction, dt);
            }
        } else {
            self.grounded = false;
            if dy < 0.0 && self.blocked(world, qx, target_y) {
                let before = self.velocity;
                self.report(Impact {
                    velocity: before,
                    cell: (qx, target_y),
                    axis: Axis::Vertical,
                });
                let settled = converge(self.position.y, dy, |y| {
                    self.blocked(world, qx, quantize(y, before.y))
                });
                self.position.y = snap(settled, before.y);
                self.velocity.y = 0.0;
                dy = 0.0;
            }
            self.velocity.x *= decay(self.config.air_friction, dt);
        }
        self.position.y += dy;

        let qy = quantize(self.position.y, self.velocity.y);
        let mut dx = self.velocity.x * dt;
        if dx != 0.0 {
            let target_x = quantize(self.position.x + dx, self.velocity.x);
            if self.blocked(world, target_x, qy) {
                let step = if self.grounded {
                    self.climb_height(world, qx, target_x, qy)
                } else {
                    None
                };
                match step {
                    Some(height) => {
                        self.position.y = (qy - height) as f32;
                        log::trace!("walker climbed {} px", height);
                    }
                    None => {
                        let before = self.velocity;
                        self.report(Impact {
                            velocity: before,
                            cell: (target_x, qy),
                            axis: Axis::Horizontal,
                        });
                        let settled = converge(self.position.x, dx, |x| {
                            self.blocked(world, quantize(x, before.x), qy)
                        });
                        self.position.x = snap(settled, before.x);
                        self.velocity.x = 0.0;
                        dx = 0.0;
                    }
                }
            }
        }
        self.position.x += dx;

        self.jumped = false;
        // Embedded bodies stay awake until they have climbed free
        if self.grounded && !embedded && self.velocity.x.abs() < WALK_SLEEP_SPEED {
            self.velocity = Vec2::ZERO;
            self.active = false;
            log::trace!("walker asleep at ({:.2}, {:.2})", self.position.x, self.position.y);
        }
        true
    }

    fn add_velocity(&mut self, vx: f32, vy: f32) {
        self.velocity += Vec2::new(vx, vy);
        self.active = true;
    }

    fn take_impact(&mut self) -> Option<Impact> {
        self.last_impact.take()
    }

    fn serialize(&self) -> Vec<f32> {
        let active = if self.active { 1.0 } else { 0.0 };
        vec![active, self.velocity.x, self.velocity.y, self.position.x, self.position.y]
    }

    fn deserialize(&mut self, state: &[f32]) -> Result<(), StateError> {
        check_len(BodyKind::Walking, state)?;
        self.velocity = Vec2::new(state[1], state[2]);
        self.move_to(state[3], state[4]);
        self.active = state[0] != 0.0;
        // Sleeping walkers always rest on ground, and a tick that ends on
        // ground leaves no vertical speed
        self.grounded = !self.active || self.velocity.y == 0.0;
        self.jumped = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DT: f32 = 1.0 / 30.0;

    fn pixel() -> Arc<BitRaster> {
        Arc::new(BitRaster::solid_rectangle(1, 1))
    }

    /// 200x100 world with a solid floor from row 80 down
    fn floor_world() -> BitRaster {
        BitRaster::from_fn(200, 100, |_, y| y >= 80)
    }

    fn settle(body: &mut WalkingBody, world: &BitRaster) {
        for _ in 0..600 {
            if !body.tick(DT, world) {
                break;
            }
        }
    }

    #[test]
    fn test_lands_on_floor() {
        let world = floor_world();
        let mut body = WalkingBody::new(pixel());
        body.move_to(50.0, 10.0);
        settle(&mut body, &world);

        assert_eq!(body.position().y, 79.0);
        assert!(body.is_grounded());
        assert!(!body.is_active());
        assert!(!body.collides(&world));
    }

    #[test]
    fn test_sleeping_body_does_not_tick() {
        let world = floor_world();
        let mut body = WalkingBody::new(pixel());
        body.move_to(50.0, 79.0);
        settle(&mut body, &world);

        let before = body.serialize();
        assert!(!body.tick(DT, &world));
        assert_eq!(body.serialize(), before);
    }

    #[test]
    fn test_walk_wakes_and_moves() {
        let world = floor_world();
        let mut body = WalkingBody::new(pixel());
        body.move_to(50.0, 79.0);
        settle(&mut body, &world);

        body.walk(DT, 1.0);
        assert!(body.is_active());
        for _ in 0..30 {
            body.walk(DT, 1.0);
            body.tick(DT, &world);
        }
        assert!(body.position().x > 50.0);
        assert_eq!(body.position().y, 79.0);
    }

    #[test]
    fn test_air_control_reduces_acceleration() {
        let mut body = WalkingBody::new(pixel());
        body.walk(1.0, 1.0);
        assert!((body.velocity().x - 50.0 * 0.3).abs() < 1e-4);
    }

    #[test]
    fn test_jump_once_per_tick() {
        let world = floor_world();
        let mut body = WalkingBody::new(pixel());
        body.move_to(50.0, 79.0);
        settle(&mut body, &world);

        assert!(body.jump());
        assert!(!body.jump());
        assert_eq!(body.velocity().y, -DEFAULT_JUMP_IMPULSE);

        body.tick(DT, &world);
        assert!(body.position().y < 79.0);
        assert!(!body.is_grounded());
        assert!(body.jump());
    }

    #[test]
    fn test_climbs_small_step() {
        // Floor at row 80 with a 2 px ledge from column 60
        let world = BitRaster::from_fn(200, 100, |x, y| y >= 80 || (x >= 60 && y >= 78));
        let mut body = WalkingBody::new(pixel());
        body.move_to(55.0, 79.0);
        settle(&mut body, &world);

        for _ in 0..90 {
            body.walk(DT, 1.0);
            body.tick(DT, &world);
        }
        assert!(body.position().x > 60.0);
        assert!(body.position().y <= 77.0);
        assert!(!body.collides(&world));
    }

    #[test]
    fn test_wall_stops_body() {
        // Floor plus a 10 px wall from column 60
        let world = BitRaster::from_fn(200, 100, |x, y| y >= 80 || (x >= 60 && x < 64 && y >= 70));
        let mut body = WalkingBody::new(pixel());
        body.move_to(50.0, 79.0);
        settle(&mut body, &world);

        body.add_velocity(40.0, 0.0);
        for _ in 0..60 {
            body.tick(DT, &world);
        }
        assert_eq!(body.position().x, 59.0);
        assert!(!body.collides(&world));
    }

    #[test]
    fn test_hard_landing_fires_impact() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let world = floor_world();
        let mut body = WalkingBody::new(pixel()).on_impact(move |impact| {
            assert_eq!(impact.axis, Axis::Vertical);
            seen.fetch_add(1, Ordering::SeqCst);
        });
        body.move_to(50.0, 0.0);
        settle(&mut body, &world);

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_gentle_landing_is_silent() {
        let world = floor_world();
        let mut body = WalkingBody::new(pixel());
        body.move_to(50.0, 78.0);
        settle(&mut body, &world);
        assert!(body.take_impact().is_none());
    }

    #[test]
    fn test_unsticks_when_embedded() {
        let world = floor_world();
        let mut body = WalkingBody::new(pixel());
        body.move_to(50.0, 80.0);
        body.tick(DT, &world);
        assert!(body.position().y < 80.0);
    }

    #[test]
    fn test_deeply_embedded_body_climbs_out() {
        let world = floor_world();
        let mut body = WalkingBody::new(pixel());
        body.move_to(50.0, 85.0);
        settle(&mut body, &world);
        assert_eq!(body.position().y, 79.0);
        assert!(!body.collides(&world));
    }

    #[test]
    fn test_roll_off_apex() {
        // A single-pixel spike the body balances on
        let world = BitRaster::from_fn(200, 100, |x, y| y >= 80 || (x == 50 && y >= 70));
        let config = WalkingConfig {
            roundness: 20.0,
            ..WalkingConfig::default()
        };
        let mut body = WalkingBody::with_config(pixel(), config);
        body.move_to(50.0, 60.0);
        for _ in 0..120 {
            body.tick(DT, &world);
        }
        assert_ne!(body.position().x, 50.0);
        assert_eq!(body.position().y, 79.0);
    }

    #[test]
    fn test_serialize_layout() {
        let mut body = WalkingBody::new(pixel());
        body.move_to(3.0, 4.0);
        body.add_velocity(1.0, 2.0);
        assert_eq!(body.serialize(), vec![1.0, 1.0, 2.0, 3.0, 4.0]);

        let mut copy = WalkingBody::new(pixel());
        copy.deserialize(&[0.0, 5.0, 6.0, 7.0, 8.0]).unwrap();
        assert!(!copy.is_active());
        assert_eq!(copy.position(), Vec2::new(7.0, 8.0));
        assert_eq!(copy.velocity(), Vec2::new(5.0, 6.0));
    }

    #[test]
    fn test_restored_resting_walker_walks_like_original() {
        let world = floor_world();
        let mut original = WalkingBody::new(pixel());
        original.move_to(40.0, 70.0);
        settle(&mut original, &world);

        let mut copy = WalkingBody::new(pixel());
        copy.deserialize(&original.serialize()).unwrap();
        assert!(copy.is_grounded());

        for tick in 0..10 {
            original.walk(DT, 1.0);
            copy.walk(DT, 1.0);
            original.tick(DT, &world);
            copy.tick(DT, &world);
            assert_eq!(original.serialize(), copy.serialize(), "diverged on tick {}", tick);
        }
    }

    #[test]
    fn test_restored_falling_walker_is_airborne() {
        let world = floor_world();
        let mut original = WalkingBody::new(pixel());
        original.move_to(40.0, 10.0);
        for _ in 0..5 {
            original.tick(DT, &world);
        }

        let mut copy = WalkingBody::new(pixel());
        copy.deserialize(&original.serialize()).unwrap();
        assert!(!copy.is_grounded());
    }

    #[test]
    fn test_deserialize_rejects_bad_length() {
        let mut body = WalkingBody::new(pixel());
        assert!(body.deserialize(&[1.0, 2.0]).is_err());
    }
}
