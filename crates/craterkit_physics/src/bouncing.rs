//! Ballistic bodies that bounce off terrain
//!
//! Debris, grenades and similar props fly under gravity with exponential
//! drag. Each axis is resolved separately, x first, and a blocked axis has
//! its velocity scaled by the restitution coefficient. A negative
//! coefficient reflects the body, a non-negative one drags it to a stop.

use std::fmt;
use std::sync::Arc;

use craterkit_raster::BitRaster;
use serde::{Deserialize, Serialize};

use crate::body::{check_len, Axis, BodyKind, Impact, ImpactCallback, PhysicsBody, StateError, DEFAULT_GRAVITY};
use crate::motion::{decay, quantize, snap};
use crate::vec2::Vec2;

/// Per-axis speed under which a bouncing body may sleep after a contact
pub const BOUNCE_SLEEP_SPEED: f32 = 1.0;

/// Tuning for [`BouncingBody`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BouncingConfig {
    /// Downward acceleration in px/s²
    pub gravity: f32,
    /// Exponential drag rate on both axes (1/s)
    pub friction: f32,
    /// Velocity factor applied on contact; negative values bounce
    pub restitution: f32,
}

impl Default for BouncingConfig {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            friction: 0.1,
            restitution: -0.5,
        }
    }
}

/// A projectile that reflects or stops on contact
pub struct BouncingBody {
    position: Vec2,
    velocity: Vec2,
    mask: Arc<BitRaster>,
    active: bool,
    last_impact: Option<Impact>,
    on_impact: Option<ImpactCallback>,
    pub config: BouncingConfig,
}

impl BouncingBody {
    pub fn new(mask: Arc<BitRaster>) -> Self {
        Self::with_config(mask, BouncingConfig::default())
    }

    pub fn with_config(mask: Arc<BitRaster>, config: BouncingConfig) -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            mask,
            active: true,
            last_impact: None,
            on_impact: None,
            config,
        }
    }

    /// Invoke `callback` on every contact
    pub fn on_impact(mut self, callback: impl FnMut(&Impact) + Send + 'static) -> Self {
        self.on_impact = Some(Box::new(callback));
        self
    }

    fn blocked(&self, world: &BitRaster, x: i32, y: i32) -> bool {
        world.collides_with(&self.mask, x, y)
    }

    fn report(&mut self, impact: Impact) {
        self.last_impact = Some(impact);
        if let Some(callback) = self.on_impact.as_mut() {
            callback(&impact);
        }
    }
}

impl fmt::Debug for BouncingBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BouncingBody")
            .field("position", &self.position)
            .field("velocity", &self.velocity)
            .field("active", &self.active)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PhysicsBody for BouncingBody {
    fn kind(&self) -> BodyKind {
        BodyKind::Bouncing
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
    }

    fn tick(&mut self, dt: f32, world: &BitRaster) -> bool {
        if !self.active {
            return false;
        }

        let gravity_step = self.config.gravity * dt;
        self.velocity.y += gravity_step;
        self.velocity = self.velocity * decay(self.config.friction, dt);

        let restitution = self.config.restitution;
        let dx = self.velocity.x * dt;
        let dy = (self.velocity.y - 0.5 * gravity_step) * dt;
        let mut contact = false;

        let qy = quantize(self.position.y, self.velocity.y);
        let target_x = quantize(self.position.x + dx, self.velocity.x);
        if self.blocked(world, target_x, qy) {
            let before = self.velocity;
            self.velocity.x *= restitution;
            if restitution >= 0.0 {
                self.position.x = snap(self.position.x, before.x);
            }
            self.report(Impact {
                velocity: before,
                cell: (target_x, qy),
                axis: Axis::Horizontal,
            });
            contact = true;
        } else {
            self.position.x += dx;
        }

        let qx = quantize(self.position.x, self.velocity.x);
        let target_y = quantize(self.position.y + dy, self.velocity.y);
        if self.blocked(world, qx, target_y) {
            let before = self.velocity;
            self.velocity.y *= restitution;
            if restitution >= 0.0 {
                self.position.y = snap(self.position.y, before.y);
            }
            self.report(Impact {
                velocity: before,
                cell: (qx, target_y),
                axis: Axis::Vertical,
            });
            contact = true;
        } else {
            self.position.y += dy;
        }

        let settle_speed = BOUNCE_SLEEP_SPEED + gravity_step.abs();
        if contact && self.velocity.x.abs() < BOUNCE_SLEEP_SPEED && self.velocity.y.abs() < settle_speed {
            self.velocity = Vec2::ZERO;
            self.active = false;
            log::trace!("bouncer asleep at ({:.2}, {:.2})", self.position.x, self.position.y);
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
        vec![self.position.x, self.position.y, self.velocity.x, self.velocity.y]
    }

    fn deserialize(&mut self, state: &[f32]) -> Result<(), StateError> {
        check_len(BodyKind::Bouncing, state)?;
        self.move_to(state[0], state[1]);
        self.velocity = Vec2::new(state[2], state[3]);
        self.active = true;
        Ok(())
    }
}
