//! The body capability contract and the closed set of body variants
//!
//! Every body exposes the same surface: continuous position and velocity, a
//! collision mask, an activity flag, a per-tick integration step against a
//! world raster, velocity impulses and a flat numeric state vector. The
//! [`Body`] enum dispatches to one of four motion models.

use std::fmt;
use std::sync::Arc;

use craterkit_raster::BitRaster;
use serde::{Deserialize, Serialize};

use crate::bouncing::BouncingBody;
use crate::motion::quantize;
use crate::static_body::StaticBody;
use crate::sticky::StickyBody;
use crate::vec2::Vec2;
use crate::walking::WalkingBody;

/// Default downward acceleration in px/s²
///
/// A body dropped from rest falls 25.77 px in its first second.
pub const DEFAULT_GRAVITY: f32 = 51.54;

/// Axis along which a collision was resolved
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// A collision reported by a body during its tick
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Impact {
    /// Velocity just before the collision was resolved
    pub velocity: Vec2,
    /// Quantized cell the body was blocked at
    pub cell: (i32, i32),
    /// Axis the collision happened on
    pub axis: Axis,
}

impl Impact {
    /// Speed along the axis of the collision
    pub fn speed(&self) -> f32 {
        match self.axis {
            Axis::Horizontal => self.velocity.x.abs(),
            Axis::Vertical => self.velocity.y.abs(),
        }
    }
}

/// Callback invoked whenever a body reports an [`Impact`]
pub type ImpactCallback = Box<dyn FnMut(&Impact) + Send>;

/// The motion model of a body
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyKind {
    Walking,
    Bouncing,
    Sticky,
    Static,
}

impl BodyKind {
    /// Number of values in this kind's serialized state vector
    pub fn state_len(self) -> usize {
        match self {
            BodyKind::Walking => 5,
            BodyKind::Bouncing => 4,
            BodyKind::Sticky => 5,
            BodyKind::Static => 2,
        }
    }
}

impl fmt::Display for BodyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BodyKind::Walking => "walking",
            BodyKind::Bouncing => "bouncing",
            BodyKind::Sticky => "sticky",
            BodyKind::Static => "static",
        };
        f.pad(name)
    }
}

/// Error restoring a body from a state vector
#[derive(Clone, Debug, PartialEq)]
pub enum StateError {
    /// The vector has the wrong number of values for this body kind
    Length {
        kind: BodyKind,
        expected: usize,
        found: usize,
    },
    /// A state of one kind was applied to a body of another
    KindMismatch { expected: BodyKind, found: BodyKind },
    /// The sticky contact code is not one of 0..=4
    InvalidStick(f32),
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::Length { kind, expected, found } => write!(
                f,
                "{} body state needs {} values, got {}",
                kind, expected, found
            ),
            StateError::KindMismatch { expected, found } => {
                write!(f, "cannot apply {} state to a {} body", found, expected)
            }
            StateError::InvalidStick(code) => write!(f, "invalid stick direction code {}", code),
        }
    }
}

impl std::error::Error for StateError {}

/// Check a state vector has the length `kind` requires
pub(crate) fn check_len(kind: BodyKind, state: &[f32]) -> Result<(), StateError> {
    let expected = kind.state_len();
    if state.len() == expected {
        Ok(())
    } else {
        Err(StateError::Length {
            kind,
            expected,
            found: state.len(),
        })
    }
}

/// The capability set every body provides
pub trait PhysicsBody {
    /// Which motion model this body runs
    fn kind(&self) -> BodyKind;

    /// Continuous position of the mask's top-left corner
    fn position(&self) -> Vec2;

    /// Velocity in px/s
    fn velocity(&self) -> Vec2;

    /// Magnitude of the velocity
    fn speed(&self) -> f32 {
        self.velocity().length()
    }

    /// Heading of the velocity in radians
    fn direction(&self) -> f32 {
        self.velocity().angle()
    }

    /// Grid cell used for collision queries
    fn quantized(&self) -> (i32, i32) {
        let position = self.position();
        let velocity = self.velocity();
        (quantize(position.x, velocity.x), quantize(position.y, velocity.y))
    }

    /// Collision mask, shared between bodies of the same shape
    fn mask(&self) -> &Arc<BitRaster>;

    /// Whether the body integrates on tick
    fn is_active(&self) -> bool;

    /// Resume integration after sleeping
    fn wake(&mut self) {}

    /// Place the body explicitly, outside of integration
    fn move_to(&mut self, x: f32, y: f32);

    /// Advance by `dt` seconds against `world`, returning whether it ran
    fn tick(&mut self, dt: f32, world: &BitRaster) -> bool;

    /// Add to the velocity and wake the body
    fn add_velocity(&mut self, vx: f32, vy: f32);

    /// Add `power` px/s along `direction` radians
    fn add_angular_velocity(&mut self, power: f32, direction: f32) {
        let impulse = Vec2::from_angle(direction) * power;
        self.add_velocity(impulse.x, impulse.y);
    }

    /// Most recent impact since the last call, if any
    fn take_impact(&mut self) -> Option<Impact> {
        None
    }

    /// Flat state vector for networking and snapshots
    fn serialize(&self) -> Vec<f32>;

    /// Restore from a vector produced by [`PhysicsBody::serialize`]
    fn deserialize(&mut self, state: &[f32]) -> Result<(), StateError>;

    /// Whether the mask at the current quantized cell overlaps `world`
    fn collides(&self, world: &BitRaster) -> bool {
        let (x, y) = self.quantized();
        world.collides_with(self.mask(), x, y)
    }
}

/// Serialized body state tagged with its kind
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BodyState {
    Walking([f32; 5]),
    Bouncing([f32; 4]),
    Sticky([f32; 5]),
    Static([f32; 2]),
}

impl BodyState {
    pub fn kind(&self) -> BodyKind {
        match self {
            BodyState::Walking(_) => BodyKind::Walking,
            BodyState::Bouncing(_) => BodyKind::Bouncing,
            BodyState::Sticky(_) => BodyKind::Sticky,
            BodyState::Static(_) => BodyKind::Static,
        }
    }

    pub fn values(&self) -> &[f32] {
        match self {
            BodyState::Walking(v) => v,
            BodyState::Bouncing(v) => v,
            BodyState::Sticky(v) => v,
            BodyState::Static(v) => v,
        }
    }

    /// Tag a raw state vector with `kind`
    pub fn from_values(kind: BodyKind, values: &[f32]) -> Result<Self, StateError> {
        check_len(kind, values)?;
        let state = match kind {
            BodyKind::Walking => BodyState::Walking([values[0], values[1], values[2], values[3], values[4]]),
            BodyKind::Bouncing => BodyState::Bouncing([values[0], values[1], values[2], values[3]]),
            BodyKind::Sticky => BodyState::Sticky([values[0], values[1], values[2], values[3], values[4]]),
            BodyKind::Static => BodyState::Static([values[0], values[1]]),
        };
        Ok(state)
    }
}

/// One of the four body variants
#[derive(Debug)]
pub enum Body {
    Walking(WalkingBody),
    Bouncing(BouncingBody),
    Sticky(StickyBody),
    Static(StaticBody),
}

impl Body {
    fn inner(&self) -> &dyn PhysicsBody {
        match self {
            Body::Walking(body) => body,
            Body::Bouncing(body) => body,
            Body::Sticky(body) => body,
            Body::Static(body) => body,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn PhysicsBody {
        match self {
            Body::Walking(body) => body,
            Body::Bouncing(body) => body,
            Body::Sticky(body) => body,
            Body::Static(body) => body,
        }
    }

    /// Current state tagged with the body kind
    pub fn state(&self) -> BodyState {
        let values = self.serialize();
        match self {
            Body::Walking(_) => BodyState::Walking([values[0], values[1], values[2], values[3], values[4]]),
            Body::Bouncing(_) => BodyState::Bouncing([values[0], values[1], values[2], values[3]]),
            Body::Sticky(_) => BodyState::Sticky([values[0], values[1], values[2], values[3], values[4]]),
            Body::Static(_) => BodyState::Static([values[0], values[1]]),
        }
    }

    /// Restore a tagged state, rejecting states of another kind
    pub fn apply_state(&mut self, state: &BodyState) -> Result<(), StateError> {
        if state.kind() != self.kind() {
            return Err(StateError::KindMismatch {
                expected: self.kind(),
                found: state.kind(),
            });
        }
        self.deserialize(state.values())
    }

    pub fn as_walking(&self) -> Option<&WalkingBody> {
        match self {
            Body::Walking(body) => Some(body),
            _ => None,
        }
    }

    pub fn as_walking_mut(&mut self) -> Option<&mut WalkingBody> {
        match self {
            Body::Walking(body) => Some(body),
            _ => None,
        }
    }

    pub fn as_sticky(&self) -> Option<&StickyBody> {
        match self {
            Body::Sticky(body) => Some(body),
            _ => None,
        }
    }

    pub fn as_static_mut(&mut self) -> Option<&mut StaticBody> {
        match self {
            Body::Static(body) => Some(body),
            _ => None,
        }
    }
}

impl PhysicsBody for Body {
    fn kind(&self) -> BodyKind {
        self.inner().kind()
    }

    fn position(&self) -> Vec2 {
        self.inner().position()
    }

    fn velocity(&self) -> Vec2 {
        self.inner().velocity()
    }

    fn quantized(&self) -> (i32, i32) {
        self.inner().quantized()
    }

    fn mask(&self) -> &Arc<BitRaster> {
        self.inner().mask()
    }

    fn is_active(&self) -> bool {
        self.inner().is_active()
    }

    fn wake(&mut self) {
        self.inner_mut().wake()
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.inner_mut().move_to(x, y)
    }

    fn tick(&mut self, dt: f32, world: &BitRaster) -> bool {
        self.inner_mut().tick(dt, world)
    }

    fn add_velocity(&mut self, vx: f32, vy: f32) {
        self.inner_mut().add_velocity(vx, vy)
    }

    fn add_angular_velocity(&mut self, power: f32, direction: f32) {
        self.inner_mut().add_angular_velocity(power, direction)
    }

    fn take_impact(&mut self) -> Option<Impact> {
        self.inner_mut().take_impact()
    }

    fn serialize(&self) -> Vec<f32> {
        self.inner().serialize()
    }

    fn deserialize(&mut self, state: &[f32]) -> Result<(), StateError> {
        self.inner_mut().deserialize(state)
    }
}

impl From<WalkingBody> for Body {
    fn from(body: WalkingBody) -> Self {
        Body::Walking(body)
    }
}

impl From<BouncingBody> for Body {
    fn from(body: BouncingBody) -> Self {
        Body::Bouncing(body)
    }
}

impl From<StickyBody> for Body {
    fn from(body: StickyBody) -> Self {
        Body::Sticky(body)
    }
}

impl From<StaticBody> for Body {
    fn from(body: StaticBody) -> Self {
        Body::Static(body)
    }
}
