//! Motion primitives shared by the body integrators
//!
//! Bodies move continuously but collide on the pixel grid. These helpers
//! turn continuous coordinates into grid cells and walk a blocked move back
//! to the last free position.

/// Step size below which [`converge`] stops halving
pub const CONVERGE_STEP: f32 = 0.125;

/// Grid cell used for collision queries along one axis
///
/// Rounds up while moving in the positive direction and truncates toward
/// zero otherwise, so the leading edge of positive motion is always the cell
/// being tested.
#[inline]
pub fn quantize(position: f32, velocity: f32) -> i32 {
    if velocity > 0.0 {
        position.ceil() as i32
    } else {
        position.trunc() as i32
    }
}

/// Continuous coordinate of the cell [`quantize`] selects
#[inline]
pub fn snap(position: f32, velocity: f32) -> f32 {
    quantize(position, velocity) as f32
}

/// Move from `start` toward `start + delta` as far as `blocked` allows
///
/// `blocked` receives candidate continuous positions. The displacement is
/// halved repeatedly and each half is kept when it lands on a free position,
/// so the result is free and lies within [`CONVERGE_STEP`] of the first
/// blocked position along the path. Snapping the result with the motion's
/// velocity yields the last free cell.
pub fn converge(start: f32, delta: f32, mut blocked: impl FnMut(f32) -> bool) -> f32 {
    let mut position = start;
    let mut remaining = delta;
    while remaining.abs() > CONVERGE_STEP {
        remaining *= 0.5;
        if !blocked(position + remaining) {
            position += remaining;
        }
    }
    position
}

/// Exponential decay factor for a rate (per second) over `dt` seconds
#[inline]
pub fn decay(rate: f32, dt: f32) -> f32 {
    (-rate * dt).exp()
}
