//! Ripple Stride - ripple effects and third-person locomotion
//!
//! Core modules:
//! - `sim`: Deterministic simulation (effect registry, locomotion, recovery)
//! - `settings`: Data-driven tuning loaded from JSON

pub mod settings;
pub mod sim;

pub use settings::{EffectSettings, LocomotionSettings, Settings, SettingsError};

use glam::Vec3;

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one locomotion update per frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Tolerance when comparing accumulated time against a deadline
    pub const TIME_EPSILON: f32 = 1e-4;

    /// Animation layer driven by the run blend weight
    pub const RUN_LAYER: usize = 1;

    /// Height above the character origin that a stable position is recorded at
    pub const STABLE_LIFT: f32 = 1.0;
    /// Height above a sample point that the ground probe starts from
    pub const PROBE_LIFT: f32 = 1.0;
}

/// Signed shortest difference between two headings, in degrees, in (-180, 180]
#[inline]
pub fn delta_angle(current: f32, target: f32) -> f32 {
    let mut delta = (target - current).rem_euclid(360.0);
    if delta > 180.0 {
        delta -= 360.0;
    }
    delta
}

/// Move `current` toward `target` by at most `max_delta`
#[inline]
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

/// Critically damped spring toward `target`.
///
/// `velocity` carries the spring state between calls. Never overshoots.
pub fn smooth_damp(current: f32, target: f32, velocity: &mut f32, smooth_time: f32, dt: f32) -> f32 {
    let smooth_time = smooth_time.max(1e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * exp;
    let mut output = target + (change + temp) * exp;

    // Snap if we passed the target this step
    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = if dt > 0.0 { (output - target) / dt } else { 0.0 };
    }
    output
}

/// [`smooth_damp`] for headings in degrees, taking the short way around
pub fn smooth_damp_angle(current: f32, target: f32, velocity: &mut f32, smooth_time: f32, dt: f32) -> f32 {
    let target = current + delta_angle(current, target);
    smooth_damp(current, target, velocity, smooth_time, dt)
}

/// Horizontal unit direction for a heading in degrees (0 = +Z, 90 = +X)
#[inline]
pub fn heading_to_direction(degrees: f32) -> Vec3 {
    let rad = degrees.to_radians();
    Vec3::new(rad.sin(), 0.0, rad.cos())
}
