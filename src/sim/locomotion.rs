//! Third-person character locomotion
//!
//! One fixed-order update per tick: ground snap, stability scan, horizontal
//! movement, run blend, facing, gravity, ground flag, jump, recovery.
//! Movement axes are world axes (right = +X, forward = +Z); only the visual
//! turns to face the movement direction.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::backend::{AnimFlag, Animator, CharacterBody, SurfaceProbe, SurfaceTag};
use super::recovery::Recovery;
use crate::consts::{PROBE_LIFT, RUN_LAYER, STABLE_LIFT};
use crate::settings::LocomotionSettings;
use crate::{heading_to_direction, move_towards, smooth_damp_angle};

/// Input intent for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LocomotionInput {
    /// Strafe axis in [-1, 1]
    pub move_x: f32,
    /// Forward axis in [-1, 1]
    pub move_z: f32,
    pub jump: bool,
    pub run: bool,
}

impl LocomotionInput {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn clamped(self) -> Self {
        Self {
            move_x: self.move_x.clamp(-1.0, 1.0),
            move_z: self.move_z.clamp(-1.0, 1.0),
            ..self
        }
    }
}

/// Persistent per-character state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocomotionState {
    /// Only `y` is integrated
    pub velocity: Vec3,
    /// Last position whose whole neighbourhood was passable
    pub last_stable_position: Vec3,
    /// Set while a hazard recovery is running
    pub immune: bool,
    /// Run animation layer weight in [0, 1]
    pub run_blend_weight: f32,
    /// Facing of the visual in degrees
    pub heading: f32,
    /// Smooth-damp state for `heading`
    pub heading_velocity: f32,
}

/// Locomotion state machine for one character
#[derive(Debug, Clone)]
pub struct CharacterLocomotion {
    settings: LocomotionSettings,
    state: LocomotionState,
    tick_index: u64,
    /// Tick at which the Jump flag is cleared
    pending_jump_clear: Option<u64>,
    /// Ignore input on the next tick
    reset_input: bool,
    recovery: Option<Recovery>,
}

impl CharacterLocomotion {
    /// `spawn` is the initial fallback for hazard recovery
    pub fn new(settings: LocomotionSettings, spawn: Vec3) -> Self {
        Self {
            settings,
            state: LocomotionState {
                velocity: Vec3::ZERO,
                last_stable_position: spawn,
                immune: false,
                run_blend_weight: 0.0,
                heading: 0.0,
                heading_velocity: 0.0,
            },
            tick_index: 0,
            pending_jump_clear: None,
            reset_input: false,
            recovery: None,
        }
    }

    pub fn settings(&self) -> &LocomotionSettings {
        &self.settings
    }

    pub fn state(&self) -> &LocomotionState {
        &self.state
    }

    pub fn is_immune(&self) -> bool {
        self.state.immune
    }

    pub fn is_recovering(&self) -> bool {
        self.recovery.is_some()
    }

    /// Ticks run so far
    pub fn ticks(&self) -> u64 {
        self.tick_index
    }

    /// Advance one tick
    pub fn tick(
        &mut self,
        dt: f32,
        input: &LocomotionInput,
        body: &mut impl CharacterBody,
        animator: &mut impl Animator,
        probe: &impl SurfaceProbe,
    ) {
        self.tick_index += 1;

        if self.pending_jump_clear.is_some_and(|at| at <= self.tick_index) {
            animator.set_flag(AnimFlag::Jump, false);
            self.pending_jump_clear = None;
        }

        let input = if std::mem::take(&mut self.reset_input) {
            LocomotionInput::default()
        } else {
            input.clamped()
        };

        // Stop accumulating fall speed once on the ground
        if body.is_grounded() && self.state.velocity.y < 0.0 {
            self.state.velocity.y = 0.0;
        }

        self.check_stable(&*body, probe);

        let movement = Vec3::X * input.move_x + Vec3::Z * input.move_z;
        body.move_by(movement * (self.settings.movement_speed * dt));
        if input.run {
            body.move_by(movement * (dt * self.settings.run_multiplier));
        }

        let run_target = if input.run && body.is_grounded() { 1.0 } else { 0.0 };
        self.state.run_blend_weight = move_towards(
            self.state.run_blend_weight,
            run_target,
            dt * self.settings.run_transition_speed,
        );
        animator.set_layer_weight(RUN_LAYER, self.state.run_blend_weight);

        let moving = movement.length() > 0.0;
        animator.set_flag(AnimFlag::Moving, moving);
        if moving {
            let target = input.move_x.atan2(input.move_z).to_degrees() + self.settings.heading_offset;
            let heading = smooth_damp_angle(
                self.state.heading,
                target,
                &mut self.state.heading_velocity,
                self.settings.smooth_time,
                dt,
            );
            self.state.heading = heading.rem_euclid(360.0);
            body.set_heading(self.state.heading);
        }

        self.state.velocity.y += self.settings.gravity * dt;
        body.move_by(Vec3::Y * (self.state.velocity.y * dt));

        if body.is_grounded() {
            animator.set_flag(AnimFlag::Grounded, true);
        }

        if input.jump && body.is_grounded() {
            animator.set_flag(AnimFlag::Jump, true);
            animator.set_flag(AnimFlag::Grounded, false);
            self.state.velocity.y = self.settings.jump_velocity();
            // Replaces any clear still pending
            self.pending_jump_clear = Some(self.tick_index + 1);
        }

        if let Some(recovery) = self.recovery.as_mut() {
            if recovery.step(dt, body, self.state.last_stable_position) {
                self.recovery = None;
                self.state.immune = false;
                log::info!("Recovery complete after {} ticks", self.tick_index);
            }
        }
    }

    /// Record the current position as stable if every sampled direction is
    /// passable. Returns whether it was recorded.
    fn check_stable(&mut self, body: &impl CharacterBody, probe: &impl SurfaceProbe) -> bool {
        if self.state.immune || !body.is_grounded() {
            return false;
        }

        let check_distance = body.radius() * self.settings.check_distance_factor;
        let samples = self.settings.stability_samples.max(1);
        let position = body.position();

        for i in 0..samples {
            let angle = 360.0 * i as f32 / samples as f32;
            let point = position + heading_to_direction(angle) * check_distance;
            if !is_passable(probe, point) {
                return false;
            }
        }

        self.state.last_stable_position = position + Vec3::Y * STABLE_LIFT;
        true
    }

    /// Start a hazard recovery. Ignored (returns false) while already immune.
    pub fn begin_recovery(&mut self, body: &mut impl CharacterBody) -> bool {
        if self.state.immune {
            return false;
        }
        self.state.immune = true;
        self.reset_input = true;
        self.recovery = Some(Recovery::start(&self.settings, body, self.state.last_stable_position));
        log::info!(
            "Hazard recovery from {} toward {}",
            body.position(),
            self.state.last_stable_position
        );
        true
    }

    /// Collision callback: hazard surfaces start a recovery
    pub fn on_surface_contact(&mut self, surface: SurfaceTag, body: &mut impl CharacterBody) -> bool {
        match surface {
            SurfaceTag::Hazard => self.begin_recovery(body),
            SurfaceTag::Ground => false,
        }
    }
}

/// A point is passable when ground (not hazard) lies below it
fn is_passable(probe: &impl SurfaceProbe, point: Vec3) -> bool {
    matches!(probe.probe_down(point + Vec3::Y * PROBE_LIFT), Some(SurfaceTag::Ground))
}
