//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Deferred work is data (timer queues, tick deadlines), never threads
//! - Stable iteration order (by target ID)
//! - Host engine reached only through the traits in `backend`

pub mod backend;
pub mod locomotion;
pub mod outline;
pub mod recovery;
pub mod ripple;
pub mod sandbox;
pub mod timer;
pub mod transition;

pub use backend::{
    AnimFlag, Animator, Bounds, CharacterBody, Color, EffectBackend, EffectHandle, SceneQuery,
    SurfaceProbe, SurfaceTag, TargetId,
};
pub use locomotion::{CharacterLocomotion, LocomotionInput, LocomotionState};
pub use outline::{MaterialId, MaterialSlots, remove_outline, set_outline};
pub use recovery::{Blink, Recovery, Travel};
pub use ripple::{EffectEntry, PlayRegistry, Ripple, RippleEffects};
pub use timer::TimerQueue;
pub use transition::{ScreenTransition, cut_transition, fade_in_transition, fade_out_transition};
