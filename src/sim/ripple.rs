//! Ripple effect registry
//!
//! One particle instance per target, tinted by a round-robin color queue.
//! [`PlayRegistry`] is the shared target→effect/colors state and is owned by
//! the caller; [`RippleEffects`] runs the operations and the global color
//! rotation against it.

use std::collections::BTreeMap;

use glam::Vec3;

use super::backend::{Color, EffectBackend, EffectHandle, SceneQuery, TargetId};
use super::timer::TimerQueue;
use crate::consts::TIME_EPSILON;
use crate::settings::{EffectSettings, ResizeParams};

/// Per-target effect state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectEntry {
    /// Active instance, cleared when the effect is stopped
    pub handle: Option<EffectHandle>,
    /// Colors in rotation order, no duplicates
    pub colors: Vec<Color>,
}

impl EffectEntry {
    /// Append `color` unless already queued. Returns true if added.
    pub fn push_color(&mut self, color: Color) -> bool {
        if self.colors.contains(&color) {
            return false;
        }
        self.colors.push(color);
        true
    }

    /// Remove `color` if queued. Returns true if removed.
    pub fn remove_color(&mut self, color: Color) -> bool {
        match self.colors.iter().position(|&c| c == color) {
            Some(i) => {
                self.colors.remove(i);
                true
            }
            None => false,
        }
    }

    /// Move the front color to the back and return it
    pub fn rotate(&mut self) -> Option<Color> {
        let front = *self.colors.first()?;
        self.colors.rotate_left(1);
        Some(front)
    }
}

/// Shared target→effect and target→colors state
#[derive(Debug, Clone, Default)]
pub struct PlayRegistry {
    entries: BTreeMap<TargetId, EffectEntry>,
}

impl PlayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `handle` to `target`, creating the entry if needed
    pub fn register(&mut self, target: TargetId, handle: EffectHandle) {
        self.entries.entry(target).or_default().handle = Some(handle);
    }

    /// Detach the active instance; colors and the entry itself are kept
    pub fn unregister(&mut self, target: TargetId) -> Option<EffectHandle> {
        self.entries.get_mut(&target).and_then(|e| e.handle.take())
    }

    /// Forget the target entirely
    pub fn purge(&mut self, target: TargetId) -> Option<EffectEntry> {
        self.entries.remove(&target)
    }

    pub fn contains(&self, target: TargetId) -> bool {
        self.entries.contains_key(&target)
    }

    /// Active instance for `target`
    pub fn handle(&self, target: TargetId) -> Option<EffectHandle> {
        self.entries.get(&target).and_then(|e| e.handle)
    }

    /// Queued colors for `target` (empty if unknown)
    pub fn colors(&self, target: TargetId) -> &[Color] {
        self.entries
            .get(&target)
            .map(|e| e.colors.as_slice())
            .unwrap_or(&[])
    }

    pub fn entry(&self, target: TargetId) -> Option<&EffectEntry> {
        self.entries.get(&target)
    }

    fn entry_mut(&mut self, target: TargetId) -> &mut EffectEntry {
        self.entries.entry(target).or_default()
    }

    /// Targets with an active instance, in id order
    pub fn targets(&self) -> impl Iterator<Item = TargetId> + '_ {
        self.entries
            .iter()
            .filter(|(_, e)| e.handle.is_some())
            .map(|(&t, _)| t)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A request to start (or feed a color to) a ripple on a target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ripple {
    pub target: TargetId,
    pub color: Color,
    /// Scale of the target; only used for primary targets
    pub scale_hint: Vec3,
    pub offset: Vec3,
    /// The player character: sized from `scale_hint`, never restarted while playing
    pub primary: bool,
}

impl Ripple {
    /// Ripple on a scene object, sized from its collider
    pub fn object(target: TargetId, color: Color) -> Self {
        Self {
            target,
            color,
            scale_hint: Vec3::ONE,
            offset: Vec3::ZERO,
            primary: false,
        }
    }

    /// Ripple on the player, sized from its scale
    pub fn primary(target: TargetId, color: Color, scale_hint: Vec3) -> Self {
        Self {
            target,
            color,
            scale_hint,
            offset: Vec3::ZERO,
            primary: true,
        }
    }

    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }
}

/// Ripple lifecycle and color rotation
#[derive(Debug)]
pub struct RippleEffects {
    settings: EffectSettings,
    switch_timer: f32,
    pending_destroy: TimerQueue<EffectHandle>,
}

impl Default for RippleEffects {
    fn default() -> Self {
        Self::new(EffectSettings::default())
    }
}

impl RippleEffects {
    pub fn new(settings: EffectSettings) -> Self {
        Self {
            settings,
            switch_timer: 0.0,
            pending_destroy: TimerQueue::new(),
        }
    }

    pub fn settings(&self) -> &EffectSettings {
        &self.settings
    }

    /// Instances stopped but not yet destroyed
    pub fn pending_destroy_count(&self) -> usize {
        self.pending_destroy.len()
    }

    /// Start a ripple on the target (or add a color to its running one).
    ///
    /// Returns the active handle, or `None` if the target is not in the scene.
    pub fn trigger(
        &mut self,
        registry: &mut PlayRegistry,
        effects: &mut impl EffectBackend,
        scene: &impl SceneQuery,
        ripple: Ripple,
    ) -> Option<EffectHandle> {
        let target = ripple.target;

        let existing = registry.handle(target).filter(|&h| {
            let alive = effects.is_alive(h);
            if !alive {
                log::warn!("Ripple for target {:?} was destroyed externally, respawning", target);
            }
            alive
        });

        let handle = match existing {
            Some(h) => h,
            None => {
                let mut position = scene.position(target)?;
                if ripple.primary {
                    if let Some(bounds) = scene.bounds(target) {
                        position = bounds.center + ripple.offset;
                    }
                }
                let h = effects.spawn(position);
                registry.register(target, h);
                log::debug!("Spawned ripple {:?} for target {:?} at {}", h, target, position);
                h
            }
        };

        registry.entry_mut(target).push_color(ripple.color);

        if ripple.primary {
            let scale = ripple.scale_hint;
            let size = scale.x.max(scale.y).max(scale.z) * self.settings.primary_size_factor;
            effects.set_size(handle, size);
        } else {
            let params = ResizeParams {
                offset: ripple.offset,
                ..self.settings.resize
            };
            self.resize(registry, effects, scene, target, params);
        }

        if !ripple.primary || !effects.is_playing(handle) {
            effects.play(handle);
        }

        Some(handle)
    }

    /// Size and place the target's ripple from its collider footprint
    pub fn resize(
        &self,
        registry: &PlayRegistry,
        effects: &mut impl EffectBackend,
        scene: &impl SceneQuery,
        target: TargetId,
        params: ResizeParams,
    ) {
        let Some(handle) = registry.handle(target) else {
            return;
        };
        let Some(bounds) = scene.bounds(target) else {
            return;
        };

        let params = params.clamped();
        let size = (bounds.footprint() * params.multiplier).clamp(params.min_size, params.max_size);
        let position = Vec3::new(bounds.center.x, bounds.mid_height(), bounds.center.z) + params.offset;

        log::debug!(
            "Resized ripple for target {:?}: size {}, mid-height {}",
            target,
            size,
            bounds.mid_height()
        );

        effects.set_size(handle, size);
        effects.set_position(handle, position);
    }

    /// Move the target's ripple
    pub fn reposition(
        &self,
        registry: &PlayRegistry,
        effects: &mut impl EffectBackend,
        target: TargetId,
        position: Vec3,
    ) {
        if let Some(handle) = registry.handle(target) {
            effects.set_position(handle, position);
        }
    }

    /// Drop one color from the target's rotation
    pub fn remove_color(&self, registry: &mut PlayRegistry, target: TargetId, color: Color) -> bool {
        if !registry.contains(target) {
            return false;
        }
        registry.entry_mut(target).remove_color(color)
    }

    /// Stop the target's ripple and destroy the instance after half its duration
    pub fn stop(
        &mut self,
        registry: &mut PlayRegistry,
        effects: &mut impl EffectBackend,
        target: TargetId,
    ) -> bool {
        let Some(handle) = registry.handle(target) else {
            return false;
        };
        if !effects.is_playing(handle) {
            return false;
        }

        effects.stop(handle);
        registry.unregister(target);
        // A later trigger starts a fresh rotation
        registry.entry_mut(target).colors.clear();
        let delay = effects.duration(handle) / 2.0;
        self.pending_destroy.schedule(delay, handle);
        log::debug!("Stopped ripple {:?} for target {:?}, destroying in {}s", handle, target, delay);
        true
    }

    /// Advance deferred destruction and the shared color rotation.
    ///
    /// Does nothing at all while `registry` is not available.
    pub fn tick(&mut self, dt: f32, registry: Option<&mut PlayRegistry>, effects: &mut impl EffectBackend) {
        let Some(registry) = registry else {
            return;
        };

        for handle in self.pending_destroy.advance(dt) {
            if effects.is_alive(handle) {
                effects.destroy(handle);
                log::debug!("Destroyed ripple {:?}", handle);
            }
        }

        self.switch_timer += dt;
        if self.switch_timer + TIME_EPSILON < self.settings.color_switch_interval {
            return;
        }
        self.switch_timer = 0.0;

        for entry in registry.entries.values_mut() {
            let Some(handle) = entry.handle else {
                continue;
            };
            if let Some(color) = entry.rotate() {
                effects.set_color(handle, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::backend::Bounds;
    use crate::sim::sandbox::{SandboxEffects, SandboxScene};
    use proptest::prelude::*;

    const T: TargetId = TargetId(1);

    fn setup() -> (RippleEffects, PlayRegistry, SandboxEffects, SandboxScene) {
        let mut scene = SandboxScene::new();
        scene.add_target(
            T,
            Vec3::new(0.0, 0.0, 0.0),
            Some(Bounds::from_center_size(Vec3::new(0.0, 1.0, 0.0), Vec3::new(2.0, 2.0, 4.0))),
        );
        (
            RippleEffects::default(),
            PlayRegistry::new(),
            SandboxEffects::new(2.0),
            scene,
        )
    }

    #[test]
    fn test_trigger_creates_entry_and_plays() {
        let (mut fx, mut reg, mut backend, scene) = setup();
        let handle = fx
            .trigger(&mut reg, &mut backend, &scene, Ripple::object(T, Color::RED))
            .unwrap();

        assert_eq!(reg.handle(T), Some(handle));
        assert_eq!(reg.colors(T), &[Color::RED]);
        let effect = backend.get(handle).unwrap();
        assert!(effect.playing);
        // Footprint (2 + 4) / 2 * 3 = 9
        assert!((effect.size - 9.0).abs() < 1e-5);
        assert_eq!(effect.position, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_duplicate_color_is_suppressed() {
        let (mut fx, mut reg, mut backend, scene) = setup();
        fx.trigger(&mut reg, &mut backend, &scene, Ripple::object(T, Color::RED));
        fx.trigger(&mut reg, &mut backend, &scene, Ripple::object(T, Color::RED));
        assert_eq!(reg.colors(T), &[Color::RED]);
        assert_eq!(backend.spawned(), 1);
    }

    #[test]
    fn test_unknown_target_is_noop() {
        let (mut fx, mut reg, mut backend, scene) = setup();
        let result = fx.trigger(&mut reg, &mut backend, &scene, Ripple::object(TargetId(99), Color::RED));
        assert!(result.is_none());
        assert!(reg.is_empty());
        assert_eq!(backend.spawned(), 0);
    }

    #[test]
    fn test_primary_sizing_and_placement() {
        let (mut fx, mut reg, mut backend, scene) = setup();
        let ripple = Ripple::primary(T, Color::BLUE, Vec3::new(0.5, 2.0, 1.0)).with_offset(Vec3::Y);
        let handle = fx.trigger(&mut reg, &mut backend, &scene, ripple).unwrap();

        let effect = backend.get(handle).unwrap();
        assert!((effect.size - 14.0).abs() < 1e-5);
        // Collider center + offset
        assert_eq!(effect.position, Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_primary_never_restarts_non_primary_always_does() {
        let (mut fx, mut reg, mut backend, mut scene) = setup();
        let other = TargetId(2);
        scene.add_target(other, Vec3::new(5.0, 0.0, 0.0), None);

        let p = fx
            .trigger(&mut reg, &mut backend, &scene, Ripple::primary(T, Color::RED, Vec3::ONE))
            .unwrap();
        fx.trigger(&mut reg, &mut backend, &scene, Ripple::primary(T, Color::BLUE, Vec3::ONE));
        assert_eq!(backend.get(p).unwrap().play_count, 1);

        let o = fx
            .trigger(&mut reg, &mut backend, &scene, Ripple::object(other, Color::RED))
            .unwrap();
        fx.trigger(&mut reg, &mut backend, &scene, Ripple::object(other, Color::BLUE));
        assert_eq!(backend.get(o).unwrap().play_count, 2);
    }

    #[test]
    fn test_resize_without_bounds_is_skipped() {
        let (mut fx, mut reg, mut backend, mut scene) = setup();
        let other = TargetId(2);
        scene.add_target(other, Vec3::new(5.0, 0.0, 0.0), None);
        let h = fx
            .trigger(&mut reg, &mut backend, &scene, Ripple::object(other, Color::RED))
            .unwrap();
        let effect = backend.get(h).unwrap();
        assert_eq!(effect.position, Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(effect.size, 1.0);
    }

    #[test]
    fn test_resize_clamps() {
        let (mut fx, mut reg, mut backend, mut scene) = setup();
        let h = fx
            .trigger(&mut reg, &mut backend, &scene, Ripple::object(T, Color::RED))
            .unwrap();

        scene.set_bounds(T, Some(Bounds::from_center_size(Vec3::ZERO, Vec3::splat(100.0))));
        fx.resize(&reg, &mut backend, &scene, T, ResizeParams::default());
        assert_eq!(backend.get(h).unwrap().size, 15.0);

        scene.set_bounds(T, Some(Bounds::from_center_size(Vec3::ZERO, Vec3::splat(0.001))));
        fx.resize(&reg, &mut backend, &scene, T, ResizeParams::with_offset(Vec3::X));
        let effect = backend.get(h).unwrap();
        assert_eq!(effect.size, 0.1);
        assert_eq!(effect.position, Vec3::X);

        let inverted = ResizeParams {
            min_size: 4.0,
            max_size: 2.0,
            ..ResizeParams::default()
        };
        fx.resize(&reg, &mut backend, &scene, T, inverted);
        assert_eq!(backend.get(h).unwrap().size, 4.0);
    }

    #[test]
    fn test_reposition() {
        let (mut fx, mut reg, mut backend, scene) = setup();
        fx.reposition(&reg, &mut backend, T, Vec3::ONE);
        assert_eq!(backend.spawned(), 0);

        let h = fx
            .trigger(&mut reg, &mut backend, &scene, Ripple::object(T, Color::RED))
            .unwrap();
        fx.reposition(&reg, &mut backend, T, Vec3::new(3.0, 4.0, 5.0));
        assert_eq!(backend.get(h).unwrap().position, Vec3::new(3.0, 4.0, 5.0));
    }

    #[test]
    fn test_removing_last_color_keeps_entry() {
        let (mut fx, mut reg, mut backend, scene) = setup();
        fx.trigger(&mut reg, &mut backend, &scene, Ripple::object(T, Color::RED));
        assert!(fx.remove_color(&mut reg, T, Color::RED));
        assert!(!fx.remove_color(&mut reg, T, Color::RED));
        assert!(reg.contains(T));
        assert!(reg.handle(T).is_some());
        assert!(reg.colors(T).is_empty());
        assert!(!fx.remove_color(&mut reg, TargetId(42), Color::RED));
    }

    #[test]
    fn test_stop_defers_destruction() {
        let (mut fx, mut reg, mut backend, scene) = setup();
        let h = fx
            .trigger(&mut reg, &mut backend, &scene, Ripple::object(T, Color::RED))
            .unwrap();

        assert!(fx.stop(&mut reg, &mut backend, T));
        assert!(!backend.get(h).unwrap().playing);
        assert_eq!(reg.handle(T), None);
        assert!(reg.contains(T));
        // Second stop has nothing to stop
        assert!(!fx.stop(&mut reg, &mut backend, T));

        // Duration 2.0 -> destroyed after 1.0
        fx.tick(0.5, Some(&mut reg), &mut backend);
        assert!(backend.is_alive(h));
        fx.tick(0.5, Some(&mut reg), &mut backend);
        assert!(!backend.is_alive(h));
        assert_eq!(fx.pending_destroy_count(), 0);
    }

    #[test]
    fn test_deferred_destroy_tolerates_missing_instance() {
        let (mut fx, mut reg, mut backend, scene) = setup();
        let h = fx
            .trigger(&mut reg, &mut backend, &scene, Ripple::object(T, Color::RED))
            .unwrap();
        fx.stop(&mut reg, &mut backend, T);
        backend.destroy(h);
        fx.tick(1.0, Some(&mut reg), &mut backend);
        assert_eq!(backend.destroy_count(h), 1);
    }

    #[test]
    fn test_retrigger_after_stop_spawns_new_instance() {
        let (mut fx, mut reg, mut backend, scene) = setup();
        let first = fx
            .trigger(&mut reg, &mut backend, &scene, Ripple::object(T, Color::RED))
            .unwrap();
        fx.stop(&mut reg, &mut backend, T);
        let second = fx
            .trigger(&mut reg, &mut backend, &scene, Ripple::object(T, Color::BLUE))
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(reg.colors(T), &[Color::BLUE]);
    }

    #[test]
    fn test_tick_without_registry_is_suppressed() {
        let (mut fx, mut reg, mut backend, scene) = setup();
        let h = fx
            .trigger(&mut reg, &mut backend, &scene, Ripple::object(T, Color::RED))
            .unwrap();
        fx.stop(&mut reg, &mut backend, T);
        fx.tick(10.0, None, &mut backend);
        assert!(backend.is_alive(h));
        assert_eq!(fx.pending_destroy_count(), 1);
    }

    #[test]
    fn test_color_rotation_scenario() {
        let (mut fx, mut reg, mut backend, scene) = setup();
        let h = fx
            .trigger(&mut reg, &mut backend, &scene, Ripple::object(T, Color::RED))
            .unwrap();
        fx.trigger(&mut reg, &mut backend, &scene, Ripple::object(T, Color::BLUE));

        for _ in 0..3 {
            fx.tick(0.5, Some(&mut reg), &mut backend);
        }
        assert_eq!(
            backend.get(h).unwrap().color_history,
            vec![Color::RED, Color::BLUE, Color::RED]
        );
    }

    #[test]
    fn test_rotation_waits_for_interval_and_is_lockstep() {
        let (mut fx, mut reg, mut backend, mut scene) = setup();
        let other = TargetId(2);
        scene.add_target(other, Vec3::ZERO, None);

        let a = fx
            .trigger(&mut reg, &mut backend, &scene, Ripple::object(T, Color::RED))
            .unwrap();
        let b = fx
            .trigger(&mut reg, &mut backend, &scene, Ripple::object(other, Color::GREEN))
            .unwrap();

        fx.tick(0.3, Some(&mut reg), &mut backend);
        assert!(backend.get(a).unwrap().color_history.is_empty());
        fx.tick(0.3, Some(&mut reg), &mut backend);
        assert_eq!(backend.get(a).unwrap().color_history.len(), 1);
        assert_eq!(backend.get(b).unwrap().color_history.len(), 1);
    }

    #[test]
    fn test_stopped_target_is_not_rotated() {
        let (mut fx, mut reg, mut backend, scene) = setup();
        let h = fx
            .trigger(&mut reg, &mut backend, &scene, Ripple::object(T, Color::RED))
            .unwrap();
        fx.trigger(&mut reg, &mut backend, &scene, Ripple::object(T, Color::BLUE));
        fx.stop(&mut reg, &mut backend, T);
        fx.tick(0.5, Some(&mut reg), &mut backend);
        assert!(backend.get(h).unwrap().color_history.is_empty());
        assert!(reg.colors(T).is_empty());
        assert_eq!(reg.targets().count(), 0);
    }

    #[test]
    fn test_stopped_entry_holds_no_colors_once_destroyed() {
        let (mut fx, mut reg, mut backend, scene) = setup();
        fx.trigger(&mut reg, &mut backend, &scene, Ripple::object(T, Color::RED));
        fx.stop(&mut reg, &mut backend, T);
        fx.tick(2.0, Some(&mut reg), &mut backend);

        assert_eq!(fx.pending_destroy_count(), 0);
        assert_eq!(reg.entry(T), Some(&EffectEntry::default()));
    }

    #[test]
    fn test_targets_lists_active_entries_in_id_order() {
        let (mut fx, mut reg, mut backend, mut scene) = setup();
        let other = TargetId(0);
        scene.add_target(other, Vec3::ZERO, None);
        fx.trigger(&mut reg, &mut backend, &scene, Ripple::object(T, Color::RED));
        fx.trigger(&mut reg, &mut backend, &scene, Ripple::object(other, Color::GREEN));
        assert_eq!(reg.targets().collect::<Vec<_>>(), vec![other, T]);

        fx.stop(&mut reg, &mut backend, other);
        assert_eq!(reg.targets().collect::<Vec<_>>(), vec![T]);
        assert_eq!(reg.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_queue_membership_is_a_set(colors in prop::collection::vec(0u32..8, 0..32)) {
            let mut entry = EffectEntry::default();
            for &c in &colors {
                entry.push_color(Color(c));
            }
            let mut seen = entry.colors.clone();
            seen.sort();
            seen.dedup();
            prop_assert_eq!(seen.len(), entry.colors.len());
            for &c in &colors {
                prop_assert!(entry.colors.contains(&Color(c)));
            }
        }

        #[test]
        fn prop_remove_then_absent(colors in prop::collection::vec(0u32..8, 1..16), pick in 0usize..16) {
            let mut entry = EffectEntry::default();
            for &c in &colors {
                entry.push_color(Color(c));
            }
            let victim = Color(colors[pick % colors.len()]);
            entry.remove_color(victim);
            prop_assert!(!entry.colors.contains(&victim));
        }

        #[test]
        fn prop_rotation_period_is_queue_length(count in 1u32..12) {
            let mut entry = EffectEntry::default();
            for c in 0..count {
                entry.push_color(Color(c));
            }
            let original = entry.colors.clone();
            for _ in 0..count {
                entry.rotate();
            }
            prop_assert_eq!(entry.colors, original);
        }
    }
}
