//! Hazard recovery sequences
//!
//! Two independently progressing timed sequences: a travel back to the last
//! stable position and a visibility blink. Both advance once per tick.

use glam::Vec3;

use super::backend::CharacterBody;
use crate::consts::TIME_EPSILON;
use crate::settings::LocomotionSettings;

/// Constant-speed horizontal travel toward a (possibly moving) destination
#[derive(Debug, Clone, PartialEq)]
pub struct Travel {
    elapsed: f32,
    window: f32,
    speed: f32,
    done: bool,
}

impl Travel {
    /// Speed is fixed so the initial horizontal gap closes in `window` seconds
    pub fn new(from: Vec3, to: Vec3, window: f32) -> Self {
        let gap = horizontal(to - from).length();
        let done = window <= TIME_EPSILON;
        Self {
            elapsed: 0.0,
            window,
            speed: if done { 0.0 } else { gap / window },
            done,
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn step(&mut self, dt: f32, body: &mut impl CharacterBody, destination: Vec3) {
        if self.done {
            return;
        }
        self.elapsed += dt;

        let offset = horizontal(destination - body.position());
        let step = (offset.normalize_or_zero() * self.speed * dt).clamp_length_max(offset.length());
        body.move_by(step);

        if self.elapsed + TIME_EPSILON >= self.window {
            self.done = true;
        }
    }
}

/// Hide/show cycles; starts hidden and always ends visible
#[derive(Debug, Clone, PartialEq)]
pub struct Blink {
    interval: f32,
    timer: f32,
    phase: u32,
    phases: u32,
}

impl Blink {
    /// Hide the body and start `cycles` hide/show cycles of `interval` each
    pub fn start(cycles: u32, interval: f32, body: &mut impl CharacterBody) -> Self {
        body.set_visible(false);
        let blink = Self {
            interval,
            timer: 0.0,
            phase: 0,
            phases: cycles.saturating_mul(2),
        };
        if blink.is_done() {
            body.set_visible(true);
        }
        blink
    }

    pub fn is_done(&self) -> bool {
        self.phase >= self.phases
    }

    pub fn step(&mut self, dt: f32, body: &mut impl CharacterBody) {
        if self.is_done() {
            return;
        }
        self.timer += dt;
        while !self.is_done() && self.timer + TIME_EPSILON >= self.interval {
            self.timer -= self.interval;
            self.phase += 1;
            if !self.is_done() {
                // Odd phases are the visible half of a cycle
                body.set_visible(self.phase % 2 == 1);
            }
        }
    }
}

/// Both sequences of one recovery
#[derive(Debug, Clone, PartialEq)]
pub struct Recovery {
    pub travel: Travel,
    pub blink: Blink,
}

impl Recovery {
    pub fn start(settings: &LocomotionSettings, body: &mut impl CharacterBody, destination: Vec3) -> Self {
        Self {
            travel: Travel::new(body.position(), destination, settings.recovery_window),
            blink: Blink::start(settings.blink_cycles, settings.blink_interval, body),
        }
    }

    /// Advance both sequences. Returns true once both have finished.
    pub fn step(&mut self, dt: f32, body: &mut impl CharacterBody, destination: Vec3) -> bool {
        self.travel.step(dt, body, destination);
        self.blink.step(dt, body);
        self.is_done()
    }

    pub fn is_done(&self) -> bool {
        self.travel.is_done() && self.blink.is_done()
    }
}

#[inline]
fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::sandbox::SandboxBody;

    #[test]
    fn test_travel_closes_gap_in_window() {
        let mut body = SandboxBody::new(Vec3::new(3.0, 0.0, 4.0), 0.5);
        let destination = Vec3::new(0.0, 1.0, 0.0);
        let mut travel = Travel::new(body.position(), destination, 1.0);
        assert!((travel.speed() - 5.0).abs() < 1e-5);

        for _ in 0..10 {
            assert!(!travel.is_done());
            travel.step(0.1, &mut body, destination);
        }
        assert!(travel.is_done());
        let p = body.position();
        assert!(p.x.abs() < 1e-3 && p.z.abs() < 1e-3);
        // Height is left to gravity
        assert_eq!(p.y, 0.0);
    }

    #[test]
    fn test_blink_sequence() {
        let mut body = SandboxBody::new(Vec3::ZERO, 0.5);
        let mut blink = Blink::start(5, 0.1, &mut body);
        for _ in 0..9 {
            blink.step(0.1, &mut body);
            assert!(!blink.is_done());
        }
        blink.step(0.1, &mut body);
        assert!(blink.is_done());
        assert_eq!(
            body.visibility_log,
            vec![false, true, false, true, false, true, false, true, false, true]
        );
        assert!(body.visible);
    }

    #[test]
    fn test_blink_handles_large_steps() {
        let mut body = SandboxBody::new(Vec3::ZERO, 0.5);
        let mut blink = Blink::start(5, 0.1, &mut body);
        blink.step(5.0, &mut body);
        assert!(blink.is_done());
        assert!(body.visible);
    }

    #[test]
    fn test_blink_with_huge_cycle_count() {
        let mut body = SandboxBody::new(Vec3::ZERO, 0.5);
        let mut blink = Blink::start(u32::MAX, 0.1, &mut body);
        assert!(!body.visible);
        blink.step(0.1, &mut body);
        assert!(body.visible);
        assert!(!blink.is_done());
    }

    #[test]
    fn test_recovery_needs_both_sequences() {
        let settings = LocomotionSettings {
            recovery_window: 2.0,
            ..Default::default()
        };
        let mut body = SandboxBody::new(Vec3::new(1.0, 0.0, 0.0), 0.5);
        let mut recovery = Recovery::start(&settings, &mut body, Vec3::ZERO);
        for _ in 0..10 {
            recovery.step(0.1, &mut body, Vec3::ZERO);
        }
        assert!(recovery.blink.is_done());
        assert!(!recovery.is_done());
        for _ in 0..10 {
            recovery.step(0.1, &mut body, Vec3::ZERO);
        }
        assert!(recovery.is_done());
    }
}
