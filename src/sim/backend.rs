//! Host engine seams
//!
//! The simulation never touches rendering, physics or animation directly.
//! Everything it needs from the host goes through these traits; the
//! [`sandbox`](super::sandbox) module provides in-memory implementations.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Identity of a scene object an effect can attach to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetId(pub u32);

/// Identity of a spawned effect instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EffectHandle(pub u32);

/// Packed RGBA color (0xRRGGBBAA)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub const RED: Color = Color(0xFF0000FF);
    pub const GREEN: Color = Color(0x00FF00FF);
    pub const BLUE: Color = Color(0x0000FFFF);
    pub const YELLOW: Color = Color(0xFFFF00FF);
    pub const WHITE: Color = Color(0xFFFFFFFF);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color(((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | a as u32)
    }

    /// Components as floats in [0, 1]
    pub fn to_array(self) -> [f32; 4] {
        let c = self.0;
        [
            ((c >> 24) & 0xFF) as f32 / 255.0,
            ((c >> 16) & 0xFF) as f32 / 255.0,
            ((c >> 8) & 0xFF) as f32 / 255.0,
            (c & 0xFF) as f32 / 255.0,
        ]
    }
}

/// Axis-aligned bounding volume of a collider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub center: Vec3,
    pub size: Vec3,
}

impl Bounds {
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        Self { center, size }
    }

    /// Lowest corner
    #[inline]
    pub fn min(&self) -> Vec3 {
        self.center - self.size * 0.5
    }

    /// Vertical midpoint of the volume
    #[inline]
    pub fn mid_height(&self) -> f32 {
        self.min().y + self.size.y * 0.5
    }

    /// Average of the horizontal extents
    #[inline]
    pub fn footprint(&self) -> f32 {
        (self.size.x + self.size.z) * 0.5
    }
}

/// What a downward probe landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceTag {
    /// Walkable ground
    Ground,
    /// Water or any other surface that forces a recovery
    Hazard,
}

/// Boolean animation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AnimFlag {
    Grounded,
    Jump,
    Moving,
}

/// Particle effect instances
pub trait EffectBackend {
    /// Create a stopped instance at `position`
    fn spawn(&mut self, position: Vec3) -> EffectHandle;
    fn play(&mut self, handle: EffectHandle);
    fn stop(&mut self, handle: EffectHandle);
    fn destroy(&mut self, handle: EffectHandle);
    /// False once destroyed (by us or by the host)
    fn is_alive(&self, handle: EffectHandle) -> bool;
    fn is_playing(&self, handle: EffectHandle) -> bool;
    /// Configured playback duration in seconds
    fn duration(&self, handle: EffectHandle) -> f32;
    fn set_color(&mut self, handle: EffectHandle, color: Color);
    fn set_size(&mut self, handle: EffectHandle, size: f32);
    fn set_position(&mut self, handle: EffectHandle, position: Vec3);
}

/// Scene graph lookups for effect targets
pub trait SceneQuery {
    /// World position, or `None` if the target no longer exists
    fn position(&self, target: TargetId) -> Option<Vec3>;
    /// Collider bounds, or `None` if the target has no collider
    fn bounds(&self, target: TargetId) -> Option<Bounds>;
}

/// Downward physics probe
pub trait SurfaceProbe {
    /// Cast straight down from `origin`; `None` if nothing is below
    fn probe_down(&self, origin: Vec3) -> Option<SurfaceTag>;
}

/// Kinematic character controller plus its visual
pub trait CharacterBody {
    fn position(&self) -> Vec3;
    /// Whether the last move ended touching ground
    fn is_grounded(&self) -> bool;
    fn radius(&self) -> f32;
    /// Move with collision resolution
    fn move_by(&mut self, delta: Vec3);
    /// Yaw of the visual in degrees
    fn set_heading(&mut self, degrees: f32);
    fn set_visible(&mut self, visible: bool);
}

/// Animation state machine parameters
pub trait Animator {
    fn set_flag(&mut self, flag: AnimFlag, value: bool);
    fn flag(&self, flag: AnimFlag) -> bool;
    fn set_layer_weight(&mut self, layer: usize, weight: f32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_geometry() {
        let b = Bounds::from_center_size(Vec3::new(1.0, 2.0, 3.0), Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(b.min(), Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(b.mid_height(), 2.0);
        assert_eq!(b.footprint(), 4.0);
    }

    #[test]
    fn test_color_packing() {
        assert_eq!(Color::rgba(255, 0, 0, 255), Color::RED);
        assert_eq!(Color::BLUE.to_array(), [0.0, 0.0, 1.0, 1.0]);
    }
}
