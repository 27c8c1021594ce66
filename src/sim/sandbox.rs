//! In-memory host for tests and the headless demo
//!
//! Flat ground at `y = 0` inside a square extent, with rectangular hazard
//! pools. Nothing here is physically accurate; it only has to be consistent.

use std::collections::BTreeMap;

use glam::{Vec2, Vec3};

use super::backend::{
    AnimFlag, Animator, Bounds, CharacterBody, Color, EffectBackend, EffectHandle, SceneQuery,
    SurfaceProbe, SurfaceTag, TargetId,
};
use super::outline::{MaterialId, MaterialSlots};
use super::transition::ScreenTransition;

const GROUND_EPSILON: f32 = 1e-4;

/// A spawned effect instance
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxEffect {
    pub position: Vec3,
    pub size: f32,
    pub color: Option<Color>,
    /// Every color applied, oldest first
    pub color_history: Vec<Color>,
    pub playing: bool,
    pub play_count: u32,
    pub duration: f32,
}

/// Effect backend that keeps instances in a map
#[derive(Debug, Clone)]
pub struct SandboxEffects {
    duration: f32,
    next_id: u32,
    live: BTreeMap<EffectHandle, SandboxEffect>,
    destroy_calls: BTreeMap<EffectHandle, u32>,
}

impl SandboxEffects {
    /// Every instance gets the given playback duration
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            next_id: 1,
            live: BTreeMap::new(),
            destroy_calls: BTreeMap::new(),
        }
    }

    pub fn get(&self, handle: EffectHandle) -> Option<&SandboxEffect> {
        self.live.get(&handle)
    }

    /// Total instances ever spawned
    pub fn spawned(&self) -> u32 {
        self.next_id - 1
    }

    /// Instances still alive
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// How many times `destroy` was called for `handle`
    pub fn destroy_count(&self, handle: EffectHandle) -> u32 {
        self.destroy_calls.get(&handle).copied().unwrap_or(0)
    }
}

impl EffectBackend for SandboxEffects {
    fn spawn(&mut self, position: Vec3) -> EffectHandle {
        let handle = EffectHandle(self.next_id);
        self.next_id += 1;
        self.live.insert(
            handle,
            SandboxEffect {
                position,
                size: 1.0,
                color: None,
                color_history: Vec::new(),
                playing: false,
                play_count: 0,
                duration: self.duration,
            },
        );
        handle
    }

    fn play(&mut self, handle: EffectHandle) {
        if let Some(e) = self.live.get_mut(&handle) {
            e.playing = true;
            e.play_count += 1;
        }
    }

    fn stop(&mut self, handle: EffectHandle) {
        if let Some(e) = self.live.get_mut(&handle) {
            e.playing = false;
        }
    }

    fn destroy(&mut self, handle: EffectHandle) {
        *self.destroy_calls.entry(handle).or_insert(0) += 1;
        self.live.remove(&handle);
    }

    fn is_alive(&self, handle: EffectHandle) -> bool {
        self.live.contains_key(&handle)
    }

    fn is_playing(&self, handle: EffectHandle) -> bool {
        self.live.get(&handle).is_some_and(|e| e.playing)
    }

    fn duration(&self, handle: EffectHandle) -> f32 {
        self.live.get(&handle).map(|e| e.duration).unwrap_or(0.0)
    }

    fn set_color(&mut self, handle: EffectHandle, color: Color) {
        if let Some(e) = self.live.get_mut(&handle) {
            e.color = Some(color);
            e.color_history.push(color);
        }
    }

    fn set_size(&mut self, handle: EffectHandle, size: f32) {
        if let Some(e) = self.live.get_mut(&handle) {
            e.size = size;
        }
    }

    fn set_position(&mut self, handle: EffectHandle, position: Vec3) {
        if let Some(e) = self.live.get_mut(&handle) {
            e.position = position;
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SceneObject {
    position: Vec3,
    bounds: Option<Bounds>,
}

/// Scene of effect targets
#[derive(Debug, Clone, Default)]
pub struct SandboxScene {
    objects: BTreeMap<TargetId, SceneObject>,
}

impl SandboxScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_target(&mut self, target: TargetId, position: Vec3, bounds: Option<Bounds>) {
        self.objects.insert(target, SceneObject { position, bounds });
    }

    pub fn remove_target(&mut self, target: TargetId) {
        self.objects.remove(&target);
    }

    pub fn set_bounds(&mut self, target: TargetId, bounds: Option<Bounds>) {
        if let Some(o) = self.objects.get_mut(&target) {
            o.bounds = bounds;
        }
    }

    /// Move a target, carrying its bounds along
    pub fn set_position(&mut self, target: TargetId, position: Vec3) {
        if let Some(o) = self.objects.get_mut(&target) {
            let delta = position - o.position;
            o.position = position;
            if let Some(b) = o.bounds.as_mut() {
                b.center += delta;
            }
        }
    }
}

impl SceneQuery for SandboxScene {
    fn position(&self, target: TargetId) -> Option<Vec3> {
        self.objects.get(&target).map(|o| o.position)
    }

    fn bounds(&self, target: TargetId) -> Option<Bounds> {
        self.objects.get(&target).and_then(|o| o.bounds)
    }
}

/// Axis-aligned rectangle on the ground plane (x, z)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    pub min: Vec2,
    pub max: Vec2,
}

impl Zone {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Square of half-size `half` around `center`
    pub fn around(center: Vec2, half: f32) -> Self {
        Self {
            min: center - Vec2::splat(half),
            max: center + Vec2::splat(half),
        }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Ground plane with hazard pools
#[derive(Debug, Clone)]
pub struct SandboxTerrain {
    /// Ground exists for |x| and |z| up to this
    pub half_extent: f32,
    pub hazards: Vec<Zone>,
}

impl SandboxTerrain {
    pub fn new(half_extent: f32) -> Self {
        Self {
            half_extent,
            hazards: Vec::new(),
        }
    }

    pub fn with_hazard(mut self, zone: Zone) -> Self {
        self.hazards.push(zone);
        self
    }

    /// Surface directly under a ground-plane point
    pub fn surface_at(&self, x: f32, z: f32) -> Option<SurfaceTag> {
        if x.abs() > self.half_extent || z.abs() > self.half_extent {
            return None;
        }
        let p = Vec2::new(x, z);
        if self.hazards.iter().any(|h| h.contains(p)) {
            Some(SurfaceTag::Hazard)
        } else {
            Some(SurfaceTag::Ground)
        }
    }

    /// Surface the body is standing on, if it is on the ground
    pub fn contact(&self, body: &SandboxBody) -> Option<SurfaceTag> {
        if !body.is_grounded() {
            return None;
        }
        let p = body.position();
        self.surface_at(p.x, p.z)
    }
}

impl SurfaceProbe for SandboxTerrain {
    fn probe_down(&self, origin: Vec3) -> Option<SurfaceTag> {
        if origin.y < 0.0 {
            return None;
        }
        self.surface_at(origin.x, origin.z)
    }
}

/// Kinematic body that cannot sink below `y = 0`
#[derive(Debug, Clone)]
pub struct SandboxBody {
    position: Vec3,
    radius: f32,
    grounded: bool,
    pub heading: f32,
    pub visible: bool,
    /// Every visibility change, oldest first
    pub visibility_log: Vec<bool>,
}

impl SandboxBody {
    pub fn new(position: Vec3, radius: f32) -> Self {
        Self {
            position,
            radius,
            grounded: position.y <= GROUND_EPSILON,
            heading: 0.0,
            visible: true,
            visibility_log: Vec::new(),
        }
    }

    /// Place the body without collision
    pub fn teleport(&mut self, position: Vec3) {
        self.position = position;
        self.grounded = position.y <= GROUND_EPSILON;
    }
}

impl CharacterBody for SandboxBody {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn is_grounded(&self) -> bool {
        self.grounded
    }

    fn radius(&self) -> f32 {
        self.radius
    }

    fn move_by(&mut self, delta: Vec3) {
        self.position += delta;
        if self.position.y <= GROUND_EPSILON {
            self.position.y = 0.0;
            self.grounded = true;
        } else {
            self.grounded = false;
        }
    }

    fn set_heading(&mut self, degrees: f32) {
        self.heading = degrees;
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.visibility_log.push(visible);
    }
}

/// Animator that records parameters
#[derive(Debug, Clone, Default)]
pub struct SandboxAnimator {
    flags: BTreeMap<AnimFlag, bool>,
    layer_weights: BTreeMap<usize, f32>,
}

impl SandboxAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer_weight(&self, layer: usize) -> f32 {
        self.layer_weights.get(&layer).copied().unwrap_or(0.0)
    }
}

impl Animator for SandboxAnimator {
    fn set_flag(&mut self, flag: AnimFlag, value: bool) {
        self.flags.insert(flag, value);
    }

    fn flag(&self, flag: AnimFlag) -> bool {
        self.flags.get(&flag).copied().unwrap_or(false)
    }

    fn set_layer_weight(&mut self, layer: usize, weight: f32) {
        self.layer_weights.insert(layer, weight);
    }
}

/// A renderer with an optional mesh-backed material list
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxVisual {
    /// `None` for renderers without submeshes (sprites, lines, particles)
    pub submeshes: Option<usize>,
    pub materials: Vec<MaterialId>,
}

impl SandboxVisual {
    /// Mesh renderer with one material per submesh
    pub fn mesh(materials: Vec<MaterialId>) -> Self {
        Self {
            submeshes: Some(materials.len()),
            materials,
        }
    }

    /// Renderer without a mesh
    pub fn flat(material: MaterialId) -> Self {
        Self {
            submeshes: None,
            materials: vec![material],
        }
    }
}

impl MaterialSlots for SandboxVisual {
    fn submesh_count(&self) -> Option<usize> {
        self.submeshes
    }

    fn materials(&self) -> &[MaterialId] {
        &self.materials
    }

    fn set_materials(&mut self, materials: Vec<MaterialId>) {
        self.materials = materials;
    }
}

/// Screen transition that counts calls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SandboxTransition {
    pub fade_ins: u32,
    pub fade_outs: u32,
    pub cuts: u32,
}

impl ScreenTransition for SandboxTransition {
    fn fade_in(&mut self) {
        self.fade_ins += 1;
    }

    fn fade_out(&mut self) {
        self.fade_outs += 1;
    }

    fn fast_fade_out(&mut self) {
        self.cuts += 1;
    }
}
