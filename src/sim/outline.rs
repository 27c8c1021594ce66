//! Outline highlight via an extra material slot
//!
//! Mesh-backed renderers draw one material per submesh; any material past the
//! last submesh is drawn over the whole mesh, which is how the outline shader
//! gets applied. Renderers without submeshes are left untouched.

use serde::{Deserialize, Serialize};

/// Identity of a material asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialId(pub u32);

/// Renderer capability: an editable material list
pub trait MaterialSlots {
    /// Submeshes of the backing mesh, `None` if the renderer has no mesh
    fn submesh_count(&self) -> Option<usize>;
    fn materials(&self) -> &[MaterialId];
    fn set_materials(&mut self, materials: Vec<MaterialId>);
}

/// Append `outline` to every mesh-backed renderer. Returns how many changed.
pub fn set_outline<V: MaterialSlots>(visuals: &mut [V], outline: MaterialId) -> usize {
    let mut changed = 0;
    for visual in visuals.iter_mut() {
        if visual.submesh_count().is_none() {
            continue;
        }
        if visual.materials().last() == Some(&outline) {
            continue;
        }
        let mut materials = visual.materials().to_vec();
        materials.push(outline);
        visual.set_materials(materials);
        changed += 1;
    }
    log::debug!("Outline applied to {} of {} renderers", changed, visuals.len());
    changed
}

/// Trim every mesh-backed renderer back to one material per submesh
pub fn remove_outline<V: MaterialSlots>(visuals: &mut [V]) -> usize {
    let mut changed = 0;
    for visual in visuals.iter_mut() {
        let Some(submeshes) = visual.submesh_count() else {
            continue;
        };
        if visual.materials().len() <= submeshes {
            continue;
        }
        let materials = visual.materials()[..submeshes].to_vec();
        visual.set_materials(materials);
        changed += 1;
    }
    changed
}
