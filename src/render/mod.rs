mod camera;
pub mod pick;

pub use camera::{CameraController, Viewport};
pub use pick::{raycast_mesh, PickHit, Ray};

use crate::decals::DecalGeometry;
use crate::scene::DecalId;
use glam::{Mat3, Mat4, Vec3};
use std::collections::BTreeMap;

/// Indexed triangle mesh in its own local space, placed in the world by
/// `transform`.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub transform: Mat4,
}

impl Mesh {
    pub fn new(positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices,
            transform: Mat4::IDENTITY,
        }
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Grid in the XY plane centred on the origin, front face towards +Z.
    pub fn plane(width: f32, height: f32, segments: u32) -> Self {
        let segments = segments.max(1);
        let row = segments + 1;
        let mut positions = Vec::with_capacity((row * row) as usize);
        for j in 0..row {
            for i in 0..row {
                positions.push([
                    -width * 0.5 + width * i as f32 / segments as f32,
                    -height * 0.5 + height * j as f32 / segments as f32,
                    0.0,
                ]);
            }
        }
        let mut indices = Vec::with_capacity((segments * segments * 6) as usize);
        for j in 0..segments {
            for i in 0..segments {
                let a = j * row + i;
                let b = a + 1;
                let c = a + row + 1;
                let d = a + row;
                indices.extend_from_slice(&[a, b, c, a, c, d]);
            }
        }
        Self::new(positions, indices)
    }

    /// Open cylinder around the Y axis with outward-facing triangles; the
    /// seam sits at +Z.
    pub fn cylinder(radius: f32, height: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let mut positions = Vec::with_capacity((segments * 2) as usize);
        for k in 0..segments {
            let theta = std::f32::consts::TAU * k as f32 / segments as f32;
            let (sin, cos) = theta.sin_cos();
            positions.push([radius * sin, -height * 0.5, radius * cos]);
            positions.push([radius * sin, height * 0.5, radius * cos]);
        }
        let mut indices = Vec::with_capacity((segments * 6) as usize);
        for k in 0..segments {
            let next = (k + 1) % segments;
            let a = k * 2;
            let d = k * 2 + 1;
            let b = next * 2;
            let c = next * 2 + 1;
            indices.extend_from_slice(&[a, b, c, a, c, d]);
        }
        Self::new(positions, indices)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Local-space corners of triangle `index`; `None` for a dangling index.
    pub fn triangle(&self, index: usize) -> Option<[Vec3; 3]> {
        let corners = self.indices.get(index * 3..index * 3 + 3)?;
        let mut out = [Vec3::ZERO; 3];
        for (slot, corner) in out.iter_mut().zip(corners) {
            *slot = Vec3::from(*self.positions.get(*corner as usize)?);
        }
        Some(out)
    }

    /// Inverse transpose of the upper 3x3, for carrying normals to world space.
    pub fn normal_matrix(&self) -> Mat3 {
        Mat3::from_mat4(self.transform).inverse().transpose()
    }
}

/// A decal ready to hang under the body: projected geometry in the body's
/// local space plus its material parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DecalMesh {
    pub geometry: DecalGeometry,
    pub texture_key: String,
    pub opacity: f32,
}

/// What the decal engine needs from the renderer.
pub trait SceneGraph {
    /// The only mesh decal clicks are tested against.
    fn body_mesh(&self) -> Option<&Mesh>;
    /// Parents `mesh` to the body so it moves rigidly with the vehicle.
    fn attach_decal(&mut self, id: DecalId, mesh: &DecalMesh);
    /// Frees whatever the renderer built for `id`; returns whether anything
    /// was attached.
    fn detach_decal(&mut self, id: DecalId) -> bool;
    /// Material-only change; geometry stays as built.
    fn update_decal_material(&mut self, id: DecalId, texture_key: &str, opacity: f32);
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttachedDecal {
    pub vertex_count: usize,
    pub texture_key: String,
    pub opacity: f32,
}

/// In-memory scene graph for the headless binary and tests. Counts
/// attach/detach calls so resource disposal can be observed.
#[derive(Debug, Clone)]
pub struct HeadlessScene {
    body: Option<Mesh>,
    attached: BTreeMap<DecalId, AttachedDecal>,
    attach_calls: usize,
    detach_calls: usize,
}

impl HeadlessScene {
    pub fn new(body: Option<Mesh>) -> Self {
        Self {
            body,
            attached: BTreeMap::new(),
            attach_calls: 0,
            detach_calls: 0,
        }
    }

    pub fn set_body(&mut self, body: Mesh) {
        self.body = Some(body);
    }

    pub fn attached(&self) -> &BTreeMap<DecalId, AttachedDecal> {
        &self.attached
    }

    pub fn attach_calls(&self) -> usize {
        self.attach_calls
    }

    pub fn detach_calls(&self) -> usize {
        self.detach_calls
    }
}

impl SceneGraph for HeadlessScene {
    fn body_mesh(&self) -> Option<&Mesh> {
        self.body.as_ref()
    }

    fn attach_decal(&mut self, id: DecalId, mesh: &DecalMesh) {
        self.attach_calls += 1;
        let previous = self.attached.insert(
            id,
            AttachedDecal {
                vertex_count: mesh.geometry.vertex_count(),
                texture_key: mesh.texture_key.clone(),
                opacity: mesh.opacity,
            },
        );
        if previous.is_some() {
            log::warn!("{} attached twice without a detach", id);
        }
    }

    fn detach_decal(&mut self, id: DecalId) -> bool {
        let removed = self.attached.remove(&id).is_some();
        if removed {
            self.detach_calls += 1;
        }
        removed
    }

    fn update_decal_material(&mut self, id: DecalId, texture_key: &str, opacity: f32) {
        if let Some(entry) = self.attached.get_mut(&id) {
            entry.texture_key = texture_key.to_string();
            entry.opacity = opacity;
        }
    }
}
