//! Surface-conforming decal geometry.
//!
//! The target mesh's own triangles are moved into projector space (origin at
//! the decal position, +Z along the decal's forward axis), clipped against
//! the box `[-size/2, size/2]` and re-expressed in the mesh's local space so
//! the result can hang under the mesh. UVs come straight from the projector
//! space x/y, so the texture wraps with the surface instead of floating on a
//! flat quad.

use crate::render::Mesh;
use glam::{Mat4, Quat, Vec3};

/// Non-indexed triangle soup in the target mesh's local space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecalGeometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
}

impl DecalGeometry {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectOptions {
    /// Skip triangles facing away from the projector.
    pub reject_backfaces: bool,
}

impl Default for ProjectOptions {
    fn default() -> Self {
        Self {
            reject_backfaces: true,
        }
    }
}

/// Projects a decal box onto `target`. `position` and `orientation` are in
/// world space; `size` is the full box extent along the decal's own axes.
pub fn project(
    target: &Mesh,
    position: Vec3,
    orientation: Quat,
    size: Vec3,
    options: ProjectOptions,
) -> DecalGeometry {
    let mut geometry = DecalGeometry::default();
    if !(size.x > 0.0 && size.y > 0.0 && size.z > 0.0) {
        return geometry;
    }
    let projector = Mat4::from_rotation_translation(orientation, position);
    let world_to_projector = projector.inverse();
    let mesh_to_projector = world_to_projector * target.transform;
    let projector_to_mesh = target.transform.inverse() * projector;
    let forward = orientation * Vec3::Z;
    let normal_matrix = target.normal_matrix();
    let half = size * 0.5;

    for index in 0..target.triangle_count() {
        let Some([a, b, c]) = target.triangle(index) else {
            continue;
        };
        let local_normal = (b - a).cross(c - a).normalize_or_zero();
        if local_normal == Vec3::ZERO {
            continue;
        }
        if options.reject_backfaces && (normal_matrix * local_normal).dot(forward) <= 0.0 {
            continue;
        }

        let polygon = [a, b, c].map(|corner| mesh_to_projector.transform_point3(corner));
        let clipped = clip_to_box(polygon.to_vec(), half);
        if clipped.len() < 3 {
            continue;
        }
        // Clipping a triangle by half-spaces keeps it convex, so a fan works.
        for i in 1..clipped.len() - 1 {
            for point in [clipped[0], clipped[i], clipped[i + 1]] {
                geometry
                    .positions
                    .push(projector_to_mesh.transform_point3(point).to_array());
                geometry.normals.push(local_normal.to_array());
                geometry
                    .uvs
                    .push([0.5 + point.x / size.x, 0.5 + point.y / size.y]);
            }
        }
    }
    geometry
}

/// Sutherland–Hodgman against the six faces of an axis-aligned box centred
/// on the origin.
fn clip_to_box(mut polygon: Vec<Vec3>, half: Vec3) -> Vec<Vec3> {
    for axis in 0..3 {
        for sign in [1.0_f32, -1.0] {
            polygon = clip_against_plane(&polygon, axis, sign, half[axis]);
            if polygon.is_empty() {
                return polygon;
            }
        }
    }
    polygon
}

/// Keeps the part of `polygon` where `sign * p[axis] <= limit`.
fn clip_against_plane(polygon: &[Vec3], axis: usize, sign: f32, limit: f32) -> Vec<Vec3> {
    let mut out = Vec::with_capacity(polygon.len() + 2);
    let distance = |p: Vec3| sign * p[axis] - limit;
    for (i, &current) in polygon.iter().enumerate() {
        let next = polygon[(i + 1) % polygon.len()];
        let d_current = distance(current);
        let d_next = distance(next);
        if d_current <= 0.0 {
            out.push(current);
        }
        if (d_current < 0.0 && d_next > 0.0) || (d_current > 0.0 && d_next < 0.0) {
            let t = d_current / (d_current - d_next);
            out.push(current.lerp(next, t));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uv_area(geometry: &DecalGeometry) -> f32 {
        geometry
            .uvs
            .chunks(3)
            .map(|tri| {
                let (a, b, c) = (tri[0], tri[1], tri[2]);
                ((b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1])).abs() * 0.5
            })
            .sum()
    }

    fn uvs_in_unit_square(geometry: &DecalGeometry) -> bool {
        geometry
            .uvs
            .iter()
            .all(|uv| uv.iter().all(|c| (-1e-4..=1.0 + 1e-4).contains(c)))
    }

    #[test]
    fn flat_plane_yields_full_square() {
        let plane = Mesh::plane(4.0, 4.0, 8);
        let geometry = project(
            &plane,
            Vec3::ZERO,
            Quat::IDENTITY,
            Vec3::new(0.5, 0.5, 1.0),
            ProjectOptions::default(),
        );
        assert!(!geometry.is_empty());
        assert_eq!(geometry.positions.len(), geometry.uvs.len());
        assert_eq!(geometry.positions.len(), geometry.normals.len());
        assert!((uv_area(&geometry) - 1.0).abs() < 1e-3);
        assert!(uvs_in_unit_square(&geometry));
        for p in &geometry.positions {
            assert!(p[0].abs() <= 0.25 + 1e-5 && p[1].abs() <= 0.25 + 1e-5);
            assert!(p[2].abs() < 1e-6);
        }
    }

    #[test]
    fn spin_rotates_the_footprint_not_the_coverage() {
        let plane = Mesh::plane(4.0, 4.0, 8);
        let spun = Quat::from_rotation_z(std::f32::consts::FRAC_PI_4);
        let geometry = project(
            &plane,
            Vec3::ZERO,
            spun,
            Vec3::new(1.0, 0.2, 1.0),
            ProjectOptions::default(),
        );
        assert!((uv_area(&geometry) - 1.0).abs() < 1e-3);
        let reach = geometry
            .positions
            .iter()
            .map(|p| p[1])
            .fold(f32::MIN, f32::max);
        assert!(reach > 0.3);
    }

    #[test]
    fn wraps_around_a_cylinder() {
        let cylinder = Mesh::cylinder(1.0, 2.0, 64);
        let geometry = project(
            &cylinder,
            Vec3::new(0.0, 0.0, 1.0),
            Quat::IDENTITY,
            Vec3::new(0.5, 0.5, 1.0),
            ProjectOptions::default(),
        );
        assert!((uv_area(&geometry) - 1.0).abs() < 1e-2);
        assert!(uvs_in_unit_square(&geometry));
        let mut min_z = f32::MAX;
        let mut max_z = f32::MIN;
        for p in &geometry.positions {
            let radius = (p[0] * p[0] + p[2] * p[2]).sqrt();
            assert!((radius - 1.0).abs() < 5e-3);
            min_z = min_z.min(p[2]);
            max_z = max_z.max(p[2]);
        }
        assert!(max_z - min_z > 0.02);
    }

    #[test]
    fn shallow_box_misses_curvature() {
        let cylinder = Mesh::cylinder(1.0, 2.0, 64);
        let deep = project(
            &cylinder,
            Vec3::new(0.0, 0.0, 1.0),
            Quat::IDENTITY,
            Vec3::new(0.5, 0.5, 1.0),
            ProjectOptions::default(),
        );
        let shallow = project(
            &cylinder,
            Vec3::new(0.0, 0.0, 1.0),
            Quat::IDENTITY,
            Vec3::new(0.5, 0.5, 0.002),
            ProjectOptions::default(),
        );
        assert!(uv_area(&shallow) < uv_area(&deep) * 0.5);
    }

    #[test]
    fn backfaces_are_rejected_on_request() {
        let cylinder = Mesh::cylinder(1.0, 2.0, 32);
        let size = Vec3::new(0.5, 0.5, 4.0);
        let front_only = project(
            &cylinder,
            Vec3::ZERO,
            Quat::IDENTITY,
            size,
            ProjectOptions::default(),
        );
        let both = project(
            &cylinder,
            Vec3::ZERO,
            Quat::IDENTITY,
            size,
            ProjectOptions {
                reject_backfaces: false,
            },
        );
        assert!(front_only.positions.iter().all(|p| p[2] > 0.0));
        assert!(both.positions.iter().any(|p| p[2] < 0.0));
    }

    #[test]
    fn output_is_in_mesh_local_space() {
        let lifted = Mesh::plane(4.0, 4.0, 4).with_transform(Mat4::from_translation(Vec3::Y * 2.0));
        let geometry = project(
            &lifted,
            Vec3::new(0.0, 2.0, 0.0),
            Quat::IDENTITY,
            Vec3::new(0.5, 0.5, 1.0),
            ProjectOptions::default(),
        );
        assert!(!geometry.is_empty());
        assert!(geometry.positions.iter().all(|p| p[1].abs() <= 0.25 + 1e-5));
    }

    #[test]
    fn degenerate_size_projects_nothing() {
        let plane = Mesh::plane(1.0, 1.0, 1);
        let geometry = project(
            &plane,
            Vec3::ZERO,
            Quat::IDENTITY,
            Vec3::ZERO,
            ProjectOptions::default(),
        );
        assert!(geometry.is_empty());
    }
}
