//! CPU ray picking against a single mesh.
//!
//! Decal placement only ever tests the vehicle body, so there is no scene
//! wide acceleration structure: the ray is moved into the mesh's local space
//! and every triangle is tested.

use super::Mesh;
use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// Nearest intersection of a ray with a mesh, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub point: Vec3,
    /// Unit face normal, flipped to face the incoming ray.
    pub face_normal: Vec3,
    pub distance: f32,
    pub triangle: usize,
}

pub fn raycast_mesh(mesh: &Mesh, ray: &Ray) -> Option<PickHit> {
    if ray.direction == Vec3::ZERO {
        return None;
    }
    let to_local = mesh.transform.inverse();
    let origin = to_local.transform_point3(ray.origin);
    // Unnormalized on purpose: keeps `t` measured in world units.
    let direction = to_local.transform_vector3(ray.direction);

    let mut nearest: Option<(f32, usize, [Vec3; 3])> = None;
    for index in 0..mesh.triangle_count() {
        let Some(corners) = mesh.triangle(index) else {
            continue;
        };
        let Some(t) = ray_intersects_triangle(origin, direction, corners) else {
            continue;
        };
        if nearest.map_or(true, |(best, _, _)| t < best) {
            nearest = Some((t, index, corners));
        }
    }

    let (distance, triangle, [v0, v1, v2]) = nearest?;
    let local_normal = (v1 - v0).cross(v2 - v0);
    let mut face_normal = (mesh.normal_matrix() * local_normal).normalize_or_zero();
    if face_normal.dot(ray.direction) > 0.0 {
        face_normal = -face_normal;
    }
    Some(PickHit {
        point: ray.at(distance),
        face_normal,
        distance,
        triangle,
    })
}

/// Möller–Trumbore; two-sided. Returns the ray parameter of the hit.
fn ray_intersects_triangle(origin: Vec3, direction: Vec3, [v0, v1, v2]: [Vec3; 3]) -> Option<f32> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let pvec = direction.cross(edge2);
    let det = edge1.dot(pvec);
    if det.abs() <= 1e-9 {
        return None;
    }
    let inv_det = 1.0 / det;

    let tvec = origin - v0;
    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(edge1);
    let v = direction.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(qvec) * inv_det;
    if t > 1e-6 {
        Some(t)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Quat};

    #[test]
    fn ray_hits_plane_centre() {
        let plane = Mesh::plane(2.0, 2.0, 4);
        let ray = Ray::new(Vec3::new(0.1, 0.2, 5.0), Vec3::NEG_Z);
        let hit = raycast_mesh(&plane, &ray).unwrap();
        assert!((hit.point - Vec3::new(0.1, 0.2, 0.0)).length() < 1e-5);
        assert!((hit.face_normal - Vec3::Z).length() < 1e-5);
        assert!((hit.distance - 5.0).abs() < 1e-5);
    }

    #[test]
    fn ray_misses_outside_mesh() {
        let plane = Mesh::plane(2.0, 2.0, 1);
        let ray = Ray::new(Vec3::new(3.0, 0.0, 5.0), Vec3::NEG_Z);
        assert!(raycast_mesh(&plane, &ray).is_none());
        let behind = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        assert!(raycast_mesh(&plane, &behind).is_none());
    }

    #[test]
    fn nearest_cylinder_wall_wins() {
        let cylinder = Mesh::cylinder(1.0, 2.0, 32);
        let ray = Ray::new(Vec3::new(0.05, 0.1, 5.0), Vec3::NEG_Z);
        let hit = raycast_mesh(&cylinder, &ray).unwrap();
        assert!(hit.point.z > 0.99);
        assert!(hit.face_normal.z > 0.99);
    }

    #[test]
    fn transformed_mesh_reports_world_space() {
        let rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let plane = Mesh::plane(2.0, 2.0, 1)
            .with_transform(Mat4::from_rotation_translation(rotation, Vec3::new(0.0, 0.0, -1.0)));
        let ray = Ray::new(Vec3::new(5.0, 0.3, -1.2), Vec3::NEG_X);
        let hit = raycast_mesh(&plane, &ray).unwrap();
        assert!((hit.point - Vec3::new(0.0, 0.3, -1.2)).length() < 1e-5);
        assert!((hit.face_normal - Vec3::X).length() < 1e-5);
    }
}
