use super::pick::Ray;
use glam::{Vec2, Vec3};

pub const DEFAULT_FOV_Y: f32 = std::f32::consts::FRAC_PI_4;

/// Screen rectangle of the render surface, in pixels with a top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    /// Normalized device coordinates (y up) of a click, or `None` when the
    /// click lies outside the surface.
    pub fn to_ndc(&self, screen_x: f32, screen_y: f32) -> Option<Vec2> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return None;
        }
        let u = (screen_x - self.x) / self.width;
        let v = (screen_y - self.y) / self.height;
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return None;
        }
        Some(Vec2::new(u * 2.0 - 1.0, 1.0 - v * 2.0))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CameraController {
    pub position: [f32; 3],
    pub yaw: f32,
    pub pitch: f32,
    pub fov_y: f32,
}

impl CameraController {
    pub fn new(position: [f32; 3], yaw: f32, pitch: f32) -> Self {
        Self {
            position,
            yaw,
            pitch,
            fov_y: DEFAULT_FOV_Y,
        }
    }

    pub fn look_at(eye: [f32; 3], target: [f32; 3]) -> Self {
        let forward = [target[0] - eye[0], target[1] - eye[1], target[2] - eye[2]];
        let (yaw, pitch) = forward_to_yaw_pitch(forward);
        Self::new(eye, yaw, pitch)
    }

    pub fn basis(&self) -> ([f32; 3], [f32; 3], [f32; 3]) {
        camera_basis(self.yaw, self.pitch)
    }

    /// World-space ray from the eye through a point in normalized device
    /// coordinates.
    pub fn screen_ray(&self, ndc: Vec2, aspect: f32) -> Ray {
        let (forward, right, up) = self.basis();
        let tan_half = (self.fov_y * 0.5).tan();
        let direction = Vec3::from(forward)
            + Vec3::from(right) * (ndc.x * tan_half * aspect)
            + Vec3::from(up) * (ndc.y * tan_half);
        Ray::new(Vec3::from(self.position), direction)
    }
}

fn forward_to_yaw_pitch(forward: [f32; 3]) -> (f32, f32) {
    let len = (forward[0] * forward[0] + forward[1] * forward[1] + forward[2] * forward[2])
        .sqrt()
        .max(1e-6);
    let nx = forward[0] / len;
    let ny = forward[1] / len;
    let nz = forward[2] / len;
    let yaw = nz.atan2(nx);
    let pitch = ny.clamp(-1.0, 1.0).asin();
    (yaw, pitch)
}

fn camera_basis(yaw: f32, pitch: f32) -> ([f32; 3], [f32; 3], [f32; 3]) {
    let cos_pitch = pitch.cos();
    let forward = Vec3::new(yaw.cos() * cos_pitch, pitch.sin(), yaw.sin() * cos_pitch);
    let right = Vec3::new(-yaw.sin(), 0.0, yaw.cos());
    let up = right.cross(forward).normalize_or_zero();
    (forward.to_array(), right.to_array(), up.to_array())
}

#[cfg(test)]
mod tests {
    use super::{CameraController, Viewport};
    use glam::{Vec2, Vec3};

    #[test]
    fn centre_ray_points_at_target() {
        let camera = CameraController::look_at([0.0, 0.0, 5.0], [0.0, 0.0, 0.0]);
        let ray = camera.screen_ray(Vec2::ZERO, 1.0);
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn screen_right_maps_to_world_right() {
        let camera = CameraController::look_at([0.0, 0.0, 5.0], [0.0, 0.0, 0.0]);
        let ray = camera.screen_ray(Vec2::new(0.5, 0.5), 1.0);
        assert!(ray.direction.x > 0.0);
        assert!(ray.direction.y > 0.0);
    }

    #[test]
    fn viewport_converts_to_ndc() {
        let viewport = Viewport {
            x: 100.0,
            y: 50.0,
            width: 200.0,
            height: 100.0,
        };
        assert_eq!(viewport.to_ndc(200.0, 100.0), Some(Vec2::ZERO));
        assert_eq!(viewport.to_ndc(100.0, 50.0), Some(Vec2::new(-1.0, 1.0)));
        assert_eq!(viewport.to_ndc(99.0, 60.0), None);
        assert_eq!(Viewport::new(0.0, 0.0).to_ndc(0.0, 0.0), None);
        assert_eq!(viewport.aspect(), 2.0);
    }
}
