use glam::{Mat4, Vec3};

use crate::config::CameraConfig;

pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32, config: &CameraConfig) -> Self {
        Self {
            eye: config.eye,
            target: config.target,
            up: Vec3::Y,
            fov_y: config.fov_y_degrees.to_radians(),
            aspect: width as f32 / height.max(1) as f32,
            z_near: config.z_near,
            z_far: config.z_far,
        }
    }

    #[cfg(test)]
    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye).normalize_or_zero()
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn view_proj(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye, self.target, self.up);
        let proj = Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far);
        proj * view
    }

    /// Eye position relative to the target as (radius, yaw, pitch).
    /// Yaw is measured around +Y from +Z, pitch from the horizon.
    pub fn spherical(&self) -> (f32, f32, f32) {
        let offset = self.eye - self.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return (0.0, 0.0, 0.0);
        }
        let yaw = offset.x.atan2(offset.z);
        let pitch = (offset.y / radius).clamp(-1.0, 1.0).asin();
        (radius, yaw, pitch)
    }

    pub fn set_spherical(&mut self, radius: f32, yaw: f32, pitch: f32) {
        let horizontal = radius * pitch.cos();
        self.eye = self.target
            + Vec3::new(horizontal * yaw.sin(), radius * pitch.sin(), horizontal * yaw.cos());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spherical_round_trip_keeps_eye() {
        let mut cam = Camera::new(800, 600, &CameraConfig::default());
        let before = cam.eye;
        let (r, yaw, pitch) = cam.spherical();
        assert!((r - before.length()).abs() < 1e-5);
        cam.set_spherical(r, yaw, pitch);
        assert!((cam.eye - before).length() < 1e-4);
    }

    #[test]
    fn test_default_camera_looks_at_origin() {
        let cam = Camera::new(1280, 720, &CameraConfig::default());
        let f = cam.forward();
        assert!(f.y < 0.0 && f.z < 0.0);
        // origin projects to the center of the screen
        let clip = cam.view_proj() * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((clip.x / clip.w).abs() < 1e-5);
        assert!((clip.y / clip.w).abs() < 1e-5);
    }
}
