use glam::{EulerRot, Mat4, Quat, Vec3};

/// Position, Euler rotation (radians, XYZ order) and scale of a scene object.
///
/// `rotation.y` is yaw, `rotation.z` is the roll/tilt the vehicle uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self { position, ..Default::default() }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.position)
    }

    /// Rotate a local axis by yaw only, so pitch and tilt never lift the
    /// direction of travel off the ground plane.
    pub fn heading(&self, local_forward: Vec3) -> Vec3 {
        Quat::from_rotation_y(self.rotation.y) * local_forward
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_heading_follows_yaw() {
        let mut t = Transform::default();
        assert!((t.heading(Vec3::X) - Vec3::X).length() < 1e-6);

        // +90° yaw turns +X towards -Z (right-handed, Y up)
        t.rotation.y = FRAC_PI_2;
        assert!((t.heading(Vec3::X) - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn test_heading_ignores_tilt() {
        let mut t = Transform::default();
        t.rotation.z = 0.7;
        let h = t.heading(Vec3::X);
        assert!(h.y.abs() < 1e-6);
        assert!((h.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_matrix_applies_scale_then_translation() {
        let t = Transform::at(Vec3::new(5.0, 0.0, 0.0)).with_scale(0.5);
        let p = t.matrix().transform_point3(Vec3::new(2.0, 2.0, 0.0));
        assert!((p - Vec3::new(6.0, 1.0, 0.0)).length() < 1e-6);
    }
}
