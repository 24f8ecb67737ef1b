use crate::model::Camera;

/// Orbit controls with damping around the camera target.
///
/// Mouse deltas feed a pending rotation that is applied a fraction at a time
/// each frame, so the view eases out after the drag stops.
pub struct CameraController {
    pub rotate_sensitivity: f32,
    pub zoom_sensitivity: f32,
    pub damping: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pending_yaw: f32,
    pending_pitch: f32,
}

impl CameraController {
    pub fn new(damping: f32) -> Self {
        Self {
            rotate_sensitivity: 0.005,
            zoom_sensitivity: 0.001,
            damping: damping.clamp(0.001, 1.0),
            min_distance: 2.0,
            max_distance: 120.0,
            pending_yaw: 0.0,
            pending_pitch: 0.0,
        }
    }

    /// Queue a drag delta in pixels
    pub fn apply_drag(&mut self, dx: f32, dy: f32) {
        self.pending_yaw -= dx * self.rotate_sensitivity;
        self.pending_pitch += dy * self.rotate_sensitivity;
    }

    /// Step the camera one frame; `zoom` is the accumulated wheel delta
    pub fn update(&mut self, camera: &mut Camera, zoom: f32) {
        let (radius, yaw, pitch) = camera.spherical();

        let yaw = yaw + self.pending_yaw * self.damping;
        let limit = std::f32::consts::FRAC_PI_2 - 0.05;
        let pitch = (pitch + self.pending_pitch * self.damping).clamp(-limit, limit);
        self.pending_yaw *= 1.0 - self.damping;
        self.pending_pitch *= 1.0 - self.damping;

        let radius = (radius * (1.0 + zoom * self.zoom_sensitivity)).clamp(self.min_distance, self.max_distance);
        camera.set_spherical(radius, yaw, pitch);
    }

    #[cfg(test)]
    fn is_settled(&self) -> bool {
        self.pending_yaw.abs() < 1e-5 && self.pending_pitch.abs() < 1e-5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;

    #[test]
    fn test_drag_eases_out() {
        let mut cam = Camera::new(800, 600, &CameraConfig::default());
        let mut ctl = CameraController::new(0.05);
        let (_, yaw0, _) = cam.spherical();

        ctl.apply_drag(100.0, 0.0);
        ctl.update(&mut cam, 0.0);
        let (_, yaw1, _) = cam.spherical();
        let first_step = yaw1 - yaw0;
        assert!(first_step < 0.0);

        ctl.update(&mut cam, 0.0);
        let (_, yaw2, _) = cam.spherical();
        assert!((yaw2 - yaw1).abs() < first_step.abs());

        for _ in 0..500 {
            ctl.update(&mut cam, 0.0);
        }
        assert!(ctl.is_settled());
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut cam = Camera::new(800, 600, &CameraConfig::default());
        let mut ctl = CameraController::new(0.05);
        ctl.update(&mut cam, -100_000.0);
        let (r, _, _) = cam.spherical();
        assert!((r - ctl.min_distance).abs() < 1e-4);
        ctl.update(&mut cam, 100_000.0);
        let (r, _, _) = cam.spherical();
        assert!((r - ctl.max_distance).abs() < 1e-3);
    }

    #[test]
    fn test_pitch_never_reaches_pole() {
        let mut cam = Camera::new(800, 600, &CameraConfig::default());
        let mut ctl = CameraController::new(1.0);
        ctl.apply_drag(0.0, 10_000.0);
        ctl.update(&mut cam, 0.0);
        let (_, _, pitch) = cam.spherical();
        assert!(pitch < std::f32::consts::FRAC_PI_2);
        assert!(cam.forward().is_finite());
    }
}
