use glam::Vec3;

use crate::controller::KeyBindings;
use crate::model::Transform;

/// Ground plane and perimeter walls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaConfig {
    pub size: f32,
    pub wall_thickness: f32,
    pub wall_height: f32,
    pub ground_uv_repeat: [f32; 2],
    pub wall_uv_repeat: [f32; 2],
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            size: 50.0,
            wall_thickness: 1.0,
            wall_height: 2.0,
            ground_uv_repeat: [20.0, 20.0],
            wall_uv_repeat: [2.0, 1.0],
        }
    }
}

/// Tuning of one controllable entity. Speeds are per frame, times in ms.
#[derive(Debug, Clone)]
pub struct MotionConfig {
    pub speed: f32,
    pub run_multiplier: f32,
    pub rotation_speed: f32,
    pub jump_height: f32,
    pub jump_duration: f64,
    /// Direction of travel in model space before yaw is applied
    pub local_forward: Vec3,
    pub bindings: KeyBindings,
}

impl MotionConfig {
    pub fn vehicle() -> Self {
        Self {
            speed: 0.1,
            run_multiplier: 5.0,
            rotation_speed: 0.03,
            jump_height: 1.2,
            jump_duration: 600.0,
            local_forward: Vec3::X,
            bindings: KeyBindings {
                forward: keys(&["KeyW"]),
                backward: keys(&["KeyS"]),
                turn_left: keys(&["KeyA"]),
                turn_right: keys(&["KeyD"]),
                tilt_positive: keys(&["KeyQ"]),
                tilt_negative: keys(&["KeyE"]),
                jump: keys(&["Space"]),
                run: keys(&["ShiftLeft", "ShiftRight"]),
            },
        }
    }

    pub fn character() -> Self {
        Self {
            speed: 0.05,
            run_multiplier: 1.0,
            rotation_speed: 0.04,
            jump_height: 1.0,
            jump_duration: 600.0,
            local_forward: Vec3::Z,
            bindings: KeyBindings {
                forward: keys(&["ArrowUp"]),
                backward: keys(&["ArrowDown"]),
                turn_left: keys(&["ArrowLeft"]),
                turn_right: keys(&["ArrowRight"]),
                tilt_positive: Vec::new(),
                tilt_negative: Vec::new(),
                jump: keys(&["Digit0", "Numpad0"]),
                run: Vec::new(),
            },
        }
    }
}

fn keys(codes: &[&str]) -> Vec<String> {
    codes.iter().map(|c| c.to_string()).collect()
}

/// Where an entity's model lives and how it is placed on spawn
#[derive(Debug, Clone)]
pub struct EntitySetup {
    pub model_path: String,
    pub spawn: Transform,
    pub motion: MotionConfig,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    pub eye: Vec3,
    pub target: Vec3,
    pub fov_y_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub damping: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 5.0, 8.0),
            target: Vec3::ZERO,
            fov_y_degrees: 60.0,
            z_near: 0.1,
            z_far: 1000.0,
            damping: 0.05,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Prefix for every asset path (directory on native, URL prefix on web)
    pub asset_base: String,
    pub arena: ArenaConfig,
    pub camera: CameraConfig,
    pub vehicle: EntitySetup,
    pub character: EntitySetup,
    pub ground_texture: String,
    pub wall_texture: String,
    pub reset_key: String,
    pub toggle_bounds_key: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            asset_base: "./".to_string(),
            arena: ArenaConfig::default(),
            camera: CameraConfig::default(),
            vehicle: EntitySetup {
                model_path: "models/su7-xiaomini.glb".to_string(),
                spawn: Transform::default(),
                motion: MotionConfig::vehicle(),
            },
            character: EntitySetup {
                model_path: "models/person/Character.glb".to_string(),
                spawn: Transform::at(Vec3::new(5.0, 0.0, 0.0)).with_scale(0.5),
                motion: MotionConfig::character(),
            },
            ground_texture: "textures/brick_pavement_02_diff_1k.jpg".to_string(),
            wall_texture: "textures/concrete_pavement_diff_1k.jpg".to_string(),
            reset_key: "KeyR".to_string(),
            toggle_bounds_key: "KeyB".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults plus `ARENA_ASSETS` as asset directory (native only)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Self {
        let asset_base = std::env::var("ARENA_ASSETS").unwrap_or_else(|_| "assets/".to_string());
        Self { asset_base, ..Default::default() }
    }

    pub fn asset_path(&self, relative: &str) -> String {
        if self.asset_base.is_empty() || self.asset_base.ends_with('/') {
            format!("{}{}", self.asset_base, relative)
        } else {
            format!("{}/{}", self.asset_base, relative)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_path_joins_once() {
        let mut cfg = AppConfig::default();
        cfg.asset_base = "assets".to_string();
        assert_eq!(cfg.asset_path("models/a.glb"), "assets/models/a.glb");
        cfg.asset_base = "assets/".to_string();
        assert_eq!(cfg.asset_path("models/a.glb"), "assets/models/a.glb");
    }

    #[test]
    fn test_character_has_no_tilt_or_run() {
        let m = MotionConfig::character();
        assert!(m.bindings.tilt_positive.is_empty());
        assert!(m.bindings.tilt_negative.is_empty());
        assert!(m.bindings.run.is_empty());
        assert_eq!(m.bindings.jump, vec!["Digit0".to_string(), "Numpad0".to_string()]);
    }
}
