use glam::Vec3;

use crate::config::MotionConfig;
use crate::controller::{CollisionWorld, InputState};
use crate::model::{BoundingBox, Entity};

/// What happened to an entity during one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionOutcome {
    /// Model not loaded yet, nothing was touched
    Inert,
    /// Candidate position committed (possibly a zero-length move)
    Moved,
    /// Candidate box overlapped an obstacle, horizontal position kept
    Blocked,
}

/// Drives one entity from its key bindings.
///
/// Vehicle and character share this type and differ only by `MotionConfig`.
/// Increments are applied per frame, not scaled by elapsed time.
#[derive(Debug, Clone)]
pub struct EntityController {
    pub config: MotionConfig,
}

impl EntityController {
    pub fn new(config: MotionConfig) -> Self {
        Self { config }
    }

    /// Advance `entity` to time `now` (ms).
    ///
    /// `others` holds the live boxes of the other entities; they block movement
    /// the same way the static walls do, except for one this entity already
    /// overlaps. Walls always block.
    pub fn update(
        &self,
        entity: &mut Entity,
        input: &InputState,
        now: f64,
        world: &CollisionWorld,
        others: &[BoundingBox],
    ) -> MotionOutcome {
        if !entity.is_loaded() {
            return MotionOutcome::Inert;
        }

        self.step_jump(entity, input, now);
        self.step_rotation(entity, input);

        let candidate = entity.transform.position + self.step_translation(entity, input);
        let offset = candidate - entity.transform.position;
        if offset == Vec3::ZERO {
            return MotionOutcome::Moved;
        }

        let Some(current) = entity.bounds() else {
            return MotionOutcome::Inert;
        };
        // boxes this entity already overlaps do not block, so an overlapping pair can separate
        let others: Vec<BoundingBox> = others.iter().copied().filter(|o| !current.intersects(o)).collect();
        if world.blocked(&current.translated(offset), &others) {
            tracing::trace!(entity = entity.kind.label(), ?candidate, "move blocked");
            return MotionOutcome::Blocked;
        }

        entity.transform.position = candidate;
        MotionOutcome::Moved
    }

    /// Vertical offset from the jump curve. Never collision-tested.
    pub fn step_jump(&self, entity: &mut Entity, input: &InputState, now: f64) {
        let pressed = input.any_pressed(&self.config.bindings.jump);
        if let Some(y) = entity.jump.advance(now, pressed, self.config.jump_height, self.config.jump_duration) {
            entity.transform.position.y = y;
        }
    }

    /// Yaw from the turn pair, roll from the tilt pair. Opposite keys cancel.
    pub fn step_rotation(&self, entity: &mut Entity, input: &InputState) {
        let b = &self.config.bindings;
        let yaw = self.axis(input, &b.turn_left, &b.turn_right, self.config.rotation_speed);
        let tilt = self.axis(input, &b.tilt_positive, &b.tilt_negative, self.config.rotation_speed);
        entity.transform.rotation.y += yaw;
        entity.transform.rotation.z += tilt;
    }

    /// Horizontal displacement requested this frame, along the yaw heading
    pub fn step_translation(&self, entity: &Entity, input: &InputState) -> Vec3 {
        let b = &self.config.bindings;
        let speed = if input.any_pressed(&b.run) {
            self.config.speed * self.config.run_multiplier
        } else {
            self.config.speed
        };
        let amount = self.axis(input, &b.forward, &b.backward, speed);
        entity.transform.heading(self.config.local_forward) * amount
    }

    fn axis(&self, input: &InputState, positive: &[String], negative: &[String], step: f32) -> f32 {
        let pos = if input.any_pressed(positive) { step } else { 0.0 };
        let neg = if input.any_pressed(negative) { step } else { 0.0 };
        pos - neg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{InputEvent, KeyBindings};
    use crate::model::{EntityKind, EntityModel, JumpState, Transform};
    use crate::utils::create_box_mesh;

    fn test_config() -> MotionConfig {
        MotionConfig {
            speed: 0.1,
            run_multiplier: 5.0,
            rotation_speed: 0.03,
            jump_height: 1.2,
            jump_duration: 600.0,
            local_forward: Vec3::X,
            bindings: KeyBindings {
                forward: vec!["KeyW".into()],
                backward: vec!["KeyS".into()],
                turn_left: vec!["KeyA".into()],
                turn_right: vec!["KeyD".into()],
                tilt_positive: vec!["KeyQ".into()],
                tilt_negative: vec!["KeyE".into()],
                jump: vec!["Space".into()],
                run: vec!["ShiftLeft".into()],
            },
        }
    }

    /// Loaded entity whose box is a small cube sitting on its position
    fn loaded_entity() -> Entity {
        let entity = Entity::new(EntityKind::Vehicle, Transform::default());
        let model = EntityModel::from_mesh(create_box_mesh(Vec3::splat(0.02))).unwrap();
        entity.attach_model(model);
        entity
    }

    fn input(keys: &[&str]) -> InputState {
        let mut state = InputState::new();
        for k in keys {
            state.process_event(&InputEvent::KeyDown(k.to_string()));
        }
        state
    }

    #[test]
    fn test_unloaded_entity_is_inert() {
        let ctl = EntityController::new(test_config());
        let mut entity = Entity::new(EntityKind::Vehicle, Transform::default());
        let out = ctl.update(&mut entity, &input(&["KeyW", "KeyA", "Space"]), 0.0, &CollisionWorld::default(), &[]);
        assert_eq!(out, MotionOutcome::Inert);
        assert_eq!(entity.transform, Transform::default());
        assert_eq!(entity.jump, JumpState::Inactive);
    }

    #[test]
    fn test_forward_moves_along_heading() {
        let ctl = EntityController::new(test_config());
        let mut entity = loaded_entity();
        let out = ctl.update(&mut entity, &input(&["KeyW"]), 16.0, &CollisionWorld::default(), &[]);
        assert_eq!(out, MotionOutcome::Moved);
        assert!((entity.transform.position - Vec3::new(0.1, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_obstacle_in_path_rejects_move() {
        let ctl = EntityController::new(test_config());
        let mut entity = loaded_entity();
        let wall = BoundingBox::new(Vec3::new(0.05, -1.0, -1.0), Vec3::new(0.2, 1.0, 1.0));
        let world = CollisionWorld::new([wall]);
        let out = ctl.update(&mut entity, &input(&["KeyW"]), 16.0, &world, &[]);
        assert_eq!(out, MotionOutcome::Blocked);
        assert_eq!(entity.transform.position, Vec3::ZERO);
    }

    #[test]
    fn test_other_entity_blocks_move() {
        let ctl = EntityController::new(test_config());
        let mut entity = loaded_entity();
        let other = BoundingBox::new(Vec3::new(0.1, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let out = ctl.update(&mut entity, &input(&["KeyW"]), 16.0, &CollisionWorld::default(), &[other]);
        assert_eq!(out, MotionOutcome::Blocked);
        assert_eq!(entity.transform.position, Vec3::ZERO);
    }

    #[test]
    fn test_already_overlapping_entity_does_not_block() {
        let ctl = EntityController::new(test_config());
        let mut entity = loaded_entity();
        let other = BoundingBox::from_center_size(Vec3::ZERO, Vec3::ONE);
        let out = ctl.update(&mut entity, &input(&["KeyW"]), 16.0, &CollisionWorld::default(), &[other]);
        assert_eq!(out, MotionOutcome::Moved);
        assert!((entity.transform.position.x - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_overlap_exemption_does_not_cover_walls() {
        let ctl = EntityController::new(test_config());
        let mut entity = loaded_entity();
        let wall = BoundingBox::from_center_size(Vec3::ZERO, Vec3::ONE);
        let out = ctl.update(&mut entity, &input(&["KeyW"]), 16.0, &CollisionWorld::new([wall]), &[]);
        assert_eq!(out, MotionOutcome::Blocked);
        assert_eq!(entity.transform.position, Vec3::ZERO);
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let ctl = EntityController::new(test_config());
        let mut entity = loaded_entity();
        let keys = input(&["KeyW", "KeyS", "KeyA", "KeyD", "KeyQ", "KeyE"]);
        ctl.update(&mut entity, &keys, 16.0, &CollisionWorld::default(), &[]);
        assert_eq!(entity.transform.position, Vec3::ZERO);
        assert_eq!(entity.transform.rotation, Vec3::ZERO);
    }

    #[test]
    fn test_run_multiplies_speed() {
        let ctl = EntityController::new(test_config());
        let mut entity = loaded_entity();
        ctl.update(&mut entity, &input(&["KeyW", "ShiftLeft"]), 16.0, &CollisionWorld::default(), &[]);
        assert!((entity.transform.position.x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_turn_then_move_follows_new_heading() {
        let ctl = EntityController::new(test_config());
        let mut entity = loaded_entity();
        ctl.update(&mut entity, &input(&["KeyA", "KeyW"]), 16.0, &CollisionWorld::default(), &[]);
        assert!((entity.transform.rotation.y - 0.03).abs() < 1e-6);
        let expected = Vec3::new(0.03f32.cos(), 0.0, -(0.03f32.sin())) * 0.1;
        assert!((entity.transform.position - expected).length() < 1e-6);
    }

    #[test]
    fn test_tilt_does_not_change_heading() {
        let ctl = EntityController::new(test_config());
        let mut entity = loaded_entity();
        for _ in 0..10 {
            ctl.update(&mut entity, &input(&["KeyQ"]), 16.0, &CollisionWorld::default(), &[]);
        }
        assert!((entity.transform.rotation.z - 0.3).abs() < 1e-5);
        ctl.update(&mut entity, &input(&["KeyW"]), 16.0, &CollisionWorld::default(), &[]);
        assert!((entity.transform.position - Vec3::new(0.1, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_jump_is_not_blocked_by_walls() {
        let ctl = EntityController::new(test_config());
        let mut entity = loaded_entity();
        // a ceiling right above the entity
        let world = CollisionWorld::new([BoundingBox::new(Vec3::new(-1.0, 0.05, -1.0), Vec3::new(1.0, 5.0, 1.0))]);
        ctl.update(&mut entity, &input(&["Space"]), 0.0, &world, &[]);
        assert!(entity.jump.is_active());
        ctl.update(&mut entity, &input(&[]), 300.0, &world, &[]);
        assert!((entity.transform.position.y - 1.2).abs() < 1e-6);
        ctl.update(&mut entity, &input(&[]), 600.0, &world, &[]);
        assert_eq!(entity.transform.position.y, 0.0);
        assert!(!entity.jump.is_active());
    }

    #[test]
    fn test_character_config_moves_along_z() {
        let ctl = EntityController::new(MotionConfig::character());
        let mut entity = loaded_entity();
        ctl.update(&mut entity, &input(&["ArrowUp"]), 16.0, &CollisionWorld::default(), &[]);
        assert!((entity.transform.position - Vec3::new(0.0, 0.0, 0.05)).length() < 1e-6);
    }
}
