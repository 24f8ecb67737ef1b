use glam::Vec3;

use super::{BoundingBox, Entity, EntityKind};
use crate::config::{AppConfig, ArenaConfig};

/// Wall boxes closing the ground plane in.
///
/// Front and back walls run across the full outer width so they also fill the
/// corner squares; left and right walls only span the inner edge. The four
/// boxes touch but never overlap.
pub fn arena_walls(arena: &ArenaConfig) -> [BoundingBox; 4] {
    let half = arena.size / 2.0;
    let t = arena.wall_thickness;
    let h = arena.wall_height;
    let offset = half + t / 2.0;

    let across = Vec3::new(arena.size + 2.0 * t, h, t);
    let along = Vec3::new(t, h, arena.size);

    [
        BoundingBox::from_center_size(Vec3::new(0.0, h / 2.0, -offset), across), // front
        BoundingBox::from_center_size(Vec3::new(0.0, h / 2.0, offset), across),  // back
        BoundingBox::from_center_size(Vec3::new(-offset, h / 2.0, 0.0), along),  // left
        BoundingBox::from_center_size(Vec3::new(offset, h / 2.0, 0.0), along),   // right
    ]
}

/// Everything that lives in the arena
pub struct Scene {
    pub arena: ArenaConfig,
    pub walls: [BoundingBox; 4],
    pub vehicle: Entity,
    pub character: Entity,
}

impl Scene {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            arena: config.arena,
            walls: arena_walls(&config.arena),
            vehicle: Entity::new(EntityKind::Vehicle, config.vehicle.spawn),
            character: Entity::new(EntityKind::Character, config.character.spawn),
        }
    }

    pub fn entity(&self, kind: EntityKind) -> &Entity {
        match kind {
            EntityKind::Vehicle => &self.vehicle,
            EntityKind::Character => &self.character,
        }
    }

    pub fn entities(&self) -> [&Entity; 2] {
        [&self.vehicle, &self.character]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walls_enclose_arena_without_gaps() {
        let arena = ArenaConfig::default();
        let walls = arena_walls(&arena);

        // inner faces sit exactly on the ground edge
        assert_eq!(walls[0].max.z, -25.0);
        assert_eq!(walls[1].min.z, 25.0);
        assert_eq!(walls[2].max.x, -25.0);
        assert_eq!(walls[3].min.x, 25.0);

        // corner squares are covered by the front/back walls
        for corner in [Vec3::new(-25.5, 1.0, -25.5), Vec3::new(25.5, 1.0, 25.5)] {
            assert!(walls.iter().any(|w| w.contains_point(corner)));
        }

        for w in &walls {
            assert_eq!(w.min.y, 0.0);
            assert_eq!(w.max.y, 2.0);
        }
    }

    #[test]
    fn test_walls_do_not_cover_interior() {
        let walls = arena_walls(&ArenaConfig::default());
        for p in [Vec3::ZERO, Vec3::new(24.9, 1.0, 24.9), Vec3::new(-24.9, 0.5, 0.0)] {
            assert!(!walls.iter().any(|w| w.contains_point(p)));
        }
    }

    #[test]
    fn test_scene_spawns_entities() {
        let scene = Scene::new(&AppConfig::default());
        assert_eq!(scene.vehicle.transform.position, Vec3::ZERO);
        assert_eq!(scene.character.transform.position, Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(scene.entity(EntityKind::Character).kind, EntityKind::Character);
    }
}
