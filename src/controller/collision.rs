use crate::model::BoundingBox;

/// Static obstacle boxes, built once at startup.
///
/// A linear scan is plenty for a handful of walls.
#[derive(Debug, Clone, Default)]
pub struct CollisionWorld {
    obstacles: Vec<BoundingBox>,
}

impl CollisionWorld {
    pub fn new<I>(obstacles: I) -> Self
    where
        I: IntoIterator<Item = BoundingBox>,
    {
        Self { obstacles: obstacles.into_iter().collect() }
    }

    pub fn obstacles(&self) -> &[BoundingBox] {
        &self.obstacles
    }

    /// True if `candidate` overlaps any static obstacle
    pub fn intersects(&self, candidate: &BoundingBox) -> bool {
        self.obstacles.iter().any(|ob| candidate.intersects(ob))
    }

    /// Static obstacles plus the live boxes of other entities
    pub fn blocked(&self, candidate: &BoundingBox, dynamic: &[BoundingBox]) -> bool {
        self.intersects(candidate) || dynamic.iter().any(|other| candidate.intersects(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArenaConfig;
    use crate::model::arena_walls;
    use glam::Vec3;

    #[test]
    fn test_empty_world_never_intersects() {
        let world = CollisionWorld::default();
        assert!(!world.intersects(&BoundingBox::new(Vec3::splat(-100.0), Vec3::splat(100.0))));
    }

    #[test]
    fn test_arena_walls_block_outside_moves() {
        let world = CollisionWorld::new(arena_walls(&ArenaConfig::default()));
        assert_eq!(world.obstacles().len(), 4);

        let inside = BoundingBox::from_center_size(Vec3::new(0.0, 0.5, 0.0), Vec3::ONE);
        assert!(!world.intersects(&inside));

        let at_edge = inside.translated(Vec3::new(24.6, 0.0, 0.0));
        assert!(world.intersects(&at_edge));

        // high jump still clips the wall: boxes are tested on all three axes
        let above = inside.translated(Vec3::new(24.6, 1.4, 0.0));
        assert!(world.intersects(&above));
        let over = inside.translated(Vec3::new(24.6, 2.1, 0.0));
        assert!(!world.intersects(&over));
    }

    #[test]
    fn test_dynamic_boxes_block() {
        let world = CollisionWorld::default();
        let me = BoundingBox::from_center_size(Vec3::ZERO, Vec3::ONE);
        let other = BoundingBox::from_center_size(Vec3::new(0.8, 0.0, 0.0), Vec3::ONE);
        let far = BoundingBox::from_center_size(Vec3::new(3.0, 0.0, 0.0), Vec3::ONE);
        assert!(world.blocked(&me, &[far, other]));
        assert!(!world.blocked(&me, &[far]));
    }
}
