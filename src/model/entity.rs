use std::ops::Range;

use once_cell::unsync::OnceCell;

use super::{BoundingBox, JumpState, Transform};
use crate::assets::TextureData;
use crate::utils::Mesh;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Vehicle,
    Character,
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Vehicle => "vehicle",
            EntityKind::Character => "character",
        }
    }
}

/// A run of the model's index buffer drawn with one material
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPart {
    pub indices: Range<u32>,
    /// Index into `EntityModel::textures`; `None` draws vertex colour only
    pub texture: Option<usize>,
}

/// Geometry and base-colour textures of a loaded model, in model-local space
#[derive(Debug, Clone)]
pub struct EntityModel {
    pub mesh: Mesh,
    pub local_bounds: BoundingBox,
    pub parts: Vec<ModelPart>,
    pub textures: Vec<TextureData>,
}

impl EntityModel {
    /// Untextured model drawn as a single part. `None` when the mesh has no
    /// vertices to bound.
    pub fn from_mesh(mesh: Mesh) -> Option<Self> {
        let parts = vec![ModelPart { indices: 0..mesh.indices.len() as u32, texture: None }];
        Self::with_parts(mesh, parts, Vec::new())
    }

    /// Parts pointing past the index buffer or at a missing texture are
    /// clamped or left untextured.
    pub fn with_parts(mesh: Mesh, parts: Vec<ModelPart>, textures: Vec<TextureData>) -> Option<Self> {
        let local_bounds = mesh.bounds()?;
        let count = mesh.indices.len() as u32;
        let parts = parts
            .into_iter()
            .map(|part| ModelPart {
                indices: part.indices.start.min(count)..part.indices.end.min(count),
                texture: part.texture.filter(|&t| t < textures.len()),
            })
            .filter(|part| !part.indices.is_empty())
            .collect();
        Some(Self { mesh, local_bounds, parts, textures })
    }
}

/// A controllable scene object.
///
/// The model slot is written at most once, when the asset finishes loading.
/// Until then the entity has no geometry and its controller skips it.
pub struct Entity {
    pub kind: EntityKind,
    pub transform: Transform,
    pub jump: JumpState,
    spawn: Transform,
    model: OnceCell<EntityModel>,
}

impl Entity {
    pub fn new(kind: EntityKind, spawn: Transform) -> Self {
        Self {
            kind,
            transform: spawn,
            jump: JumpState::Inactive,
            spawn,
            model: OnceCell::new(),
        }
    }

    pub fn model(&self) -> Option<&EntityModel> {
        self.model.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }

    /// Publish the loaded model. Returns `false` if a model was already attached.
    pub fn attach_model(&self, model: EntityModel) -> bool {
        self.model.set(model).is_ok()
    }

    /// Live world-space box, recomputed from the current transform
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.model()
            .map(|m| m.local_bounds.transformed(&self.transform.matrix()))
    }

    /// Back to the spawn transform, any running jump cancelled
    pub fn reset(&mut self) {
        self.transform = self.spawn;
        self.jump = JumpState::Inactive;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::create_box_mesh;
    use glam::Vec3;

    #[test]
    fn test_model_attaches_once() {
        let entity = Entity::new(EntityKind::Vehicle, Transform::default());
        assert!(!entity.is_loaded());
        assert!(entity.bounds().is_none());

        let model = EntityModel::from_mesh(create_box_mesh(Vec3::ONE)).unwrap();
        assert!(entity.attach_model(model.clone()));
        assert!(!entity.attach_model(model));
        assert!(entity.is_loaded());
    }

    #[test]
    fn test_bounds_follow_transform() {
        let mut entity = Entity::new(EntityKind::Character, Transform::at(Vec3::new(5.0, 0.0, 0.0)).with_scale(0.5));
        entity.attach_model(EntityModel::from_mesh(create_box_mesh(Vec3::splat(2.0))).unwrap());
        let b = entity.bounds().unwrap();
        assert_eq!(b.min, Vec3::new(4.5, -0.5, -0.5));
        assert_eq!(b.max, Vec3::new(5.5, 0.5, 0.5));

        entity.transform.position.x = 0.0;
        assert_eq!(entity.bounds().unwrap().center(), Vec3::ZERO);
    }

    #[test]
    fn test_reset_restores_spawn() {
        let mut entity = Entity::new(EntityKind::Vehicle, Transform::default());
        entity.transform.position = Vec3::new(3.0, 1.0, -2.0);
        entity.transform.rotation = Vec3::new(0.0, 1.0, 0.3);
        entity.jump = JumpState::Active { start: 10.0 };
        entity.reset();
        assert_eq!(entity.transform, Transform::default());
        assert_eq!(entity.jump, JumpState::Inactive);
    }

    #[test]
    fn test_empty_mesh_has_no_model() {
        assert!(EntityModel::from_mesh(Mesh::empty()).is_none());
    }

    #[test]
    fn test_plain_model_is_one_untextured_part() {
        let model = EntityModel::from_mesh(create_box_mesh(Vec3::ONE)).unwrap();
        assert_eq!(model.parts, vec![ModelPart { indices: 0..36, texture: None }]);
        assert!(model.textures.is_empty());
    }

    #[test]
    fn test_parts_are_sanitised() {
        let texture = TextureData { width: 1, height: 1, rgba: vec![255; 4] };
        let parts = vec![
            ModelPart { indices: 0..12, texture: Some(0) },
            ModelPart { indices: 12..100, texture: Some(3) },
            ModelPart { indices: 200..300, texture: None },
        ];
        let model = EntityModel::with_parts(create_box_mesh(Vec3::ONE), parts, vec![texture]).unwrap();
        assert_eq!(
            model.parts,
            vec![
                ModelPart { indices: 0..12, texture: Some(0) },
                ModelPart { indices: 12..36, texture: None },
            ]
        );
    }
}
