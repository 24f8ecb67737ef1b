// MODEL: Scene data
pub mod bounds;
pub mod transform;
pub mod jump;
pub mod entity;
pub mod camera;
pub mod scene;

pub use bounds::BoundingBox;
pub use transform::Transform;
pub use jump::JumpState;
pub use entity::{Entity, EntityKind, EntityModel, ModelPart};
pub use camera::Camera;
pub use scene::{Scene, arena_walls};
