// CONTROLLER: Input, motion, collision and the update loop
pub mod input;
pub mod collision;
pub mod motion;
pub mod camera_controller;
pub mod frame_loop;

pub use input::{InputEvent, InputState, InputProcessor, KeyBindings, MouseButton};
pub use collision::CollisionWorld;
pub use motion::{EntityController, MotionOutcome};
pub use camera_controller::CameraController;
pub use frame_loop::{FrameLoopContext, FrameReport, FrameScheduler};
