use std::cell::RefCell;
use std::rc::Rc;

use wgpu::{Device, Queue};

use crate::assets::{AssetEvent, AssetKind, AssetLoader, AssetPayload, TextureSlot};
use crate::config::AppConfig;
use crate::controller::{CameraController, CollisionWorld, EntityController, InputState, MotionOutcome};
use crate::model::{Camera, EntityKind, Scene};
use crate::ui::{self, HudInfo, UiState};
use crate::view::RenderState;

/// What the simulation did in one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub vehicle: MotionOutcome,
    pub character: MotionOutcome,
    pub reset: bool,
}

/// Runs both entity controllers once per frame against the shared walls.
///
/// The vehicle goes first; the character then sees the vehicle's updated box.
pub struct FrameScheduler {
    pub vehicle: EntityController,
    pub character: EntityController,
    pub world: CollisionWorld,
}

impl FrameScheduler {
    pub fn new(config: &AppConfig, scene: &Scene) -> Self {
        Self {
            vehicle: EntityController::new(config.vehicle.motion.clone()),
            character: EntityController::new(config.character.motion.clone()),
            world: CollisionWorld::new(scene.walls),
        }
    }

    pub fn tick(&self, scene: &mut Scene, input: &mut InputState, now: f64) -> FrameReport {
        let reset = input.take_reset();
        if reset {
            scene.vehicle.reset();
            tracing::info!("vehicle reset to spawn");
        }

        let others: Vec<_> = scene.character.bounds().into_iter().collect();
        let vehicle = self.vehicle.update(&mut scene.vehicle, input, now, &self.world, &others);

        let others: Vec<_> = scene.vehicle.bounds().into_iter().collect();
        let character = self.character.update(&mut scene.character, input, now, &self.world, &others);

        FrameReport { vehicle, character, reset }
    }
}

/// Main loop state and update logic, shared by native and web
pub struct FrameLoopContext {
    pub config: AppConfig,
    pub scene: Scene,
    pub input_state: Rc<RefCell<InputState>>,
    pub camera: Camera,
    pub camera_controller: CameraController,
    pub scheduler: FrameScheduler,
    pub assets: AssetLoader,
    pub ui_state: UiState,
    pub egui_ctx: egui::Context,
    last_time: Option<f64>,
    fps: f32,
}

impl FrameLoopContext {
    /// Build the scene and start loading every asset in the background
    pub fn new(config: AppConfig, width: u32, height: u32, input_state: Rc<RefCell<InputState>>) -> Self {
        let scene = Scene::new(&config);
        let camera = Camera::new(width, height, &config.camera);
        let camera_controller = CameraController::new(config.camera.damping);
        let scheduler = FrameScheduler::new(&config, &scene);

        let mut assets = AssetLoader::new();
        assets.request(AssetKind::Model(EntityKind::Vehicle), config.asset_path(&config.vehicle.model_path));
        assets.request(AssetKind::Model(EntityKind::Character), config.asset_path(&config.character.model_path));
        assets.request(AssetKind::Texture(TextureSlot::Ground), config.asset_path(&config.ground_texture));
        assets.request(AssetKind::Texture(TextureSlot::Wall), config.asset_path(&config.wall_texture));

        Self {
            config,
            scene,
            input_state,
            camera,
            camera_controller,
            scheduler,
            assets,
            ui_state: UiState::default(),
            egui_ctx: egui::Context::default(),
            last_time: None,
            fps: 0.0,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        tracing::debug!(width, height, "resize");
        self.camera.set_aspect(width, height);
    }

    /// Advance one frame at time `now` (ms) and prepare everything for drawing.
    ///
    /// Returns the egui platform output so the caller can apply cursor and
    /// clipboard changes.
    pub fn update(
        &mut self,
        device: &Device,
        queue: &Queue,
        render_state: &mut RenderState,
        now: f64,
        raw_input: egui::RawInput,
        dpr: f32,
    ) -> egui::PlatformOutput {
        if let Some(last) = self.last_time {
            let dt = ((now - last) / 1000.0) as f32;
            if dt > 0.0 {
                self.fps = self.fps * 0.9 + (1.0 / dt) * 0.1;
            }
        }
        self.last_time = Some(now);

        for event in self.assets.drain() {
            self.publish_asset(device, queue, render_state, event);
        }

        let (orbit, zoom, show_bounds) = {
            let mut input = self.input_state.borrow_mut();
            self.scheduler.tick(&mut self.scene, &mut input, now);
            (input.consume_orbit(), input.consume_zoom(), input.show_bounds)
        };

        self.camera_controller.apply_drag(orbit.0, orbit.1);
        self.camera_controller.update(&mut self.camera, zoom);

        render_state.show_bounds = show_bounds;
        render_state.prepare(queue, &self.camera, &self.scene);

        let hud = HudInfo {
            fps: self.fps,
            vehicle_loaded: self.scene.vehicle.is_loaded(),
            vehicle_pos: self.scene.vehicle.transform.position,
            character_pos: self.scene.character.transform.position,
            show_bounds,
        };

        self.egui_ctx.set_pixels_per_point(dpr);
        let mut full_output = ui::build_ui(&self.egui_ctx, raw_input, &mut self.ui_state, &hud, &self.config);
        let platform_output = std::mem::take(&mut full_output.platform_output);

        // Tessellate and store for rendering in next step
        let primitives = self.egui_ctx.tessellate(std::mem::take(&mut full_output.shapes), dpr);
        render_state.egui_primitives = Some(primitives);
        render_state.egui_full_output = Some(full_output);
        render_state.egui_dpr = dpr;

        platform_output
    }

    fn publish_asset(&mut self, device: &Device, queue: &Queue, render_state: &mut RenderState, event: AssetEvent) {
        let AssetEvent { kind, path, result } = event;
        match (kind, result) {
            (AssetKind::Model(kind), Ok(AssetPayload::Model(model))) => {
                let entity = self.scene.entity(kind);
                render_state.attach_entity_model(device, queue, kind, &model);
                let triangles = model.mesh.indices.len() / 3;
                let textures = model.textures.len();
                if entity.attach_model(model) {
                    tracing::info!(entity = kind.label(), %path, triangles, textures, "model loaded");
                }
            }
            (AssetKind::Texture(slot), Ok(AssetPayload::Texture(texture))) => {
                render_state.set_texture(device, queue, slot, &texture);
                tracing::info!(?slot, %path, width = texture.width, height = texture.height, "texture loaded");
            }
            (kind, Ok(_)) => {
                tracing::warn!(?kind, %path, "asset payload does not match request");
            }
            (kind, Err(err)) => {
                tracing::warn!(?kind, %path, %err, "asset failed to load");
            }
        }
    }
}
