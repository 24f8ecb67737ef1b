use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::PhysicalKey,
    window::{Window, WindowId},
};

// Import from the library crate
use arena_drive::{
    config::AppConfig,
    controller::{FrameLoopContext, InputEvent, InputProcessor, InputState, MouseButton},
    logging,
    view::{GpuContext, RenderState},
};

/// Pixels per wheel line, to match the browser's `deltaY`
const LINE_HEIGHT: f32 = 100.0;

/// Everything that exists once the window is up
struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    render_state: RenderState,
    frame_ctx: FrameLoopContext,
    egui_state: egui_winit::State,
    input_processor: InputProcessor,
    last_cursor: Option<(f64, f64)>,
}

struct App {
    config: AppConfig,
    started: Instant,
    running: Option<Running>,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: AppConfig) -> Self {
        Self {
            config,
            started: Instant::now(),
            running: None,
            error: None,
        }
    }

    fn start(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<Running> {
        let window_attributes = Window::default_attributes()
            .with_title("Arena Drive")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = Arc::new(event_loop.create_window(window_attributes).context("create window")?);
        let size = window.inner_size();

        let gpu = pollster::block_on(GpuContext::new_native(window.clone(), size.width, size.height))
            .context("wgpu init")?;
        let (width, height) = (gpu.config.width, gpu.config.height);

        let config = self.config.clone();
        let uv_repeat = (config.arena.ground_uv_repeat, config.arena.wall_uv_repeat);
        let input_processor = InputProcessor::new(config.reset_key.clone(), config.toggle_bounds_key.clone());
        let frame_ctx = FrameLoopContext::new(config, width, height, Rc::new(RefCell::new(InputState::new())));
        let render_state = RenderState::new(&gpu.device, &gpu.queue, gpu.format, width, height, &frame_ctx.scene, uv_repeat);

        let egui_state = egui_winit::State::new(
            frame_ctx.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
            None,
        );

        tracing::info!(width, height, assets = %self.config.asset_base, "window ready");

        Ok(Running {
            window,
            gpu,
            render_state,
            frame_ctx,
            egui_state,
            input_processor,
            last_cursor: None,
        })
    }
}

impl Running {
    fn send(&mut self, event: InputEvent) {
        let mut state = self.frame_ctx.input_state.borrow_mut();
        self.input_processor.handle(&mut state, &event);
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.gpu.resize(width, height);
        self.render_state.resize(&self.gpu.device, width, height);
        self.frame_ctx.resize(width, height);
    }

    /// Map a window event onto the platform-independent input events
    fn input(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    // winit key codes are named like KeyboardEvent.code
                    let key = format!("{code:?}");
                    match event.state {
                        ElementState::Pressed => self.send(InputEvent::KeyDown(key)),
                        ElementState::Released => self.send(InputEvent::KeyUp(key)),
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    winit::event::MouseButton::Left => MouseButton::Left,
                    winit::event::MouseButton::Right => MouseButton::Right,
                    winit::event::MouseButton::Middle => MouseButton::Middle,
                    _ => return,
                };
                self.send(InputEvent::MouseClick { button, is_down: *state == ElementState::Pressed });
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some((lx, ly)) = self.last_cursor {
                    let (dx, dy) = ((position.x - lx) as f32, (position.y - ly) as f32);
                    self.send(InputEvent::MouseMove { dx, dy });
                }
                self.last_cursor = Some((position.x, position.y));
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let delta_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y * LINE_HEIGHT,
                    MouseScrollDelta::PixelDelta(p) => -p.y as f32,
                };
                self.send(InputEvent::MouseWheel { delta_y });
            }
            WindowEvent::Focused(false) => self.send(InputEvent::FocusLost),
            WindowEvent::Occluded(occluded) => self.send(InputEvent::VisibilityChanged { visible: !occluded }),
            _ => {}
        }
    }

    fn redraw(&mut self, now: f64, event_loop: &ActiveEventLoop) {
        let raw_input = self.egui_state.take_egui_input(&self.window);
        let dpr = self.window.scale_factor() as f32;
        let platform_output = self.frame_ctx.update(
            &self.gpu.device,
            &self.gpu.queue,
            &mut self.render_state,
            now,
            raw_input,
            dpr,
        );
        self.egui_state.handle_platform_output(&self.window, platform_output);

        match self.render_state.draw_frame(&self.gpu.device, &self.gpu.queue, &self.gpu.surface) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = self.window.inner_size();
                self.resize(size.width, size.height);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::error!("surface out of memory");
                event_loop.exit();
            }
            Err(e) => tracing::warn!(?e, "frame dropped"),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(running) => self.running = Some(running),
            Err(err) => {
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let now = self.started.elapsed().as_secs_f64() * 1000.0;
        let Some(running) = self.running.as_mut() else { return; };
        if running.window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => running.resize(size.width, size.height),
            WindowEvent::RedrawRequested => running.redraw(now, event_loop),
            _ => {
                // egui gets first pick; the arena only sees what it leaves
                let consumed = running.egui_state.on_window_event(&running.window, &event).consumed;
                let passthrough = matches!(
                    event,
                    WindowEvent::MouseInput { state: ElementState::Released, .. }
                        | WindowEvent::CursorMoved { .. }
                        | WindowEvent::KeyboardInput { .. }
                        | WindowEvent::Focused(false)
                );
                if !consumed || passthrough {
                    running.input(&event);
                }
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = &self.running {
            running.window.request_redraw();
        }
    }
}

fn main() -> anyhow::Result<()> {
    logging::init();

    let event_loop = EventLoop::new()?;
    let mut app = App::new(AppConfig::from_env());
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
