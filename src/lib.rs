// Re-export all public modules so they can be used from main.rs
pub mod logging;
pub mod utils;
pub mod ui;
pub mod config;
pub mod assets;

// MVC Architecture
pub mod model;
pub mod view;
pub mod controller;

#[cfg(target_arch = "wasm32")]
use std::{cell::RefCell, collections::HashSet, rc::Rc};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{closure::Closure, prelude::wasm_bindgen, JsCast, JsValue};
#[cfg(target_arch = "wasm32")]
use web_sys::{Document, Event, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent, Window};

#[cfg(target_arch = "wasm32")]
use config::AppConfig;
#[cfg(target_arch = "wasm32")]
use controller::{input::wasm, FrameLoopContext, InputEvent, InputProcessor, InputState};
#[cfg(target_arch = "wasm32")]
use view::{GpuContext, RenderState};

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    logging::init();
    let (window, document, canvas) = init_canvas()?;
    setup_app(&window, &document, &canvas).await
}

/// Main application setup for WASM
#[cfg(target_arch = "wasm32")]
async fn setup_app(
    window: &Window,
    document: &Document,
    canvas: &HtmlCanvasElement,
) -> Result<(), JsValue> {
    let (width, height) = window_size(window);
    canvas.set_width(width);
    canvas.set_height(height);

    // Initialize GPU
    let mut gpu = GpuContext::new(canvas, width, height)
        .await
        .map_err(|e| js_error(format!("GPU init failed: {e}")))?;

    let config = AppConfig::default();
    let uv_repeat = (config.arena.ground_uv_repeat, config.arena.wall_uv_repeat);
    let input_state = Rc::new(RefCell::new(InputState::new()));
    let egui_events: Rc<RefCell<Vec<egui::Event>>> = Rc::new(RefCell::new(Vec::new()));

    let mut frame_ctx = FrameLoopContext::new(config, width, height, input_state.clone());
    let mut render_state = RenderState::new(
        &gpu.device,
        &gpu.queue,
        gpu.format,
        width,
        height,
        &frame_ctx.scene,
        uv_repeat,
    );

    setup_input_listeners(document, window, canvas, &frame_ctx, input_state, egui_events.clone())?;

    // Continuous redraw using requestAnimationFrame
    let f = RcCellCallback::new(window.clone(), {
        let window = window.clone();
        let canvas = canvas.clone();

        move || {
            let now = window.performance().map(|p| p.now()).unwrap_or(0.0);
            handle_resize(&window, &canvas, &mut gpu, &mut frame_ctx, &mut render_state);

            // Build egui input from queued events
            let dpr = window.device_pixel_ratio() as f32;
            let mut raw_input = egui::RawInput::default();
            raw_input.time = Some(now / 1000.0);
            raw_input.screen_rect = Some(egui::Rect::from_min_size(
                egui::Pos2::new(0.0, 0.0),
                egui::vec2(render_state.width as f32 / dpr, render_state.height as f32 / dpr),
            ));
            raw_input.events.extend(egui_events.borrow_mut().drain(..));

            let _ = frame_ctx.update(&gpu.device, &gpu.queue, &mut render_state, now, raw_input, dpr);

            match render_state.draw_frame(&gpu.device, &gpu.queue, &gpu.surface) {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    let (w, h) = (gpu.config.width, gpu.config.height);
                    gpu.resize(w, h);
                }
                Err(e) => tracing::warn!(?e, "frame dropped"),
            }
        }
    });
    f.start();

    Ok(())
}

/// Keep the canvas, surface, depth buffer and camera in step with the browser window
#[cfg(target_arch = "wasm32")]
fn handle_resize(
    window: &Window,
    canvas: &HtmlCanvasElement,
    gpu: &mut GpuContext,
    frame_ctx: &mut FrameLoopContext,
    render_state: &mut RenderState,
) {
    let (w, h) = window_size(window);
    if w == render_state.width && h == render_state.height {
        return;
    }
    canvas.set_width(w);
    canvas.set_height(h);
    gpu.resize(w, h);
    render_state.resize(&gpu.device, w, h);
    frame_ctx.resize(w, h);
}

/// Drawable size in physical pixels
#[cfg(target_arch = "wasm32")]
fn window_size(window: &Window) -> (u32, u32) {
    let dpr = window.device_pixel_ratio();
    let css_w = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0);
    let css_h = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0);
    (((css_w * dpr) as u32).max(1), ((css_h * dpr) as u32).max(1))
}

/// Setup all input event listeners. Callbacks only write `InputState` and the
/// egui event queue; the frame loop reads both once per frame.
#[cfg(target_arch = "wasm32")]
fn setup_input_listeners(
    document: &Document,
    window: &Window,
    canvas: &HtmlCanvasElement,
    frame_ctx: &FrameLoopContext,
    input_state: Rc<RefCell<InputState>>,
    egui_events: Rc<RefCell<Vec<egui::Event>>>,
) -> Result<(), JsValue> {
    let config = &frame_ctx.config;
    let input_processor = InputProcessor::new(config.reset_key.clone(), config.toggle_bounds_key.clone());

    // Keys the page should not scroll or type with
    let bound_keys: HashSet<String> = config
        .vehicle
        .motion
        .bindings
        .all_keys()
        .chain(config.character.motion.bindings.all_keys())
        .map(str::to_string)
        .collect();

    // Keyboard down
    {
        let input_state = input_state.clone();
        let input_processor = input_processor.clone();
        let bound_keys = bound_keys.clone();
        let keydown = Closure::wrap(Box::new(move |e: KeyboardEvent| {
            if bound_keys.contains(&e.code()) {
                e.prevent_default();
            }
            let event = wasm::keyboard_event_to_input(&e, true);
            input_processor.handle(&mut input_state.borrow_mut(), &event);
        }) as Box<dyn FnMut(KeyboardEvent)>);
        document.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
        keydown.forget();
    }

    // Keyboard up
    {
        let input_state = input_state.clone();
        let keyup = Closure::wrap(Box::new(move |e: KeyboardEvent| {
            let event = wasm::keyboard_event_to_input(&e, false);
            input_processor.handle(&mut input_state.borrow_mut(), &event);
        }) as Box<dyn FnMut(KeyboardEvent)>);
        document.add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref())?;
        keyup.forget();
    }

    // Focus loss - clear all keys
    {
        let input_state = input_state.clone();
        let blur = Closure::wrap(Box::new(move |_e: Event| {
            input_state.borrow_mut().process_event(&InputEvent::FocusLost);
        }) as Box<dyn FnMut(Event)>);
        window.add_event_listener_with_callback("blur", blur.as_ref().unchecked_ref())?;
        blur.forget();
    }

    // Visibility change - clear all keys
    {
        let input_state = input_state.clone();
        let doc = document.clone();
        let visibility = Closure::wrap(Box::new(move |_e: Event| {
            let event = InputEvent::VisibilityChanged { visible: !doc.hidden() };
            input_state.borrow_mut().process_event(&event);
        }) as Box<dyn FnMut(Event)>);
        document.add_event_listener_with_callback("visibilitychange", visibility.as_ref().unchecked_ref())?;
        visibility.forget();
    }

    // Mouse down on the canvas starts an orbit drag unless egui owns the pointer
    {
        let input_state = input_state.clone();
        let egui_events = egui_events.clone();
        let egui_ctx = frame_ctx.egui_ctx.clone();
        let mousedown = Closure::wrap(Box::new(move |e: MouseEvent| {
            let pos = egui::pos2(e.client_x() as f32, e.client_y() as f32);
            egui_events.borrow_mut().push(egui::Event::PointerButton {
                pos,
                button: egui::PointerButton::Primary,
                pressed: true,
                modifiers: egui::Modifiers::default(),
            });
            if !egui_ctx.is_pointer_over_area() {
                input_state.borrow_mut().process_event(&wasm::mouse_click_to_input(&e, true));
            }
        }) as Box<dyn FnMut(MouseEvent)>);
        canvas.add_event_listener_with_callback("mousedown", mousedown.as_ref().unchecked_ref())?;
        mousedown.forget();
    }

    // Mouse up anywhere ends the drag
    {
        let input_state = input_state.clone();
        let egui_events = egui_events.clone();
        let mouseup = Closure::wrap(Box::new(move |e: MouseEvent| {
            let pos = egui::pos2(e.client_x() as f32, e.client_y() as f32);
            egui_events.borrow_mut().push(egui::Event::PointerButton {
                pos,
                button: egui::PointerButton::Primary,
                pressed: false,
                modifiers: egui::Modifiers::default(),
            });
            input_state.borrow_mut().process_event(&wasm::mouse_click_to_input(&e, false));
        }) as Box<dyn FnMut(MouseEvent)>);
        document.add_event_listener_with_callback("mouseup", mouseup.as_ref().unchecked_ref())?;
        mouseup.forget();
    }

    // Mouse move
    {
        let input_state = input_state.clone();
        let mm = Closure::wrap(Box::new(move |e: MouseEvent| {
            let pos = egui::pos2(e.client_x() as f32, e.client_y() as f32);
            egui_events.borrow_mut().push(egui::Event::PointerMoved(pos));
            input_state.borrow_mut().process_event(&wasm::mouse_move_to_input(&e));
        }) as Box<dyn FnMut(MouseEvent)>);
        document.add_event_listener_with_callback("mousemove", mm.as_ref().unchecked_ref())?;
        mm.forget();
    }

    // Context menu prevention
    {
        let contextmenu = Closure::wrap(Box::new(move |e: MouseEvent| {
            e.prevent_default();
        }) as Box<dyn FnMut(MouseEvent)>);
        canvas.add_event_listener_with_callback("contextmenu", contextmenu.as_ref().unchecked_ref())?;
        contextmenu.forget();
    }

    // Mouse wheel zooms the orbit camera
    {
        let wheel = Closure::wrap(Box::new(move |e: WheelEvent| {
            input_state.borrow_mut().process_event(&wasm::mouse_wheel_to_input(&e));
            e.prevent_default();
        }) as Box<dyn FnMut(WheelEvent)>);
        canvas.add_event_listener_with_callback("wheel", wheel.as_ref().unchecked_ref())?;
        wheel.forget();
    }

    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn init_canvas() -> Result<(Window, Document, HtmlCanvasElement), JsValue> {
    let window = web_sys::window().ok_or(js_error("no global `window`"))?;
    let document = window.document().ok_or(js_error("no document on window"))?;
    let body = document.body().ok_or(js_error("no body on document"))?;
    let canvas_el = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| js_error("failed to create canvas"))?;
    canvas_el.set_attribute("style", "position: fixed; inset: 0; width: 100vw; height: 100vh; display: block;")?;
    body.append_child(&canvas_el)?;
    Ok((window, document, canvas_el))
}

#[cfg(target_arch = "wasm32")]
fn js_error<E: Into<String>>(msg: E) -> JsValue {
    JsValue::from_str(&msg.into())
}

#[cfg(target_arch = "wasm32")]
struct RcCellCallback {
    inner: Rc<RefCell<Box<dyn FnMut()>>>,
    window: Window,
}

#[cfg(target_arch = "wasm32")]
impl RcCellCallback {
    fn new(window: Window, f: impl FnMut() + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Box::new(f))),
            window,
        }
    }

    fn start(self) {
        let inner = self.inner.clone();
        let window = self.window.clone();

        let callback = Rc::new(RefCell::new(None::<Closure<dyn FnMut()>>));
        let callback_clone = callback.clone();

        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            inner.borrow_mut().as_mut()();

            // Recursively schedule next frame
            let cb_ref = callback_clone.borrow();
            window
                .request_animation_frame(cb_ref.as_ref().unwrap().as_ref().unchecked_ref())
                .expect("RAF failed");
        }) as Box<dyn FnMut()>));

        self.window
            .request_animation_frame(
                callback.borrow().as_ref().unwrap().as_ref().unchecked_ref(),
            )
            .expect("RAF start failed");

        // Leak the closure to keep it alive
        std::mem::forget(callback);
    }
}
