//! Window, event loop, and the startup sequence.
//!
//! Startup is all-or-nothing: the model is loaded and sampled before the event
//! loop exists, and the GPU is brought up on the first `resumed`. Any failure
//! is stored, the loop exits, and no frame is ever requested.

use std::path::Path;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::config::FlowConfig;
use crate::driver::FrameDriver;
use crate::error::{AssetLoadError, SessionError};
use crate::gpu::GpuState;
use crate::loader::MeshData;
use crate::sampler::{sample_geometry, ParticleGeometry};

/// Load `model_path`, sample its vertices, and run until the window closes.
pub fn run<P: AsRef<Path>>(model_path: P, config: FlowConfig) -> Result<(), SessionError> {
    let mesh = MeshData::load(model_path)?;
    let geometry = sample_with_config(&mesh, &config)?;
    run_geometry(geometry, config)
}

/// Sample `mesh`, seeded from `config.seed` when one is set.
pub fn sample_with_config(mesh: &MeshData, config: &FlowConfig) -> Result<ParticleGeometry, AssetLoadError> {
    match config.seed {
        Some(seed) => sample_geometry(mesh, &mut StdRng::seed_from_u64(seed)),
        None => sample_geometry(mesh, &mut rand::thread_rng()),
    }
}

/// Run an already sampled particle set until the window closes.
pub fn run_geometry(geometry: ParticleGeometry, config: FlowConfig) -> Result<(), SessionError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(geometry, config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct App {
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    geometry: ParticleGeometry,
    config: FlowConfig,
    driver: FrameDriver,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    error: Option<SessionError>,
}

impl App {
    fn new(geometry: ParticleGeometry, config: FlowConfig) -> Self {
        let driver = FrameDriver::new(geometry.grid, geometry.count);
        Self {
            window: None,
            gpu_state: None,
            geometry,
            config,
            driver,
            mouse_pressed: false,
            last_mouse_pos: None,
            error: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<(), SessionError> {
        let window_attrs = Window::default_attributes()
            .with_title(self.config.window.title.as_str())
            .with_inner_size(LogicalSize::new(self.config.window.width, self.config.window.height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu_state = pollster::block_on(GpuState::new(window.clone(), &self.geometry, &self.config))?;

        log::info!("Session started with {} particles", self.geometry.count);
        window.request_redraw();
        self.window = Some(window);
        self.gpu_state = Some(gpu_state);
        Ok(())
    }

    #[cfg(feature = "egui")]
    fn forward_to_ui(&mut self, event: &WindowEvent) -> bool {
        match (&self.window, &mut self.gpu_state) {
            (Some(window), Some(gpu_state)) => gpu_state.egui.on_window_event(window, event),
            _ => false,
        }
    }

    #[cfg(not(feature = "egui"))]
    fn forward_to_ui(&mut self, _event: &WindowEvent) -> bool {
        false
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(gpu_state)) = (&self.window, &mut self.gpu_state) else {
            return;
        };

        let tick = self.driver.tick();
        gpu_state.camera.update();

        #[cfg(feature = "egui")]
        {
            let stats = crate::panel::PanelStats {
                fps: self.driver.time().fps(),
                particle_count: gpu_state.simulation().particle_count(),
                steps: gpu_state.simulation().step_count(),
                paused: self.driver.time().is_paused(),
            };
            gpu_state.egui.begin_frame(window);
            crate::panel::tweak_panel(&gpu_state.egui.ctx, &mut self.config, &stats);
            let output = gpu_state.egui.end_frame(window);
            gpu_state.set_ui_output(output);
        }

        // Read the tweak values after the panel had its chance to change them
        let uniforms = self.driver.step_uniforms(&tick, &self.config);

        match gpu_state.render(&uniforms, &self.config.render) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu_state.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory, exiting");
                event_loop.exit();
                return;
            }
            Err(e) => log::warn!("Render error: {:?}", e),
        }

        window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.error.is_some() {
            return;
        }
        if let Err(err) = self.start(event_loop) {
            self.error = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let ui_consumed = self.forward_to_ui(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let (Some(window), Some(gpu_state)) = (&self.window, &mut self.gpu_state) {
                    gpu_state.resize(physical_size, window.scale_factor());
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let (Some(window), Some(gpu_state)) = (&self.window, &mut self.gpu_state) {
                    gpu_state.resize(window.inner_size(), scale_factor);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Space),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } if !ui_consumed => {
                let time = self.driver.time_mut();
                time.toggle_pause();
                log::info!("{}", if time.is_paused() { "Paused" } else { "Resumed" });
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed && !ui_consumed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        let dx = position.x - last_x;
                        let dy = position.y - last_y;
                        if let Some(gpu_state) = &mut self.gpu_state {
                            gpu_state.camera.rotate(dx as f32, dy as f32);
                        }
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } if !ui_consumed => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.camera.zoom(scroll);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}
