//! Application event loop and the per-frame orchestration.
//!
//! Each redraw runs the same sequence:
//! 1. Measure the frame time
//! 2. Apply one-shot input actions (flashlight, vsync, fullscreen, cursor, FOV)
//! 3. Update the scene: camera and collision, lights, particles
//! 4. Upload camera, light and instance data
//! 5. Draw the opaque batch, the sorted transparent batch, then the particles
//! 6. Present the frame

use std::{iter, path::PathBuf, sync::Arc};

use instant::{Duration, Instant};
use rand::{SeedableRng, rngs::StdRng};
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{CursorGrabMode, Fullscreen, Window},
};

use crate::{
    config::AppConfig,
    context::Context,
    data_structures::{
        instance::InstanceRaw,
        model::{DrawModel, GpuMesh},
    },
    input::{Action, InputState},
    render::{FramePlan, PipelineKind},
    resources::mesh::MeshData,
    scene::{CRYSTAL_MODEL, MeshKind, Scene, TEXTURE_FILES},
};

/// Longest step the simulation takes; longer stalls are cut down to it.
pub const MAX_FRAME_TIME: Duration = Duration::from_millis(100);

/// Time since the previous frame, clamped so a stall never becomes one huge step.
pub fn frame_time(elapsed: Duration) -> Duration {
    elapsed.min(MAX_FRAME_TIME)
}

/// Counts frames and reports the rate once per period.
#[derive(Debug, Clone, PartialEq)]
pub struct FpsCounter {
    period: Duration,
    elapsed: Duration,
    frames: u32,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl FpsCounter {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            elapsed: Duration::ZERO,
            frames: 0,
        }
    }

    /// Records one frame; returns frames per second when a period completes.
    pub fn tick(&mut self, dt: Duration) -> Option<f32> {
        self.frames += 1;
        self.elapsed += dt;
        if self.elapsed < self.period {
            return None;
        }
        let fps = self.frames as f32 / self.elapsed.as_secs_f32();
        self.frames = 0;
        self.elapsed = Duration::ZERO;
        Some(fps)
    }
}

/// Everything that exists once the window and the GPU are up.
#[derive(Debug)]
pub struct AppState {
    pub(crate) ctx: Context,
    scene: Scene<GpuMesh>,
    input: InputState,
    config: AppConfig,
    config_path: PathBuf,
    particle_draws: u32,
    fps: FpsCounter,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>, config: AppConfig, config_path: PathBuf) -> anyhow::Result<Self> {
        let mut ctx = Context::new(window, &config).await?;
        ctx.load_textures(&TEXTURE_FILES).await?;
        let crystal = ctx.load_mesh(CRYSTAL_MODEL).await?;
        let cube = MeshData::cube();

        let seed = config.maze.seed.unwrap_or_else(rand::random);
        log::info!("maze seed {seed}");
        let mut rng = StdRng::seed_from_u64(seed);
        let mut scene = Scene::assemble(&config, &mut rng, |kind, name| {
            let data = match kind {
                MeshKind::Cube => &cube,
                MeshKind::Crystal => &crystal,
            };
            GpuMesh::new(&ctx.device, data, name)
        })?;
        scene.projection.resize(ctx.config.width, ctx.config.height);

        Ok(Self {
            ctx,
            scene,
            input: InputState::default(),
            config,
            config_path,
            particle_draws: 0,
            fps: FpsCounter::default(),
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.resize(width, height);
            self.scene.projection.resize(width, height);
            self.is_surface_configured = true;
        }
    }

    fn grab_cursor(&mut self) {
        let window = &self.ctx.window;
        let grabbed = window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
        match grabbed {
            Ok(()) => {
                window.set_cursor_visible(false);
                self.input.mouse.capture();
            }
            Err(e) => log::warn!("cannot grab the cursor: {e}"),
        }
    }

    fn release_cursor(&mut self) {
        if let Err(e) = self.ctx.window.set_cursor_grab(CursorGrabMode::None) {
            log::warn!("cannot release the cursor: {e}");
        }
        self.ctx.window.set_cursor_visible(true);
        self.input.mouse.release();
    }

    fn save_config(&self) {
        if let Err(e) = self.config.save(&self.config_path) {
            log::warn!("{e:?}");
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::ToggleVsync => {
                self.config.vsync = !self.config.vsync;
                self.ctx.set_vsync(self.config.vsync);
                self.save_config();
            }
            Action::ToggleFullscreen => {
                self.config.window.fullscreen = !self.config.window.fullscreen;
                self.ctx
                    .window
                    .set_fullscreen(self.config.window.fullscreen.then_some(Fullscreen::Borderless(None)));
                self.save_config();
            }
            Action::GrabCursor => self.grab_cursor(),
            Action::ReleaseCursor => self.release_cursor(),
            Action::ToggleFlashlight | Action::ResetFov | Action::CycleTint(_) => {
                log::debug!("{action:?} is handled by the scene");
            }
        }
    }

    fn update(&mut self, dt: Duration) {
        let actions = self.input.take_actions();
        for action in self.scene.apply_actions(actions) {
            self.handle_action(action);
        }

        self.scene.update(dt.as_secs_f32(), &mut self.input);

        let ctx = &mut self.ctx;
        ctx.camera.write(&ctx.queue, &self.scene.camera, &self.scene.projection);
        self.scene.lights.write_uniforms(&mut ctx.lights.uniform);
        ctx.lights.write(&ctx.queue);

        for (_, object) in self.scene.registry.iter() {
            object.mesh.write_instance(&ctx.queue, object.to_raw());
        }

        let raws: Vec<InstanceRaw> = self
            .scene
            .fountain
            .draw_list()
            .iter()
            .take(ctx.particles.capacity)
            .map(|draw| draw.instance.to_raw(draw.color))
            .collect();
        if !raws.is_empty() {
            ctx.queue
                .write_buffer(&ctx.particles.instances, 0, bytemuck::cast_slice(&raws));
        }
        self.particle_draws = raws.len() as u32;

        if let Some(fps) = self.fps.tick(dt) {
            let [r, g, b] = self.scene.tint().rgb();
            ctx.window.set_title(&format!(
                "{} - {fps:.0} FPS | tint {r:.1} {g:.1} {b:.1}",
                self.config.window.title
            ));
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        // invoke main render loop
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let ctx = &self.ctx;
        let (target, resolve_target) = match &ctx.msaa_target {
            Some(msaa) => (&msaa.view, Some(&view)),
            None => (&view, None),
        };

        let plan = FramePlan::build(&self.scene.registry, self.scene.camera.eye());

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    depth_slice: None,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            let mut current = None;
            for call in plan.opaque.iter().chain(plan.transparent.iter()) {
                let Some(object) = self.scene.registry.get(call.id) else {
                    continue;
                };
                if current != Some(call.pipeline) {
                    render_pass.set_pipeline(ctx.pipelines.get(call.pipeline));
                    current = Some(call.pipeline);
                }
                render_pass.draw_object(
                    &object.mesh,
                    ctx.material_bind_group(&object.material),
                    &ctx.camera.bind_group,
                    &ctx.lights.bind_group,
                );
            }

            if self.particle_draws > 0 {
                render_pass.set_pipeline(ctx.pipelines.get(PipelineKind::Transparent));
                render_pass.set_vertex_buffer(1, ctx.particles.instances.slice(..));
                for i in 0..self.particle_draws {
                    render_pass.draw_mesh_instanced(
                        &ctx.particles.mesh,
                        &ctx.white,
                        i..i + 1,
                        &ctx.camera.bind_group,
                        &ctx.lights.bind_group,
                    );
                }
            }
        }

        ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

pub struct App {
    async_runtime: tokio::runtime::Runtime,
    config: AppConfig,
    config_path: PathBuf,
    state: Option<AppState>,
    error: Option<anyhow::Error>,
    last_time: Instant,
}

impl App {
    fn new(async_runtime: tokio::runtime::Runtime, config: AppConfig, config_path: PathBuf) -> Self {
        Self {
            async_runtime,
            config,
            config_path,
            state: None,
            error: None,
            last_time: Instant::now(),
        }
    }

    fn window_attributes(&self) -> winit::window::WindowAttributes {
        let window = &self.config.window;
        let mut attributes = Window::default_attributes()
            .with_title(window.title.clone())
            .with_inner_size(PhysicalSize::new(window.width, window.height))
            .with_fullscreen(window.fullscreen.then_some(Fullscreen::Borderless(None)));
        if let (Some(x), Some(y)) = (window.x, window.y) {
            attributes = attributes.with_position(PhysicalPosition::new(x, y));
        }
        attributes
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window = match event_loop.create_window(self.window_attributes()) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        let init = AppState::new(window, self.config.clone(), self.config_path.clone());
        match self.async_runtime.block_on(init) {
            Ok(mut state) => {
                let size = state.ctx.window.inner_size();
                state.resize(size.width, size.height);
                state.grab_cursor();
                state.ctx.window.request_redraw();
                self.last_time = Instant::now();
                self.state = Some(state);
            }
            Err(e) => self.fail(event_loop, e.context("startup failed")),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        let Some(state) = &mut self.state else {
            return;
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            state.input.mouse.motion(dx, dy);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };

        if state.input.handle_window_event(&event) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                state.save_config();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::Focused(true) => state.grab_cursor(),
            WindowEvent::Focused(false) => {
                state.release_cursor();
                state.input.clear_held();
            }
            WindowEvent::Moved(position) => {
                state.config.window.x = Some(position.x);
                state.config.window.y = Some(position.y);
            }
            WindowEvent::RedrawRequested => {
                let dt = frame_time(self.last_time.elapsed());
                self.last_time = Instant::now();
                state.update(dt);

                match state.render() {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Opens the window and runs until it is closed.
///
/// Startup failures (no adapter, missing asset, broken shader) are returned.
pub fn run(config_path: impl Into<PathBuf>) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    let config_path = config_path.into();
    let config = AppConfig::load_or_default(&config_path);
    let async_runtime = tokio::runtime::Runtime::new()?;

    let event_loop = EventLoop::new()?;
    let mut app = App::new(async_runtime, config, config_path);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{camera::CameraController, scene::VIEWER_RADIUS};

    #[test]
    fn stalls_are_cut_to_the_longest_step() {
        assert_eq!(frame_time(Duration::from_millis(16)), Duration::from_millis(16));
        assert_eq!(frame_time(Duration::from_secs(3)), MAX_FRAME_TIME);
    }

    #[test]
    fn longest_sprint_step_cannot_cross_a_wall() {
        let controller = CameraController::default();
        let step = controller.speed * controller.sprint_multiplier * MAX_FRAME_TIME.as_secs_f32();
        // a wall cube is one unit thick and the viewer box adds its radius on both sides
        assert!(step < 1.0 + 2.0 * VIEWER_RADIUS);
    }

    #[test]
    fn fps_is_reported_once_per_period() {
        let mut fps = FpsCounter::default();
        let frame = Duration::from_millis(20);
        let reports: Vec<f32> = (0..100).filter_map(|_| fps.tick(frame)).collect();
        assert_eq!(reports.len(), 2);
        assert!((reports[0] - 50.0).abs() < 0.01);
    }
}
