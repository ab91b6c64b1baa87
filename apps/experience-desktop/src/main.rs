use anyhow::Result;
use clap::Parser;
use egui::Context as EguiContext;
use experience_assets::Manifest;
use experience_core::{Experience, ExperienceConfig, ExperienceContext, HostEvent};
use experience_host::Host;
use experience_render::{RenderBackend, RenderError};
use experience_render_wgpu::{Overlay, WgpuBackend};
use experience_tools::DEBUG_HASH;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

/// Radians of orbit per pixel of drag.
const ROTATE_SPEED: f32 = 0.005;
/// Dolly factor per scroll line.
const ZOOM_STEP: f32 = 0.95;

#[derive(Parser)]
#[command(name = "experience-desktop", about = "Run an experience in a window")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Experience config file (.json or .yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Resource manifest (.json or .yaml); overrides the config's manifest
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Directory manifest paths are relative to
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Location hash to start with; `#debug` shows the debug panel
    #[arg(long)]
    hash: Option<String>,

    /// Show the debug panel, same as `--hash '#debug'`
    #[arg(long)]
    debug: bool,
}

fn load_config(cli: &Cli) -> Result<ExperienceConfig> {
    let mut config = match &cli.config {
        Some(path) => ExperienceConfig::load(path)?,
        None => ExperienceConfig::default(),
    };
    if let Some(path) = &cli.manifest {
        config.manifest = Manifest::load(path)?;
        if cli.assets.is_none() {
            if let Some(dir) = path.parent() {
                config.asset_root = dir.to_path_buf();
            }
        }
    }
    if let Some(dir) = &cli.assets {
        config.asset_root = dir.clone();
    }
    if let Some(hash) = &cli.hash {
        config.location_hash = hash.clone();
    }
    if cli.debug {
        config.location_hash = DEBUG_HASH.to_string();
    }
    Ok(config)
}

/// winit window seen through the host seam.
struct WinitHost {
    window: Arc<Window>,
}

impl Host for WinitHost {
    fn inner_size(&self) -> (u32, u32) {
        let size = self
            .window
            .inner_size()
            .to_logical::<f64>(self.window.scale_factor());
        (size.width.round() as u32, size.height.round() as u32)
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.window.scale_factor()
    }

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn request_frame(&self) {
        self.window.request_redraw();
    }
}

/// Tessellated egui output waiting for the next scene frame.
struct UiFrame {
    jobs: Vec<egui::ClippedPrimitive>,
    textures: egui::TexturesDelta,
    pixels_per_point: f32,
}

type SharedUiFrame = Rc<RefCell<Option<UiFrame>>>;

/// Paints the debug panel over the scene pass.
struct EguiOverlay {
    renderer: egui_wgpu::Renderer,
    frame: SharedUiFrame,
}

impl Overlay for EguiOverlay {
    fn paint(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        size: [u32; 2],
    ) {
        let Some(frame) = self.frame.borrow_mut().take() else {
            return;
        };
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: size,
            pixels_per_point: frame.pixels_per_point,
        };
        for (id, delta) in &frame.textures.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }
        self.renderer
            .update_buffers(device, queue, encoder, &frame.jobs, &screen);
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.renderer.render(&mut pass, &frame.jobs, &screen);
        }
        for id in &frame.textures.free {
            self.renderer.free_texture(id);
        }
    }
}

struct DesktopApp {
    config: ExperienceConfig,
    host: Option<WinitHost>,
    context: Option<ExperienceContext>,
    experience: Option<Rc<RefCell<Experience>>>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    ui_frame: SharedUiFrame,
    dragging: bool,
    cursor: Option<PhysicalPosition<f64>>,
}

impl DesktopApp {
    fn new(config: ExperienceConfig) -> Self {
        Self {
            config,
            host: None,
            context: None,
            experience: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            ui_frame: Rc::new(RefCell::new(None)),
            dragging: false,
            cursor: None,
        }
    }

    fn backend_factory(
        window: Arc<Window>,
        ui_frame: SharedUiFrame,
    ) -> impl FnMut() -> Result<Box<dyn RenderBackend>, RenderError> + 'static {
        move || {
            let size = window.inner_size();
            let mut backend = WgpuBackend::new(window.clone(), size.width, size.height)?;
            let renderer = egui_wgpu::Renderer::new(
                backend.device(),
                backend.surface_format(),
                None,
                1,
                false,
            );
            backend.set_overlay(Box::new(EguiOverlay {
                renderer,
                frame: ui_frame.clone(),
            }));
            tracing::info!(adapter = backend.adapter_name(), "GPU initialized");
            Ok(Box::new(backend) as Box<dyn RenderBackend>)
        }
    }

    fn pump(&mut self, event: HostEvent) {
        let (Some(host), Some(experience)) = (&self.host, &self.experience) else {
            return;
        };
        if let Err(e) = experience.borrow_mut().handle(host, event) {
            tracing::error!("frame failed: {e}");
        }
    }

    fn run_ui(&mut self) {
        let (Some(host), Some(egui_winit), Some(experience)) =
            (&self.host, &mut self.egui_winit, &self.experience)
        else {
            return;
        };
        if !experience.borrow().debug().is_active() {
            return;
        }
        let raw_input = egui_winit.take_egui_input(&host.window);
        let output = self.egui_ctx.run(raw_input, |ctx| {
            experience.borrow_mut().debug_mut().ui(ctx);
        });
        egui_winit.handle_platform_output(&host.window, output.platform_output);
        let jobs = self
            .egui_ctx
            .tessellate(output.shapes, output.pixels_per_point);
        *self.ui_frame.borrow_mut() = Some(UiFrame {
            jobs,
            textures: output.textures_delta,
            pixels_per_point: output.pixels_per_point,
        });
    }

    fn shutdown(&mut self) {
        self.experience = None;
        if let Some(context) = &mut self.context {
            if context.destroy() {
                tracing::info!("experience destroyed");
            }
        }
    }
}

impl ApplicationHandler for DesktopApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.host.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Experience")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                tracing::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let mut context = ExperienceContext::new(Self::backend_factory(
            window.clone(),
            self.ui_frame.clone(),
        ));
        let host = WinitHost {
            window: window.clone(),
        };
        let experience = match context.get_or_create(&host, &self.config) {
            Ok(e) => e,
            Err(e) => {
                tracing::error!("failed to start experience: {e}");
                event_loop.exit();
                return;
            }
        };

        self.egui_winit = Some(egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        ));
        self.host = Some(host);
        self.context = Some(context);
        self.experience = Some(experience);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(host), Some(egui_winit)) = (&self.host, &mut self.egui_winit) {
            let response = egui_winit.on_window_event(&host.window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                self.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                self.pump(HostEvent::Resized);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.dragging = state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let (true, Some(last), Some(experience)) =
                    (self.dragging, self.cursor, &self.experience)
                {
                    let dx = (position.x - last.x) as f32;
                    let dy = (position.y - last.y) as f32;
                    experience
                        .borrow_mut()
                        .camera_mut()
                        .orbit(-dx * ROTATE_SPEED, -dy * ROTATE_SPEED);
                }
                self.cursor = Some(position);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 50.0,
                };
                if let Some(experience) = &self.experience {
                    experience.borrow_mut().camera_mut().zoom(ZOOM_STEP.powf(lines));
                }
            }
            WindowEvent::RedrawRequested => {
                self.run_ui();
                self.pump(HostEvent::AnimationFrame);
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    tracing::info!("experience-desktop starting");
    let config = load_config(&cli)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = DesktopApp::new(config);
    event_loop.run_app(&mut app)?;

    Ok(())
}
