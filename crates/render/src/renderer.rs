use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;

use experience_scene::{NodeKind, Scene};
use glam::{Mat4, Vec3};

use crate::rig::RendererSettings;

/// Camera parameters a backend needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub eye: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl CameraView {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

impl Default for CameraView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(6.0, 4.0, 8.0),
            target: Vec3::ZERO,
            fov_degrees: 35.0,
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("renderer has been disposed")]
    Disposed,
    #[error("surface error: {0}")]
    Surface(String),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Renderer-agnostic interface. All backends implement this trait.
pub trait RenderBackend {
    fn name(&self) -> &str;

    /// Apply clear color, tone mapping and shadow settings.
    fn configure(&mut self, settings: &RendererSettings);

    /// Resize the drawing target. Sizes are logical; `pixel_ratio` scales them.
    fn resize(&mut self, width: u32, height: u32, pixel_ratio: f32) -> Result<(), RenderError>;

    /// Draw one frame.
    fn render(&mut self, scene: &Scene, view: &CameraView) -> Result<(), RenderError>;

    /// Release the drawing context. Idempotent.
    fn dispose(&mut self);
}

/// What a [`DebugTextRenderer`] has been asked to do.
#[derive(Debug, Clone, Default)]
pub struct RenderLog {
    pub frames: u64,
    pub resizes: Vec<(u32, u32, f32)>,
    pub settings: Option<RendererSettings>,
    pub last_frame: Option<String>,
    pub disposed: bool,
}

/// Backend that renders the scene to text.
///
/// Useful for CLI output, logging and tests. The log handle stays readable
/// after the renderer has been boxed into a `RendererRig`.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    log: Rc<RefCell<RenderLog>>,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> Rc<RefCell<RenderLog>> {
        self.log.clone()
    }

    /// Render the scene as text without recording a frame.
    pub fn describe(scene: &Scene, view: &CameraView) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Scene ({} nodes, {} meshes) ===",
            scene.node_count(),
            scene.mesh_count()
        );
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0} aspect={:.2}",
            view.eye.x,
            view.eye.y,
            view.eye.z,
            view.target.x,
            view.target.y,
            view.target.z,
            view.fov_degrees,
            view.aspect
        );
        if let Some(env) = scene.environment() {
            let _ = writeln!(out, "Environment: {} intensity={:.2}", env.texture, env.intensity);
        }
        scene.traverse(|id, node| {
            let p = node.transform.position;
            let kind = match &node.kind {
                NodeKind::Group => "group".to_string(),
                NodeKind::Mesh(m) if m.geometry.is_disposed() => "mesh (disposed)".to_string(),
                NodeKind::Mesh(_) => "mesh".to_string(),
                NodeKind::DirectionalLight(l) => format!("sun intensity={:.2}", l.intensity),
                NodeKind::AmbientLight(l) => format!("ambient intensity={:.2}", l.intensity),
            };
            let _ = writeln!(
                out,
                "  [{}] {} {} pos=({:.2}, {:.2}, {:.2})",
                id.short(),
                node.name,
                kind,
                p.x,
                p.y,
                p.z
            );
        });
        out
    }
}

impl RenderBackend for DebugTextRenderer {
    fn name(&self) -> &str {
        "debug-text"
    }

    fn configure(&mut self, settings: &RendererSettings) {
        self.log.borrow_mut().settings = Some(*settings);
    }

    fn resize(&mut self, width: u32, height: u32, pixel_ratio: f32) -> Result<(), RenderError> {
        let mut log = self.log.borrow_mut();
        if log.disposed {
            return Err(RenderError::Disposed);
        }
        log.resizes.push((width, height, pixel_ratio));
        Ok(())
    }

    fn render(&mut self, scene: &Scene, view: &CameraView) -> Result<(), RenderError> {
        let text = Self::describe(scene, view);
        let mut log = self.log.borrow_mut();
        if log.disposed {
            return Err(RenderError::Disposed);
        }
        log.frames += 1;
        log.last_frame = Some(text);
        Ok(())
    }

    fn dispose(&mut self) {
        self.log.borrow_mut().disposed = true;
    }
}
