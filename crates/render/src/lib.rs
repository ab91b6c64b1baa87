//! Rendering adapter: camera and renderer wrappers over a swappable backend.
//!
//! # Invariants
//! - Backends read the scene and a camera view; they never mutate the scene.
//! - The renderer target always matches the latest viewport state.
//! - After `dispose` a wrapper refuses further work.
//!
//! The `DebugTextRenderer` backend records what it was asked to draw and is
//! what headless runs and tests use. The wgpu backend lives in its own crate.

mod camera;
mod renderer;
mod rig;

pub use camera::{CameraRig, CameraSettings, OrbitControls, PerspectiveCamera};
pub use renderer::{CameraView, DebugTextRenderer, RenderBackend, RenderError, RenderLog};
pub use rig::{RendererRig, RendererSettings, ShadowMapKind, ToneMapping};

pub fn crate_info() -> &'static str {
    "experience-render v0.1.0"
}
