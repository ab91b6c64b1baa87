//! wgpu render backend for the experience framework.
//!
//! Draws every resident mesh of the scene as a lit, instanced box, using the
//! scene's directional light and environment intensity. An optional
//! [`Overlay`] paints on top of each frame (the desktop app uses it for the
//! egui debug panel).
//!
//! # Invariants
//! - The backend never mutates the scene.
//! - Released geometry is never drawn.
//! - After `dispose` every GPU buffer is destroyed and rendering is refused.

mod gpu;
mod shaders;

pub use gpu::{Overlay, WgpuBackend};

pub fn crate_info() -> &'static str {
    "experience-render-wgpu v0.1.0"
}
