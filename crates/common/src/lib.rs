//! Shared value types for the experience framework.
//!
//! Everything here is plain data: identifiers, transforms, and the state
//! snapshots (`ViewportState`, `FrameState`) that the host layer produces and
//! the camera/renderer wrappers consume.

mod frame;
mod types;

pub use frame::{FrameState, ViewportState, MAX_PIXEL_RATIO};
pub use types::{Color, NodeId, Transform};

pub fn crate_info() -> &'static str {
    "experience-common v0.1.0"
}
