//! Host seam: window dimensions, clock and frame scheduling.
//!
//! The [`Host`] trait is the narrow interface to whatever owns the window
//! (winit on the desktop, [`HeadlessHost`] in tests and the CLI). [`Ticker`]
//! and [`Viewport`] are the two leaf components built on top of it.
//!
//! # Invariants
//! - Frame notifications never overlap: `Ticker::tick` takes `&mut self`.
//! - Timing drift from a variable frame rate is accepted, not corrected.
//! - A resize replaces the viewport state wholesale before notifying.

mod headless;
mod history;
mod ticker;
mod viewport;

pub use headless::HeadlessHost;
pub use history::FrameHistory;
pub use ticker::{DEFAULT_FIRST_DELTA, Ticker};
pub use viewport::Viewport;

use std::time::Instant;

/// Narrow interface to the window/event-loop owner.
pub trait Host {
    /// Current inner size of the window in logical pixels.
    fn inner_size(&self) -> (u32, u32);

    /// Raw device pixel ratio reported by the platform.
    fn device_pixel_ratio(&self) -> f64;

    /// Wall-clock sample used for frame timing.
    fn now(&self) -> Instant;

    /// Ask the host to deliver another animation frame.
    fn request_frame(&self);
}

pub fn crate_info() -> &'static str {
    "experience-host v0.1.0"
}
