use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Upper bound applied to the host's device pixel ratio.
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// Window dimensions and pixel density, replaced wholesale on every resize.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
}

impl ViewportState {
    /// Build a state from raw host values, clamping the pixel ratio.
    /// A ratio that is not a positive finite number is read as 1.0.
    pub fn new(width: u32, height: u32, device_pixel_ratio: f64) -> Self {
        let ratio = device_pixel_ratio as f32;
        let pixel_ratio = if ratio.is_finite() && ratio > 0.0 {
            ratio.min(MAX_PIXEL_RATIO)
        } else {
            1.0
        };
        Self {
            width,
            height,
            pixel_ratio,
        }
    }

    /// Width over height; a zero height reports 1.0.
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Size of the drawing buffer in physical pixels.
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        (
            (self.width as f32 * self.pixel_ratio).round() as u32,
            (self.height as f32 * self.pixel_ratio).round() as u32,
        )
    }
}

/// Timing of one frame. Recomputed every tick, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameState {
    pub start: Instant,
    pub current: Instant,
    /// Time since the ticker started.
    pub elapsed: Duration,
    /// Time since the previous frame.
    pub delta: Duration,
    /// Zero-based frame counter.
    pub index: u64,
}

impl FrameState {
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }
}
