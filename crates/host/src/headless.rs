use std::cell::Cell;
use std::time::{Duration, Instant};

use crate::Host;

/// Window-less host with a manual clock.
///
/// Used by the CLI and by tests: the size and pixel ratio are set directly
/// and time only moves when [`HeadlessHost::advance`] is called.
#[derive(Debug)]
pub struct HeadlessHost {
    size: Cell<(u32, u32)>,
    pixel_ratio: Cell<f64>,
    origin: Instant,
    offset: Cell<Duration>,
    frame_requests: Cell<u64>,
}

impl HeadlessHost {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Cell::new((width, height)),
            pixel_ratio: Cell::new(1.0),
            origin: Instant::now(),
            offset: Cell::new(Duration::ZERO),
            frame_requests: Cell::new(0),
        }
    }

    pub fn with_pixel_ratio(self, ratio: f64) -> Self {
        self.pixel_ratio.set(ratio);
        self
    }

    /// Change the simulated window size. The caller still has to deliver
    /// the resize event to whoever listens.
    pub fn set_size(&self, width: u32, height: u32) {
        self.size.set((width, height));
    }

    pub fn set_pixel_ratio(&self, ratio: f64) {
        self.pixel_ratio.set(ratio);
    }

    /// Move the manual clock forward.
    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }

    pub fn frame_requests(&self) -> u64 {
        self.frame_requests.get()
    }
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

impl Host for HeadlessHost {
    fn inner_size(&self) -> (u32, u32) {
        self.size.get()
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.pixel_ratio.get()
    }

    fn now(&self) -> Instant {
        self.origin + self.offset.get()
    }

    fn request_frame(&self) {
        self.frame_requests.set(self.frame_requests.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_only_moves_when_advanced() {
        let host = HeadlessHost::default();
        let t0 = host.now();
        assert_eq!(host.now(), t0);
        host.advance(Duration::from_millis(16));
        assert_eq!(host.now() - t0, Duration::from_millis(16));
    }

    #[test]
    fn size_and_requests() {
        let host = HeadlessHost::new(800, 600).with_pixel_ratio(2.5);
        assert_eq!(host.inner_size(), (800, 600));
        assert_eq!(host.device_pixel_ratio(), 2.5);
        host.set_size(1024, 768);
        assert_eq!(host.inner_size(), (1024, 768));
        host.request_frame();
        host.request_frame();
        assert_eq!(host.frame_requests(), 2);
    }
}
