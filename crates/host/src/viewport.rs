use experience_common::ViewportState;
use experience_notify::Notifier;

use crate::Host;

/// Tracks window dimensions and pixel density.
///
/// Consumers recompute their derived state (camera aspect, renderer target
/// size) synchronously inside the `on_resize` notification.
#[derive(Debug)]
pub struct Viewport {
    state: ViewportState,
    on_resize: Notifier<ViewportState>,
}

impl Viewport {
    pub fn new(host: &dyn Host) -> Self {
        Self {
            state: sample(host),
            on_resize: Notifier::new("resize"),
        }
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    /// Re-read the host dimensions, replace the state and notify.
    pub fn refresh(&mut self, host: &dyn Host) -> ViewportState {
        self.state = sample(host);
        tracing::debug!(
            width = self.state.width,
            height = self.state.height,
            pixel_ratio = self.state.pixel_ratio,
            "viewport resized"
        );
        self.on_resize.emit(&self.state);
        self.state
    }

    pub fn on_resize(&mut self) -> &mut Notifier<ViewportState> {
        &mut self.on_resize
    }
}

fn sample(host: &dyn Host) -> ViewportState {
    let (width, height) = host.inner_size();
    ViewportState::new(width, height, host.device_pixel_ratio())
}
