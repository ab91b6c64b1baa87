use experience_common::{Color, ViewportState};
use experience_scene::Scene;
use serde::{Deserialize, Serialize};

use crate::camera::CameraRig;
use crate::renderer::{RenderBackend, RenderError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToneMapping {
    None,
    Linear,
    Reinhard,
    Cineon,
    AcesFilmic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShadowMapKind {
    Basic,
    Pcf,
    PcfSoft,
    Vsm,
}

/// Output settings handed to the backend on construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    pub clear_color: Color,
    pub tone_mapping: ToneMapping,
    pub exposure: f32,
    pub shadows: bool,
    pub shadow_map: ShadowMapKind,
    pub antialias: bool,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            clear_color: Color::from_hex(0x211d20),
            tone_mapping: ToneMapping::Cineon,
            exposure: 1.75,
            shadows: true,
            shadow_map: ShadowMapKind::PcfSoft,
            antialias: true,
        }
    }
}

/// Owns the render backend and keeps it sized to the viewport.
pub struct RendererRig {
    backend: Box<dyn RenderBackend>,
    settings: RendererSettings,
    frames: u64,
    disposed: bool,
}

impl RendererRig {
    pub fn new(
        mut backend: Box<dyn RenderBackend>,
        settings: RendererSettings,
        viewport: &ViewportState,
    ) -> Result<Self, RenderError> {
        backend.configure(&settings);
        backend.resize(viewport.width, viewport.height, viewport.pixel_ratio)?;
        tracing::info!(backend = backend.name(), "renderer ready");
        Ok(Self {
            backend,
            settings,
            frames: 0,
            disposed: false,
        })
    }

    pub fn resize(&mut self, viewport: &ViewportState) -> Result<(), RenderError> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        self.backend
            .resize(viewport.width, viewport.height, viewport.pixel_ratio)
    }

    /// Render one frame of `scene` through `camera`.
    pub fn update(&mut self, scene: &Scene, camera: &CameraRig) -> Result<(), RenderError> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        self.backend.render(scene, &camera.view())?;
        self.frames += 1;
        Ok(())
    }

    /// Release the backend. Later calls are no-ops or errors.
    pub fn dispose(&mut self) {
        if !self.disposed {
            self.backend.dispose();
            self.disposed = true;
            tracing::debug!(frames = self.frames, "renderer disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }
}

impl std::fmt::Debug for RendererRig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererRig")
            .field("backend", &self.backend.name())
            .field("frames", &self.frames)
            .field("disposed", &self.disposed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraSettings;
    use crate::renderer::DebugTextRenderer;

    fn rig(viewport: &ViewportState) -> (RendererRig, std::rc::Rc<std::cell::RefCell<crate::RenderLog>>) {
        let backend = DebugTextRenderer::new();
        let log = backend.log();
        let rig = RendererRig::new(Box::new(backend), RendererSettings::default(), viewport).unwrap();
        (rig, log)
    }

    #[test]
    fn default_settings() {
        let s = RendererSettings::default();
        assert_eq!(s.clear_color.to_hex(), 0x211d20);
        assert_eq!(s.tone_mapping, ToneMapping::Cineon);
        assert_eq!(s.exposure, 1.75);
        assert_eq!(s.shadow_map, ShadowMapKind::PcfSoft);
    }

    #[test]
    fn construction_configures_and_sizes_backend() {
        let viewport = ViewportState::new(800, 600, 1.5);
        let (_rig, log) = rig(&viewport);
        let log = log.borrow();
        assert!(log.settings.is_some());
        assert_eq!(log.resizes, vec![(800, 600, 1.5)]);
    }

    #[test]
    fn update_renders_and_dispose_stops() {
        let viewport = ViewportState::new(800, 600, 1.0);
        let (mut rig, log) = rig(&viewport);
        let camera = CameraRig::new(&CameraSettings::default(), &viewport);
        let scene = Scene::new();

        rig.update(&scene, &camera).unwrap();
        rig.resize(&ViewportState::new(400, 300, 1.0)).unwrap();
        assert_eq!(rig.frames(), 1);

        rig.dispose();
        rig.dispose();
        assert!(log.borrow().disposed);
        assert!(matches!(rig.update(&scene, &camera), Err(RenderError::Disposed)));
        assert_eq!(log.borrow().frames, 1);
    }
}
