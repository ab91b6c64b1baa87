use experience_common::{FrameState, ViewportState};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::renderer::CameraView;

const MIN_POLAR: f32 = 0.000_1;
const MAX_POLAR: f32 = std::f32::consts::PI - 0.000_1;

/// Initial camera placement and control tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 35.0,
            near: 0.1,
            far: 100.0,
            position: Vec3::new(6.0, 4.0, 8.0),
            target: Vec3::ZERO,
            damping_factor: 0.05,
            min_distance: 0.5,
            max_distance: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl PerspectiveCamera {
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }
}

/// Orbit controls with inertia.
///
/// Input accumulates into a pending rotation and zoom; every `update` applies
/// a `damping_factor` share of it and decays the remainder, so the camera
/// keeps gliding for a few frames after input stops.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    pub target: Vec3,
    pub damping_factor: f32,
    pub enabled: bool,
    radius: f32,
    theta: f32,
    phi: f32,
    pending_theta: f32,
    pending_phi: f32,
    pending_scale: f32,
    min_distance: f32,
    max_distance: f32,
    disposed: bool,
}

impl OrbitControls {
    fn new(position: Vec3, settings: &CameraSettings) -> Self {
        let offset = position - settings.target;
        let radius = offset.length().max(f32::EPSILON);
        Self {
            target: settings.target,
            damping_factor: settings.damping_factor,
            enabled: true,
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            pending_theta: 0.0,
            pending_phi: 0.0,
            pending_scale: 1.0,
            min_distance: settings.min_distance,
            max_distance: settings.max_distance,
            disposed: false,
        }
    }

    /// Queue a rotation in radians around the target.
    pub fn rotate(&mut self, d_theta: f32, d_phi: f32) {
        if self.enabled && !self.disposed {
            self.pending_theta += d_theta;
            self.pending_phi += d_phi;
        }
    }

    /// Queue a dolly. Factors below 1 move closer.
    pub fn dolly(&mut self, factor: f32) {
        if self.enabled && !self.disposed && factor > 0.0 {
            self.pending_scale *= factor;
        }
    }

    /// Apply one damping step and return the new camera position.
    pub fn update(&mut self) -> Vec3 {
        let k = self.damping_factor.clamp(0.0, 1.0);
        self.theta += self.pending_theta * k;
        self.phi = (self.phi + self.pending_phi * k).clamp(MIN_POLAR, MAX_POLAR);
        self.pending_theta *= 1.0 - k;
        self.pending_phi *= 1.0 - k;

        let step = self.pending_scale.powf(k);
        self.radius = (self.radius * step).clamp(self.min_distance, self.max_distance);
        self.pending_scale /= step;

        self.position()
    }

    pub fn position(&self) -> Vec3 {
        let sin_phi = self.phi.sin();
        self.target
            + self.radius
                * Vec3::new(sin_phi * self.theta.sin(), self.phi.cos(), sin_phi * self.theta.cos())
    }

    pub fn distance(&self) -> f32 {
        self.radius
    }

    /// True while queued input has not yet settled.
    pub fn is_moving(&self) -> bool {
        self.pending_theta.abs() > 1e-5
            || self.pending_phi.abs() > 1e-5
            || (self.pending_scale - 1.0).abs() > 1e-5
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn dispose(&mut self) {
        self.disposed = true;
        self.enabled = false;
        self.pending_theta = 0.0;
        self.pending_phi = 0.0;
        self.pending_scale = 1.0;
    }
}

/// Perspective camera plus orbit controls, kept in step with the viewport.
#[derive(Debug, Clone)]
pub struct CameraRig {
    camera: PerspectiveCamera,
    controls: OrbitControls,
}

impl CameraRig {
    pub fn new(settings: &CameraSettings, viewport: &ViewportState) -> Self {
        let camera = PerspectiveCamera {
            position: settings.position,
            fov_degrees: settings.fov_degrees,
            aspect: viewport.aspect(),
            near: settings.near,
            far: settings.far,
        };
        Self {
            controls: OrbitControls::new(camera.position, settings),
            camera,
        }
    }

    /// Recompute the aspect ratio from the new viewport.
    pub fn resize(&mut self, viewport: &ViewportState) {
        self.camera.aspect = viewport.aspect();
    }

    /// Advance control damping by one frame.
    pub fn update(&mut self, _frame: &FrameState) {
        if self.controls.is_disposed() {
            return;
        }
        self.camera.position = self.controls.update();
    }

    pub fn orbit(&mut self, d_theta: f32, d_phi: f32) {
        self.controls.rotate(d_theta, d_phi);
    }

    pub fn zoom(&mut self, factor: f32) {
        self.controls.dolly(factor);
    }

    pub fn dispose(&mut self) {
        self.controls.dispose();
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }

    pub fn view(&self) -> CameraView {
        CameraView {
            eye: self.camera.position,
            target: self.controls.target,
            fov_degrees: self.camera.fov_degrees,
            aspect: self.camera.aspect,
            near: self.camera.near,
            far: self.camera.far,
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.view().view_projection()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn frame() -> FrameState {
        let now = Instant::now();
        FrameState {
            start: now,
            current: now,
            elapsed: Duration::ZERO,
            delta: Duration::from_millis(16),
            index: 0,
        }
    }

    #[test]
    fn defaults_match_starter_scene() {
        let rig = CameraRig::new(&CameraSettings::default(), &ViewportState::new(1600, 800, 1.0));
        assert_eq!(rig.camera().fov_degrees, 35.0);
        assert_eq!(rig.camera().aspect, 2.0);
        assert_eq!(rig.camera().position, Vec3::new(6.0, 4.0, 8.0));
    }

    #[test]
    fn controls_reproduce_initial_position() {
        let rig = CameraRig::new(&CameraSettings::default(), &ViewportState::new(800, 600, 1.0));
        let p = rig.controls().position();
        assert!((p - Vec3::new(6.0, 4.0, 8.0)).length() < 1e-4);
    }

    #[test]
    fn update_without_input_keeps_position() {
        let mut rig = CameraRig::new(&CameraSettings::default(), &ViewportState::new(800, 600, 1.0));
        let before = rig.camera().position;
        rig.update(&frame());
        assert!((rig.camera().position - before).length() < 1e-4);
    }

    #[test]
    fn resize_updates_aspect() {
        let mut rig = CameraRig::new(&CameraSettings::default(), &ViewportState::new(800, 600, 1.0));
        rig.resize(&ViewportState::new(1000, 500, 1.0));
        assert_eq!(rig.view().aspect, 2.0);
    }

    #[test]
    fn damping_spreads_rotation_over_frames() {
        let mut rig = CameraRig::new(&CameraSettings::default(), &ViewportState::new(800, 600, 1.0));
        let start = rig.camera().position;
        rig.orbit(1.0, 0.0);
        rig.update(&frame());
        let first = rig.camera().position;
        assert_ne!(first, start);
        assert!(rig.controls().is_moving());
        rig.update(&frame());
        assert_ne!(rig.camera().position, first);
        // Distance to the target is preserved by pure rotation.
        let d = (rig.camera().position - rig.controls().target).length();
        assert!((d - start.length()).abs() < 1e-3);
    }

    #[test]
    fn zoom_moves_closer() {
        let mut rig = CameraRig::new(&CameraSettings::default(), &ViewportState::new(800, 600, 1.0));
        let before = rig.controls().distance();
        rig.zoom(0.5);
        for _ in 0..10 {
            rig.update(&frame());
        }
        assert!(rig.controls().distance() < before);
    }

    #[test]
    fn disposed_controls_ignore_input() {
        let mut rig = CameraRig::new(&CameraSettings::default(), &ViewportState::new(800, 600, 1.0));
        rig.dispose();
        let before = rig.camera().position;
        rig.orbit(1.0, 1.0);
        rig.update(&frame());
        assert_eq!(rig.camera().position, before);
        assert!(rig.controls().is_disposed());
    }
}
