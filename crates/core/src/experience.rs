use experience_assets::{AssetLoader, LoadFailure, LoaderSet};
use experience_common::{FrameState, ViewportState};
use experience_host::{Host, Ticker, Viewport};
use experience_notify::{ListenerId, Mailbox};
use experience_render::{CameraRig, RenderBackend, RendererRig};
use experience_scene::Scene;
use experience_tools::DebugPanel;

use crate::{ExperienceConfig, ExperienceError, World};

/// Events the host delivers to a running experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// The window changed size or pixel density.
    Resized,
    /// The host is ready for the next frame.
    AnimationFrame,
    /// Nothing happened; only pending work is processed.
    Idle,
}

/// Internal notification relayed from the viewport and ticker listeners.
#[derive(Debug, Clone, Copy)]
enum Signal {
    Resize(ViewportState),
    Frame(FrameState),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExperienceStats {
    pub resizes: u64,
    pub updates: u64,
}

/// Root object wiring every subsystem of one running experience.
#[derive(Debug)]
pub struct Experience {
    debug: DebugPanel,
    viewport: Viewport,
    ticker: Ticker,
    scene: Scene,
    camera: CameraRig,
    renderer: RendererRig,
    resources: AssetLoader,
    world: World,
    signals: Mailbox<Signal>,
    resize_listener: Option<ListenerId>,
    frame_listener: Option<ListenerId>,
    stats: ExperienceStats,
    destroyed: bool,
}

impl Experience {
    pub fn new(
        host: &dyn Host,
        config: &ExperienceConfig,
        backend: Box<dyn RenderBackend>,
    ) -> Result<Self, ExperienceError> {
        Self::with_loaders(host, config, backend, &LoaderSet::default())
    }

    pub fn with_loaders(
        host: &dyn Host,
        config: &ExperienceConfig,
        backend: Box<dyn RenderBackend>,
        loaders: &LoaderSet,
    ) -> Result<Self, ExperienceError> {
        let _span = tracing::info_span!("experience_new").entered();

        let panel = DebugPanel::from_hash(&config.location_hash);
        let mut viewport = Viewport::new(host);
        let mut ticker = Ticker::new();
        ticker.start(host.now());
        host.request_frame();

        let mut scene = Scene::new();
        let mut resources = AssetLoader::new(
            config.manifest.clone(),
            &config.asset_root,
            loaders,
            config.dispatch,
        )?;
        let state = viewport.state();
        let camera = CameraRig::new(&config.camera, &state);
        let renderer = RendererRig::new(backend, config.renderer, &state)?;
        let world = World::new(&mut scene, &mut resources, config.environment_map.clone());

        let signals = Mailbox::new();
        let tx = signals.sender();
        let resize_listener = viewport.on_resize().subscribe(move |state: &ViewportState| {
            let _ = tx.send(Signal::Resize(*state));
        });
        let tx = signals.sender();
        let frame_listener = ticker.on_frame().subscribe(move |frame: &FrameState| {
            let _ = tx.send(Signal::Frame(*frame));
        });

        let debug_active = panel.is_active();
        tracing::info!(
            width = state.width,
            height = state.height,
            resources = config.manifest.len(),
            debug = debug_active,
            "experience created"
        );

        Ok(Self {
            debug: panel,
            viewport,
            ticker,
            scene,
            camera,
            renderer,
            resources,
            world,
            signals,
            resize_listener: Some(resize_listener),
            frame_listener: Some(frame_listener),
            stats: ExperienceStats::default(),
            destroyed: false,
        })
    }

    /// Pump one host event. A destroyed experience ignores everything.
    pub fn handle(&mut self, host: &dyn Host, event: HostEvent) -> Result<(), ExperienceError> {
        if self.destroyed {
            return Ok(());
        }
        match event {
            HostEvent::Resized => {
                self.viewport.refresh(host);
            }
            HostEvent::AnimationFrame => {
                if self.ticker.tick(host.now()).is_some() {
                    host.request_frame();
                }
            }
            HostEvent::Idle => {}
        }

        self.resources.poll();
        let changes = self.debug.take_changes();
        self.world
            .process(&mut self.scene, &self.resources, &mut self.debug, &changes);

        // Every drained signal runs; the first failure is returned afterwards.
        let mut first_error = None;
        for signal in self.signals.drain() {
            let result = match signal {
                Signal::Resize(state) => self.resize(&state),
                Signal::Frame(frame) => self.update(&frame),
            };
            if let Err(e) = result {
                tracing::error!("signal failed: {e}");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn resize(&mut self, state: &ViewportState) -> Result<(), ExperienceError> {
        self.camera.resize(state);
        self.renderer.resize(state)?;
        self.stats.resizes += 1;
        Ok(())
    }

    fn update(&mut self, frame: &FrameState) -> Result<(), ExperienceError> {
        self.camera.update(frame);
        self.renderer.update(&self.scene, &self.camera)?;
        self.stats.updates += 1;
        Ok(())
    }

    /// Tear everything down. Safe to call more than once.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        if let Some(id) = self.resize_listener.take() {
            self.viewport.on_resize().unsubscribe(id);
        }
        if let Some(id) = self.frame_listener.take() {
            self.ticker.on_frame().unsubscribe(id);
        }
        self.ticker.stop();
        self.world.detach(&mut self.resources);

        let disposed = self.scene.dispose_geometries();
        self.camera.dispose();
        self.renderer.dispose();
        if self.debug.is_active() {
            self.debug.destroy();
        }
        self.resources.clear();
        self.signals.drain();
        self.destroyed = true;
        tracing::info!(
            geometries = disposed,
            updates = self.stats.updates,
            "experience destroyed"
        );
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn viewport(&self) -> ViewportState {
        self.viewport.state()
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraRig {
        &mut self.camera
    }

    pub fn renderer(&self) -> &RendererRig {
        &self.renderer
    }

    pub fn resources(&self) -> &AssetLoader {
        &self.resources
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn debug(&self) -> &DebugPanel {
        &self.debug
    }

    pub fn debug_mut(&mut self) -> &mut DebugPanel {
        &mut self.debug
    }

    pub fn stats(&self) -> ExperienceStats {
        self.stats
    }

    /// Resources that failed to load. They are not retried.
    pub fn load_failures(&self) -> &[LoadFailure] {
        self.resources.failures()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use experience_assets::{
        Asset, AssetError, Dispatch, Loader, Manifest, ModelAsset, ResourceDescriptor,
        ResourceKind, TextureAsset,
    };
    use experience_host::HeadlessHost;
    use experience_tools::SceneInspector;
    use experience_render::{CameraView, DebugTextRenderer, RenderError, RendererSettings};
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;
    use std::time::Duration;

    struct StubModel;

    impl Loader for StubModel {
        fn load(&self, paths: &[PathBuf]) -> Result<Asset, AssetError> {
            if paths[0].to_string_lossy().contains("missing") {
                return Err(AssetError::SourceCount {
                    expected: 1,
                    found: 0,
                });
            }
            Ok(Asset::Model(ModelAsset {
                meshes: Vec::new(),
                materials: Vec::new(),
                nodes: 1,
                scenes: 1,
                animations: 0,
            }))
        }
    }

    struct StubTexture;

    impl Loader for StubTexture {
        fn load(&self, _paths: &[PathBuf]) -> Result<Asset, AssetError> {
            Ok(Asset::Texture(TextureAsset {
                width: 1,
                height: 1,
                pixels: vec![255; 4],
                fingerprint: String::new(),
            }))
        }
    }

    fn loaders() -> LoaderSet {
        LoaderSet::default()
            .with_model(StubModel)
            .with_texture(StubTexture)
    }

    fn config(manifest: Manifest) -> ExperienceConfig {
        ExperienceConfig::default()
            .with_manifest(manifest)
            .with_dispatch(Dispatch::Inline)
    }

    fn build(
        host: &HeadlessHost,
        config: &ExperienceConfig,
    ) -> (Experience, Rc<RefCell<experience_render::RenderLog>>) {
        let backend = DebugTextRenderer::new();
        let log = backend.log();
        let experience =
            Experience::with_loaders(host, config, Box::new(backend), &loaders()).unwrap();
        (experience, log)
    }

    fn frame(experience: &mut Experience, host: &HeadlessHost) {
        host.advance(Duration::from_millis(16));
        experience.handle(host, HostEvent::AnimationFrame).unwrap();
    }

    fn duck() -> Manifest {
        Manifest::new(vec![ResourceDescriptor::new(
            "duck",
            ResourceKind::Model,
            "duck.gltf",
        )])
    }

    #[test]
    fn construction_builds_static_content_and_requests_a_frame() {
        let host = HeadlessHost::new(800, 600);
        let (experience, log) = build(&host, &config(Manifest::empty()));
        assert_eq!(experience.scene().mesh_count(), 1);
        assert_eq!(host.frame_requests(), 1);
        assert_eq!(log.borrow().resizes, vec![(800, 600, 1.0)]);
        assert!(!experience.debug().is_active());
    }

    #[test]
    fn construction_with_debug_hash_activates_panel() {
        let host = HeadlessHost::new(800, 600);
        let (experience, _log) = build(&host, &config(Manifest::empty()).with_hash("#debug"));
        assert!(experience.debug().is_active());
        assert!(!experience.is_destroyed());
    }

    /// Fails the first `render` call, then draws normally.
    struct FlakyBackend {
        failures_left: u32,
    }

    impl RenderBackend for FlakyBackend {
        fn name(&self) -> &str {
            "flaky"
        }

        fn configure(&mut self, _settings: &RendererSettings) {}

        fn resize(&mut self, _width: u32, _height: u32, _ratio: f32) -> Result<(), RenderError> {
            Ok(())
        }

        fn render(&mut self, _scene: &Scene, _view: &CameraView) -> Result<(), RenderError> {
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(RenderError::Backend("lost frame".into()));
            }
            Ok(())
        }

        fn dispose(&mut self) {}
    }

    #[test]
    fn failing_signal_does_not_drop_the_rest() {
        let host = HeadlessHost::new(800, 600);
        let backend = FlakyBackend { failures_left: 1 };
        let mut experience = Experience::with_loaders(
            &host,
            &config(Manifest::empty()),
            Box::new(backend),
            &loaders(),
        )
        .unwrap();

        let now = host.now();
        let frame_at = |index| FrameState {
            start: now,
            current: now,
            elapsed: Duration::ZERO,
            delta: Duration::from_millis(16),
            index,
        };
        let tx = experience.signals.sender();
        tx.send(Signal::Resize(experience.viewport())).unwrap();
        tx.send(Signal::Frame(frame_at(0))).unwrap();
        tx.send(Signal::Frame(frame_at(1))).unwrap();

        let result = experience.handle(&host, HostEvent::Idle);
        assert!(matches!(result, Err(ExperienceError::Render(_))));
        assert_eq!(experience.stats().resizes, 1);
        assert_eq!(experience.stats().updates, 1);
        assert_eq!(experience.renderer().frames(), 1);
        assert!(experience.signals.drain().is_empty());
    }

    #[test]
    fn duck_scenario_builds_world_once() {
        let host = HeadlessHost::new(800, 600);
        let (mut experience, _log) = build(&host, &config(duck()));
        assert_eq!(experience.world().builds(), 0);

        for _ in 0..5 {
            frame(&mut experience, &host);
        }
        assert_eq!(experience.resources().loaded(), 1);
        assert!(experience.resources().get("duck").is_some());
        assert_eq!(experience.world().builds(), 1);
        let report = experience.world().load_report().unwrap();
        assert_eq!(report.loaded, vec!["duck".to_string()]);
        // cube + sun
        assert_eq!(experience.scene().node_count(), 2);
    }

    #[test]
    fn empty_manifest_still_builds_world() {
        let host = HeadlessHost::default();
        let (mut experience, _log) = build(&host, &config(Manifest::empty()));
        experience.handle(&host, HostEvent::Idle).unwrap();
        assert_eq!(experience.world().builds(), 1);
        assert!(experience.scene().environment().is_none());
    }

    #[test]
    fn environment_map_is_applied_when_loaded() {
        let host = HeadlessHost::default();
        let manifest = Manifest::new(vec![ResourceDescriptor::new(
            "environmentMapTexture",
            ResourceKind::Texture,
            "env.png",
        )]);
        let (mut experience, _log) = build(&host, &config(manifest));
        experience.handle(&host, HostEvent::Idle).unwrap();
        let env = experience.scene().environment().unwrap();
        assert_eq!(env.texture, "environmentMapTexture");
        assert_eq!(env.intensity, 0.4);
    }

    #[test]
    fn failed_resource_is_reported_and_world_still_builds() {
        let host = HeadlessHost::default();
        let manifest = Manifest::new(vec![ResourceDescriptor::new(
            "duck",
            ResourceKind::Model,
            "missing.gltf",
        )]);
        let (mut experience, _log) = build(&host, &config(manifest));
        experience.handle(&host, HostEvent::Idle).unwrap();
        assert_eq!(experience.load_failures().len(), 1);
        assert_eq!(experience.load_failures()[0].name, "duck");
        assert_eq!(experience.world().builds(), 1);
    }

    #[test]
    fn resize_matches_host_dimensions() {
        let host = HeadlessHost::new(800, 600).with_pixel_ratio(3.0);
        let (mut experience, log) = build(&host, &config(Manifest::empty()));

        host.set_size(1024, 512);
        experience.handle(&host, HostEvent::Resized).unwrap();

        let state = experience.viewport();
        assert_eq!((state.width, state.height), (1024, 512));
        assert_eq!(state.pixel_ratio, 2.0);
        assert_eq!(experience.camera().camera().aspect, 2.0);
        assert_eq!(log.borrow().resizes.last(), Some(&(1024, 512, 2.0)));
        assert_eq!(experience.stats().resizes, 1);
    }

    #[test]
    fn frames_update_camera_and_renderer() {
        let host = HeadlessHost::default();
        let (mut experience, log) = build(&host, &config(Manifest::empty()));
        for _ in 0..3 {
            frame(&mut experience, &host);
        }
        assert_eq!(experience.stats().updates, 3);
        assert_eq!(experience.renderer().frames(), 3);
        assert_eq!(log.borrow().frames, 3);
        // one request at construction plus one per frame
        assert_eq!(host.frame_requests(), 4);
    }

    #[test]
    fn destroy_stops_all_calls() {
        let host = HeadlessHost::default();
        let (mut experience, log) = build(&host, &config(duck()));
        frame(&mut experience, &host);
        experience.destroy();

        assert!(experience.is_destroyed());
        assert!(log.borrow().disposed);
        assert!(experience.camera().controls().is_disposed());
        assert!(experience.resources().get("duck").is_none());
        assert_eq!(SceneInspector::summary(experience.scene()).resident_geometries, 0);

        let before = (experience.stats(), log.borrow().frames, host.frame_requests());
        host.set_size(10, 10);
        experience.handle(&host, HostEvent::Resized).unwrap();
        frame(&mut experience, &host);
        let after = (experience.stats(), log.borrow().frames, host.frame_requests());
        assert_eq!(before, after);

        // idempotent
        experience.destroy();
    }

    #[test]
    fn debug_hash_enables_environment_controls() {
        use experience_tools::ControlValue;

        let host = HeadlessHost::default();
        let manifest = Manifest::new(vec![ResourceDescriptor::new(
            "environmentMapTexture",
            ResourceKind::Texture,
            "env.png",
        )]);
        let (mut experience, _log) = build(&host, &config(manifest).with_hash("#debug"));
        experience.handle(&host, HostEvent::Idle).unwrap();
        assert!(experience.debug().is_active());
        assert_eq!(experience.debug().control_count(), 5);

        let sun = experience.world().environment().unwrap().sun();
        let intensity = experience.debug().find_control("sunLightIntensity").unwrap();
        assert!(
            experience
                .debug_mut()
                .set_value(intensity, ControlValue::Number(7.5))
        );
        experience.handle(&host, HostEvent::Idle).unwrap();
        let light = experience
            .scene()
            .get(sun)
            .and_then(|n| n.as_directional_light())
            .unwrap();
        assert_eq!(light.intensity, 7.5);

        experience.destroy();
        assert!(experience.debug().is_destroyed());
    }
}
