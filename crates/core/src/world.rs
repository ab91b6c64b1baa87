use experience_assets::{AssetLoader, LoadReport};
use experience_common::{Color, NodeId};
use experience_notify::{ListenerId, Mailbox};
use experience_scene::{Geometry, Material, Mesh, Node, Scene};
use experience_tools::{ControlChange, DebugPanel};

use crate::environment::Environment;

/// Scene content.
///
/// Static content is added at construction. Content that needs loaded
/// resources waits for the all-loaded notification, which lands in the
/// world's mailbox and is acted on by [`process`](Self::process).
#[derive(Debug)]
pub struct World {
    cube: NodeId,
    environment: Option<Environment>,
    environment_map: String,
    inbox: Mailbox<LoadReport>,
    listener: Option<ListenerId>,
    builds: usize,
    report: Option<LoadReport>,
}

impl World {
    pub fn new(
        scene: &mut Scene,
        resources: &mut AssetLoader,
        environment_map: impl Into<String>,
    ) -> Self {
        let cube = scene.add(Node::mesh(
            "cube",
            Mesh::new(Geometry::cube(1.0), Material::standard(Color::WHITE)),
        ));
        let inbox = Mailbox::new();
        let tx = inbox.sender();
        let listener = resources.on_all_loaded().subscribe(move |report: &LoadReport| {
            let _ = tx.send(report.clone());
        });
        Self {
            cube,
            environment: None,
            environment_map: environment_map.into(),
            inbox,
            listener: Some(listener),
            builds: 0,
            report: None,
        }
    }

    /// Handle queued notifications and debug edits. Returns true if the
    /// environment was built by this call.
    pub fn process(
        &mut self,
        scene: &mut Scene,
        resources: &AssetLoader,
        debug: &mut DebugPanel,
        changes: &[ControlChange],
    ) -> bool {
        let mut built = false;
        for report in self.inbox.drain() {
            if self.environment.is_some() {
                continue;
            }
            if !report.is_clean() {
                tracing::warn!(failed = report.failed.len(), "building world with missing resources");
            }
            self.environment = Some(Environment::build(
                scene,
                resources,
                debug,
                &self.environment_map,
            ));
            self.report = Some(report);
            self.builds += 1;
            built = true;
        }
        if let Some(env) = &self.environment {
            env.apply(changes, scene);
        }
        built
    }

    /// Stop listening for load notifications.
    pub fn detach(&mut self, resources: &mut AssetLoader) {
        if let Some(id) = self.listener.take() {
            resources.on_all_loaded().unsubscribe(id);
        }
        self.inbox.drain();
    }

    pub fn cube(&self) -> NodeId {
        self.cube
    }

    pub fn environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    /// Times the load-dependent builder has run. Never more than one.
    pub fn builds(&self) -> usize {
        self.builds
    }

    pub fn load_report(&self) -> Option<&LoadReport> {
        self.report.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use experience_assets::{Dispatch, LoaderSet, Manifest};

    fn loader() -> AssetLoader {
        AssetLoader::new(Manifest::empty(), ".", &LoaderSet::default(), Dispatch::Inline).unwrap()
    }

    #[test]
    fn cube_is_added_synchronously() {
        let mut scene = Scene::new();
        let mut resources = loader();
        let world = World::new(&mut scene, &mut resources, "environmentMapTexture");
        let cube = scene.get(world.cube()).unwrap();
        assert_eq!(cube.name, "cube");
        assert_eq!(cube.as_mesh().unwrap().material.color, Color::WHITE);
        assert!(world.environment().is_none());
    }

    #[test]
    fn repeated_notifications_build_once() {
        let mut scene = Scene::new();
        let mut resources = loader();
        let mut debug = DebugPanel::new(false);
        let mut world = World::new(&mut scene, &mut resources, "environmentMapTexture");

        resources.on_all_loaded().emit(&LoadReport::default());
        resources.on_all_loaded().emit(&LoadReport::default());
        assert!(world.process(&mut scene, &resources, &mut debug, &[]));
        assert!(!world.process(&mut scene, &resources, &mut debug, &[]));
        assert_eq!(world.builds(), 1);
        assert_eq!(scene.node_count(), 2);
    }

    #[test]
    fn detached_world_ignores_notifications() {
        let mut scene = Scene::new();
        let mut resources = loader();
        let mut debug = DebugPanel::new(false);
        let mut world = World::new(&mut scene, &mut resources, "environmentMapTexture");

        world.detach(&mut resources);
        assert_eq!(resources.on_all_loaded().listener_count(), 0);
        resources.poll();
        world.process(&mut scene, &resources, &mut debug, &[]);
        assert_eq!(world.builds(), 0);
    }
}
