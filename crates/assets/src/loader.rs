use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use experience_notify::Notifier;
use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::loaders::{AssetError, Loader, LoaderSet};
use crate::manifest::Manifest;
use crate::registry::LoadedAssetRegistry;

/// Where loader work runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dispatch {
    /// One worker thread per resource.
    #[default]
    Threaded,
    /// Decode on the constructing thread. Results are still applied by `poll`.
    Inline,
}

/// A resource that could not be loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadFailure {
    pub name: String,
    pub reason: String,
}

/// Emitted after each resource resolves.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadProgress {
    pub name: String,
    pub succeeded: bool,
    pub resolved: usize,
    pub total: usize,
}

impl LoadProgress {
    pub fn ratio(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.resolved as f32 / self.total as f32
        }
    }
}

/// Payload of the all-loaded notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    pub total: usize,
    pub loaded: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<LoadFailure>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

struct Outcome {
    name: String,
    result: Result<Asset, AssetError>,
}

/// Loads every resource of a manifest and announces when all have resolved.
///
/// Workers only decode; the registry, the counters and both notifiers are
/// touched exclusively by [`poll`](Self::poll) on the owning thread.
pub struct AssetLoader {
    manifest: Manifest,
    registry: LoadedAssetRegistry,
    report: LoadReport,
    rx: Receiver<Outcome>,
    completed: bool,
    on_progress: Notifier<LoadProgress>,
    on_all_loaded: Notifier<LoadReport>,
}

impl AssetLoader {
    /// Validate the manifest and start loading every resource.
    pub fn new(
        manifest: Manifest,
        root: impl AsRef<Path>,
        loaders: &LoaderSet,
        dispatch: Dispatch,
    ) -> Result<Self, AssetError> {
        manifest.validate()?;
        let root = root.as_ref();
        let (tx, rx) = mpsc::channel();
        let mut report = LoadReport {
            total: manifest.len(),
            ..LoadReport::default()
        };

        let _span = tracing::info_span!("asset_loader", total = manifest.len(), ?dispatch).entered();
        for descriptor in manifest.iter() {
            let Some(loader) = loaders.for_kind(&descriptor.kind) else {
                tracing::warn!(
                    name = %descriptor.name,
                    kind = %descriptor.kind,
                    "unrecognized resource kind, skipping"
                );
                report.skipped.push(descriptor.name.clone());
                continue;
            };
            let paths = descriptor.resolve(root);
            let name = descriptor.name.clone();
            match dispatch {
                Dispatch::Inline => {
                    let result = load_guarded(&name, loader.as_ref(), &paths);
                    let _ = tx.send(Outcome { name, result });
                }
                Dispatch::Threaded => spawn(name, paths, loader, tx.clone()),
            }
        }

        Ok(Self {
            manifest,
            registry: LoadedAssetRegistry::new(),
            report,
            rx,
            completed: false,
            on_progress: Notifier::new("progress"),
            on_all_loaded: Notifier::new("all-loaded"),
        })
    }

    /// Apply every finished result, then fire all-loaded if this was the
    /// call that saw the last resource resolve. Returns how many results
    /// were applied.
    pub fn poll(&mut self) -> usize {
        if self.completed {
            return 0;
        }
        let outcomes: Vec<Outcome> = self.rx.try_iter().collect();
        let applied = outcomes.len();
        for Outcome { name, result } in outcomes {
            let succeeded = match result {
                Ok(asset) => {
                    tracing::debug!(%name, kind = asset.kind_name(), "resource loaded");
                    self.registry.insert(name.clone(), asset);
                    self.report.loaded.push(name.clone());
                    true
                }
                Err(err) => {
                    tracing::error!(%name, error = %err, "resource failed to load");
                    self.report.failed.push(LoadFailure {
                        name: name.clone(),
                        reason: err.to_string(),
                    });
                    false
                }
            };
            let progress = LoadProgress {
                name,
                succeeded,
                resolved: self.resolved(),
                total: self.report.total,
            };
            self.on_progress.emit(&progress);
        }

        if self.resolved() == self.report.total {
            self.completed = true;
            tracing::info!(
                loaded = self.report.loaded.len(),
                skipped = self.report.skipped.len(),
                failed = self.report.failed.len(),
                "all resources resolved"
            );
            let report = self.report.clone();
            self.on_all_loaded.emit(&report);
        }
        applied
    }

    /// Resources counted as loaded: stored ones plus skipped unknown kinds.
    pub fn loaded(&self) -> usize {
        self.report.loaded.len() + self.report.skipped.len()
    }

    /// Resources that have finished, successfully or not.
    pub fn resolved(&self) -> usize {
        self.loaded() + self.report.failed.len()
    }

    pub fn to_load(&self) -> usize {
        self.report.total
    }

    pub fn progress(&self) -> f32 {
        if self.report.total == 0 {
            1.0
        } else {
            self.resolved() as f32 / self.report.total as f32
        }
    }

    /// True once all-loaded has fired.
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn items(&self) -> &LoadedAssetRegistry {
        &self.registry
    }

    pub fn get(&self, name: &str) -> Option<Arc<Asset>> {
        self.registry.get(name)
    }

    pub fn failures(&self) -> &[LoadFailure] {
        &self.report.failed
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn on_progress(&mut self) -> &mut Notifier<LoadProgress> {
        &mut self.on_progress
    }

    pub fn on_all_loaded(&mut self) -> &mut Notifier<LoadReport> {
        &mut self.on_all_loaded
    }

    /// Drop loaded assets and listeners. Results still in flight are
    /// discarded and all-loaded will not fire.
    pub fn clear(&mut self) {
        self.registry.clear();
        self.on_progress.clear();
        self.on_all_loaded.clear();
        let (_tx, rx) = mpsc::channel();
        self.rx = rx;
        self.completed = true;
        tracing::debug!("asset registry cleared");
    }
}

impl std::fmt::Debug for AssetLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetLoader")
            .field("total", &self.report.total)
            .field("resolved", &self.resolved())
            .field("completed", &self.completed)
            .finish()
    }
}

/// Run `loader`, turning a panic into a failure so the resource still resolves.
fn load_guarded(name: &str, loader: &dyn Loader, paths: &[PathBuf]) -> Result<Asset, AssetError> {
    panic::catch_unwind(AssertUnwindSafe(|| loader.load(paths))).unwrap_or_else(|_| {
        Err(AssetError::Panicked {
            name: name.to_string(),
        })
    })
}

fn spawn(name: String, paths: Vec<PathBuf>, loader: Arc<dyn Loader>, tx: Sender<Outcome>) {
    let worker_tx = tx.clone();
    let worker_name = name.clone();
    let spawned = std::thread::Builder::new()
        .name(format!("load-{name}"))
        .spawn(move || {
            let result = load_guarded(&worker_name, loader.as_ref(), &paths);
            // The owner may already be gone.
            let _ = worker_tx.send(Outcome {
                name: worker_name,
                result,
            });
        });
    if let Err(err) = spawned {
        let _ = tx.send(Outcome {
            name,
            result: Err(AssetError::Spawn(err)),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::ModelAsset;
    use crate::loaders::tests::{TRIANGLE_GLTF, write_png};
    use crate::{ResourceDescriptor, ResourceKind};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    /// Succeeds unless the file name contains "bad"; counts calls.
    #[derive(Default)]
    struct FakeLoader {
        calls: Arc<AtomicUsize>,
    }

    impl Loader for FakeLoader {
        fn load(&self, paths: &[PathBuf]) -> Result<Asset, AssetError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if paths[0].to_string_lossy().contains("bad") {
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

    /// Panics on any path containing "boom".
    struct PanickingLoader;

    impl Loader for PanickingLoader {
        fn load(&self, paths: &[PathBuf]) -> Result<Asset, AssetError> {
            if paths[0].to_string_lossy().contains("boom") {
                panic!("decoder blew up on {}", paths[0].display());
            }
            FakeLoader::default().load(paths)
        }
    }

    fn fake_set() -> (LoaderSet, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let set = LoaderSet::default().with_model(FakeLoader {
            calls: calls.clone(),
        });
        (set, calls)
    }

    fn model(name: &str, path: &str) -> ResourceDescriptor {
        ResourceDescriptor::new(name, ResourceKind::Model, path)
    }

    fn count_all_loaded(loader: &mut AssetLoader) -> Rc<RefCell<Vec<LoadReport>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        loader
            .on_all_loaded()
            .subscribe(move |r: &LoadReport| s.borrow_mut().push(r.clone()));
        seen
    }

    fn poll_until_complete(loader: &mut AssetLoader) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !loader.is_complete() && Instant::now() < deadline {
            loader.poll();
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn empty_manifest_fires_on_first_poll() {
        let mut loader =
            AssetLoader::new(Manifest::empty(), ".", &LoaderSet::default(), Dispatch::Inline)
                .unwrap();
        // Subscribed after construction and still notified.
        let seen = count_all_loaded(&mut loader);
        assert!(seen.borrow().is_empty());

        loader.poll();
        loader.poll();
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(loader.progress(), 1.0);
    }

    #[test]
    fn all_loaded_fires_once_after_every_resource() {
        let (set, calls) = fake_set();
        let manifest = Manifest::new(vec![model("a", "a.glb"), model("b", "b.glb"), model("c", "c.glb")]);
        let mut loader = AssetLoader::new(manifest, ".", &set, Dispatch::Threaded).unwrap();
        let seen = count_all_loaded(&mut loader);
        let progress = Rc::new(RefCell::new(Vec::new()));
        let p = progress.clone();
        loader
            .on_progress()
            .subscribe(move |e: &LoadProgress| p.borrow_mut().push(e.resolved));

        poll_until_complete(&mut loader);
        loader.poll();

        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(*progress.borrow(), vec![1, 2, 3]);
        assert_eq!(loader.items().len(), 3);
        assert!(loader.get("b").is_some());
    }

    #[test]
    fn unrecognized_kind_is_counted_without_storing() {
        let (set, _) = fake_set();
        let manifest = Manifest::new(vec![
            model("duck", "duck.glb"),
            ResourceDescriptor::new("font", ResourceKind::Unrecognized("font".into()), "f.json"),
        ]);
        let mut loader = AssetLoader::new(manifest, ".", &set, Dispatch::Inline).unwrap();
        assert_eq!(loader.loaded(), 1);
        let seen = count_all_loaded(&mut loader);

        loader.poll();
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(loader.loaded(), 2);
        assert_eq!(loader.items().len(), 1);
        assert!(loader.get("font").is_none());
        assert_eq!(seen.borrow()[0].skipped, vec!["font".to_string()]);
    }

    #[test]
    fn panicking_loader_counts_as_failure() {
        for dispatch in [Dispatch::Threaded, Dispatch::Inline] {
            let set = LoaderSet::default().with_model(PanickingLoader);
            let manifest = Manifest::new(vec![model("ok", "ok.glb"), model("boom", "boom.glb")]);
            let mut loader = AssetLoader::new(manifest, ".", &set, dispatch).unwrap();
            let seen = count_all_loaded(&mut loader);

            poll_until_complete(&mut loader);
            loader.poll();

            assert!(loader.is_complete(), "{dispatch:?}");
            assert_eq!(seen.borrow().len(), 1, "{dispatch:?}");
            assert_eq!(loader.resolved(), 2);
            assert_eq!(loader.failures().len(), 1);
            assert_eq!(loader.failures()[0].name, "boom");
            assert!(loader.get("ok").is_some());
            assert!(loader.get("boom").is_none());
        }
    }

    #[test]
    fn failures_resolve_and_are_reported() {
        let (set, _) = fake_set();
        let manifest = Manifest::new(vec![model("good", "good.glb"), model("broken", "bad.glb")]);
        let mut loader = AssetLoader::new(manifest, ".", &set, Dispatch::Threaded).unwrap();
        let seen = count_all_loaded(&mut loader);

        poll_until_complete(&mut loader);

        assert_eq!(seen.borrow().len(), 1);
        let report = &seen.borrow()[0];
        assert_eq!(report.loaded, vec!["good".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].name, "broken");
        assert!(!report.is_clean());
        assert_eq!(loader.failures().len(), 1);
        assert!(loader.get("broken").is_none());
    }

    #[test]
    fn real_files_through_default_loaders() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tri.gltf"), TRIANGLE_GLTF).unwrap();
        write_png(&dir.path().join("grass.png"), 2, 2);
        let manifest = Manifest::new(vec![
            model("tri", "tri.gltf"),
            ResourceDescriptor::new("grass", ResourceKind::Texture, "grass.png"),
        ]);
        let mut loader =
            AssetLoader::new(manifest, dir.path(), &LoaderSet::default(), Dispatch::Threaded)
                .unwrap();
        poll_until_complete(&mut loader);

        assert!(loader.report().is_clean());
        assert!(loader.get("tri").unwrap().as_model().is_some());
        assert!(loader.get("grass").unwrap().as_texture().is_some());
    }

    #[test]
    fn duplicate_manifest_is_rejected() {
        let manifest = Manifest::new(vec![model("a", "a.glb"), model("a", "b.glb")]);
        assert!(matches!(
            AssetLoader::new(manifest, ".", &LoaderSet::default(), Dispatch::Inline),
            Err(AssetError::Manifest(_))
        ));
    }

    #[test]
    fn clear_drops_assets_and_silences_notification() {
        let (set, _) = fake_set();
        let manifest = Manifest::new(vec![model("a", "a.glb")]);
        let mut loader = AssetLoader::new(manifest, ".", &set, Dispatch::Inline).unwrap();
        let seen = count_all_loaded(&mut loader);
        loader.clear();
        loader.poll();
        assert!(seen.borrow().is_empty());
        assert!(loader.items().is_empty());
    }
}
