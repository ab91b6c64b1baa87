//! Resource loading: a declarative manifest of named resources, one loader
//! per resource kind, and a registry the scene reads decoded assets from.
//!
//! # Invariants
//! - Resource names are unique within a manifest.
//! - The registry is append-only until it is cleared.
//! - All-loaded fires exactly once per manifest, from `AssetLoader::poll`,
//!   after every resource resolved (loaded, failed, or skipped).
//! - Worker threads only decode files; all bookkeeping happens in `poll`.

pub mod asset;
pub mod loader;
pub mod loaders;
pub mod manifest;
pub mod registry;

pub use asset::{Asset, CubeTextureAsset, MaterialSummary, MeshSummary, ModelAsset, TextureAsset};
pub use loader::{AssetLoader, Dispatch, LoadFailure, LoadProgress, LoadReport};
pub use loaders::{AssetError, CubeTextureLoader, GltfLoader, Loader, LoaderSet, TextureLoader};
pub use manifest::{
    CUBE_FACES, Manifest, ManifestError, ResourceDescriptor, ResourceKind, ResourceSource,
};
pub use registry::LoadedAssetRegistry;

pub fn crate_info() -> &'static str {
    "experience-assets v0.1.0"
}
