use std::path::PathBuf;

use experience_assets::{AssetError, ManifestError};
use experience_render::RenderError;
use experience_scene::SceneError;

/// Errors surfaced by the composition root.
#[derive(Debug, thiserror::Error)]
pub enum ExperienceError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config {path}: {message}")]
    Config { path: PathBuf, message: String },
}
