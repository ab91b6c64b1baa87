use std::path::{Path, PathBuf};

use experience_assets::{Dispatch, Manifest};
use experience_render::{CameraSettings, RendererSettings};
use serde::{Deserialize, Serialize};

use crate::ExperienceError;

/// Resource name the environment looks up after loading.
pub const DEFAULT_ENVIRONMENT_MAP: &str = "environmentMapTexture";

/// Everything an [`Experience`](crate::Experience) is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceConfig {
    pub manifest: Manifest,
    /// Directory manifest paths are relative to.
    pub asset_root: PathBuf,
    /// `#debug` turns the debug panel on.
    pub location_hash: String,
    pub dispatch: Dispatch,
    pub renderer: RendererSettings,
    pub camera: CameraSettings,
    pub environment_map: String,
}

impl Default for ExperienceConfig {
    fn default() -> Self {
        Self {
            manifest: Manifest::empty(),
            asset_root: PathBuf::from("."),
            location_hash: String::new(),
            dispatch: Dispatch::Threaded,
            renderer: RendererSettings::default(),
            camera: CameraSettings::default(),
            environment_map: DEFAULT_ENVIRONMENT_MAP.to_string(),
        }
    }
}

impl ExperienceConfig {
    pub fn with_manifest(mut self, manifest: Manifest) -> Self {
        self.manifest = manifest;
        self
    }

    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = root.into();
        self
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.location_hash = hash.into();
        self
    }

    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Read a JSON or YAML config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ExperienceError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ExperienceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed: Result<Self, String> = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&text).map_err(|e| e.to_string()),
            Some("yaml" | "yml") => serde_yaml::from_str(&text).map_err(|e| e.to_string()),
            _ => Err("expected a .json, .yaml or .yml file".to_string()),
        };
        let config = parsed.map_err(|message| ExperienceError::Config {
            path: path.to_path_buf(),
            message,
        })?;
        config.manifest.validate()?;
        Ok(config)
    }
}
