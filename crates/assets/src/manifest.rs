use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Number of faces a cube texture is built from.
pub const CUBE_FACES: usize = 6;

/// What a resource decodes into. Unknown strings are kept verbatim so the
/// loader can report them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceKind {
    Model,
    Texture,
    CubeTexture,
    Unrecognized(String),
}

impl From<String> for ResourceKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "gltfModel" | "model" => Self::Model,
            "texture" => Self::Texture,
            "cubeTexture" | "cube-texture" => Self::CubeTexture,
            _ => Self::Unrecognized(value),
        }
    }
}

impl From<ResourceKind> for String {
    fn from(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Unrecognized(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl ResourceKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Model => "gltfModel",
            Self::Texture => "texture",
            Self::CubeTexture => "cubeTexture",
            Self::Unrecognized(s) => s,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file, or an ordered list of files (cube faces).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceSource {
    Single(PathBuf),
    Many(Vec<PathBuf>),
}

impl ResourceSource {
    pub fn paths(&self) -> Vec<&Path> {
        match self {
            Self::Single(p) => vec![p.as_path()],
            Self::Many(ps) => ps.iter().map(PathBuf::as_path).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Many(ps) => ps.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named resource to load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    #[serde(rename = "path", alias = "paths")]
    pub source: ResourceSource,
}

impl ResourceDescriptor {
    pub fn new(name: impl Into<String>, kind: ResourceKind, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind,
            source: ResourceSource::Single(path.into()),
        }
    }

    pub fn cube(name: impl Into<String>, faces: Vec<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind: ResourceKind::CubeTexture,
            source: ResourceSource::Many(faces),
        }
    }

    /// Source paths joined onto `root`.
    pub fn resolve(&self, root: &Path) -> Vec<PathBuf> {
        self.source.paths().into_iter().map(|p| root.join(p)).collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("reading manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON manifest: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML manifest: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported manifest format: {0:?}")]
    UnsupportedFormat(PathBuf),
    #[error("resource with an empty name")]
    EmptyName,
    #[error("duplicate resource name: {0}")]
    DuplicateName(String),
    #[error("resource {0} has no path")]
    NoPaths(String),
    #[error("cube texture {name} needs 6 faces, found {found}")]
    CubeFaces { name: String, found: usize },
}

/// Ordered list of resources to load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    resources: Vec<ResourceDescriptor>,
}

impl Manifest {
    pub fn new(resources: Vec<ResourceDescriptor>) -> Self {
        Self { resources }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json_str(s: &str) -> Result<Self, ManifestError> {
        let manifest: Self = serde_json::from_str(s)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ManifestError> {
        let manifest: Self = serde_yaml::from_str(s)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Read a manifest file, choosing the format by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text)?,
            Some("yaml" | "yml") => Self::from_yaml_str(&text)?,
            _ => return Err(ManifestError::UnsupportedFormat(path.to_path_buf())),
        };
        tracing::debug!(path = %path.display(), resources = manifest.len(), "manifest loaded");
        Ok(manifest)
    }

    /// Check names are unique and non-empty, and sources are well formed.
    pub fn validate(&self) -> Result<(), ManifestError> {
        let mut seen = BTreeSet::new();
        for r in &self.resources {
            if r.name.is_empty() {
                return Err(ManifestError::EmptyName);
            }
            if !seen.insert(r.name.as_str()) {
                return Err(ManifestError::DuplicateName(r.name.clone()));
            }
            if r.source.is_empty() {
                return Err(ManifestError::NoPaths(r.name.clone()));
            }
            if r.kind == ResourceKind::CubeTexture && r.source.len() != CUBE_FACES {
                return Err(ManifestError::CubeFaces {
                    name: r.name.clone(),
                    found: r.source.len(),
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.resources.iter()
    }

    pub fn get(&self, name: &str) -> Option<&ResourceDescriptor> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn to_json(&self) -> Result<String, ManifestError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"[
        {"name": "duck", "type": "gltfModel", "path": "models/Duck.gltf"},
        {"name": "grass", "type": "texture", "path": "textures/grass.png"},
        {"name": "env", "type": "cubeTexture", "path": [
            "px.png", "nx.png", "py.png", "ny.png", "pz.png", "nz.png"
        ]},
        {"name": "font", "type": "font", "path": "fonts/helvetiker.json"}
    ]"#;

    #[test]
    fn parse_json_manifest() {
        let m = Manifest::from_json_str(JSON).unwrap();
        assert_eq!(m.len(), 4);
        let kinds: Vec<_> = m.iter().map(|r| r.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                ResourceKind::Model,
                ResourceKind::Texture,
                ResourceKind::CubeTexture,
                ResourceKind::Unrecognized("font".into()),
            ]
        );
        assert_eq!(m.get("env").unwrap().source.len(), 6);
    }

    #[test]
    fn parse_yaml_manifest_with_aliases() {
        let yaml = "
- name: duck
  type: model
  path: Duck.glb
- name: sky
  type: cube-texture
  paths: [a.png, b.png, c.png, d.png, e.png, f.png]
";
        let m = Manifest::from_yaml_str(yaml).unwrap();
        assert_eq!(m.get("duck").unwrap().kind, ResourceKind::Model);
        assert_eq!(m.get("sky").unwrap().kind, ResourceKind::CubeTexture);
    }

    #[test]
    fn unknown_kind_round_trips_verbatim() {
        let m = Manifest::from_json_str(JSON).unwrap();
        let json = m.to_json().unwrap();
        assert!(json.contains("\"font\""));
        assert!(json.contains("\"gltfModel\""));
    }

    #[test]
    fn duplicate_names_rejected() {
        let json = r#"[
            {"name": "a", "type": "texture", "path": "a.png"},
            {"name": "a", "type": "texture", "path": "b.png"}
        ]"#;
        assert!(matches!(
            Manifest::from_json_str(json),
            Err(ManifestError::DuplicateName(n)) if n == "a"
        ));
    }

    #[test]
    fn cube_texture_needs_six_faces() {
        let json = r#"[{"name": "env", "type": "cubeTexture", "path": ["a.png", "b.png"]}]"#;
        assert!(matches!(
            Manifest::from_json_str(json),
            Err(ManifestError::CubeFaces { found: 2, .. })
        ));
    }

    #[test]
    fn load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("sources.json");
        std::fs::write(&json, JSON).unwrap();
        assert_eq!(Manifest::load(&json).unwrap().len(), 4);

        let toml = dir.path().join("sources.toml");
        std::fs::write(&toml, "").unwrap();
        assert!(matches!(
            Manifest::load(&toml),
            Err(ManifestError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            Manifest::load(dir.path().join("missing.json")),
            Err(ManifestError::Io { .. })
        ));
    }

    #[test]
    fn empty_manifest_is_valid() {
        let m = Manifest::from_json_str("[]").unwrap();
        assert!(m.is_empty());
    }

    #[test]
    fn resolve_joins_root() {
        let d = ResourceDescriptor::new("t", ResourceKind::Texture, "t.png");
        assert_eq!(
            d.resolve(Path::new("static")),
            vec![PathBuf::from("static/t.png")]
        );
    }
}
