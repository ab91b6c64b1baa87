use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::asset::{Asset, CubeTextureAsset, MaterialSummary, MeshSummary, ModelAsset, TextureAsset};
use crate::manifest::{CUBE_FACES, ManifestError, ResourceKind};

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("glTF {path}: {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },
    #[error("image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("expected {expected} source file(s), got {found}")]
    SourceCount { expected: usize, found: usize },
    #[error("cube face {face} is {found:?}, expected {expected:?}")]
    FaceSize {
        face: usize,
        expected: (u32, u32),
        found: (u32, u32),
    },
    #[error("no loader for kind {0}")]
    NoLoader(ResourceKind),
    #[error("could not start loader thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("loader panicked on {name}")]
    Panicked { name: String },
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Decodes the files of one resource kind.
///
/// Loaders run on worker threads when dispatch is threaded, so they must be
/// shareable and must not touch any owner-thread state.
pub trait Loader: Send + Sync {
    fn load(&self, paths: &[PathBuf]) -> Result<Asset, AssetError>;
}

fn read(path: &Path) -> Result<Vec<u8>, AssetError> {
    std::fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn single(paths: &[PathBuf]) -> Result<&Path, AssetError> {
    match paths {
        [p] => Ok(p),
        _ => Err(AssetError::SourceCount {
            expected: 1,
            found: paths.len(),
        }),
    }
}

/// glTF and GLB models. Only the document is parsed; buffers stay on disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct GltfLoader;

impl GltfLoader {
    pub fn parse(bytes: &[u8], path: &Path) -> Result<ModelAsset, AssetError> {
        let gltf = gltf::Gltf::from_slice(bytes).map_err(|source| AssetError::Gltf {
            path: path.to_path_buf(),
            source,
        })?;

        let meshes = gltf
            .meshes()
            .map(|mesh| {
                let mut summary = MeshSummary {
                    name: mesh
                        .name()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("mesh_{}", mesh.index())),
                    primitives: 0,
                    vertex_count: 0,
                    index_count: 0,
                };
                for primitive in mesh.primitives() {
                    summary.primitives += 1;
                    summary.vertex_count += primitive
                        .get(&gltf::Semantic::Positions)
                        .map(|a| a.count())
                        .unwrap_or(0);
                    summary.index_count += primitive.indices().map(|a| a.count()).unwrap_or(0);
                }
                summary
            })
            .collect();

        let materials = gltf
            .materials()
            .map(|m| MaterialSummary {
                name: m.name().unwrap_or("unnamed").to_string(),
                base_color: m.pbr_metallic_roughness().base_color_factor(),
            })
            .collect();

        Ok(ModelAsset {
            meshes,
            materials,
            nodes: gltf.nodes().count(),
            scenes: gltf.scenes().count(),
            animations: gltf.animations().count(),
        })
    }
}

impl Loader for GltfLoader {
    fn load(&self, paths: &[PathBuf]) -> Result<Asset, AssetError> {
        let path = single(paths)?;
        let bytes = read(path)?;
        let model = Self::parse(&bytes, path)?;
        tracing::debug!(
            path = %path.display(),
            meshes = model.meshes.len(),
            vertices = model.vertex_count(),
            "model parsed"
        );
        Ok(Asset::Model(model))
    }
}

/// PNG and JPEG images, decoded to RGBA8.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextureLoader;

impl TextureLoader {
    pub fn decode(path: &Path) -> Result<TextureAsset, AssetError> {
        let bytes = read(path)?;
        let fingerprint = format!("{:x}", Sha256::digest(&bytes));
        let rgba = image::load_from_memory(&bytes)
            .map_err(|source| AssetError::Image {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(TextureAsset {
            width,
            height,
            pixels: rgba.into_raw(),
            fingerprint,
        })
    }
}

impl Loader for TextureLoader {
    fn load(&self, paths: &[PathBuf]) -> Result<Asset, AssetError> {
        Ok(Asset::Texture(Self::decode(single(paths)?)?))
    }
}

/// Six faces, all required to share one size.
#[derive(Debug, Default, Clone, Copy)]
pub struct CubeTextureLoader;

impl Loader for CubeTextureLoader {
    fn load(&self, paths: &[PathBuf]) -> Result<Asset, AssetError> {
        if paths.len() != CUBE_FACES {
            return Err(AssetError::SourceCount {
                expected: CUBE_FACES,
                found: paths.len(),
            });
        }
        let mut faces = Vec::with_capacity(CUBE_FACES);
        for (face, path) in paths.iter().enumerate() {
            let texture = TextureLoader::decode(path)?;
            if let Some(first) = faces.first().map(|f: &TextureAsset| (f.width, f.height)) {
                let found = (texture.width, texture.height);
                if found != first {
                    return Err(AssetError::FaceSize {
                        face,
                        expected: first,
                        found,
                    });
                }
            }
            faces.push(texture);
        }
        Ok(Asset::CubeTexture(CubeTextureAsset { faces }))
    }
}

/// The loader used for each recognized kind.
#[derive(Clone)]
pub struct LoaderSet {
    model: Arc<dyn Loader>,
    texture: Arc<dyn Loader>,
    cube_texture: Arc<dyn Loader>,
}

impl LoaderSet {
    pub fn with_model(mut self, loader: impl Loader + 'static) -> Self {
        self.model = Arc::new(loader);
        self
    }

    pub fn with_texture(mut self, loader: impl Loader + 'static) -> Self {
        self.texture = Arc::new(loader);
        self
    }

    pub fn with_cube_texture(mut self, loader: impl Loader + 'static) -> Self {
        self.cube_texture = Arc::new(loader);
        self
    }

    /// The loader for `kind`, or `None` if the kind is unrecognized.
    pub fn for_kind(&self, kind: &ResourceKind) -> Option<Arc<dyn Loader>> {
        match kind {
            ResourceKind::Model => Some(self.model.clone()),
            ResourceKind::Texture => Some(self.texture.clone()),
            ResourceKind::CubeTexture => Some(self.cube_texture.clone()),
            ResourceKind::Unrecognized(_) => None,
        }
    }
}

impl Default for LoaderSet {
    fn default() -> Self {
        Self {
            model: Arc::new(GltfLoader),
            texture: Arc::new(TextureLoader),
            cube_texture: Arc::new(CubeTextureLoader),
        }
    }
}

impl std::fmt::Debug for LoaderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderSet").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Smallest valid glTF: one triangle mesh, one material.
    pub(crate) const TRIANGLE_GLTF: &str = r#"{
        "asset": {"version": "2.0"},
        "scene": 0,
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0}],
        "meshes": [{"name": "Triangle", "primitives": [{"attributes": {"POSITION": 0}, "material": 0}]}],
        "materials": [{"name": "Yellow", "pbrMetallicRoughness": {"baseColorFactor": [1.0, 1.0, 0.0, 1.0]}}],
        "accessors": [{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                       "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]}],
        "bufferViews": [{"buffer": 0, "byteLength": 36}],
        "buffers": [{"byteLength": 36,
                     "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"}]
    }"#;

    pub(crate) fn write_png(path: &Path, width: u32, height: u32) {
        image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn gltf_loader_summarizes_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("triangle.gltf");
        std::fs::write(&path, TRIANGLE_GLTF).unwrap();

        let asset = GltfLoader.load(&[path]).unwrap();
        let model = asset.as_model().unwrap();
        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.meshes[0].name, "Triangle");
        assert_eq!(model.vertex_count(), 3);
        assert_eq!(model.materials[0].base_color, [1.0, 1.0, 0.0, 1.0]);
        assert_eq!(model.nodes, 1);
        assert_eq!(model.scenes, 1);
    }

    #[test]
    fn gltf_loader_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.gltf");
        std::fs::write(&path, "not gltf").unwrap();
        assert!(matches!(
            GltfLoader.load(&[path]),
            Err(AssetError::Gltf { .. })
        ));
    }

    #[test]
    fn texture_loader_decodes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.png");
        write_png(&path, 4, 2);

        let asset = TextureLoader.load(&[path]).unwrap();
        let tex = asset.as_texture().unwrap();
        assert_eq!((tex.width, tex.height), (4, 2));
        assert_eq!(tex.pixels.len(), 4 * 2 * 4);
        assert_eq!(&tex.pixels[..4], &[255, 0, 0, 255]);
        assert_eq!(tex.fingerprint.len(), 64);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = TextureLoader
            .load(&[PathBuf::from("/nonexistent/x.png")])
            .unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[test]
    fn cube_loader_requires_matching_faces() {
        let dir = tempfile::tempdir().unwrap();
        let faces: Vec<PathBuf> = ["px", "nx", "py", "ny", "pz", "nz"]
            .iter()
            .map(|n| dir.path().join(format!("{n}.png")))
            .collect();
        for f in &faces {
            write_png(f, 2, 2);
        }
        let asset = CubeTextureLoader.load(&faces).unwrap();
        let cube = asset.as_cube_texture().unwrap();
        assert_eq!(cube.faces.len(), 6);
        assert_eq!(cube.face_size(), Some((2, 2)));

        write_png(&faces[3], 4, 4);
        assert!(matches!(
            CubeTextureLoader.load(&faces),
            Err(AssetError::FaceSize { face: 3, .. })
        ));
        assert!(matches!(
            CubeTextureLoader.load(&faces[..2]),
            Err(AssetError::SourceCount { expected: 6, found: 2 })
        ));
    }

    #[test]
    fn unrecognized_kind_has_no_loader() {
        let set = LoaderSet::default();
        assert!(set.for_kind(&ResourceKind::Texture).is_some());
        assert!(set.for_kind(&ResourceKind::Unrecognized("font".into())).is_none());
    }
}
