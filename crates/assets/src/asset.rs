use serde::{Deserialize, Serialize};

/// Summary of one mesh in a model file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshSummary {
    pub name: String,
    pub primitives: usize,
    pub vertex_count: usize,
    pub index_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSummary {
    pub name: String,
    pub base_color: [f32; 4],
}

/// A decoded glTF document, reduced to what the scene needs to know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelAsset {
    pub meshes: Vec<MeshSummary>,
    pub materials: Vec<MaterialSummary>,
    pub nodes: usize,
    pub scenes: usize,
    pub animations: usize,
}

impl ModelAsset {
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.vertex_count).sum()
    }
}

/// RGBA8 pixels plus a SHA-256 fingerprint of the encoded source.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureAsset {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub fingerprint: String,
}

impl std::fmt::Debug for TextureAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureAsset")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

/// Six same-sized faces in `px, nx, py, ny, pz, nz` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubeTextureAsset {
    pub faces: Vec<TextureAsset>,
}

impl CubeTextureAsset {
    pub fn face_size(&self) -> Option<(u32, u32)> {
        self.faces.first().map(|f| (f.width, f.height))
    }
}

/// A loaded resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Asset {
    Model(ModelAsset),
    Texture(TextureAsset),
    CubeTexture(CubeTextureAsset),
}

impl Asset {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Model(_) => "model",
            Self::Texture(_) => "texture",
            Self::CubeTexture(_) => "cube-texture",
        }
    }

    pub fn as_model(&self) -> Option<&ModelAsset> {
        match self {
            Self::Model(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_texture(&self) -> Option<&TextureAsset> {
        match self {
            Self::Texture(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_cube_texture(&self) -> Option<&CubeTextureAsset> {
        match self {
            Self::CubeTexture(c) => Some(c),
            _ => None,
        }
    }

    /// True for textures and cube textures, either of which can light a scene.
    pub fn is_environment_source(&self) -> bool {
        matches!(self, Self::Texture(_) | Self::CubeTexture(_))
    }
}
