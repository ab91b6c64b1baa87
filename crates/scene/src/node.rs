use experience_common::{Color, NodeId, Transform};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Shape a geometry was generated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeometryShape {
    Box { width: f32, height: f32, depth: f32 },
    Sphere { radius: f32, segments: u32 },
    Plane { width: f32, height: f32 },
    /// Geometry taken from a loaded model resource.
    Model { resource: String, mesh: usize },
}

/// GPU-resident vertex data, tracked by residency only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub shape: GeometryShape,
    disposed: bool,
}

impl Geometry {
    pub fn new(shape: GeometryShape) -> Self {
        Self {
            shape,
            disposed: false,
        }
    }

    pub fn cube(size: f32) -> Self {
        Self::new(GeometryShape::Box {
            width: size,
            height: size,
            depth: size,
        })
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Release the GPU side. Returns false if it was already released.
    pub fn dispose(&mut self) -> bool {
        !std::mem::replace(&mut self.disposed, true)
    }

    /// Axis-aligned extent, used by backends that draw everything as boxes.
    pub fn extent(&self) -> Vec3 {
        match self.shape {
            GeometryShape::Box {
                width,
                height,
                depth,
            } => Vec3::new(width, height, depth),
            GeometryShape::Sphere { radius, .. } => Vec3::splat(radius * 2.0),
            GeometryShape::Plane { width, height } => Vec3::new(width, 0.01, height),
            GeometryShape::Model { .. } => Vec3::ONE,
        }
    }
}

/// Physically based surface description.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub color: Color,
    pub roughness: f32,
    pub metalness: f32,
}

impl Material {
    pub fn standard(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            roughness: 1.0,
            metalness: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub geometry: Geometry,
    pub material: Material,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Mesh {
    pub fn new(geometry: Geometry, material: Material) -> Self {
        Self {
            geometry,
            material,
            cast_shadow: false,
            receive_shadow: false,
        }
    }
}

/// Shadow camera and map settings of a light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowSettings {
    pub far: f32,
    pub map_size: [u32; 2],
    pub normal_bias: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            far: 500.0,
            map_size: [512, 512],
            normal_bias: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub cast_shadow: bool,
    pub shadow: ShadowSettings,
}

impl DirectionalLight {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            cast_shadow: false,
            shadow: ShadowSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

/// Scene-wide environment lighting keyed off a loaded texture resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentMap {
    pub texture: String,
    pub intensity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Group,
    Mesh(Mesh),
    DirectionalLight(DirectionalLight),
    AmbientLight(AmbientLight),
}

/// A node of the scene graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub kind: NodeKind,
    pub visible: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            kind,
            visible: true,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self::new(name, NodeKind::Mesh(mesh))
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn as_mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_directional_light(&self) -> Option<&DirectionalLight> {
        match &self.kind {
            NodeKind::DirectionalLight(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_directional_light_mut(&mut self) -> Option<&mut DirectionalLight> {
        match &mut self.kind {
            NodeKind::DirectionalLight(l) => Some(l),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_disposes_once() {
        let mut g = Geometry::cube(1.0);
        assert!(!g.is_disposed());
        assert!(g.dispose());
        assert!(!g.dispose());
        assert!(g.is_disposed());
    }

    #[test]
    fn extent_of_shapes() {
        assert_eq!(Geometry::cube(2.0).extent(), Vec3::splat(2.0));
        let sphere = Geometry::new(GeometryShape::Sphere {
            radius: 0.5,
            segments: 16,
        });
        assert_eq!(sphere.extent(), Vec3::ONE);
    }

    #[test]
    fn node_accessors() {
        let node = Node::mesh("cube", Mesh::new(Geometry::cube(1.0), Material::default()));
        assert!(node.as_mesh().is_some());
        assert!(node.as_directional_light().is_none());
        assert!(node.visible);
    }
}
