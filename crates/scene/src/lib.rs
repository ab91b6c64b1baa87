//! Scene graph: the hierarchy of renderable objects and transforms.
//!
//! # Invariants
//! - Nodes are only mutated through explicit `Scene` operations.
//! - Traversal order is deterministic: roots and children in insertion order.
//! - A geometry is released at most once; a released geometry is never drawn.

pub mod node;
pub mod scene;

pub use node::{
    AmbientLight, DirectionalLight, EnvironmentMap, Geometry, GeometryShape, Material, Mesh, Node,
    NodeKind, ShadowSettings,
};
pub use scene::{Scene, SceneError, SceneEvent};

pub fn crate_info() -> &'static str {
    "experience-scene v0.1.0"
}
