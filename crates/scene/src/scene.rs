use std::collections::BTreeMap;

use experience_common::NodeId;
use serde::{Deserialize, Serialize};

use crate::node::{EnvironmentMap, Node, NodeKind};

/// An event record produced by every structural mutation of the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneEvent {
    Added { id: NodeId, parent: Option<NodeId> },
    Removed { id: NodeId },
    GeometryDisposed { id: NodeId },
    EnvironmentSet { texture: String },
    Cleared,
}

/// Errors from scene operations.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("node {0:?} not found")]
    NodeNotFound(NodeId),
}

/// The scene graph.
///
/// Nodes live in a BTreeMap keyed by id; hierarchy and ordering are kept in
/// the `roots` list and each node's child list, so traversal follows
/// insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    nodes: BTreeMap<NodeId, Node>,
    roots: Vec<NodeId>,
    environment: Option<EnvironmentMap>,
    #[serde(skip)]
    event_log: Vec<SceneEvent>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node at the top level. Returns its id.
    pub fn add(&mut self, mut node: Node) -> NodeId {
        let id = NodeId::new();
        node.parent = None;
        node.children.clear();
        self.nodes.insert(id, node);
        self.roots.push(id);
        self.event_log.push(SceneEvent::Added { id, parent: None });
        id
    }

    /// Add a node under `parent`.
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> Result<NodeId, SceneError> {
        if !self.nodes.contains_key(&parent) {
            return Err(SceneError::NodeNotFound(parent));
        }
        let id = NodeId::new();
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.insert(id, node);
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        self.event_log.push(SceneEvent::Added {
            id,
            parent: Some(parent),
        });
        Ok(id)
    }

    /// Remove a node and its whole subtree. Returns the removed node.
    pub fn remove(&mut self, id: NodeId) -> Result<Node, SceneError> {
        let parent = self
            .nodes
            .get(&id)
            .ok_or(SceneError::NodeNotFound(id))?
            .parent;
        match parent {
            Some(p) => {
                if let Some(p) = self.nodes.get_mut(&p) {
                    p.children.retain(|c| *c != id);
                }
            }
            None => self.roots.retain(|r| *r != id),
        }

        let mut stack = vec![id];
        let mut removed = None;
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.children.iter().copied());
                self.event_log.push(SceneEvent::Removed { id: current });
                if current == id {
                    removed = Some(node);
                }
            }
        }
        removed.ok_or(SceneError::NodeNotFound(id))
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// First node with the given name, in traversal order.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        let mut found = None;
        self.traverse(|id, node| {
            if found.is_none() && node.name == name {
                found = Some(id);
            }
        });
        found
    }

    /// Visit every node depth-first, parents before children.
    pub fn traverse(&self, mut visit: impl FnMut(NodeId, &Node)) {
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                visit(id, node);
                stack.extend(node.children.iter().rev().copied());
            }
        }
    }

    /// Ids in traversal order.
    pub fn ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::with_capacity(self.nodes.len());
        self.traverse(|id, _| ids.push(id));
        ids
    }

    /// World-space position of a node, composing parent translations.
    pub fn world_position(&self, id: NodeId) -> Option<glam::Vec3> {
        let mut node = self.nodes.get(&id)?;
        let mut position = node.transform.position;
        while let Some(parent) = node.parent.and_then(|p| self.nodes.get(&p)) {
            position = parent.transform.rotation * (position * parent.transform.scale)
                + parent.transform.position;
            node = parent;
        }
        Some(position)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn mesh_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|n| matches!(n.kind, NodeKind::Mesh(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn set_environment(&mut self, environment: EnvironmentMap) {
        self.event_log.push(SceneEvent::EnvironmentSet {
            texture: environment.texture.clone(),
        });
        self.environment = Some(environment);
    }

    pub fn environment(&self) -> Option<&EnvironmentMap> {
        self.environment.as_ref()
    }

    pub fn environment_mut(&mut self) -> Option<&mut EnvironmentMap> {
        self.environment.as_mut()
    }

    /// Release the geometry of every mesh. Returns how many were released
    /// by this call; already released geometry is skipped.
    pub fn dispose_geometries(&mut self) -> usize {
        let _span = tracing::debug_span!("dispose_geometries").entered();
        let mut released = 0;
        for id in self.ids() {
            if let Some(NodeKind::Mesh(mesh)) = self.nodes.get_mut(&id).map(|n| &mut n.kind) {
                if mesh.geometry.dispose() {
                    released += 1;
                    self.event_log.push(SceneEvent::GeometryDisposed { id });
                }
            }
        }
        tracing::debug!(released, "geometries released");
        released
    }

    /// Drop every node and the environment.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
        self.environment = None;
        self.event_log.push(SceneEvent::Cleared);
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[SceneEvent] {
        &self.event_log
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.event_log)
    }
}
