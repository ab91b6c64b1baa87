use experience_common::NodeId;
use experience_scene::{NodeKind, Scene};

/// Read-only queries against the scene for the debug panel and the CLI.
pub struct SceneInspector;

impl SceneInspector {
    pub fn summary(scene: &Scene) -> SceneSummary {
        let mut summary = SceneSummary {
            nodes: scene.node_count(),
            meshes: 0,
            resident_geometries: 0,
            lights: 0,
            environment: scene.environment().map(|e| e.texture.clone()),
        };
        scene.traverse(|_, node| match &node.kind {
            NodeKind::Mesh(mesh) => {
                summary.meshes += 1;
                if !mesh.geometry.is_disposed() {
                    summary.resident_geometries += 1;
                }
            }
            NodeKind::DirectionalLight(_) | NodeKind::AmbientLight(_) => summary.lights += 1,
            NodeKind::Group => {}
        });
        summary
    }

    pub fn inspect_node(scene: &Scene, id: NodeId) -> Option<NodeInfo> {
        let node = scene.get(id)?;
        let p = scene.world_position(id).unwrap_or(node.transform.position);
        let s = node.transform.scale;
        Some(NodeInfo {
            id,
            name: node.name.clone(),
            kind: match &node.kind {
                NodeKind::Group => "group",
                NodeKind::Mesh(_) => "mesh",
                NodeKind::DirectionalLight(_) => "directional light",
                NodeKind::AmbientLight(_) => "ambient light",
            },
            position: [p.x, p.y, p.z],
            scale: [s.x, s.y, s.z],
            children: node.children().len(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneSummary {
    pub nodes: usize,
    pub meshes: usize,
    pub resident_geometries: usize,
    pub lights: usize,
    pub environment: Option<String>,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: nodes={} meshes={} resident={} lights={} environment={}",
            self.nodes,
            self.meshes,
            self.resident_geometries,
            self.lights,
            self.environment.as_deref().unwrap_or("none")
        )
    }
}

#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub id: NodeId,
    pub name: String,
    pub kind: &'static str,
    pub position: [f32; 3],
    pub scale: [f32; 3],
    pub children: usize,
}

impl std::fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} ({}) pos=({:.2}, {:.2}, {:.2}) scale=({:.2}, {:.2}, {:.2})",
            self.id.short(),
            self.name,
            self.kind,
            self.position[0],
            self.position[1],
            self.position[2],
            self.scale[0],
            self.scale[1],
            self.scale[2],
        )
    }
}
