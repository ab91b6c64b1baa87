use experience_assets::AssetLoader;
use experience_common::{Color, NodeId};
use experience_scene::{DirectionalLight, EnvironmentMap, Node, NodeKind, Scene, ShadowSettings};
use experience_tools::{ControlChange, ControlId, DebugPanel};
use glam::Vec3;

pub const SUN_INTENSITY: f32 = 4.0;
pub const SUN_POSITION: Vec3 = Vec3::new(3.0, 3.0, -2.25);
pub const ENVIRONMENT_INTENSITY: f32 = 0.4;

#[derive(Debug, Default, Clone, Copy)]
struct Controls {
    sun_intensity: Option<ControlId>,
    sun_x: Option<ControlId>,
    sun_y: Option<ControlId>,
    sun_z: Option<ControlId>,
    environment_intensity: Option<ControlId>,
}

/// Scene lighting built once every resource has resolved.
#[derive(Debug)]
pub struct Environment {
    sun: NodeId,
    environment_map: Option<String>,
    controls: Controls,
}

impl Environment {
    /// Add the sun and, if `environment_map` names a loaded texture, the
    /// scene environment. Registers tuning controls when debugging.
    pub fn build(
        scene: &mut Scene,
        resources: &AssetLoader,
        debug: &mut DebugPanel,
        environment_map: &str,
    ) -> Self {
        let mut sun = DirectionalLight::new(Color::WHITE, SUN_INTENSITY);
        sun.cast_shadow = true;
        sun.shadow = ShadowSettings {
            far: 15.0,
            map_size: [1024, 1024],
            normal_bias: 0.05,
        };
        let sun = scene.add(
            Node::new("sunLight", NodeKind::DirectionalLight(sun)).with_position(SUN_POSITION),
        );

        let environment_map = match resources.get(environment_map) {
            Some(asset) if asset.is_environment_source() => {
                scene.set_environment(EnvironmentMap {
                    texture: environment_map.to_string(),
                    intensity: ENVIRONMENT_INTENSITY,
                });
                Some(environment_map.to_string())
            }
            Some(asset) => {
                tracing::warn!(
                    name = environment_map,
                    kind = asset.kind_name(),
                    "environment map resource is not a texture"
                );
                None
            }
            None => {
                tracing::debug!(name = environment_map, "no environment map loaded");
                None
            }
        };

        let mut controls = Controls::default();
        let folder = debug.add_folder("environment");
        controls.sun_intensity =
            debug.add_slider(folder, "sunLightIntensity", SUN_INTENSITY, 0.0, 10.0, 0.001);
        controls.sun_x = debug.add_slider(folder, "sunLightX", SUN_POSITION.x, -5.0, 5.0, 0.001);
        controls.sun_y = debug.add_slider(folder, "sunLightY", SUN_POSITION.y, -5.0, 5.0, 0.001);
        controls.sun_z = debug.add_slider(folder, "sunLightZ", SUN_POSITION.z, -5.0, 5.0, 0.001);
        if environment_map.is_some() {
            controls.environment_intensity = debug.add_slider(
                folder,
                "envMapIntensity",
                ENVIRONMENT_INTENSITY,
                0.0,
                4.0,
                0.001,
            );
        }

        tracing::info!(environment_map = ?environment_map, "environment built");
        Self {
            sun,
            environment_map,
            controls,
        }
    }

    pub fn sun(&self) -> NodeId {
        self.sun
    }

    pub fn environment_map(&self) -> Option<&str> {
        self.environment_map.as_deref()
    }

    /// Apply debug edits that target this environment. Returns how many
    /// were applied.
    pub fn apply(&self, changes: &[ControlChange], scene: &mut Scene) -> usize {
        let mut applied = 0;
        for change in changes {
            let Some(value) = change.value.as_number() else {
                continue;
            };
            let id = Some(change.id);
            if id == self.controls.environment_intensity {
                if let Some(env) = scene.environment_mut() {
                    env.intensity = value;
                    applied += 1;
                }
                continue;
            }
            let Some(node) = scene.get_mut(self.sun) else {
                continue;
            };
            if id == self.controls.sun_intensity {
                if let Some(light) = node.as_directional_light_mut() {
                    light.intensity = value;
                    applied += 1;
                }
            } else if id == self.controls.sun_x {
                node.transform.position.x = value;
                applied += 1;
            } else if id == self.controls.sun_y {
                node.transform.position.y = value;
                applied += 1;
            } else if id == self.controls.sun_z {
                node.transform.position.z = value;
                applied += 1;
            }
        }
        applied
    }
}
