/// WGSL shader for lit, instanced mesh boxes.
///
/// One directional light plus a flat ambient term scaled by the scene's
/// environment intensity. `params.x` is exposure, `params.y` selects tone
/// mapping (0 = none, 1 = filmic curve), `params.z` is the ambient level.
pub const SCENE_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    light_dir: vec4<f32>,
    light_color: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);
    let world_normal = (model * vec4<f32>(vertex.normal, 0.0)).xyz;

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * world_pos;
    out.world_normal = normalize(world_normal);
    out.color = instance.color;
    return out;
}

fn filmic(x: vec3<f32>) -> vec3<f32> {
    let c = max(vec3<f32>(0.0), x - vec3<f32>(0.004));
    return (c * (6.2 * c + 0.5)) / (c * (6.2 * c + 1.7) + 0.06);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let light_dir = normalize(uniforms.light_dir.xyz);
    let intensity = uniforms.light_dir.w;
    let diffuse = max(dot(in.world_normal, light_dir), 0.0) * intensity;
    let lit = in.color.rgb * (uniforms.params.z + diffuse * uniforms.light_color.rgb);
    var mapped = lit * uniforms.params.x;
    if (uniforms.params.y > 0.5) {
        mapped = filmic(mapped);
    }
    return vec4<f32>(mapped, in.color.a);
}
"#;
