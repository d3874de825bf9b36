//! WGSL sources for the lit mesh pipeline.
//!
//! The stages are compiled as separate modules, so each declares the shared
//! uniform block. Its layout must match `shader::Uniforms`.

pub const VERTEX_SHADER: &str = r#"
struct Uniforms {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    light_pos: vec4<f32>,
    light_color: vec4<f32>,
    object_color: vec4<f32>,
    view_pos: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) frag_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world_position = uniforms.model * vec4<f32>(input.position, 1.0);
    out.frag_pos = world_position.xyz;
    out.normal = (uniforms.normal_matrix * vec4<f32>(input.normal, 0.0)).xyz;
    out.clip_position = uniforms.projection * uniforms.view * world_position;
    return out;
}
"#;

pub const FRAGMENT_SHADER: &str = r#"
struct Uniforms {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    light_pos: vec4<f32>,
    light_color: vec4<f32>,
    object_color: vec4<f32>,
    view_pos: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct FragmentInput {
    @location(0) frag_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

@fragment
fn fs_main(input: FragmentInput) -> @location(0) vec4<f32> {
    let light_color = uniforms.light_color.xyz;
    let ambient = 0.1 * light_color;

    let norm = normalize(input.normal);
    let light_dir = normalize(uniforms.light_pos.xyz - input.frag_pos);
    let diffuse = max(dot(norm, light_dir), 0.0) * light_color;

    let view_dir = normalize(uniforms.view_pos.xyz - input.frag_pos);
    let reflect_dir = reflect(-light_dir, norm);
    let spec = pow(max(dot(view_dir, reflect_dir), 0.0), 32.0);
    let specular = 0.5 * spec * light_color;

    let result = (ambient + diffuse + specular) * uniforms.object_color.xyz;
    return vec4<f32>(result, 1.0);
}
"#;
