/// Uniform block shared by both shaders. Layout matches `FrameUniforms`.
const FRAME_UNIFORMS: &str = r#"
struct Frame {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    light_color: vec4<f32>,
    light_direction: vec4<f32>,
    light_position: vec4<f32>,
    // ambient, diffuse, specular, shininess
    amounts: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;
"#;

const LINE_BODY: &str = r#"
struct LineVertex {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
};

struct LineOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_line(vertex: LineVertex) -> LineOutput {
    var out: LineOutput;
    out.clip_position = frame.view_proj * vec4<f32>(vertex.position, 1.0);
    out.color = vertex.color;
    return out;
}

@fragment
fn fs_line(in: LineOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

const MESH_BODY: &str = r#"
struct MeshVertex {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec4<f32>,
};

struct MeshOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec4<f32>,
};

@vertex
fn vs_mesh(vertex: MeshVertex) -> MeshOutput {
    var out: MeshOutput;
    out.clip_position = frame.view_proj * vec4<f32>(vertex.position, 1.0);
    out.world_position = vertex.position;
    out.normal = vertex.normal;
    out.color = vertex.color;
    return out;
}

@fragment
fn fs_mesh(in: MeshOutput) -> @location(0) vec4<f32> {
    let view_dir = normalize(frame.camera_position.xyz - in.world_position);
    var normal = normalize(in.normal);
    // Two-sided lighting.
    if (dot(normal, view_dir) < 0.0) {
        normal = -normal;
    }
    let light_dir = normalize(frame.light_direction.xyz);
    let diffuse = max(dot(normal, light_dir), 0.0) * frame.amounts.y;
    let to_light = normalize(frame.light_position.xyz - in.world_position);
    let half_dir = normalize(to_light + view_dir);
    let specular = pow(max(dot(normal, half_dir), 0.0), max(frame.amounts.w, 1.0)) * frame.amounts.z;
    let light = frame.light_color.rgb * (frame.amounts.x + diffuse + specular);
    return vec4<f32>(in.color.rgb * light, in.color.a);
}
"#;

/// WGSL for grid and axis lines.
pub fn line_shader() -> String {
    format!("{FRAME_UNIFORMS}{LINE_BODY}")
}

/// WGSL for lit solid meshes.
pub fn mesh_shader() -> String {
    format!("{FRAME_UNIFORMS}{MESH_BODY}")
}
