//! WGSL programs for the simulation step and the particle render pass.
//!
//! The step program is the GPU form of [`crate::kernel::step_texel`]; keep
//! the two in sync. The noise helpers are prepended to the step program by
//! [`step_shader`].

/// 3D simplex noise, `noise3(p) -> f32` in roughly [-1, 1].
pub const NOISE_WGSL: &str = r#"
fn mod289_3(x: vec3<f32>) -> vec3<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn mod289_4(x: vec4<f32>) -> vec4<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn permute4(x: vec4<f32>) -> vec4<f32> {
    return mod289_4(((x * 34.0) + 1.0) * x);
}

fn taylor_inv_sqrt4(r: vec4<f32>) -> vec4<f32> {
    return 1.79284291400159 - 0.85373472095314 * r;
}

fn noise3(v: vec3<f32>) -> f32 {
    let C = vec2<f32>(1.0 / 6.0, 1.0 / 3.0);
    let D = vec4<f32>(0.0, 0.5, 1.0, 2.0);

    // First corner
    var i = floor(v + dot(v, vec3<f32>(C.y)));
    let x0 = v - i + dot(i, vec3<f32>(C.x));

    // Other corners
    let g = step(x0.yzx, x0.xyz);
    let l = 1.0 - g;
    let i1 = min(g.xyz, l.zxy);
    let i2 = max(g.xyz, l.zxy);

    let x1 = x0 - i1 + C.x;
    let x2 = x0 - i2 + C.y;
    let x3 = x0 - D.yyy;

    // Permutations
    i = mod289_3(i);
    let p = permute4(permute4(permute4(
        i.z + vec4<f32>(0.0, i1.z, i2.z, 1.0))
      + i.y + vec4<f32>(0.0, i1.y, i2.y, 1.0))
      + i.x + vec4<f32>(0.0, i1.x, i2.x, 1.0));

    // Gradients
    let n_ = 0.142857142857;
    let ns = n_ * D.wyz - D.xzx;

    let j = p - 49.0 * floor(p * ns.z * ns.z);

    let x_ = floor(j * ns.z);
    let y_ = floor(j - 7.0 * x_);

    let x = x_ * ns.x + ns.yyyy;
    let y = y_ * ns.x + ns.yyyy;
    let h = 1.0 - abs(x) - abs(y);

    let b0 = vec4<f32>(x.xy, y.xy);
    let b1 = vec4<f32>(x.zw, y.zw);

    let s0 = floor(b0) * 2.0 + 1.0;
    let s1 = floor(b1) * 2.0 + 1.0;
    let sh = -step(h, vec4<f32>(0.0));

    let a0 = b0.xzyw + s0.xzyw * sh.xxyy;
    let a1 = b1.xzyw + s1.xzyw * sh.zzww;

    var p0 = vec3<f32>(a0.xy, h.x);
    var p1 = vec3<f32>(a0.zw, h.y);
    var p2 = vec3<f32>(a1.xy, h.z);
    var p3 = vec3<f32>(a1.zw, h.w);

    let norm = taylor_inv_sqrt4(vec4<f32>(dot(p0, p0), dot(p1, p1), dot(p2, p2), dot(p3, p3)));
    p0 *= norm.x;
    p1 *= norm.y;
    p2 *= norm.z;
    p3 *= norm.w;

    var m = max(0.6 - vec4<f32>(dot(x0, x0), dot(x1, x1), dot(x2, x2), dot(x3, x3)), vec4<f32>(0.0));
    m = m * m;
    return 42.0 * dot(m * m, vec4<f32>(dot(p0, x0), dot(p1, x1), dot(p2, x2), dot(p3, x3)));
}
"#;

/// Compute program advancing every texel of the state texture by one step.
pub const STEP_WGSL: &str = r#"
struct StepUniforms {
    time: f32,
    delta_time: f32,
    influence: f32,
    strength: f32,
    frequency: f32,
    respawn_rate: f32,
    time_scale: f32,
    shape_frequency: f32,
    return_rate: f32,
    grid_size: u32,
    particle_count: u32,
    _pad0: u32,
};

@group(0) @binding(0)
var<uniform> params: StepUniforms;

@group(0) @binding(1)
var previous_state: texture_2d<f32>;

@group(0) @binding(2)
var base_state: texture_2d<f32>;

@group(0) @binding(3)
var next_state: texture_storage_2d<rgba32float, write>;

// smoothstep that treats edge1 <= edge0 as a hard step at edge1
fn gate_step(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return select(0.0, 1.0, x >= edge1);
    }
    return smoothstep(edge0, edge1, x);
}

fn flow_velocity(position: vec3<f32>, rest: vec3<f32>) -> vec3<f32> {
    let t = params.time * params.time_scale;

    let gate_noise = noise3(rest * params.shape_frequency + vec3<f32>(t + 1.0));
    let threshold = (params.influence - 0.5) * -2.0;
    let gate = gate_step(threshold, 1.0, gate_noise);

    let q = position * params.frequency + vec3<f32>(t);
    var direction = vec3<f32>(
        noise3(q),
        noise3(q + vec3<f32>(1.0)),
        noise3(q + vec3<f32>(2.0)),
    );
    let len = length(direction);
    if len > 0.0 {
        direction = direction / len;
    }

    let flow = direction * params.strength;
    let home = (rest - position) * params.return_rate;
    return mix(home, flow, gate);
}

@compute @workgroup_size(8, 8)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    if id.x >= params.grid_size || id.y >= params.grid_size {
        return;
    }

    let coord = vec2<i32>(id.xy);
    let index = id.y * params.grid_size + id.x;

    // Padding texels stay zero
    if index >= params.particle_count {
        textureStore(next_state, coord, vec4<f32>(0.0));
        return;
    }

    let previous = textureLoad(previous_state, coord, 0);
    let base = textureLoad(base_state, coord, 0);

    let life = previous.w + params.delta_time * params.respawn_rate;
    if life >= 1.0 {
        textureStore(next_state, coord, vec4<f32>(base.xyz, fract(life)));
        return;
    }

    let velocity = flow_velocity(previous.xyz, base.xyz);
    textureStore(next_state, coord, vec4<f32>(previous.xyz + velocity * params.delta_time, life));
}
"#;

/// Render program: one instanced quad per particle.
pub const PARTICLES_WGSL: &str = r#"
struct RenderUniforms {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    resolution: vec2<f32>,
    point_size: f32,
    grid_size: u32,
};

@group(0) @binding(0)
var<uniform> uniforms: RenderUniforms;

@group(0) @binding(1)
var particles: texture_2d<f32>;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) sprite: vec2<f32>,
};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) particle_uv: vec2<f32>,
    @location(1) size: f32,
    @location(2) color: vec3<f32>,
) -> VertexOutput {
    var quad_vertices = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );
    let quad = quad_vertices[vertex_index];

    let texel = vec2<i32>(floor(particle_uv * f32(uniforms.grid_size)));
    let particle = textureLoad(particles, texel, 0);

    let view_position = uniforms.view * vec4<f32>(particle.xyz, 1.0);
    var clip_pos = uniforms.projection * view_position;

    // Grow in after respawn, shrink out before the next one
    let size_in = smoothstep(0.0, 0.1, particle.w);
    let size_out = 1.0 - smoothstep(0.7, 1.0, particle.w);
    let envelope = min(size_in, size_out);

    let pixel_size = envelope * size * uniforms.point_size * uniforms.resolution.y
        / max(-view_position.z, 0.0001);

    // Pixel diameter to clip-space half extent
    let offset = quad * pixel_size / uniforms.resolution * clip_pos.w;
    clip_pos.x += offset.x;
    clip_pos.y += offset.y;

    var out: VertexOutput;
    out.clip_position = clip_pos;
    out.color = color;
    out.sprite = quad * 0.5;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    if length(in.sprite) > 0.5 {
        discard;
    }
    return vec4<f32>(in.color, 1.0);
}
"#;

/// Full source of the simulation step program.
pub fn step_shader() -> String {
    format!("// Noise\n{}\n{}", NOISE_WGSL, STEP_WGSL)
}

/// Full source of the particle render program.
pub fn particles_shader() -> String {
    PARTICLES_WGSL.to_string()
}
