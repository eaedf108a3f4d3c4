use std::{collections::HashMap, sync::Arc};

/// Uniform block and tone-mapping helpers shared by every shader.
pub const PRELUDE: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    inv_view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    camera_pos: vec3<f32>,
    _pad0: f32,
    surface_color: vec3<f32>,
    ambient: f32,
    sky_top: vec3<f32>,
    exposure: f32,
    sky_bottom: vec3<f32>,
    light_intensity: f32,
    material: u32,
    tone_mapping: u32,
    light_count: u32,
    _pad: u32,
    lights: array<vec4<f32>, 16>,
    light_colors: array<vec4<f32>, 16>,
}

@group(0) @binding(0)
var<uniform> globals: Globals;

fn aces(c: vec3<f32>) -> vec3<f32> {
    let a = 2.51;
    let b = 0.03;
    let d = 2.43;
    let e = 0.59;
    let f = 0.14;
    return clamp((c * (a * c + b)) / (c * (d * c + e) + f), vec3<f32>(0.0), vec3<f32>(1.0));
}

fn tone_map(color: vec3<f32>) -> vec3<f32> {
    let c = color * globals.exposure;
    var out = color;
    switch globals.tone_mapping {
        case 1u: { out = clamp(c, vec3<f32>(0.0), vec3<f32>(1.0)); }
        case 2u: { out = c / (vec3<f32>(1.0) + c); }
        case 3u: { out = aces(c); }
        default: {}
    }
    return out;
}
"#;

pub const SKY_SHADER: &str = r#"
struct SkyOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) ndc: vec2<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> SkyOut {
    // fullscreen triangle
    let x = f32((index << 1u) & 2u) * 2.0 - 1.0;
    let y = f32(index & 2u) * 2.0 - 1.0;
    var out: SkyOut;
    out.clip = vec4<f32>(x, y, 1.0, 1.0);
    out.ndc = vec2<f32>(x, y);
    return out;
}

@fragment
fn fs_main(in: SkyOut) -> @location(0) vec4<f32> {
    let far = globals.inv_view_proj * vec4<f32>(in.ndc, 1.0, 1.0);
    let dir = normalize(far.xyz / far.w - globals.camera_pos);
    let t = clamp(dir.y * 0.5 + 0.5, 0.0, 1.0);
    let base = mix(globals.sky_bottom, globals.sky_top, t);
    // faint star speckle
    let cell = floor(dir * 240.0);
    let h = fract(sin(dot(cell, vec3<f32>(12.9898, 78.233, 37.719))) * 43758.5453);
    let star = select(0.0, (h - 0.997) * 300.0, h > 0.997);
    return vec4<f32>(tone_map(base + vec3<f32>(star)), 1.0);
}
"#;

pub const SURFACE_SHADER: &str = r#"
struct VertexIn {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

struct VertexOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) world: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) view_normal: vec3<f32>,
}

@vertex
fn vs_main(in: VertexIn) -> VertexOut {
    let world = globals.model * vec4<f32>(in.position, 1.0);
    let world_normal = globals.model * vec4<f32>(in.normal, 0.0);
    var out: VertexOut;
    out.clip = globals.view_proj * world;
    out.world = world.xyz;
    out.normal = world_normal.xyz;
    out.uv = in.uv;
    out.view_normal = (globals.view * world_normal).xyz;
    return out;
}

fn shade_lit(p: vec3<f32>, n: vec3<f32>) -> vec3<f32> {
    let view = normalize(globals.camera_pos - p);
    var color = globals.surface_color * globals.ambient;
    for (var i = 0u; i < globals.light_count; i = i + 1u) {
        let to_light = globals.lights[i].xyz - p;
        let dist2 = max(dot(to_light, to_light), 1e-4);
        let l = to_light / sqrt(dist2);
        let radiance = globals.light_colors[i].rgb * globals.light_intensity / (1.0 + dist2);
        let diffuse = max(dot(n, l), 0.0);
        let h = normalize(l + view);
        let specular = pow(max(dot(n, h), 0.0), 48.0) * 0.5;
        color += (globals.surface_color * diffuse + vec3<f32>(specular)) * radiance;
    }
    return color;
}

@fragment
fn fs_main(in: VertexOut, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    var n = normalize(in.normal);
    var vn = normalize(in.view_normal);
    if (!front) {
        n = -n;
        vn = -vn;
    }
    var color: vec3<f32>;
    switch globals.material {
        case 1u: { color = shade_lit(in.world, n); }
        case 2u: {
            let grid = abs(fract(in.uv * vec2<f32>(40.0, 20.0)) - vec2<f32>(0.5));
            let line = step(0.45, max(grid.x, grid.y));
            color = mix(globals.surface_color, globals.surface_color * 0.4, line);
        }
        default: { color = vn * 0.5 + vec3<f32>(0.5); }
    }
    return vec4<f32>(tone_map(color), 1.0);
}
"#;

pub const ORBITER_SHADER: &str = r#"
struct VertexIn {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) center: vec3<f32>,
    @location(4) radius: f32,
    @location(5) color: vec3<f32>,
}

struct VertexOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) world: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec3<f32>,
}

@vertex
fn vs_main(in: VertexIn) -> VertexOut {
    let world = in.center + in.position * in.radius;
    var out: VertexOut;
    out.clip = globals.view_proj * vec4<f32>(world, 1.0);
    out.world = world;
    out.normal = in.normal;
    out.color = in.color;
    return out;
}

@fragment
fn fs_main(in: VertexOut) -> @location(0) vec4<f32> {
    let view = normalize(globals.camera_pos - in.world);
    let facing = max(dot(normalize(in.normal), view), 0.0);
    // emissive core with a softer rim
    let emission = in.color * (1.5 + 2.5 * pow(facing, 2.0));
    return vec4<f32>(tone_map(emission), 1.0);
}
"#;

/// Compiled shader modules by name. Every source is compiled with `PRELUDE`.
pub struct ShaderManager {
    device: Arc<wgpu::Device>,
    shader_modules: HashMap<String, wgpu::ShaderModule>,
}

impl ShaderManager {
    pub fn new(device: Arc<wgpu::Device>) -> Self {
        Self {
            device,
            shader_modules: HashMap::new(),
        }
    }

    /// Built-in set: `sky`, `surface`, `orbiter`.
    pub fn with_builtin(device: Arc<wgpu::Device>) -> Self {
        let mut sm = Self::new(device);
        sm.load_wgsl_str("sky", SKY_SHADER);
        sm.load_wgsl_str("surface", SURFACE_SHADER);
        sm.load_wgsl_str("orbiter", ORBITER_SHADER);
        sm
    }

    pub fn load_wgsl_str(&mut self, name: &str, body: &str) {
        let source = compose(body);
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(name),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        self.shader_modules.insert(name.to_string(), module);
    }

    pub fn get(&self, name: &str) -> Option<&wgpu::ShaderModule> {
        self.shader_modules.get(name)
    }
}

/// Prefix a shader body with the shared prelude.
pub fn compose(body: &str) -> String {
    let mut source = String::with_capacity(PRELUDE.len() + body.len());
    source.push_str(PRELUDE);
    source.push_str(body);
    source
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MAX_ORBITERS;

    #[test]
    fn test_light_array_matches_orbiter_limit() {
        let decl = format!("array<vec4<f32>, {}>", MAX_ORBITERS);
        assert_eq!(PRELUDE.matches(decl.as_str()).count(), 2);
    }

    #[test]
    fn test_normal_material_uses_view_space() {
        assert!(PRELUDE.contains("view: mat4x4<f32>"));
        assert!(SURFACE_SHADER.contains("globals.view * world_normal"));
        assert!(SURFACE_SHADER.contains("color = vn * 0.5"));
    }

    #[test]
    fn test_every_shader_has_entry_points() {
        for body in [SKY_SHADER, SURFACE_SHADER, ORBITER_SHADER] {
            let source = compose(body);
            assert!(source.starts_with(PRELUDE));
            assert!(source.contains("fn vs_main"));
            assert!(source.contains("fn fs_main"));
        }
    }
}
