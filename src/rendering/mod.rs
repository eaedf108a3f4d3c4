//! Rendering module: wgpu pipelines, camera and the config-derived render
//! graph.
//!
//! The geometry module hands this layer plain meshes and positions; nothing
//! here feeds back into the animation.

pub mod camera;
pub mod graph;
pub mod renderer;
pub mod shaders;

pub use camera::{Camera, OrbitControls};
pub use graph::{CullMode, PassDesc, PipelineKey, RenderGraph};
pub use renderer::{FrameData, Renderer};

use crate::geometry::{SurfaceMesh, MAX_ORBITERS};

/// Vertex type shared by the surface and sphere meshes.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coords,
        }
    }

    pub const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }

    /// Interleave a tessellated surface into GPU vertices.
    pub fn from_surface(mesh: &SurfaceMesh) -> Vec<Vertex> {
        mesh.positions
            .iter()
            .zip(&mesh.normals)
            .zip(&mesh.uvs)
            .map(|((p, n), uv)| Vertex::new(*p, *n, *uv))
            .collect()
    }
}

/// Per-orbiter instance data.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct OrbiterInstance {
    pub center: [f32; 3],
    pub radius: f32,
    pub color: [f32; 3],
    pub _pad: f32,
}

impl OrbiterInstance {
    pub const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![3 => Float32x3, 4 => Float32, 5 => Float32x3];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<OrbiterInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Uniform block; layout mirrors `Globals` in `shaders::PRELUDE`.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Uniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub inv_view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub _pad0: f32,
    pub surface_color: [f32; 3],
    pub ambient: f32,
    pub sky_top: [f32; 3],
    pub exposure: f32,
    pub sky_bottom: [f32; 3],
    pub light_intensity: f32,
    pub material: u32,
    pub tone_mapping: u32,
    pub light_count: u32,
    pub _pad: u32,
    pub lights: [[f32; 4]; MAX_ORBITERS as usize],
    pub light_colors: [[f32; 4]; MAX_ORBITERS as usize],
}

impl Uniforms {
    pub fn new() -> Self {
        bytemuck::Zeroable::zeroed()
    }

    pub fn update_view_proj(&mut self, camera: &Camera) {
        let vp = camera.view_projection();
        self.view_proj = vp.to_cols_array_2d();
        self.inv_view_proj = vp.inverse().to_cols_array_2d();
        self.view = camera.view_matrix().to_cols_array_2d();
        self.camera_pos = camera.position.to_array();
    }

    /// Copy orbiter positions into the light array, up to `MAX_ORBITERS`.
    pub fn set_lights(&mut self, instances: &[OrbiterInstance]) {
        let count = instances.len().min(MAX_ORBITERS as usize);
        for (i, inst) in instances.iter().take(count).enumerate() {
            let [x, y, z] = inst.center;
            let [r, g, b] = inst.color;
            self.lights[i] = [x, y, z, 1.0];
            self.light_colors[i] = [r, g, b, 1.0];
        }
        self.light_count = count as u32;
    }
}

impl Default for Uniforms {
    fn default() -> Self {
        Self::new()
    }
}

/// Rendering error types
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Surface creation error: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("Surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("No compatible GPU adapter found")]
    NoAdapter,
    #[error("Device request failed: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("Shader module missing: {0}")]
    Shader(String),
}

pub type RenderResult<T> = Result<T, RenderError>;
