use crate::config::SceneConfig;
use crate::geometry::{generate_uv_sphere, SphereOptions, SurfaceMesh, MAX_ORBITERS};
use crate::rendering::camera::Camera;
use crate::rendering::graph::{CullMode, PassDesc, RenderGraph};
use crate::rendering::shaders::ShaderManager;
use crate::rendering::{OrbiterInstance, RenderError, RenderResult, Uniforms, Vertex};
use glam::Mat4;
use parking_lot::RwLock;
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::window::Window;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Everything the renderer needs from the scene for one frame.
pub struct FrameData<'a> {
    pub model: Mat4,
    pub instances: &'a [OrbiterInstance],
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, label: &str, vertices: &[Vertex], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertices")),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_indices")),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }
}

pub struct Renderer {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,
    pub shader_manager: ShaderManager,
    camera: Arc<RwLock<Camera>>,
    graph: RenderGraph,
    uniforms: Uniforms,
    uniform_buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    surface_mesh: GpuMesh,
    sphere_mesh: GpuMesh,
    instance_buffer: wgpu::Buffer,
    instance_count: u32,
    sky_pipeline: wgpu::RenderPipeline,
    surface_pipeline: wgpu::RenderPipeline,
    orbiter_pipeline: wgpu::RenderPipeline,
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        camera: Arc<RwLock<Camera>>,
        scene_config: &SceneConfig,
        mesh: &SurfaceMesh,
    ) -> RenderResult<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;
        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        camera.write().set_aspect(config.width, config.height);

        let device = Arc::new(device);
        let queue = Arc::new(queue);
        let shader_manager = ShaderManager::with_builtin(device.clone());

        let uniforms = Uniforms::new();
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals_bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals_bg"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let depth_view = create_depth_view(&device, config.width, config.height);

        let surface_mesh = GpuMesh::upload(
            &device,
            "klein",
            &Vertex::from_surface(mesh),
            &mesh.indices,
        );
        let (positions, normals, indices) = generate_uv_sphere(SphereOptions {
            radius: 1.0,
            ..Default::default()
        });
        let sphere_vertices: Vec<Vertex> = positions
            .into_iter()
            .zip(normals)
            .map(|(p, n)| Vertex::new(p, n, [0.0, 0.0]))
            .collect();
        let sphere_mesh = GpuMesh::upload(&device, "orbiter", &sphere_vertices, &indices);

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("orbiter_instances"),
            size: (std::mem::size_of::<OrbiterInstance>() * MAX_ORBITERS as usize)
                as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let graph = RenderGraph::derive(scene_config);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let sky_pipeline = create_sky_pipeline(&device, &shader_manager, &pipeline_layout, format)?;
        let surface_pipeline = create_surface_pipeline(
            &device,
            &shader_manager,
            &pipeline_layout,
            format,
            graph.key.surface_cull,
        )?;
        let orbiter_pipeline =
            create_orbiter_pipeline(&device, &shader_manager, &pipeline_layout, format)?;

        Ok(Self {
            device,
            queue,
            surface,
            config,
            size,
            shader_manager,
            camera,
            graph,
            uniforms,
            uniform_buffer,
            bind_group_layout,
            bind_group,
            depth_view,
            surface_mesh,
            sphere_mesh,
            instance_buffer,
            instance_count: 0,
            sky_pipeline,
            surface_pipeline,
            orbiter_pipeline,
        })
    }

    /// Re-derive the render graph from `config`, rebuilding only the
    /// pipelines whose fixed state changed.
    pub fn apply_config(&mut self, config: &SceneConfig) -> RenderResult<()> {
        let next = RenderGraph::derive(config);
        if self.graph.needs_rebuild(&next) {
            log::debug!("Rebuilding surface pipeline for {:?}", next.key);
            let layout = self
                .device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("pipeline_layout"),
                    bind_group_layouts: &[&self.bind_group_layout],
                    push_constant_ranges: &[],
                });
            self.surface_pipeline = create_surface_pipeline(
                &self.device,
                &self.shader_manager,
                &layout,
                self.config.format,
                next.key.surface_cull,
            )?;
        }
        self.graph = next;
        Ok(())
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, self.config.width, self.config.height);
        self.camera
            .write()
            .set_aspect(self.config.width, self.config.height);
    }

    /// Reconfigure the surface at its current size (after `Lost`/`Outdated`).
    pub fn reconfigure(&mut self) {
        self.resize(self.size);
    }

    fn update_uniforms(&mut self, frame: &FrameData) {
        let settings = self.graph.frame;
        let sky = self.graph.passes.iter().find_map(|pass| match pass {
            PassDesc::Sky { top, bottom } => Some((*top, *bottom)),
            _ => None,
        });

        let u = &mut self.uniforms;
        u.update_view_proj(&self.camera.read());
        u.model = frame.model.to_cols_array_2d();
        u.surface_color = settings.surface_color;
        u.ambient = settings.ambient_intensity;
        u.exposure = settings.exposure;
        u.light_intensity = settings.light_intensity;
        u.material = settings.material.shader_index();
        u.tone_mapping = settings.tone_mapping.shader_index();
        if let Some((top, bottom)) = sky {
            u.sky_top = top;
            u.sky_bottom = bottom;
        }
        if self.graph.orbiter_lights() {
            u.set_lights(frame.instances);
        } else {
            u.light_count = 0;
        }
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));

        self.instance_count = frame.instances.len().min(MAX_ORBITERS as usize) as u32;
        if self.instance_count > 0 {
            self.queue.write_buffer(
                &self.instance_buffer,
                0,
                bytemuck::cast_slice(&frame.instances[..self.instance_count as usize]),
            );
        }
    }

    pub fn render(&mut self, frame: &FrameData) -> RenderResult<()> {
        self.update_uniforms(frame);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rpass.set_bind_group(0, &self.bind_group, &[]);

            for pass in &self.graph.passes {
                match pass {
                    PassDesc::Sky { .. } => {
                        rpass.set_pipeline(&self.sky_pipeline);
                        rpass.draw(0..3, 0..1);
                    }
                    PassDesc::Surface { .. } => {
                        rpass.set_pipeline(&self.surface_pipeline);
                        rpass.set_vertex_buffer(0, self.surface_mesh.vertex_buffer.slice(..));
                        rpass.set_index_buffer(
                            self.surface_mesh.index_buffer.slice(..),
                            wgpu::IndexFormat::Uint32,
                        );
                        rpass.draw_indexed(0..self.surface_mesh.index_count, 0, 0..1);
                    }
                    PassDesc::Orbiters { .. } => {
                        if self.instance_count == 0 {
                            continue;
                        }
                        rpass.set_pipeline(&self.orbiter_pipeline);
                        rpass.set_vertex_buffer(0, self.sphere_mesh.vertex_buffer.slice(..));
                        rpass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                        rpass.set_index_buffer(
                            self.sphere_mesh.index_buffer.slice(..),
                            wgpu::IndexFormat::Uint32,
                        );
                        rpass.draw_indexed(
                            0..self.sphere_mesh.index_count,
                            0,
                            0..self.instance_count,
                        );
                    }
                }
            }
        }
        self.queue.submit(Some(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn shader<'a>(sm: &'a ShaderManager, name: &str) -> RenderResult<&'a wgpu::ShaderModule> {
    sm.get(name)
        .ok_or_else(|| RenderError::Shader(name.to_string()))
}

fn depth_state(write: bool, compare: wgpu::CompareFunction) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: write,
        depth_compare: compare,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

#[allow(clippy::too_many_arguments)]
fn build_pipeline(
    device: &wgpu::Device,
    label: &str,
    module: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    buffers: &[wgpu::VertexBufferLayout],
    format: wgpu::TextureFormat,
    cull_mode: Option<wgpu::Face>,
    depth: wgpu::DepthStencilState,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: "vs_main",
            buffers,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: Some(depth),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}

fn create_sky_pipeline(
    device: &wgpu::Device,
    sm: &ShaderManager,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
) -> RenderResult<wgpu::RenderPipeline> {
    Ok(build_pipeline(
        device,
        "sky_pipeline",
        shader(sm, "sky")?,
        layout,
        &[],
        format,
        None,
        depth_state(false, wgpu::CompareFunction::Always),
    ))
}

fn create_surface_pipeline(
    device: &wgpu::Device,
    sm: &ShaderManager,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    cull: CullMode,
) -> RenderResult<wgpu::RenderPipeline> {
    let cull_mode = match cull {
        CullMode::None => None,
        CullMode::Back => Some(wgpu::Face::Back),
    };
    Ok(build_pipeline(
        device,
        "surface_pipeline",
        shader(sm, "surface")?,
        layout,
        &[Vertex::desc()],
        format,
        cull_mode,
        depth_state(true, wgpu::CompareFunction::Less),
    ))
}

fn create_orbiter_pipeline(
    device: &wgpu::Device,
    sm: &ShaderManager,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
) -> RenderResult<wgpu::RenderPipeline> {
    Ok(build_pipeline(
        device,
        "orbiter_pipeline",
        shader(sm, "orbiter")?,
        layout,
        &[Vertex::desc(), OrbiterInstance::desc()],
        format,
        Some(wgpu::Face::Back),
        depth_state(true, wgpu::CompareFunction::Less),
    ))
}
