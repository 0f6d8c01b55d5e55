use crate::error::SurfaceInitError;
use crate::geometry::{self, FrameUniforms, LineVertex, MeshVertex};
use crate::shaders;
use bytemuck::Zeroable;
use solidview_common::{Rgba, Size, Solid};
use solidview_render::{
    AxisEntity, DrawCommands, FrameContext, GridEntity, MeshEntity, OutputSurface,
};
use std::sync::Arc;
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const LINE_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4];
const MESH_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x4];

/// A solid uploaded with one color.
struct GpuMesh {
    solid: Arc<Solid>,
    color: Rgba,
    buffer: wgpu::Buffer,
    vertex_count: u32,
    used: bool,
}

/// Draws collected between `clear` and `end_frame`.
struct PendingFrame {
    clear: wgpu::Color,
    uniforms: FrameUniforms,
    lines: Vec<LineVertex>,
    blended_lines: Vec<LineVertex>,
    opaque_meshes: Vec<usize>,
    transparent_meshes: Vec<usize>,
}

struct Pipelines {
    line: wgpu::RenderPipeline,
    line_blended: wgpu::RenderPipeline,
    mesh: wgpu::RenderPipeline,
    mesh_blended: wgpu::RenderPipeline,
}

struct PipelineSpec<'a> {
    label: &'a str,
    module: &'a wgpu::ShaderModule,
    vs: &'a str,
    fs: &'a str,
    stride: usize,
    attributes: &'a [wgpu::VertexAttribute],
    topology: wgpu::PrimitiveTopology,
    blend: wgpu::BlendState,
    depth_write: bool,
}

/// Output surface backed by a wgpu swapchain.
///
/// Hosts that paint an overlay (a UI, for instance) turn off auto-present,
/// draw into [`frame_view`](Self::frame_view) after each frame and then call
/// [`present`](Self::present).
pub struct WgpuSurface {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: Size,
    pipelines: Pipelines,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    meshes: Vec<GpuMesh>,
    frame: Option<PendingFrame>,
    output: Option<wgpu::SurfaceTexture>,
    requested_size: Option<Size>,
    auto_present: bool,
}

impl WgpuSurface {
    /// Open a device for `target` and configure it at `size`. A zero size is
    /// allowed; the swapchain is configured on the first positive resize.
    pub fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        size: Size,
    ) -> Result<Self, SurfaceInitError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(target)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(SurfaceInitError::NoAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("solidview_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(caps.formats.first())
            .copied()
            .ok_or(SurfaceInitError::UnsupportedSurface)?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        if size.is_positive() {
            surface.configure(&device, &config);
        }

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame_uniforms"),
            contents: bytemuck::bytes_of(&FrameUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        let pipelines = create_pipelines(&device, &bind_group_layout, format);
        let depth_view = create_depth_texture(&device, config.width, config.height);

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            ?format,
            width = size.width,
            height = size.height,
            "GPU surface initialized"
        );
        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            pipelines,
            uniform_buffer,
            uniform_bind_group,
            depth_view,
            meshes: Vec::new(),
            frame: None,
            output: None,
            requested_size: None,
            auto_present: true,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Host-side layout: the surface now has `size` pixels.
    pub fn resize(&mut self, size: Size) {
        self.size = size;
        if !size.is_positive() {
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_texture(&self.device, size.width, size.height);
        tracing::debug!(width = size.width, height = size.height, "GPU surface resized");
    }

    /// Size the viewer last asked for, if any. Taking it clears it.
    pub fn take_requested_size(&mut self) -> Option<Size> {
        self.requested_size.take()
    }

    pub fn set_auto_present(&mut self, auto_present: bool) {
        self.auto_present = auto_present;
    }

    /// View of the last rendered, not yet presented frame.
    pub fn frame_view(&self) -> Option<wgpu::TextureView> {
        self.output
            .as_ref()
            .map(|o| o.texture.create_view(&wgpu::TextureViewDescriptor::default()))
    }

    pub fn present(&mut self) {
        if let Some(output) = self.output.take() {
            output.present();
        }
    }

    fn pending(&mut self) -> Option<&mut PendingFrame> {
        if self.frame.is_none() {
            tracing::warn!("draw call outside a frame ignored");
        }
        self.frame.as_mut()
    }

    /// Index of the uploaded mesh for `entity`, uploading it on first use.
    fn mesh_index(&mut self, entity: &MeshEntity) -> Option<usize> {
        let found = self
            .meshes
            .iter()
            .position(|m| Arc::ptr_eq(&m.solid, &entity.solid) && m.color == entity.color);
        let index = match found {
            Some(index) => index,
            None => {
                let vertices: Vec<MeshVertex> =
                    geometry::mesh_vertices(&entity.solid, entity.color);
                if vertices.is_empty() {
                    return None;
                }
                let buffer = self
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("mesh_vertices"),
                        contents: bytemuck::cast_slice(&vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    });
                tracing::debug!(vertices = vertices.len(), "mesh uploaded");
                self.meshes.push(GpuMesh {
                    solid: entity.solid.clone(),
                    color: entity.color,
                    buffer,
                    vertex_count: vertices.len() as u32,
                    used: false,
                });
                self.meshes.len() - 1
            }
        };
        self.meshes[index].used = true;
        Some(index)
    }

    fn line_buffer(&self, label: &str, lines: &[LineVertex]) -> Option<(wgpu::Buffer, u32)> {
        if lines.is_empty() {
            return None;
        }
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(lines),
                usage: wgpu::BufferUsages::VERTEX,
            });
        Some((buffer, lines.len() as u32))
    }

    fn encode(&self, frame: &PendingFrame, view: &wgpu::TextureView) {
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&frame.uniforms));
        let lines = self.line_buffer("line_vertices", &frame.lines);
        let blended_lines = self.line_buffer("blended_line_vertices", &frame.blended_lines);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("frame_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(frame.clear),
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
                ..Default::default()
            });
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            if let Some((buffer, count)) = &lines {
                pass.set_pipeline(&self.pipelines.line);
                pass.set_vertex_buffer(0, buffer.slice(..));
                pass.draw(0..*count, 0..1);
            }
            pass.set_pipeline(&self.pipelines.mesh);
            for &index in &frame.opaque_meshes {
                let mesh = &self.meshes[index];
                pass.set_vertex_buffer(0, mesh.buffer.slice(..));
                pass.draw(0..mesh.vertex_count, 0..1);
            }
            if let Some((buffer, count)) = &blended_lines {
                pass.set_pipeline(&self.pipelines.line_blended);
                pass.set_vertex_buffer(0, buffer.slice(..));
                pass.draw(0..*count, 0..1);
            }
            pass.set_pipeline(&self.pipelines.mesh_blended);
            for &index in &frame.transparent_meshes {
                let mesh = &self.meshes[index];
                pass.set_vertex_buffer(0, mesh.buffer.slice(..));
                pass.draw(0..mesh.vertex_count, 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn evict_unused_meshes(&mut self) {
        let before = self.meshes.len();
        self.meshes.retain(|m| m.used);
        for mesh in &mut self.meshes {
            mesh.used = false;
        }
        if self.meshes.len() != before {
            tracing::debug!(evicted = before - self.meshes.len(), "meshes released");
        }
    }
}

impl DrawCommands for WgpuSurface {
    fn clear(&mut self, ctx: &FrameContext<'_>) {
        let [r, g, b, a] = ctx.rendering.background;
        self.frame = Some(PendingFrame {
            clear: wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: a as f64,
            },
            uniforms: geometry::frame_uniforms(ctx),
            lines: Vec::new(),
            blended_lines: Vec::new(),
            opaque_meshes: Vec::new(),
            transparent_meshes: Vec::new(),
        });
    }

    fn draw_grid(&mut self, _ctx: &FrameContext<'_>, grid: &GridEntity) {
        let lines = geometry::grid_lines(grid);
        let Some(frame) = self.pending() else {
            return;
        };
        if grid.transparent || grid.fade_out {
            frame.blended_lines.extend(lines);
        } else {
            frame.lines.extend(lines);
        }
    }

    fn draw_axis(&mut self, _ctx: &FrameContext<'_>, axis: &AxisEntity) {
        let lines = geometry::axis_lines(axis);
        if let Some(frame) = self.pending() {
            frame.lines.extend(lines);
        }
    }

    fn draw_mesh(&mut self, _ctx: &FrameContext<'_>, mesh: &MeshEntity) {
        if self.pending().is_none() {
            return;
        }
        let Some(index) = self.mesh_index(mesh) else {
            return;
        };
        if let Some(frame) = self.frame.as_mut() {
            if mesh.transparent {
                frame.transparent_meshes.push(index);
            } else {
                frame.opaque_meshes.push(index);
            }
        }
    }

    fn end_frame(&mut self) {
        let Some(frame) = self.frame.take() else {
            return;
        };
        if self.size.is_positive() {
            self.present();
            match self.surface.get_current_texture() {
                Ok(output) => {
                    let view = output
                        .texture
                        .create_view(&wgpu::TextureViewDescriptor::default());
                    self.encode(&frame, &view);
                    if self.auto_present {
                        output.present();
                    } else {
                        self.output = Some(output);
                    }
                }
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    self.surface.configure(&self.device, &self.config);
                    tracing::debug!("surface reconfigured, frame skipped");
                }
                Err(e) => tracing::warn!("surface error: {e}"),
            }
        }
        self.evict_unused_meshes();
    }
}

impl OutputSurface for WgpuSurface {
    fn pixel_size(&self) -> Size {
        self.size
    }

    fn request_size(&mut self, size: Size) {
        tracing::debug!(width = size.width, height = size.height, "surface size requested");
        self.requested_size = Some(size);
    }
}

fn create_pipelines(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> Pipelines {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("frame_pipeline_layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });
    let line_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("line_shader"),
        source: wgpu::ShaderSource::Wgsl(shaders::line_shader().into()),
    });
    let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("mesh_shader"),
        source: wgpu::ShaderSource::Wgsl(shaders::mesh_shader().into()),
    });

    let line = |label: &'static str, depth_write: bool| PipelineSpec {
        label,
        module: &line_shader,
        vs: "vs_line",
        fs: "fs_line",
        stride: std::mem::size_of::<LineVertex>(),
        attributes: &LINE_ATTRIBUTES,
        topology: wgpu::PrimitiveTopology::LineList,
        blend: wgpu::BlendState::ALPHA_BLENDING,
        depth_write,
    };
    let mesh = |label: &'static str, blend: wgpu::BlendState, depth_write: bool| PipelineSpec {
        label,
        module: &mesh_shader,
        vs: "vs_mesh",
        fs: "fs_mesh",
        stride: std::mem::size_of::<MeshVertex>(),
        attributes: &MESH_ATTRIBUTES,
        topology: wgpu::PrimitiveTopology::TriangleList,
        blend,
        depth_write,
    };

    Pipelines {
        line: create_pipeline(device, &layout, format, line("line_pipeline", true)),
        line_blended: create_pipeline(
            device,
            &layout,
            format,
            line("line_blended_pipeline", false),
        ),
        mesh: create_pipeline(
            device,
            &layout,
            format,
            mesh("mesh_pipeline", wgpu::BlendState::REPLACE, true),
        ),
        mesh_blended: create_pipeline(
            device,
            &layout,
            format,
            mesh("mesh_blended_pipeline", wgpu::BlendState::ALPHA_BLENDING, false),
        ),
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    spec: PipelineSpec<'_>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(spec.label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: spec.module,
            entry_point: Some(spec.vs),
            compilation_options: Default::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: spec.stride as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: spec.attributes,
            }],
        },
        fragment: Some(wgpu::FragmentState {
            module: spec.module,
            entry_point: Some(spec.fs),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(spec.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: spec.topology,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: spec.depth_write,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}
