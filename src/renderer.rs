//! The wgpu implementation of [`GraphicsBackend`].
//!
//! wgpu has no notion of an "active program" or of uniforms addressed by name, so
//! [`WgpuBackend`] emulates both on the CPU:
//!
//! - Every compiled program keeps its own [`SceneUniforms`] block. Uniform writes go to
//!   the block of the program made active by the last `use_program`; names the block
//!   has no slot for are ignored.
//! - Every draw call copies the active program's block into its own slot of a
//!   dynamic-offset uniform buffer. A later uniform write therefore never changes an
//!   earlier draw, just like with GL's immediate uniform state.
//!
//! Draws are recorded between [`WgpuBackend::begin_frame`] and
//! [`WgpuBackend::end_frame`] and encoded into a single render pass at the end.
//!
//! # Bind groups
//!
//! | Group | Binding | Contents |
//! |-------|---------|----------|
//! | 0 | 0 | [`SceneUniforms`] at a per-draw dynamic offset |
//! | 1 | 0 | diffuse texture (unit selected by `material.diffuse`) |
//! | 1 | 1 | specular texture (unit selected by `material.specular`) |
//! | 1 | 2 | sampler |
//!
//! Texture units with nothing bound read a 1x1 white texture.
//!
//! # Shaders
//!
//! Programs are WGSL modules with `vs_main` and `fs_main` entry points. The vertex
//! inputs follow the [`VertexLayout`] of the drawn vertex array:
//!
//! | Layout | Locations |
//! |--------|-----------|
//! | `Textured` | 0: position, 1: uv, 2: normal |
//! | `Colored` | 0: position, 1: color |

use std::collections::HashMap;
use std::mem;

use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::backend::{
    BackendError, GraphicsBackend, ShaderId, TextureId, UniformValue, VertexArrayId, VertexLayout,
};
use crate::gpu::GpuContext;
use crate::light::MAX_POINT_LIGHTS;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const INITIAL_DRAW_SLOTS: u64 = 64;

/// `dirLight` as laid out in WGSL.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirLightUniform {
    pub direction: [f32; 3],
    pub _pad0: f32,
    pub ambient: [f32; 3],
    pub _pad1: f32,
    pub diffuse: [f32; 3],
    pub _pad2: f32,
    pub specular: [f32; 3],
    pub _pad3: f32,
}

/// One element of `pointLights` as laid out in WGSL.
///
/// The scalar attenuation terms sit in the padding after each `vec3`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightUniform {
    pub position: [f32; 3],
    pub constant: f32,
    pub ambient: [f32; 3],
    pub linear: f32,
    pub diffuse: [f32; 3],
    pub quadratic: f32,
    pub specular: [f32; 3],
    pub _pad: f32,
}

/// The uniform block every program receives at group 0.
///
/// ```text
/// struct Globals {
///     proj_view: mat4x4<f32>,       //   0
///     model: mat4x4<f32>,           //  64
///     view_pos: vec3<f32>,          // 128
///     shininess: f32,               // 140
///     dir_light: DirLight,          // 144
///     point_lights: array<PointLight, 4>, // 208
/// }
/// ```
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    pub proj_view: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub view_pos: [f32; 3],
    pub shininess: f32,
    pub dir_light: DirLightUniform,
    pub point_lights: [PointLightUniform; MAX_POINT_LIGHTS],
}

impl Default for SceneUniforms {
    fn default() -> Self {
        Self {
            proj_view: Mat4::IDENTITY.to_cols_array_2d(),
            model: Mat4::IDENTITY.to_cols_array_2d(),
            view_pos: [0.0; 3],
            shininess: 32.0,
            dir_light: DirLightUniform::default(),
            point_lights: [PointLightUniform::default(); MAX_POINT_LIGHTS],
        }
    }
}

/// CPU-side uniform state of one program.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgramState {
    pub uniforms: SceneUniforms,
    /// Texture unit sampled as `material.diffuse`.
    pub diffuse_unit: u32,
    /// Texture unit sampled as `material.specular`.
    pub specular_unit: u32,
}

impl ProgramState {
    pub fn new() -> Self {
        Self {
            specular_unit: 1,
            ..Self::default()
        }
    }

    /// Applies a named uniform write. Returns `false` if the name or type has no slot.
    pub fn write(&mut self, name: &str, value: UniformValue) -> bool {
        let u = &mut self.uniforms;
        match (name, value) {
            ("projView", UniformValue::Mat4(m)) => u.proj_view = m.to_cols_array_2d(),
            ("model", UniformValue::Mat4(m)) => u.model = m.to_cols_array_2d(),
            ("viewPos", UniformValue::Vec3(v)) => u.view_pos = v.to_array(),
            ("material.shininess", UniformValue::Float(f)) => u.shininess = f,
            ("material.diffuse", UniformValue::Int(unit)) => self.diffuse_unit = unit.max(0) as u32,
            ("material.specular", UniformValue::Int(unit)) => {
                self.specular_unit = unit.max(0) as u32
            }
            _ => {
                if let Some(field) = name.strip_prefix("dirLight.") {
                    return write_dir_light(&mut u.dir_light, field, value);
                }
                if let Some((index, field)) = parse_point_light(name) {
                    return match u.point_lights.get_mut(index) {
                        Some(light) => write_point_light(light, field, value),
                        None => false,
                    };
                }
                return false;
            }
        }
        true
    }
}

/// Splits `pointLights[i].field` into `(i, field)`.
fn parse_point_light(name: &str) -> Option<(usize, &str)> {
    let rest = name.strip_prefix("pointLights[")?;
    let (index, field) = rest.split_once("].")?;
    Some((index.parse().ok()?, field))
}

fn write_dir_light(light: &mut DirLightUniform, field: &str, value: UniformValue) -> bool {
    let UniformValue::Vec3(v) = value else {
        return false;
    };
    let slot = match field {
        "direction" => &mut light.direction,
        "ambient" => &mut light.ambient,
        "diffuse" => &mut light.diffuse,
        "specular" => &mut light.specular,
        _ => return false,
    };
    *slot = v.to_array();
    true
}

fn write_point_light(light: &mut PointLightUniform, field: &str, value: UniformValue) -> bool {
    match (field, value) {
        ("position", UniformValue::Vec3(v)) => light.position = v.to_array(),
        ("ambient", UniformValue::Vec3(v)) => light.ambient = v.to_array(),
        ("diffuse", UniformValue::Vec3(v)) => light.diffuse = v.to_array(),
        ("specular", UniformValue::Vec3(v)) => light.specular = v.to_array(),
        ("constant", UniformValue::Float(f)) => light.constant = f,
        ("linear", UniformValue::Float(f)) => light.linear = f,
        ("quadratic", UniformValue::Float(f)) => light.quadratic = f,
        _ => return false,
    }
    true
}

fn align_up(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

/// Appends a copy of `uniforms` to the frame's staging bytes, zero-padded to `stride`,
/// and returns its dynamic offset.
fn push_uniform_snapshot(staging: &mut Vec<u8>, uniforms: &SceneUniforms, stride: u64) -> u32 {
    let offset = staging.len();
    staging.extend_from_slice(bytemuck::bytes_of(uniforms));
    staging.resize(offset + stride as usize, 0);
    offset as u32
}

const TEXTURED_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2, 2 => Float32x3];
const COLORED_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

fn vertex_buffer_layout(layout: VertexLayout) -> wgpu::VertexBufferLayout<'static> {
    let attributes: &'static [wgpu::VertexAttribute] = match layout {
        VertexLayout::Textured => &TEXTURED_ATTRIBUTES,
        VertexLayout::Colored => &COLORED_ATTRIBUTES,
    };
    wgpu::VertexBufferLayout {
        array_stride: (layout.floats_per_vertex() * mem::size_of::<f32>()) as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes,
    }
}

struct Program {
    label: String,
    module: wgpu::ShaderModule,
    state: ProgramState,
}

struct VertexArray {
    buffer: Option<wgpu::Buffer>,
    layout: VertexLayout,
}

struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

type PipelineKey = (ShaderId, VertexLayout, bool);
type MaterialKey = (Option<TextureId>, Option<TextureId>);

struct DrawCommand {
    pipeline: PipelineKey,
    material: MaterialKey,
    vertex_array: VertexArrayId,
    vertex_count: u32,
    uniform_offset: u32,
}

/// Renders through wgpu while presenting the GL-like [`GraphicsBackend`] interface.
pub struct WgpuBackend {
    gpu: GpuContext,
    depth_view: wgpu::TextureView,
    uniform_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,
    white: GpuTexture,
    uniform_stride: u64,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_slots: u64,
    programs: HashMap<ShaderId, Program>,
    vertex_arrays: HashMap<VertexArrayId, VertexArray>,
    textures: HashMap<TextureId, GpuTexture>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    material_groups: HashMap<MaterialKey, wgpu::BindGroup>,
    bound_textures: HashMap<u32, TextureId>,
    active: Option<ShaderId>,
    culling: bool,
    staging: Vec<u8>,
    draws: Vec<DrawCommand>,
    next_id: u32,
}

impl WgpuBackend {
    pub fn new(gpu: GpuContext) -> Self {
        let device = &gpu.device;

        let uniform_size = mem::size_of::<SceneUniforms>() as u64;
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let uniform_stride = align_up(uniform_size, alignment);

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(uniform_size),
                },
                count: None,
            }],
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Material Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let white = upload_texture(&gpu, "Default White Texture", &[255; 4], 1, 1);
        let depth_view = create_depth_view(&gpu);
        let (uniform_buffer, uniform_bind_group) = create_uniform_buffer(
            device,
            &uniform_layout,
            uniform_stride,
            INITIAL_DRAW_SLOTS,
        );

        Self {
            gpu,
            depth_view,
            uniform_layout,
            material_layout,
            pipeline_layout,
            sampler,
            white,
            uniform_stride,
            uniform_buffer,
            uniform_bind_group,
            uniform_slots: INITIAL_DRAW_SLOTS,
            programs: HashMap::new(),
            vertex_arrays: HashMap::new(),
            textures: HashMap::new(),
            pipelines: HashMap::new(),
            material_groups: HashMap::new(),
            bound_textures: HashMap::new(),
            active: None,
            culling: true,
            staging: Vec::new(),
            draws: Vec::new(),
            next_id: 0,
        }
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    /// Resizes the surface and depth buffer. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.gpu.resize(width, height);
        self.depth_view = create_depth_view(&self.gpu);
    }

    /// Starts recording a frame.
    pub fn begin_frame(&mut self) {
        self.draws.clear();
        self.staging.clear();
    }

    /// Encodes every draw recorded since [`begin_frame`](Self::begin_frame) and
    /// presents the result.
    pub fn end_frame(&mut self, clear_color: wgpu::Color) -> Result<(), wgpu::SurfaceError> {
        self.ensure_uniform_capacity(self.draws.len() as u64);
        if !self.staging.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.uniform_buffer, 0, &self.staging);
        }

        let output = self.gpu.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scene Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
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

            for draw in &self.draws {
                let (Some(pipeline), Some(material), Some(vertex_array)) = (
                    self.pipelines.get(&draw.pipeline),
                    self.material_groups.get(&draw.material),
                    self.vertex_arrays.get(&draw.vertex_array),
                ) else {
                    log::warn!("skipping draw that references released resources");
                    continue;
                };
                let Some(buffer) = &vertex_array.buffer else {
                    continue;
                };

                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &self.uniform_bind_group, &[draw.uniform_offset]);
                render_pass.set_bind_group(1, material, &[]);
                render_pass.set_vertex_buffer(0, buffer.slice(..));
                render_pass.draw(0..draw.vertex_count, 0..1);
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        log::trace!("frame submitted with {} draws", self.draws.len());
        Ok(())
    }

    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn ensure_uniform_capacity(&mut self, slots: u64) {
        if slots <= self.uniform_slots {
            return;
        }
        let slots = slots.next_power_of_two();
        let (buffer, bind_group) = create_uniform_buffer(
            &self.gpu.device,
            &self.uniform_layout,
            self.uniform_stride,
            slots,
        );
        log::debug!("uniform buffer grown to {} draw slots", slots);
        self.uniform_buffer = buffer;
        self.uniform_bind_group = bind_group;
        self.uniform_slots = slots;
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) -> bool {
        if self.pipelines.contains_key(&key) {
            return true;
        }
        let (program_id, layout, culling) = key;
        let Some(program) = self.programs.get(&program_id) else {
            return false;
        };
        let pipeline = self
            .gpu
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&format!("{} Pipeline", program.label)),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &program.module,
                    entry_point: Some("vs_main"),
                    buffers: &[vertex_buffer_layout(layout)],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &program.module,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.gpu.config.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: culling.then_some(wgpu::Face::Back),
                    front_face: wgpu::FrontFace::Ccw,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });
        log::debug!(
            "created pipeline for '{}' ({:?}, culling {})",
            program.label,
            layout,
            culling
        );
        self.pipelines.insert(key, pipeline);
        true
    }

    fn ensure_material_group(&mut self, key: MaterialKey) {
        if self.material_groups.contains_key(&key) {
            return;
        }
        let view = |id: Option<TextureId>| {
            id.and_then(|id| self.textures.get(&id))
                .unwrap_or(&self.white)
                .view
                .clone()
        };
        let (diffuse, specular) = (view(key.0), view(key.1));
        let group = self
            .gpu
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Material Bind Group"),
                layout: &self.material_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&diffuse),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&specular),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                ],
            });
        self.material_groups.insert(key, group);
    }
}

impl GraphicsBackend for WgpuBackend {
    fn compile_program(&mut self, label: &str, source: &str) -> Result<ShaderId, BackendError> {
        let device = &self.gpu.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(BackendError::ShaderCompile {
                label: label.to_string(),
                message: error.to_string(),
            });
        }

        let id = ShaderId(self.next());
        self.programs.insert(
            id,
            Program {
                label: label.to_string(),
                module,
                state: ProgramState::new(),
            },
        );
        Ok(id)
    }

    fn use_program(&mut self, program: ShaderId) {
        self.active = Some(program);
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        let Some(program) = self.active.and_then(|id| self.programs.get_mut(&id)) else {
            log::trace!("uniform '{}' written with no active program", name);
            return;
        };
        if !program.state.write(name, value) {
            log::trace!("program '{}' has no uniform '{}'", program.label, name);
        }
    }

    fn create_vertex_array(&mut self, layout: VertexLayout, data: &[f32]) -> VertexArrayId {
        let buffer = (!data.is_empty()).then(|| {
            self.gpu
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Vertex Buffer"),
                    contents: bytemuck::cast_slice(data),
                    usage: wgpu::BufferUsages::VERTEX,
                })
        });
        let id = VertexArrayId(self.next());
        self.vertex_arrays.insert(id, VertexArray { buffer, layout });
        id
    }

    fn release_vertex_array(&mut self, vertex_array: VertexArrayId) {
        if let Some(VertexArray {
            buffer: Some(buffer),
            ..
        }) = self.vertex_arrays.remove(&vertex_array)
        {
            buffer.destroy();
        }
    }

    fn create_texture(
        &mut self,
        label: &str,
        rgba: &[u8],
        width: u32,
        height: u32,
    ) -> Result<TextureId, BackendError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected || expected == 0 {
            return Err(BackendError::TextureSize {
                label: label.to_string(),
                expected,
                actual: rgba.len(),
            });
        }
        let texture = upload_texture(&self.gpu, label, rgba, width, height);
        let id = TextureId(self.next());
        self.textures.insert(id, texture);
        Ok(id)
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        self.bound_textures.insert(unit, texture);
    }

    fn release_texture(&mut self, texture: TextureId) {
        if let Some(gpu_texture) = self.textures.remove(&texture) {
            gpu_texture.texture.destroy();
        }
        self.bound_textures.retain(|_, bound| *bound != texture);
        self.material_groups
            .retain(|(diffuse, specular), _| *diffuse != Some(texture) && *specular != Some(texture));
    }

    fn set_face_culling(&mut self, enabled: bool) {
        self.culling = enabled;
    }

    fn draw_triangles(&mut self, vertex_array: VertexArrayId, vertex_count: u32) {
        if vertex_count == 0 {
            return;
        }
        let Some(program_id) = self.active else {
            log::warn!("draw with no active program");
            return;
        };
        let Some(layout) = self.vertex_arrays.get(&vertex_array).map(|va| va.layout) else {
            log::warn!("draw with unknown vertex array {:?}", vertex_array);
            return;
        };

        let pipeline = (program_id, layout, self.culling);
        if !self.ensure_pipeline(pipeline) {
            return;
        }
        let Some(program) = self.programs.get(&program_id) else {
            return;
        };
        let units = (program.state.diffuse_unit, program.state.specular_unit);
        let snapshot = program.state.uniforms;

        let material = (
            self.bound_textures.get(&units.0).copied(),
            self.bound_textures.get(&units.1).copied(),
        );
        self.ensure_material_group(material);

        let uniform_offset = push_uniform_snapshot(&mut self.staging, &snapshot, self.uniform_stride);

        self.draws.push(DrawCommand {
            pipeline,
            material,
            vertex_array,
            vertex_count,
            uniform_offset,
        });
    }
}

fn upload_texture(gpu: &GpuContext, label: &str, rgba: &[u8], width: u32, height: u32) -> GpuTexture {
    let texture = gpu.device.create_texture_with_data(
        &gpu.queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        rgba,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture { texture, view }
}

fn create_depth_view(gpu: &GpuContext) -> wgpu::TextureView {
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: gpu.width(),
            height: gpu.height(),
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

fn create_uniform_buffer(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    stride: u64,
    slots: u64,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Scene Uniforms"),
        size: stride * slots,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Scene Uniform Bind Group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: wgpu::BufferSize::new(mem::size_of::<SceneUniforms>() as u64),
            }),
        }],
    });
    (buffer, bind_group)
}
