use std::collections::HashMap;
use std::ops::Range;

use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;
use wgpu::*;

use crate::assets::{TextureData, TextureSlot};
use crate::model::{Camera, EntityKind, EntityModel, Scene};
use crate::utils::{create_bounds_lines, create_box_mesh, create_plane_mesh, MeshBuffer, Vertex};

pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// Room for the walls plus both entities in the bounds overlay
const MAX_OVERLAY_BOXES: usize = 16;

const SCENE_ATTRIBUTES: [VertexAttribute; 4] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x3,
    2 => Float32x4,
    3 => Float32x2,
];

const BOUNDS_ATTRIBUTES: [VertexAttribute; 2] = [
    VertexAttribute { offset: 0, shader_location: 0, format: VertexFormat::Float32x3 },
    VertexAttribute { offset: 24, shader_location: 1, format: VertexFormat::Float32x4 },
];

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightingUniform {
    pub sun_dir: [f32; 3],
    pub sun_intensity: f32,
    pub ambient: f32,
    pub _pad1: f32,
    pub _pad2: f32,
    pub _pad3: f32,
}

impl Default for LightingUniform {
    fn default() -> Self {
        let dir = Vec3::new(5.0, 10.0, 7.0).normalize();
        Self {
            sun_dir: dir.to_array(),
            sun_intensity: 1.0,
            ambient: 0.5,
            _pad1: 0.0,
            _pad2: 0.0,
            _pad3: 0.0,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub tint: [f32; 4],
    pub uv_scale: [f32; 4],
}

impl ObjectUniform {
    pub fn new(model: Mat4, uv_scale: [f32; 2]) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            tint: [1.0; 4],
            uv_scale: [uv_scale[0], uv_scale[1], 0.0, 0.0],
        }
    }
}

// Shared graphics setup used by native and web
pub struct CameraResources {
    pub camera_buffer: Buffer,
    pub lighting_buffer: Buffer,
    pub bind_group_layout: BindGroupLayout,
    pub camera_bind_group: BindGroup,
}

pub fn create_depth_texture(device: &Device, width: u32, height: u32) -> (Texture, TextureView) {
    let depth_texture = device.create_texture(&TextureDescriptor {
        label: Some("depth_texture"),
        size: Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

pub fn create_camera_resources(device: &Device) -> CameraResources {
    let camera_buffer = device.create_buffer(&BufferDescriptor {
        label: Some("camera_buffer"),
        size: std::mem::size_of::<CameraUniform>() as BufferAddress,
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let lighting_buffer = device.create_buffer_init(&util::BufferInitDescriptor {
        label: Some("lighting_buffer"),
        contents: bytemuck::bytes_of(&LightingUniform::default()),
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
    });

    let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("camera_bind_group_layout"),
        entries: &[
            uniform_entry(0, ShaderStages::VERTEX),
            uniform_entry(1, ShaderStages::FRAGMENT),
        ],
    });

    let camera_bind_group = device.create_bind_group(&BindGroupDescriptor {
        label: Some("camera_bind_group"),
        layout: &bind_group_layout,
        entries: &[
            BindGroupEntry { binding: 0, resource: camera_buffer.as_entire_binding() },
            BindGroupEntry { binding: 1, resource: lighting_buffer.as_entire_binding() },
        ],
    });

    CameraResources { camera_buffer, lighting_buffer, bind_group_layout, camera_bind_group }
}

fn uniform_entry(binding: u32, visibility: ShaderStages) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility,
        ty: BindingType::Buffer {
            ty: BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Per-object uniform buffer and its bind group
pub struct DrawObject {
    pub buffer: Buffer,
    pub bind_group: BindGroup,
}

impl DrawObject {
    pub fn new(device: &Device, layout: &BindGroupLayout, uniform: ObjectUniform) -> Self {
        let buffer = device.create_buffer_init(&util::BufferInitDescriptor {
            label: Some("object_uniform"),
            contents: bytemuck::bytes_of(&uniform),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("object_bind_group"),
            layout,
            entries: &[BindGroupEntry { binding: 0, resource: buffer.as_entire_binding() }],
        });
        Self { buffer, bind_group }
    }

    pub fn write(&self, queue: &Queue, uniform: &ObjectUniform) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(uniform));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum MaterialSlot {
    Ground,
    Wall,
    Plain,
}

impl From<TextureSlot> for MaterialSlot {
    fn from(slot: TextureSlot) -> Self {
        match slot {
            TextureSlot::Ground => MaterialSlot::Ground,
            TextureSlot::Wall => MaterialSlot::Wall,
        }
    }
}

/// Where a draw call gets its texture from
enum PartMaterial {
    Shared(MaterialSlot),
    /// Index into the drawable's own textures
    Own(usize),
}

struct DrawPart {
    indices: Range<u32>,
    material: PartMaterial,
}

/// Mesh on the GPU plus what it needs to be drawn
struct Drawable {
    mesh: MeshBuffer,
    object: DrawObject,
    parts: Vec<DrawPart>,
    textures: Vec<BindGroup>,
}

impl Drawable {
    /// Whole mesh drawn with one shared material
    fn shared(mesh: MeshBuffer, object: DrawObject, slot: MaterialSlot) -> Self {
        let parts = vec![DrawPart { indices: 0..mesh.index_count, material: PartMaterial::Shared(slot) }];
        Self { mesh, object, parts, textures: Vec::new() }
    }
}

/// Pipelines, layouts and the sampler every material shares
pub struct PipelineResources {
    pub scene_pipeline: RenderPipeline,
    pub bounds_pipeline: RenderPipeline,
    pub object_layout: BindGroupLayout,
    pub material_layout: BindGroupLayout,
    pub sampler: Sampler,
}

pub fn create_pipelines(device: &Device, format: TextureFormat, camera_layout: &BindGroupLayout) -> PipelineResources {
    let object_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("object_bind_group_layout"),
        entries: &[uniform_entry(0, ShaderStages::VERTEX)],
    });

    let material_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("material_bind_group_layout"),
        entries: &[
            BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Texture {
                    sample_type: TextureSampleType::Float { filterable: true },
                    view_dimension: TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            BindGroupLayoutEntry {
                binding: 1,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Sampler(SamplerBindingType::Filtering),
                count: None,
            },
        ],
    });

    let sampler = device.create_sampler(&SamplerDescriptor {
        label: Some("repeat_sampler"),
        address_mode_u: AddressMode::Repeat,
        address_mode_v: AddressMode::Repeat,
        address_mode_w: AddressMode::Repeat,
        mag_filter: FilterMode::Linear,
        min_filter: FilterMode::Linear,
        ..Default::default()
    });

    let scene_shader = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("scene_shader"),
        source: ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
    });
    let scene_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("scene_pipeline_layout"),
        bind_group_layouts: &[camera_layout, &object_layout, &material_layout],
        push_constant_ranges: &[],
    });
    let scene_pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("scene_pipeline"),
        layout: Some(&scene_layout),
        vertex: VertexState {
            module: &scene_shader,
            entry_point: Some("vs_main"),
            buffers: &[VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as BufferAddress,
                step_mode: VertexStepMode::Vertex,
                attributes: &SCENE_ATTRIBUTES,
            }],
            compilation_options: Default::default(),
        },
        fragment: Some(FragmentState {
            module: &scene_shader,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState { format, blend: Some(BlendState::ALPHA_BLENDING), write_mask: ColorWrites::ALL })],
            compilation_options: Default::default(),
        }),
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            // glTF exports are not reliably closed or consistently wound
            cull_mode: None,
            polygon_mode: PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    });

    let bounds_shader = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("bounds_shader"),
        source: ShaderSource::Wgsl(include_str!("shaders/bounds.wgsl").into()),
    });
    let bounds_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("bounds_pipeline_layout"),
        bind_group_layouts: &[camera_layout],
        push_constant_ranges: &[],
    });
    let bounds_pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("bounds_pipeline"),
        layout: Some(&bounds_layout),
        vertex: VertexState {
            module: &bounds_shader,
            entry_point: Some("vs_main"),
            buffers: &[VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as BufferAddress,
                step_mode: VertexStepMode::Vertex,
                attributes: &BOUNDS_ATTRIBUTES,
            }],
            compilation_options: Default::default(),
        },
        fragment: Some(FragmentState {
            module: &bounds_shader,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState { format, blend: Some(BlendState::REPLACE), write_mask: ColorWrites::ALL })],
            compilation_options: Default::default(),
        }),
        primitive: PrimitiveState {
            topology: PrimitiveTopology::LineList,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: CompareFunction::LessEqual,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    });

    PipelineResources { scene_pipeline, bounds_pipeline, object_layout, material_layout, sampler }
}

fn create_material(
    device: &Device,
    queue: &Queue,
    resources: &PipelineResources,
    texture: &TextureData,
    label: &str,
) -> BindGroup {
    let size = Extent3d { width: texture.width, height: texture.height, depth_or_array_layers: 1 };
    let gpu_texture = device.create_texture(&TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: TextureFormat::Rgba8UnormSrgb,
        usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        TexelCopyTextureInfo {
            texture: &gpu_texture,
            mip_level: 0,
            origin: Origin3d::ZERO,
            aspect: TextureAspect::All,
        },
        &texture.rgba,
        TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * texture.width),
            rows_per_image: Some(texture.height),
        },
        size,
    );
    let view = gpu_texture.create_view(&TextureViewDescriptor::default());

    device.create_bind_group(&BindGroupDescriptor {
        label: Some(label),
        layout: &resources.material_layout,
        entries: &[
            BindGroupEntry { binding: 0, resource: BindingResource::TextureView(&view) },
            BindGroupEntry { binding: 1, resource: BindingResource::Sampler(&resources.sampler) },
        ],
    })
}

fn white_texture() -> TextureData {
    TextureData { width: 1, height: 1, rgba: vec![255; 4] }
}

///////////////////////////////////////////////////////////////////////////////

/// Consolidated render state to avoid parameter explosion
pub struct RenderState {
    // wgpu resources
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    depth_view: TextureView,
    camera: CameraResources,
    pipelines: PipelineResources,
    materials: HashMap<MaterialSlot, BindGroup>,

    // Scene geometry
    statics: Vec<Drawable>,
    entities: HashMap<EntityKind, Drawable>,

    // Bounds overlay
    bounds_buffer: Buffer,
    bounds_vertex_count: u32,
    pub show_bounds: bool,

    // UI
    pub egui_renderer: egui_wgpu::Renderer,
    pub egui_primitives: Option<Vec<egui::ClippedPrimitive>>,
    pub egui_full_output: Option<egui::FullOutput>,
    pub egui_dpr: f32,
}

impl RenderState {
    pub fn new(device: &Device, queue: &Queue, format: TextureFormat, width: u32, height: u32, scene: &Scene, uv_repeat: ([f32; 2], [f32; 2])) -> Self {
        let (_depth_texture, depth_view) = create_depth_texture(device, width, height);
        let camera = create_camera_resources(device);
        let pipelines = create_pipelines(device, format, &camera.bind_group_layout);

        // every material starts plain white until its texture arrives
        let mut materials = HashMap::new();
        for slot in [MaterialSlot::Ground, MaterialSlot::Wall, MaterialSlot::Plain] {
            materials.insert(slot, create_material(device, queue, &pipelines, &white_texture(), "white_material"));
        }

        let (ground_repeat, wall_repeat) = uv_repeat;
        let mut statics = Vec::with_capacity(1 + scene.walls.len());
        statics.push(Drawable::shared(
            create_plane_mesh(scene.arena.size).upload(device),
            DrawObject::new(device, &pipelines.object_layout, ObjectUniform::new(Mat4::IDENTITY, ground_repeat)),
            MaterialSlot::Ground,
        ));
        for wall in &scene.walls {
            let model = Mat4::from_translation(wall.center());
            statics.push(Drawable::shared(
                create_box_mesh(wall.size()).upload(device),
                DrawObject::new(device, &pipelines.object_layout, ObjectUniform::new(model, wall_repeat)),
                MaterialSlot::Wall,
            ));
        }

        let bounds_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("bounds_vertices"),
            size: (MAX_OVERLAY_BOXES * 24 * std::mem::size_of::<Vertex>()) as BufferAddress,
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let egui_renderer = egui_wgpu::Renderer::new(device, format, egui_wgpu::RendererOptions::default());

        Self {
            format,
            width,
            height,
            depth_view,
            camera,
            pipelines,
            materials,
            statics,
            entities: HashMap::new(),
            bounds_buffer,
            bounds_vertex_count: 0,
            show_bounds: false,
            egui_renderer,
            egui_primitives: None,
            egui_full_output: None,
            egui_dpr: 1.0,
        }
    }

    pub fn resize(&mut self, device: &Device, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        let (_depth_texture, depth_view) = create_depth_texture(device, width, height);
        self.depth_view = depth_view;
    }

    /// Swap a plain material for its loaded texture
    pub fn set_texture(&mut self, device: &Device, queue: &Queue, slot: TextureSlot, texture: &TextureData) {
        let bind_group = create_material(device, queue, &self.pipelines, texture, "arena_material");
        self.materials.insert(slot.into(), bind_group);
    }

    /// Upload an entity model and its base-colour textures once it has been
    /// published. Untextured parts use the plain white material.
    pub fn attach_entity_model(&mut self, device: &Device, queue: &Queue, kind: EntityKind, model: &EntityModel) {
        let label = format!("{}_texture", kind.label());
        let textures = model
            .textures
            .iter()
            .map(|texture| create_material(device, queue, &self.pipelines, texture, &label))
            .collect();
        let parts = model
            .parts
            .iter()
            .map(|part| DrawPart {
                indices: part.indices.clone(),
                material: part.texture.map_or(PartMaterial::Shared(MaterialSlot::Plain), PartMaterial::Own),
            })
            .collect();
        let drawable = Drawable {
            mesh: model.mesh.upload(device),
            object: DrawObject::new(device, &self.pipelines.object_layout, ObjectUniform::new(Mat4::IDENTITY, [1.0, 1.0])),
            parts,
            textures,
        };
        self.entities.insert(kind, drawable);
    }

    /// Write camera, entity transforms and the bounds overlay for this frame
    pub fn prepare(&mut self, queue: &Queue, camera: &Camera, scene: &Scene) {
        let cam = CameraUniform { view_proj: camera.view_proj().to_cols_array_2d() };
        queue.write_buffer(&self.camera.camera_buffer, 0, bytemuck::bytes_of(&cam));

        for entity in scene.entities() {
            if let Some(drawable) = self.entities.get(&entity.kind) {
                drawable.object.write(queue, &ObjectUniform::new(entity.transform.matrix(), [1.0, 1.0]));
            }
        }

        self.bounds_vertex_count = 0;
        if self.show_bounds {
            let mut lines = create_bounds_lines(&scene.walls, [1.0, 0.6, 0.1, 1.0]);
            let live: Vec<_> = scene.entities().iter().filter_map(|e| e.bounds()).collect();
            lines.extend(create_bounds_lines(&live, [0.2, 1.0, 0.3, 1.0]));
            lines.truncate(MAX_OVERLAY_BOXES * 24);
            queue.write_buffer(&self.bounds_buffer, 0, bytemuck::cast_slice(&lines));
            self.bounds_vertex_count = lines.len() as u32;
        }
    }

    pub fn draw_frame(&mut self, device: &Device, queue: &Queue, surface: &Surface) -> Result<(), SurfaceError> {
        let frame = surface.get_current_texture()?;
        let view = frame.texture.create_view(&TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("encoder"),
        });

        {
            let mut rp = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("render_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        // #111111 in linear space
                        load: LoadOp::Clear(Color { r: 0.0056, g: 0.0056, b: 0.0056, a: 1.0 }),
                        store: StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rp.set_pipeline(&self.pipelines.scene_pipeline);
            rp.set_bind_group(0, &self.camera.camera_bind_group, &[]);

            for drawable in self.statics.iter().chain(self.entities.values()) {
                if drawable.mesh.index_count == 0 {
                    continue;
                }
                rp.set_bind_group(1, &drawable.object.bind_group, &[]);
                rp.set_vertex_buffer(0, drawable.mesh.vertex_buffer.slice(..));
                rp.set_index_buffer(drawable.mesh.index_buffer.slice(..), IndexFormat::Uint32);
                for part in &drawable.parts {
                    let material = match part.material {
                        PartMaterial::Shared(slot) => self.materials.get(&slot),
                        PartMaterial::Own(index) => drawable.textures.get(index),
                    };
                    let Some(material) = material else {
                        continue;
                    };
                    rp.set_bind_group(2, material, &[]);
                    rp.draw_indexed(part.indices.clone(), 0, 0..1);
                }
            }

            if self.bounds_vertex_count > 0 {
                rp.set_pipeline(&self.pipelines.bounds_pipeline);
                rp.set_bind_group(0, &self.camera.camera_bind_group, &[]);
                rp.set_vertex_buffer(0, self.bounds_buffer.slice(..));
                rp.draw(0..self.bounds_vertex_count, 0..1);
            }
        }

        if let (Some(egui_primitives), Some(egui_full_output)) = (self.egui_primitives.take(), self.egui_full_output.take()) {
            let screen_descriptor = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [self.width, self.height],
                pixels_per_point: self.egui_dpr,
            };

            // Upload egui textures
            for (id, image_delta) in &egui_full_output.textures_delta.set {
                self.egui_renderer
                    .update_texture(device, queue, *id, image_delta);
            }

            // Update egui buffers
            self.egui_renderer
                .update_buffers(device, queue, &mut encoder, &egui_primitives, &screen_descriptor);

            // Render egui overlay
            {
                let egui_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                    label: Some("egui_render_pass"),
                    color_attachments: &[Some(RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: Operations {
                            load: LoadOp::Load,
                            store: StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });

                self.egui_renderer
                    .render(&mut egui_pass.forget_lifetime(), &egui_primitives, &screen_descriptor);
            }

            // Free egui textures
            for id in &egui_full_output.textures_delta.free {
                self.egui_renderer.free_texture(id);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}
