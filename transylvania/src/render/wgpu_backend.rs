use std::collections::HashMap;

use anyhow::{anyhow, Result};
use wgpu::util::DeviceExt;
use wgpu::{
    AddressMode, BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout,
    BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingResource, BindingType, Buffer,
    BufferBindingType, BufferUsages, ColorTargetState, ColorWrites, CommandEncoder,
    CommandEncoderDescriptor, CompositeAlphaMode, DeviceDescriptor, ErrorFilter, Extent3d,
    FilterMode,
    FragmentState, Instance, LoadOp, MultisampleState, Operations, Origin3d,
    PipelineLayoutDescriptor, PresentMode, PrimitiveState, RenderPassColorAttachment,
    RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor, RequestAdapterOptions, Sampler,
    SamplerBindingType, SamplerDescriptor, ShaderModuleDescriptor, ShaderSource,
    SurfaceConfiguration, TexelCopyBufferLayout, TexelCopyTextureInfo, Texture, TextureAspect,
    TextureDescriptor, TextureDimension, TextureFormat, TextureSampleType, TextureUsages,
    TextureView, TextureViewDescriptor, TextureViewDimension, VertexAttribute,
    VertexBufferLayout, VertexFormat, VertexState, VertexStepMode,
};
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    error::ShaderError,
    render::config::RendererConfig,
    render::params::{DrawParams, SpriteUniforms},
    render::quad,
    sheet::{SheetId, SpriteSheet},
    texture::{TextureData, TextureKind},
};

/// Queued sprite draw, flushed at `end_frame`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct SpriteDrawCommand {
    uniform_offset: u64,
    sheet: SheetId,
    layer: f32,
}

/// Wrapper around wgpu surface/device setup, the sprite pipeline and per-sheet textures.
pub struct Renderer<'window> {
    backend: WgpuBackend<'window>,
}

impl<'window> Renderer<'window> {
    pub fn new(window: &'window Window, config: RendererConfig) -> Result<Self> {
        let backend = WgpuBackend::new(window, config)?;
        Ok(Self { backend })
    }

    pub fn config(&self) -> &RendererConfig {
        &self.backend.config
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.backend.resize(new_size);
    }

    pub fn begin_frame(&mut self) -> Result<Frame> {
        self.backend.begin_frame()
    }

    pub fn clear(&mut self, frame: &mut Frame, color: [f32; 4]) -> Result<()> {
        self.backend.clear(frame, color)
    }

    /// Queue one sprite draw.
    ///
    /// The sheet's textures are uploaded on its first draw and reused afterwards.
    /// The shader program is built on the very first draw.
    pub fn draw_sprite(
        &mut self,
        frame: &mut Frame,
        sheet: &SpriteSheet,
        params: &DrawParams,
    ) -> Result<()> {
        self.backend.draw_sprite(frame, sheet, params)
    }

    /// Submit queued draws and present.
    pub fn end_frame(&mut self, frame: Frame) -> Result<()> {
        self.backend.end_frame(frame)
    }

    /// Free the GPU textures of a sheet. Returns false if none were allocated.
    pub fn release(&mut self, sheet: SheetId) -> bool {
        self.backend.release(sheet)
    }

    /// Whether textures for `sheet` are currently resident.
    pub fn is_resident(&self, sheet: SheetId) -> bool {
        self.backend.sheets.contains_key(&sheet)
    }

    pub fn surface_size(&self) -> (u32, u32) {
        self.backend.surface_size()
    }
}

pub struct Frame {
    surface_texture: Option<wgpu::SurfaceTexture>,
    view: TextureView,
    encoder: Option<CommandEncoder>,
    sprite_draws: Vec<SpriteDrawCommand>,
    cleared: bool,
}

impl Frame {
    /// Number of draws queued so far.
    pub fn queued(&self) -> usize {
        self.sprite_draws.len()
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        // An abandoned frame still has to hand its surface texture back.
        if let Some(surface_texture) = self.surface_texture.take() {
            surface_texture.present();
        }
    }
}

struct TextureEntry {
    /// Owns the GPU memory behind `view`.
    #[allow(dead_code)]
    texture: Texture,
    view: TextureView,
    sampler: Sampler,
}

/// GPU side of one sprite sheet.
struct SheetTextures {
    #[allow(dead_code)]
    color: TextureEntry,
    #[allow(dead_code)]
    normal: TextureEntry,
    bind_group: BindGroup,
}

struct SpritePipeline {
    pipeline: RenderPipeline,
    /// One buffer per attribute, indexed by shader location.
    vertex_buffers: [Buffer; 4],
    uniform_buffer: Buffer,
    uniform_bind_group: BindGroup,
    texture_bind_group_layout: BindGroupLayout,
    uniform_stride: u64,
    /// Draws that fit in the uniform buffer.
    capacity: usize,
}

struct WgpuBackend<'window> {
    surface: wgpu::Surface<'window>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: SurfaceConfiguration,
    present_mode: PresentMode,
    config: RendererConfig,
    pipeline: Option<SpritePipeline>,
    sheets: HashMap<SheetId, SheetTextures>,
}

impl<'window> WgpuBackend<'window> {
    fn new(window: &'window Window, config: RendererConfig) -> Result<Self> {
        let instance = Instance::default();
        let surface = instance.create_surface(window)?;

        let adapter = pollster::block_on(instance.request_adapter(&RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))?;

        let (device, queue) = pollster::block_on(adapter.request_device(&DeviceDescriptor {
            label: Some("transylvania-device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            experimental_features: Default::default(),
            memory_hints: Default::default(),
            trace: wgpu::Trace::Off,
        }))?;

        let size = window.inner_size();
        let capabilities = surface.get_capabilities(&adapter);
        let format = capabilities
            .formats
            .iter()
            .copied()
            .find(|format| format.is_srgb())
            .or_else(|| capabilities.formats.first().copied())
            .ok_or_else(|| anyhow!("Surface reports no supported formats"))?;

        let present_mode = choose_present_mode(&capabilities.present_modes, config.vsync);
        let alpha_mode = choose_alpha_mode(&capabilities.alpha_modes);

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        log::info!(
            "renderer ready: {:?} {}x{}, present mode {:?}",
            format,
            surface_config.width,
            surface_config.height,
            present_mode
        );

        Ok(Self {
            surface,
            device,
            queue,
            surface_config,
            present_mode,
            config,
            pipeline: None,
            sheets: HashMap::new(),
        })
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.surface_config.width = new_size.width;
        self.surface_config.height = new_size.height;
        self.surface_config.present_mode = self.present_mode;
        self.surface.configure(&self.device, &self.surface_config);
    }

    fn begin_frame(&mut self) -> Result<Frame> {
        loop {
            match self.surface.get_current_texture() {
                Ok(surface_texture) => {
                    let view = surface_texture
                        .texture
                        .create_view(&TextureViewDescriptor::default());
                    let encoder = self
                        .device
                        .create_command_encoder(&CommandEncoderDescriptor {
                            label: Some("frame-encoder"),
                        });

                    return Ok(Frame {
                        surface_texture: Some(surface_texture),
                        view,
                        encoder: Some(encoder),
                        sprite_draws: Vec::new(),
                        cleared: false,
                    });
                }
                Err(e) => match e {
                    wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                        log::debug!("surface {e:?}, reconfiguring");
                        self.surface.configure(&self.device, &self.surface_config);
                        continue;
                    }
                    wgpu::SurfaceError::Timeout => {
                        continue;
                    }
                    wgpu::SurfaceError::OutOfMemory => {
                        return Err(anyhow!("Surface ran out of memory"));
                    }
                    wgpu::SurfaceError::Other => {
                        return Err(anyhow!("Surface error: Other"));
                    }
                },
            }
        }
    }

    fn clear(&mut self, frame: &mut Frame, color: [f32; 4]) -> Result<()> {
        let encoder = frame
            .encoder
            .as_mut()
            .ok_or_else(|| anyhow!("Frame already ended"))?;

        record_clear(encoder, &frame.view, color);
        frame.cleared = true;
        Ok(())
    }

    fn ensure_pipeline(&mut self) -> Result<()> {
        if self.pipeline.is_none() {
            let pipeline = create_sprite_pipeline(
                &self.device,
                self.surface_config.format,
                self.config.max_sprites_per_frame,
            )?;
            log::debug!(
                "sprite pipeline built, uniform stride {} bytes, {} sprites per frame",
                pipeline.uniform_stride,
                pipeline.capacity
            );
            self.pipeline = Some(pipeline);
        }
        Ok(())
    }

    fn draw_sprite(
        &mut self,
        frame: &mut Frame,
        sheet: &SpriteSheet,
        params: &DrawParams,
    ) -> Result<()> {
        if frame.encoder.is_none() {
            return Err(anyhow!("Frame already ended"));
        }

        self.ensure_pipeline()?;
        let pipeline = self
            .pipeline
            .as_ref()
            .ok_or_else(|| anyhow!("Sprite pipeline not available"))?;

        if frame.sprite_draws.len() >= pipeline.capacity {
            return Err(anyhow!(
                "Too many sprites drawn in one frame (max: {})",
                pipeline.capacity
            ));
        }

        if !self.sheets.contains_key(&sheet.id()) {
            check_texture_size(
                sheet.width(),
                sheet.height(),
                self.device.limits().max_texture_dimension_2d,
            )?;

            let scope = self.device.push_error_scope(ErrorFilter::Validation);
            let textures = upload_sheet(
                &self.device,
                &self.queue,
                &pipeline.texture_bind_group_layout,
                sheet,
            );
            if let Some(err) = pollster::block_on(scope.pop()) {
                return Err(anyhow!(
                    "Failed to upload textures for sheet {}: {err}",
                    sheet.id().to_u64()
                ));
            }
            log::debug!(
                "allocated textures for sheet {} ({}x{})",
                sheet.id().to_u64(),
                sheet.width(),
                sheet.height()
            );
            self.sheets.insert(sheet.id(), textures);
        }

        let uniforms = SpriteUniforms::new(sheet.frame(), params);
        let uniform_offset = frame.sprite_draws.len() as u64 * pipeline.uniform_stride;
        self.queue.write_buffer(
            &pipeline.uniform_buffer,
            uniform_offset,
            bytemuck::bytes_of(&uniforms),
        );

        frame.sprite_draws.push(SpriteDrawCommand {
            uniform_offset,
            sheet: sheet.id(),
            layer: params.layer,
        });

        Ok(())
    }

    fn flush_sprites(&mut self, frame: &mut Frame) -> Result<()> {
        if frame.sprite_draws.is_empty() {
            return Ok(());
        }

        let pipeline = self
            .pipeline
            .as_ref()
            .ok_or_else(|| anyhow!("Sprite pipeline not available"))?;

        sort_by_layer(&mut frame.sprite_draws);

        let encoder = frame
            .encoder
            .as_mut()
            .ok_or_else(|| anyhow!("Frame already ended"))?;

        let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("sprite-pass"),
            color_attachments: &[Some(RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: Operations {
                    load: LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            multiview_mask: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        pass.set_pipeline(&pipeline.pipeline);
        for (slot, buffer) in pipeline.vertex_buffers.iter().enumerate() {
            pass.set_vertex_buffer(slot as u32, buffer.slice(..));
        }

        for draw_cmd in &frame.sprite_draws {
            let textures = self
                .sheets
                .get(&draw_cmd.sheet)
                .ok_or_else(|| anyhow!("Textures for sheet released before end of frame"))?;
            pass.set_bind_group(0, &pipeline.uniform_bind_group, &[draw_cmd.uniform_offset as u32]);
            pass.set_bind_group(1, &textures.bind_group, &[]);
            pass.draw(0..quad::VERTEX_COUNT, 0..1);
        }

        Ok(())
    }

    fn end_frame(&mut self, mut frame: Frame) -> Result<()> {
        if !frame.cleared {
            let clear_color = self.config.clear_color;
            self.clear(&mut frame, clear_color)?;
        }

        self.flush_sprites(&mut frame)?;

        let encoder = frame
            .encoder
            .take()
            .ok_or_else(|| anyhow!("Frame already ended"))?;
        self.queue.submit(Some(encoder.finish()));

        let surface_texture = frame
            .surface_texture
            .take()
            .ok_or_else(|| anyhow!("Frame already ended"))?;
        surface_texture.present();
        Ok(())
    }

    fn release(&mut self, sheet: SheetId) -> bool {
        let released = self.sheets.remove(&sheet).is_some();
        if released {
            log::debug!("released textures for sheet {}", sheet.to_u64());
        }
        released
    }

    fn surface_size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }
}

/// Sheets larger than the device allows cannot be uploaded.
fn check_texture_size(width: u32, height: u32, max_dimension: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(anyhow!("Sprite sheet has an empty texture ({width}x{height})"));
    }
    if width > max_dimension || height > max_dimension {
        return Err(anyhow!(
            "Sprite sheet is {width}x{height}, larger than the device limit of {max_dimension}"
        ));
    }
    Ok(())
}

/// Number of per-draw uniform slots that fit in one buffer and whose offsets fit in `u32`.
fn uniform_capacity(requested: usize, stride: u64, max_buffer_size: u64) -> usize {
    let by_buffer = max_buffer_size / stride;
    let by_offset = u64::from(u32::MAX) / stride + 1;
    let capacity = (requested as u64).min(by_buffer).min(by_offset).max(1);
    usize::try_from(capacity).unwrap_or(usize::MAX)
}

/// Later layers are drawn on top. Equal layers keep submission order.
fn sort_by_layer(draws: &mut [SpriteDrawCommand]) {
    draws.sort_by(|a, b| a.layer.total_cmp(&b.layer));
}

fn record_clear(encoder: &mut CommandEncoder, view: &TextureView, color: [f32; 4]) {
    let _pass = encoder.begin_render_pass(&RenderPassDescriptor {
        label: Some("clear-pass"),
        color_attachments: &[Some(RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: Operations {
                load: LoadOp::Clear(wgpu::Color {
                    r: color[0] as f64,
                    g: color[1] as f64,
                    b: color[2] as f64,
                    a: color[3] as f64,
                }),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        multiview_mask: None,
        occlusion_query_set: None,
        timestamp_writes: None,
    });
}

fn texture_format(kind: TextureKind) -> TextureFormat {
    match kind {
        TextureKind::Color => TextureFormat::Rgba8UnormSrgb,
        // Normals are vectors, not colors.
        TextureKind::Normal => TextureFormat::Rgba8Unorm,
    }
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    kind: TextureKind,
    data: &TextureData,
) -> TextureEntry {
    let size = Extent3d {
        width: data.width(),
        height: data.height(),
        depth_or_array_layers: 1,
    };

    let texture = device.create_texture(&TextureDescriptor {
        label: Some(kind.name()),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: texture_format(kind),
        usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: Origin3d::ZERO,
            aspect: TextureAspect::All,
        },
        data.pixels(),
        TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * data.width()),
            rows_per_image: Some(data.height()),
        },
        size,
    );

    let view = texture.create_view(&TextureViewDescriptor::default());

    let sampler = device.create_sampler(&SamplerDescriptor {
        label: Some("sprite-sampler"),
        address_mode_u: AddressMode::Repeat,
        address_mode_v: AddressMode::Repeat,
        address_mode_w: AddressMode::Repeat,
        mag_filter: FilterMode::Linear,
        min_filter: FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    });

    TextureEntry {
        texture,
        view,
        sampler,
    }
}

fn upload_sheet(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &BindGroupLayout,
    sheet: &SpriteSheet,
) -> SheetTextures {
    let color = upload_texture(device, queue, TextureKind::Color, sheet.texture(TextureKind::Color));
    let normal = upload_texture(
        device,
        queue,
        TextureKind::Normal,
        sheet.texture(TextureKind::Normal),
    );

    // Each map takes a view binding followed by its sampler: unit n uses bindings 2n and 2n + 1.
    let bind_group = device.create_bind_group(&BindGroupDescriptor {
        label: Some("sprite-texture-bind-group"),
        layout,
        entries: &[
            BindGroupEntry {
                binding: TextureKind::Color.unit() * 2,
                resource: BindingResource::TextureView(&color.view),
            },
            BindGroupEntry {
                binding: TextureKind::Color.unit() * 2 + 1,
                resource: BindingResource::Sampler(&color.sampler),
            },
            BindGroupEntry {
                binding: TextureKind::Normal.unit() * 2,
                resource: BindingResource::TextureView(&normal.view),
            },
            BindGroupEntry {
                binding: TextureKind::Normal.unit() * 2 + 1,
                resource: BindingResource::Sampler(&normal.sampler),
            },
        ],
    });

    SheetTextures {
        color,
        normal,
        bind_group,
    }
}

fn compile_log(info: &wgpu::CompilationInfo) -> Option<String> {
    let errors: Vec<String> = info
        .messages
        .iter()
        .filter(|m| matches!(m.message_type, wgpu::CompilationMessageType::Error))
        .map(|m| match &m.location {
            Some(loc) => format!("{}:{}: {}", loc.line_number, loc.line_position, m.message),
            None => m.message.clone(),
        })
        .collect();

    if errors.is_empty() {
        None
    } else {
        Some(errors.join("\n"))
    }
}

fn vertex_layout(attribute: &VertexAttribute) -> VertexBufferLayout<'_> {
    VertexBufferLayout {
        array_stride: attribute.format.size(),
        step_mode: VertexStepMode::Vertex,
        attributes: std::slice::from_ref(attribute),
    }
}

fn create_sprite_pipeline(
    device: &wgpu::Device,
    surface_format: TextureFormat,
    max_sprites: usize,
) -> Result<SpritePipeline, ShaderError> {
    // Validation errors would otherwise reach the uncaptured error handler, which panics.
    let scope = device.push_error_scope(ErrorFilter::Validation);
    let shader = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("sprite-shader"),
        source: ShaderSource::Wgsl(include_str!("sprite.wgsl").into()),
    });
    let info = pollster::block_on(shader.get_compilation_info());
    let scope_error = pollster::block_on(scope.pop());
    if let Some(log) = compile_log(&info) {
        return Err(ShaderError::Compile(log));
    }
    if let Some(err) = scope_error {
        return Err(ShaderError::Compile(err.to_string()));
    }

    let limits = device.limits();
    let uniform_size = std::mem::size_of::<SpriteUniforms>() as u64;
    let uniform_alignment = u64::from(limits.min_uniform_buffer_offset_alignment);
    let uniform_stride = uniform_size.div_ceil(uniform_alignment) * uniform_alignment;
    let capacity = uniform_capacity(max_sprites, uniform_stride, limits.max_buffer_size);
    if capacity < max_sprites {
        log::warn!(
            "max_sprites_per_frame {} exceeds what the device can hold, using {}",
            max_sprites,
            capacity
        );
    }

    let uniform_bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("sprite-uniform-layout"),
        entries: &[BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: std::num::NonZeroU64::new(uniform_size),
            },
            count: None,
        }],
    });

    let texture_entry = |binding: u32| BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: BindingType::Texture {
            sample_type: TextureSampleType::Float { filterable: true },
            view_dimension: TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    };
    let sampler_entry = |binding: u32| BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: BindingType::Sampler(SamplerBindingType::Filtering),
        count: None,
    };

    let texture_bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("sprite-texture-layout"),
        entries: &[
            texture_entry(0),
            sampler_entry(1),
            texture_entry(2),
            sampler_entry(3),
        ],
    });

    let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("sprite-pipeline-layout"),
        bind_group_layouts: &[&uniform_bind_group_layout, &texture_bind_group_layout],
        immediate_size: 0,
    });

    let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("sprite-uniform-buffer"),
        size: uniform_stride * capacity as u64,
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let uniform_bind_group = device.create_bind_group(&BindGroupDescriptor {
        label: Some("sprite-uniform-bind-group"),
        layout: &uniform_bind_group_layout,
        entries: &[BindGroupEntry {
            binding: 0,
            resource: BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &uniform_buffer,
                offset: 0,
                size: std::num::NonZeroU64::new(uniform_size),
            }),
        }],
    });

    let make_buffer = |label: &'static str, contents: &[u8]| {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage: BufferUsages::VERTEX,
        })
    };
    let vertex_buffers = [
        make_buffer("sprite-positions", bytemuck::cast_slice(&quad::POSITIONS)),
        make_buffer("sprite-normals", bytemuck::cast_slice(&quad::NORMALS)),
        make_buffer("sprite-tangents", bytemuck::cast_slice(&quad::TANGENTS)),
        make_buffer("sprite-tex-coords", bytemuck::cast_slice(&quad::TEX_COORDS)),
    ];

    let attributes = [
        VertexAttribute {
            format: VertexFormat::Float32x4,
            offset: 0,
            shader_location: quad::LOC_VERTEX,
        },
        VertexAttribute {
            format: VertexFormat::Float32x3,
            offset: 0,
            shader_location: quad::LOC_NORMAL,
        },
        VertexAttribute {
            format: VertexFormat::Float32x3,
            offset: 0,
            shader_location: quad::LOC_TANGENT,
        },
        VertexAttribute {
            format: VertexFormat::Float32x3,
            offset: 0,
            shader_location: quad::LOC_TEX_COORD,
        },
    ];
    let buffer_layouts = [
        vertex_layout(&attributes[0]),
        vertex_layout(&attributes[1]),
        vertex_layout(&attributes[2]),
        vertex_layout(&attributes[3]),
    ];

    let scope = device.push_error_scope(ErrorFilter::Validation);
    let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("sprite-pipeline"),
        layout: Some(&pipeline_layout),
        vertex: VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &buffer_layouts,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: PrimitiveState::default(),
        depth_stencil: None,
        multisample: MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    });
    if let Some(err) = pollster::block_on(scope.pop()) {
        return Err(ShaderError::Compile(err.to_string()));
    }

    Ok(SpritePipeline {
        pipeline,
        vertex_buffers,
        uniform_buffer,
        uniform_bind_group,
        texture_bind_group_layout,
        uniform_stride,
        capacity,
    })
}

fn choose_present_mode(modes: &[PresentMode], vsync: bool) -> PresentMode {
    if vsync {
        modes
            .iter()
            .copied()
            .find(|mode| matches!(mode, PresentMode::Fifo | PresentMode::FifoRelaxed))
            .unwrap_or(PresentMode::Fifo)
    } else {
        modes
            .iter()
            .copied()
            .find(|mode| matches!(mode, PresentMode::Immediate | PresentMode::Mailbox))
            .unwrap_or(PresentMode::Fifo)
    }
}

fn choose_alpha_mode(modes: &[CompositeAlphaMode]) -> CompositeAlphaMode {
    modes
        .iter()
        .copied()
        .find(|mode| matches!(mode, CompositeAlphaMode::Auto))
        .unwrap_or_else(|| modes.first().copied().unwrap_or(CompositeAlphaMode::Opaque))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(sheet: SheetId, layer: f32, uniform_offset: u64) -> SpriteDrawCommand {
        SpriteDrawCommand {
            uniform_offset,
            sheet,
            layer,
        }
    }

    #[test]
    fn draws_sorted_by_layer_stably() {
        let a = SheetId::for_tests(1);
        let b = SheetId::for_tests(2);
        let mut draws = vec![
            draw(a, 2.0, 0),
            draw(b, 0.0, 512),
            draw(a, 1.0, 1024),
            draw(b, 2.0, 1536),
            draw(a, 0.0, 2048),
        ];
        sort_by_layer(&mut draws);
        let offsets: Vec<u64> = draws.iter().map(|d| d.uniform_offset).collect();
        assert_eq!(offsets, vec![512, 2048, 1024, 0, 1536]);
    }

    #[test]
    fn negative_layers_go_first() {
        let s = SheetId::for_tests(1);
        let mut draws = vec![draw(s, 0.0, 0), draw(s, -3.0, 1), draw(s, -0.5, 2)];
        sort_by_layer(&mut draws);
        let layers: Vec<f32> = draws.iter().map(|d| d.layer).collect();
        assert_eq!(layers, vec![-3.0, -0.5, 0.0]);
    }

    #[test]
    fn compile_log_keeps_errors_only() {
        let message = |text: &str,
                       message_type: wgpu::CompilationMessageType,
                       location: Option<wgpu::SourceLocation>| wgpu::CompilationMessage {
            message: text.to_string(),
            message_type,
            location,
        };
        let info = wgpu::CompilationInfo {
            messages: vec![
                message("unused variable", wgpu::CompilationMessageType::Warning, None),
                message(
                    "unknown identifier `tex`",
                    wgpu::CompilationMessageType::Error,
                    Some(wgpu::SourceLocation {
                        line_number: 12,
                        line_position: 5,
                        offset: 240,
                        length: 3,
                    }),
                ),
                message("entry point missing", wgpu::CompilationMessageType::Error, None),
            ],
        };
        assert_eq!(
            compile_log(&info).as_deref(),
            Some("12:5: unknown identifier `tex`\nentry point missing")
        );

        let clean = wgpu::CompilationInfo {
            messages: vec![message("note", wgpu::CompilationMessageType::Info, None)],
        };
        assert_eq!(compile_log(&clean), None);
    }

    #[test]
    fn oversized_sheets_are_rejected() {
        assert!(check_texture_size(8192, 16, 8192).is_ok());
        let err = check_texture_size(8193, 16, 8192).unwrap_err();
        assert!(err.to_string().contains("8193x16"), "{err}");
        assert!(check_texture_size(16, 9000, 8192).is_err());
        assert!(check_texture_size(0, 16, 8192).is_err());
    }

    #[test]
    fn uniform_capacity_respects_device_limits() {
        assert_eq!(uniform_capacity(2048, 512, 256 << 20), 2048);
        // Buffer size bound.
        assert_eq!(uniform_capacity(usize::MAX, 512, 1 << 20), 2048);
        // Dynamic offsets are u32.
        let capacity = uniform_capacity(usize::MAX, 512, u64::MAX);
        assert_eq!(capacity as u64, u64::from(u32::MAX) / 512 + 1);
        assert!((capacity as u64 - 1) * 512 <= u64::from(u32::MAX));
        assert_eq!(uniform_capacity(0, 512, 1 << 20), 1);
    }

    #[test]
    fn vsync_prefers_fifo() {
        let modes = [PresentMode::Immediate, PresentMode::FifoRelaxed];
        assert_eq!(choose_present_mode(&modes, true), PresentMode::FifoRelaxed);
        assert_eq!(choose_present_mode(&modes, false), PresentMode::Immediate);
        assert_eq!(choose_present_mode(&[PresentMode::Fifo], false), PresentMode::Fifo);
    }

    #[test]
    fn alpha_mode_falls_back_to_first() {
        assert_eq!(
            choose_alpha_mode(&[CompositeAlphaMode::PreMultiplied, CompositeAlphaMode::Auto]),
            CompositeAlphaMode::Auto
        );
        assert_eq!(
            choose_alpha_mode(&[CompositeAlphaMode::PostMultiplied]),
            CompositeAlphaMode::PostMultiplied
        );
        assert_eq!(choose_alpha_mode(&[]), CompositeAlphaMode::Opaque);
    }
}
