use fnv::FnvHashMap;

use splash_core::gpu::{
    Capabilities, Dest, FieldFormat, Filtering, GpuError, Output, ProgramDesc, ProgramKind,
    RenderBackend, Target, TargetDesc,
};

use crate::helpers::{
    blend_state, create_color_texture, create_sampler, make_fullscreen_pipeline, program_layout,
    texture_format,
};
use crate::shaders;
use crate::uniforms::UniformPool;

pub struct WgpuTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    width: u32,
    height: u32,
    pub format: FieldFormat,
    pub filtering: Filtering,
}

impl Target for WgpuTarget {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

pub struct WgpuProgram {
    pub kind: ProgramKind,
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
}

/// Half-float filtering and the largest target side the adapter allows.
pub fn probe_capabilities(adapter: &wgpu::Adapter, device: &wgpu::Device) -> Capabilities {
    let features = adapter.get_texture_format_features(wgpu::TextureFormat::Rgba16Float);
    let renderable = features
        .allowed_usages
        .contains(wgpu::TextureUsages::RENDER_ATTACHMENT);
    let filterable = features
        .flags
        .contains(wgpu::TextureFormatFeatureFlags::FILTERABLE);
    let caps = Capabilities {
        linear_filtering: renderable && filterable,
        max_texture_size: device.limits().max_texture_dimension_2d,
    };
    log::info!("[gpu] capabilities {caps:?}");
    caps
}

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    size: (u32, u32),
    caps: Capabilities,
    linear_sampler: wgpu::Sampler,
    nearest_sampler: wgpu::Sampler,
    modules: FnvHashMap<String, wgpu::ShaderModule>,
    uniforms: UniformPool,
    encoder: Option<wgpu::CommandEncoder>,
    frame: Option<wgpu::TextureView>,
    screen_cleared: bool,
}

impl WgpuBackend {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        size: (u32, u32),
        caps: Capabilities,
    ) -> Self {
        device.on_uncaptured_error(Box::new(|e| log::error!("[gpu] {e}")));
        let linear_sampler = create_sampler(&device, Filtering::Linear);
        let nearest_sampler = create_sampler(&device, Filtering::Nearest);
        Self {
            device,
            queue,
            surface_format,
            size,
            caps,
            linear_sampler,
            nearest_sampler,
            modules: FnvHashMap::default(),
            uniforms: UniformPool::default(),
            encoder: None,
            frame: None,
            screen_cleared: false,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width.max(1), height.max(1));
    }

    /// Route screen blits into `view` until [`Self::end_frame`]. The first
    /// screen blit of the frame clears it.
    pub fn begin_frame(&mut self, view: wgpu::TextureView) {
        self.frame = Some(view);
        self.screen_cleared = false;
    }

    /// Submit everything recorded since the previous submit.
    pub fn end_frame(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(Some(encoder.finish()));
        }
        self.uniforms.recycle();
        self.frame = None;
    }

    /// Native waits for validation; the browser can only report it later.
    fn check_scope(&self, program: &'static str) -> Result<(), GpuError> {
        let scope = self.device.pop_error_scope();
        #[cfg(not(target_arch = "wasm32"))]
        {
            if let Some(err) = pollster::block_on(scope) {
                return Err(GpuError::Compile {
                    program,
                    message: err.to_string(),
                });
            }
        }
        #[cfg(target_arch = "wasm32")]
        {
            wasm_bindgen_futures::spawn_local(async move {
                if let Some(err) = scope.await {
                    log::error!("[gpu] failed to build program {program}: {err}");
                }
            });
        }
        Ok(())
    }
}

impl RenderBackend for WgpuBackend {
    type Target = WgpuTarget;
    type Program = WgpuProgram;

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn drawing_buffer_size(&self) -> (u32, u32) {
        self.size
    }

    fn create_target(&mut self, desc: &TargetDesc) -> WgpuTarget {
        let max = self.caps.max_texture_size.max(1);
        let width = desc.width.clamp(1, max);
        let height = desc.height.clamp(1, max);
        if (width, height) != (desc.width, desc.height) {
            log::warn!(
                "[gpu] {} {}x{} clamped to {}x{}",
                desc.label,
                desc.width,
                desc.height,
                width,
                height
            );
        }
        let (texture, view) = create_color_texture(
            &self.device,
            desc.label,
            width,
            height,
            texture_format(desc.format),
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
        );
        WgpuTarget {
            texture,
            view,
            width,
            height,
            format: desc.format,
            filtering: desc.filtering,
        }
    }

    fn compile_program(&mut self, desc: &ProgramDesc<'_>) -> Result<WgpuProgram, GpuError> {
        let name = desc.kind.name();
        let source = shaders::compose(desc.kind, desc.keywords)?;
        let format = match desc.output {
            Output::Field(f) => texture_format(f),
            Output::Screen => self.surface_format,
        };

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let device = &self.device;
        let module = self.modules.entry(source).or_insert_with_key(|source| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(name),
                source: wgpu::ShaderSource::Wgsl(source.as_str().into()),
            })
        });
        let layout = program_layout(device, name, desc.kind.inputs(), self.caps.linear_filtering);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(name),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });
        let pipeline = make_fullscreen_pipeline(
            device,
            name,
            &pipeline_layout,
            module,
            format,
            blend_state(desc.blend),
        );
        self.check_scope(name)?;
        log::debug!("[gpu] built {name} for {:?} {:?}", desc.output, desc.blend);
        Ok(WgpuProgram {
            kind: desc.kind,
            pipeline,
            layout,
        })
    }

    fn blit(
        &mut self,
        program: &WgpuProgram,
        uniforms: &[u8],
        sources: &[&WgpuTarget],
        dest: Dest<'_, WgpuTarget>,
    ) {
        let name = program.kind.name();
        if sources.len() != program.kind.inputs() {
            log::warn!(
                "[gpu] {name} expects {} sources, got {}",
                program.kind.inputs(),
                sources.len()
            );
            return;
        }
        let load = match dest {
            Dest::Screen if !self.screen_cleared => {
                self.screen_cleared = true;
                wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT)
            }
            _ => wgpu::LoadOp::Load,
        };

        let buffer = self.uniforms.write(&self.device, &self.queue, name, uniforms);

        let mut entries = Vec::with_capacity(1 + 2 * sources.len());
        entries.push(wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        });
        for (i, source) in sources.iter().enumerate() {
            let sampler = match source.filtering {
                Filtering::Linear if self.caps.linear_filtering => &self.linear_sampler,
                _ => &self.nearest_sampler,
            };
            let i = i as u32;
            entries.push(wgpu::BindGroupEntry {
                binding: 1 + 2 * i,
                resource: wgpu::BindingResource::TextureView(&source.view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: 2 + 2 * i,
                resource: wgpu::BindingResource::Sampler(sampler),
            });
        }
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(name),
            layout: &program.layout,
            entries: &entries,
        });

        let view = match dest {
            Dest::Target(target) => &target.view,
            Dest::Screen => match self.frame.as_ref() {
                Some(view) => view,
                None => {
                    log::warn!("[gpu] {name} drew to the screen outside a frame");
                    return;
                }
            },
        };
        let device = &self.device;
        let encoder = self.encoder.get_or_insert_with(|| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("splash_frame"),
            })
        });
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(name),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&program.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}
