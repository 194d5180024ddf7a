//! Stable-fluids step over double-buffered fields.

use crate::config::SimConfig;
use crate::constants::MAX_SPLAT_BATCH;
use crate::gpu::{
    Capabilities, Dest, FieldFormat, Filtering, GpuError, Keyword, Output, ProgramDesc,
    ProgramKind, RenderBackend, Target, TargetDesc,
};
use crate::splat::{DrainStats, SplatField, SplatQueue};
use crate::targets::{get_resolution, DoubleTarget};
use crate::uniforms::{
    AdvectionUniforms, ClearUniforms, GradientSubtractUniforms, SplatUniforms,
    TexelUniforms, VorticityUniforms,
};

/// Every simulation field. Velocity, dye and pressure are double buffered.
pub struct Fields<T> {
    pub dye: DoubleTarget<T>,
    pub velocity: DoubleTarget<T>,
    pub divergence: T,
    pub curl: T,
    pub pressure: DoubleTarget<T>,
}

struct Programs<P> {
    copy: P,
    clear: P,
    splat_velocity: P,
    splat_dye: P,
    curl: P,
    vorticity: P,
    divergence: P,
    pressure: P,
    gradient_subtract: P,
    advect_velocity: P,
    advect_dye: P,
}

impl<P> Programs<P> {
    fn compile<B>(backend: &mut B, manual_filtering: bool) -> Result<Self, GpuError>
    where
        B: RenderBackend<Program = P>,
    {
        use FieldFormat::{R16F, Rg16F, Rgba16F};
        let filtering = [Keyword::new("MANUAL_FILTERING", manual_filtering)];
        let mut field = |kind, format| {
            backend.compile_program(&ProgramDesc::new(kind, Output::Field(format)))
        };
        let copy = field(ProgramKind::Copy, Rgba16F)?;
        let clear = field(ProgramKind::Clear, R16F)?;
        let splat_velocity = field(ProgramKind::Splat, Rg16F)?;
        let splat_dye = field(ProgramKind::Splat, Rgba16F)?;
        let curl = field(ProgramKind::Curl, R16F)?;
        let vorticity = field(ProgramKind::Vorticity, Rg16F)?;
        let divergence = field(ProgramKind::Divergence, R16F)?;
        let pressure = field(ProgramKind::Pressure, R16F)?;
        let gradient_subtract = field(ProgramKind::GradientSubtract, Rg16F)?;
        let advect = |backend: &mut B, format| {
            backend.compile_program(
                &ProgramDesc::new(ProgramKind::Advection, Output::Field(format))
                    .keywords(&filtering),
            )
        };
        let advect_velocity = advect(backend, Rg16F)?;
        let advect_dye = advect(backend, Rgba16F)?;
        Ok(Self {
            copy,
            clear,
            splat_velocity,
            splat_dye,
            curl,
            vorticity,
            divergence,
            pressure,
            gradient_subtract,
            advect_velocity,
            advect_dye,
        })
    }
}

pub struct FluidSolver<B: RenderBackend> {
    programs: Programs<B::Program>,
    fields: Option<Fields<B::Target>>,
    filtering: Filtering,
    manual_filtering: bool,
}

fn desc(label: &'static str, (width, height): (u32, u32), format: FieldFormat, filtering: Filtering) -> TargetDesc {
    TargetDesc {
        label,
        width,
        height,
        format,
        filtering,
    }
}

impl<B: RenderBackend> FluidSolver<B> {
    /// Compiles every simulation program; any failure is fatal.
    pub fn new(backend: &mut B, caps: &Capabilities) -> Result<Self, GpuError> {
        let manual_filtering = !caps.linear_filtering;
        Ok(Self {
            programs: Programs::compile(backend, manual_filtering)?,
            fields: None,
            filtering: if manual_filtering {
                Filtering::Nearest
            } else {
                Filtering::Linear
            },
            manual_filtering,
        })
    }

    pub fn fields(&self) -> Option<&Fields<B::Target>> {
        self.fields.as_ref()
    }

    pub fn copy_program(&self) -> &B::Program {
        &self.programs.copy
    }

    /// Size the fields for the current screen. Dye keeps its contents across
    /// a resize; every other field starts over.
    pub fn init_fields(&mut self, backend: &mut B, config: &SimConfig) {
        let (w, h) = backend.drawing_buffer_size();
        let sim = get_resolution(config.sim_resolution, w, h);
        let dye = get_resolution(config.dye_resolution, w, h);
        log::info!(
            "[solver] fields sim={}x{} dye={}x{} for {}x{}",
            sim.0,
            sim.1,
            dye.0,
            dye.1,
            w,
            h
        );
        let linear = self.filtering;
        let dye_desc = desc("dye", dye, FieldFormat::Rgba16F, linear);
        let velocity_desc = desc("velocity", sim, FieldFormat::Rg16F, linear);
        let divergence_desc = desc("divergence", sim, FieldFormat::R16F, Filtering::Nearest);
        let curl_desc = desc("curl", sim, FieldFormat::R16F, Filtering::Nearest);
        let pressure_desc = desc("pressure", sim, FieldFormat::R16F, Filtering::Nearest);

        let dye = match self.fields.take() {
            Some(mut old) => {
                old.dye.resize(backend, &dye_desc, &self.programs.copy);
                old.dye
            }
            None => DoubleTarget::new(backend, &dye_desc),
        };
        self.fields = Some(Fields {
            dye,
            velocity: DoubleTarget::new(backend, &velocity_desc),
            divergence: backend.create_target(&divergence_desc),
            curl: backend.create_target(&curl_desc),
            pressure: DoubleTarget::new(backend, &pressure_desc),
        });
    }

    /// Drain `queue` into velocity and then dye. Splats stay queued until
    /// the fields exist.
    pub fn apply_splats(
        &mut self,
        backend: &mut B,
        queue: &mut SplatQueue,
        max_batch: usize,
        config: &SimConfig,
    ) -> DrainStats {
        let Some(fields) = self.fields.as_mut() else {
            return DrainStats::default();
        };
        let programs = &self.programs;
        let (w, h) = backend.drawing_buffer_size();
        let aspect = w.max(1) as f32 / h.max(1) as f32;
        let max_batch = max_batch.clamp(1, MAX_SPLAT_BATCH);
        queue.drain(max_batch, |field, chunk| {
            let uniforms = SplatUniforms::pack(field, chunk, aspect, config.splat_radius);
            let bytes = bytemuck::bytes_of(&uniforms);
            let (target, program) = match field {
                SplatField::Velocity => (&mut fields.velocity, &programs.splat_velocity),
                SplatField::Dye => (&mut fields.dye, &programs.splat_dye),
            };
            backend.blit(program, bytes, &[target.read()], Dest::Target(target.write()));
            target.swap();
        })
    }

    /// One simulation step of `dt` seconds.
    pub fn step(&mut self, backend: &mut B, config: &SimConfig, dt: f32) {
        let Some(f) = self.fields.as_mut() else {
            return;
        };
        let p = &self.programs;
        let texel = f.velocity.texel_size();
        let texel_block = TexelUniforms::new(texel);

        backend.blit(
            &p.curl,
            bytemuck::bytes_of(&texel_block),
            &[f.velocity.read()],
            Dest::Target(&f.curl),
        );

        let vorticity = VorticityUniforms {
            texel_size: texel,
            curl: config.curl,
            dt,
        };
        backend.blit(
            &p.vorticity,
            bytemuck::bytes_of(&vorticity),
            &[f.velocity.read(), &f.curl],
            Dest::Target(f.velocity.write()),
        );
        f.velocity.swap();

        backend.blit(
            &p.divergence,
            bytemuck::bytes_of(&texel_block),
            &[f.velocity.read()],
            Dest::Target(&f.divergence),
        );

        let clear = ClearUniforms {
            value: config.pressure,
            ..Default::default()
        };
        backend.blit(
            &p.clear,
            bytemuck::bytes_of(&clear),
            &[f.pressure.read()],
            Dest::Target(f.pressure.write()),
        );
        f.pressure.swap();

        for _ in 0..config.pressure_iterations {
            backend.blit(
                &p.pressure,
                bytemuck::bytes_of(&texel_block),
                &[f.pressure.read(), &f.divergence],
                Dest::Target(f.pressure.write()),
            );
            f.pressure.swap();
        }

        let gradient = GradientSubtractUniforms {
            texel_size: texel,
            radius: config.radius,
            ..Default::default()
        };
        backend.blit(
            &p.gradient_subtract,
            bytemuck::bytes_of(&gradient),
            &[f.pressure.read(), f.velocity.read()],
            Dest::Target(f.velocity.write()),
        );
        f.velocity.swap();

        let mut advection = AdvectionUniforms {
            texel_size: texel,
            source_texel_size: texel,
            dt,
            dissipation: config.velocity_dissipation,
            radius: config.radius,
            fade_width: config.fade_width,
        };
        backend.blit(
            &p.advect_velocity,
            bytemuck::bytes_of(&advection),
            &[f.velocity.read(), f.velocity.read()],
            Dest::Target(f.velocity.write()),
        );
        f.velocity.swap();

        advection.dissipation = config.density_dissipation;
        if self.manual_filtering {
            advection.source_texel_size = f.dye.texel_size();
        }
        backend.blit(
            &p.advect_dye,
            bytemuck::bytes_of(&advection),
            &[f.velocity.read(), f.dye.read()],
            Dest::Target(f.dye.write()),
        );
        f.dye.swap();
    }
}

impl<T: Target> Fields<T> {
    pub fn sim_size(&self) -> (u32, u32) {
        (self.velocity.width(), self.velocity.height())
    }

    pub fn dye_size(&self) -> (u32, u32) {
        (self.dye.width(), self.dye.height())
    }
}
