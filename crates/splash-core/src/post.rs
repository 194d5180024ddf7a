//! Bloom, sunrays and the final composite onto the screen.

use fnv::FnvHashMap;

use crate::config::SimConfig;
use crate::constants::{MIN_BLOOM_LEVEL_SIZE, SUNRAYS_BLUR_ITERATIONS};
use crate::gpu::{
    Blend, Dest, FieldFormat, Filtering, GpuError, Keyword, Output, ProgramDesc, ProgramKind,
    RenderBackend, Target, TargetDesc,
};
use crate::solver::Fields;
use crate::targets::get_resolution;
use crate::uniforms::{
    BloomFinalUniforms, BloomPrefilterUniforms, CheckerboardUniforms, ColorUniforms,
    DisplayUniforms, NoUniforms, SunraysUniforms, TexelUniforms,
};

/// Display program variants keyed by their keyword set.
pub struct Material<P> {
    variants: FnvHashMap<[bool; 3], P>,
}

impl<P> Default for Material<P> {
    fn default() -> Self {
        Self {
            variants: FnvHashMap::default(),
        }
    }
}

impl<P> Material<P> {
    pub fn keywords(config: &SimConfig) -> [Keyword; 3] {
        [
            Keyword::new("SHADING", config.shading),
            Keyword::new("BLOOM", config.bloom),
            Keyword::new("SUNRAYS", config.sunrays),
        ]
    }

    /// The variant for the config's toggles, compiled on first use.
    pub fn variant<B>(&mut self, backend: &mut B, config: &SimConfig) -> Result<&P, GpuError>
    where
        B: RenderBackend<Program = P>,
    {
        let key = [config.shading, config.bloom, config.sunrays];
        if !self.variants.contains_key(&key) {
            let keywords = Self::keywords(config);
            let program = backend.compile_program(
                &ProgramDesc::new(ProgramKind::Display, Output::Screen)
                    .keywords(&keywords)
                    .blend(Blend::Premultiplied),
            )?;
            log::debug!("[post] compiled display variant {key:?}");
            self.variants.insert(key, program);
        }
        Ok(&self.variants[&key])
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

struct Programs<P> {
    bloom_prefilter: P,
    bloom_blur: P,
    bloom_blur_additive: P,
    bloom_final: P,
    sunrays_mask: P,
    sunrays: P,
    blur: P,
    color: P,
    checkerboard: P,
}

/// Bloom mip chain and sunray buffers.
pub struct PostTargets<T> {
    pub bloom: T,
    pub bloom_levels: Vec<T>,
    pub sunrays: T,
    pub sunrays_temp: T,
}

pub struct Compositor<B: RenderBackend> {
    programs: Programs<B::Program>,
    display: Material<B::Program>,
    targets: Option<PostTargets<B::Target>>,
    filtering: Filtering,
}

impl<B: RenderBackend> Compositor<B> {
    /// Compiles the fixed programs and the display variant for `config`.
    pub fn new(backend: &mut B, config: &SimConfig, filtering: Filtering) -> Result<Self, GpuError> {
        let bloom = Output::Field(FieldFormat::Rgba16F);
        let rays = Output::Field(FieldFormat::R16F);
        let mut compile = |desc: ProgramDesc<'_>| backend.compile_program(&desc);
        let programs = Programs {
            bloom_prefilter: compile(ProgramDesc::new(ProgramKind::BloomPrefilter, bloom))?,
            bloom_blur: compile(ProgramDesc::new(ProgramKind::BloomBlur, bloom))?,
            bloom_blur_additive: compile(
                ProgramDesc::new(ProgramKind::BloomBlur, bloom).blend(Blend::Additive),
            )?,
            bloom_final: compile(ProgramDesc::new(ProgramKind::BloomFinal, bloom))?,
            sunrays_mask: compile(ProgramDesc::new(
                ProgramKind::SunraysMask,
                Output::Field(FieldFormat::Rgba16F),
            ))?,
            sunrays: compile(ProgramDesc::new(ProgramKind::Sunrays, rays))?,
            blur: compile(ProgramDesc::new(ProgramKind::Blur, rays))?,
            color: compile(
                ProgramDesc::new(ProgramKind::Color, Output::Screen).blend(Blend::Premultiplied),
            )?,
            checkerboard: compile(
                ProgramDesc::new(ProgramKind::Checkerboard, Output::Screen)
                    .blend(Blend::Premultiplied),
            )?,
        };
        let mut display = Material::default();
        display.variant(backend, config)?;
        Ok(Self {
            programs,
            display,
            targets: None,
            filtering,
        })
    }

    pub fn targets(&self) -> Option<&PostTargets<B::Target>> {
        self.targets.as_ref()
    }

    pub fn display_variants(&self) -> usize {
        self.display.len()
    }

    /// (Re)allocate bloom and sunray targets for the current screen.
    pub fn init_targets(&mut self, backend: &mut B, config: &SimConfig) {
        let (w, h) = backend.drawing_buffer_size();
        let (bw, bh) = get_resolution(config.bloom_resolution, w, h);
        let filtering = self.filtering;
        let make = |backend: &mut B,
                    label: &'static str,
                    (width, height): (u32, u32),
                    format: FieldFormat| {
            backend.create_target(&TargetDesc {
                label,
                width,
                height,
                format,
                filtering,
            })
        };
        let bloom = make(backend, "bloom", (bw, bh), FieldFormat::Rgba16F);
        let mut bloom_levels = Vec::new();
        for i in 1..=config.bloom_iterations.min(31) {
            let (lw, lh) = (bw >> i, bh >> i);
            if lw < MIN_BLOOM_LEVEL_SIZE || lh < MIN_BLOOM_LEVEL_SIZE {
                break;
            }
            bloom_levels.push(make(backend, "bloom_level", (lw, lh), FieldFormat::Rgba16F));
        }
        let rays = get_resolution(config.sunrays_resolution, w, h);
        let sunrays = make(backend, "sunrays", rays, FieldFormat::R16F);
        let sunrays_temp = make(backend, "sunrays_temp", rays, FieldFormat::R16F);
        log::info!(
            "[post] bloom {}x{} with {} levels, sunrays {}x{}",
            bw,
            bh,
            bloom_levels.len(),
            rays.0,
            rays.1
        );
        self.targets = Some(PostTargets {
            bloom,
            bloom_levels,
            sunrays,
            sunrays_temp,
        });
    }

    /// Composite the dye field onto the screen.
    pub fn render(&mut self, backend: &mut B, fields: &Fields<B::Target>, config: &SimConfig) {
        let Some(t) = self.targets.as_ref() else {
            return;
        };
        let p = &self.programs;
        if config.bloom {
            apply_bloom(backend, p, fields.dye.read(), t, config);
        }
        if config.sunrays {
            apply_sunrays(backend, p, fields.dye.read(), fields.dye.write(), &t.sunrays, config);
            blur(backend, &p.blur, &t.sunrays, &t.sunrays_temp, SUNRAYS_BLUR_ITERATIONS);
        }

        if config.transparent {
            let (w, h) = backend.drawing_buffer_size();
            let checker = CheckerboardUniforms {
                aspect_ratio: w.max(1) as f32 / h.max(1) as f32,
                ..Default::default()
            };
            backend.blit(&p.checkerboard, bytemuck::bytes_of(&checker), &[], Dest::Screen);
        } else {
            let color = ColorUniforms::opaque(config.back_color.normalized());
            backend.blit(&p.color, bytemuck::bytes_of(&color), &[], Dest::Screen);
        }

        let (w, h) = backend.drawing_buffer_size();
        let display = DisplayUniforms {
            texel_size: [1.0 / w.max(1) as f32, 1.0 / h.max(1) as f32],
            radius: config.radius,
            fade_width: config.fade_width,
        };
        let program = match self.display.variant(backend, config) {
            Ok(program) => program,
            Err(e) => {
                log::error!("[post] display program unavailable: {e}");
                return;
            }
        };
        backend.blit(
            program,
            bytemuck::bytes_of(&display),
            &[fields.dye.read(), &t.bloom, &t.sunrays],
            Dest::Screen,
        );
    }
}

fn apply_bloom<B: RenderBackend>(
    backend: &mut B,
    p: &Programs<B::Program>,
    source: &B::Target,
    t: &PostTargets<B::Target>,
    config: &SimConfig,
) {
    if t.bloom_levels.len() < 2 {
        return;
    }
    let prefilter = BloomPrefilterUniforms::new(config.bloom_threshold, config.bloom_soft_knee);
    backend.blit(
        &p.bloom_prefilter,
        bytemuck::bytes_of(&prefilter),
        &[source],
        Dest::Target(&t.bloom),
    );

    let mut last = &t.bloom;
    for level in &t.bloom_levels {
        let texel = TexelUniforms::new(last.texel_size());
        backend.blit(&p.bloom_blur, bytemuck::bytes_of(&texel), &[last], Dest::Target(level));
        last = level;
    }
    for level in t.bloom_levels.iter().rev().skip(1) {
        let texel = TexelUniforms::new(last.texel_size());
        backend.blit(
            &p.bloom_blur_additive,
            bytemuck::bytes_of(&texel),
            &[last],
            Dest::Target(level),
        );
        last = level;
    }

    let final_pass = BloomFinalUniforms {
        texel_size: last.texel_size(),
        intensity: config.bloom_intensity,
        ..Default::default()
    };
    backend.blit(
        &p.bloom_final,
        bytemuck::bytes_of(&final_pass),
        &[last],
        Dest::Target(&t.bloom),
    );
}

fn apply_sunrays<B: RenderBackend>(
    backend: &mut B,
    p: &Programs<B::Program>,
    source: &B::Target,
    mask: &B::Target,
    destination: &B::Target,
    config: &SimConfig,
) {
    backend.blit(
        &p.sunrays_mask,
        bytemuck::bytes_of(&NoUniforms::default()),
        &[source],
        Dest::Target(mask),
    );
    let rays = SunraysUniforms {
        weight: config.sunrays_weight,
        ..Default::default()
    };
    backend.blit(&p.sunrays, bytemuck::bytes_of(&rays), &[mask], Dest::Target(destination));
}

/// Separable blur: horizontal into `temp`, vertical back into `target`.
fn blur<B: RenderBackend>(
    backend: &mut B,
    program: &B::Program,
    target: &B::Target,
    temp: &B::Target,
    iterations: u32,
) {
    let [tx, ty] = target.texel_size();
    for _ in 0..iterations {
        let horizontal = TexelUniforms::new([tx, 0.0]);
        backend.blit(program, bytemuck::bytes_of(&horizontal), &[target], Dest::Target(temp));
        let vertical = TexelUniforms::new([0.0, ty]);
        backend.blit(program, bytemuck::bytes_of(&vertical), &[temp], Dest::Target(target));
    }
}
