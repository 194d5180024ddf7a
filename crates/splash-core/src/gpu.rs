//! The render resource provider the solver runs on.
//!
//! The core never talks to a graphics API directly. It asks a
//! [`RenderBackend`] for off-screen targets and compiled programs, and issues
//! full-viewport draws ("blits") with a packed uniform block and a list of
//! source targets. Program source text belongs to the backend; the core only
//! names programs by [`ProgramKind`] and selects variants with keywords.

use thiserror::Error;

/// Half-float texel layouts used by the simulation fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldFormat {
    /// One channel: pressure, divergence, curl, sunrays.
    R16F,
    /// Two channels: velocity.
    Rg16F,
    /// Four channels: dye and bloom.
    Rgba16F,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Filtering {
    Linear,
    Nearest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetDesc {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub format: FieldFormat,
    pub filtering: Filtering,
}

/// A texture that can be both sampled and rendered into.
pub trait Target {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    fn texel_size(&self) -> [f32; 2] {
        [1.0 / self.width().max(1) as f32, 1.0 / self.height().max(1) as f32]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    Copy,
    Clear,
    Color,
    Checkerboard,
    Display,
    BloomPrefilter,
    BloomBlur,
    BloomFinal,
    SunraysMask,
    Sunrays,
    Blur,
    Splat,
    Advection,
    Divergence,
    Curl,
    Vorticity,
    Pressure,
    GradientSubtract,
}

impl ProgramKind {
    pub fn name(self) -> &'static str {
        match self {
            ProgramKind::Copy => "copy",
            ProgramKind::Clear => "clear",
            ProgramKind::Color => "color",
            ProgramKind::Checkerboard => "checkerboard",
            ProgramKind::Display => "display",
            ProgramKind::BloomPrefilter => "bloom_prefilter",
            ProgramKind::BloomBlur => "bloom_blur",
            ProgramKind::BloomFinal => "bloom_final",
            ProgramKind::SunraysMask => "sunrays_mask",
            ProgramKind::Sunrays => "sunrays",
            ProgramKind::Blur => "blur",
            ProgramKind::Splat => "splat",
            ProgramKind::Advection => "advection",
            ProgramKind::Divergence => "divergence",
            ProgramKind::Curl => "curl",
            ProgramKind::Vorticity => "vorticity",
            ProgramKind::Pressure => "pressure",
            ProgramKind::GradientSubtract => "gradient_subtract",
        }
    }

    /// Number of source targets a blit with this program binds.
    pub fn inputs(self) -> usize {
        match self {
            ProgramKind::Color | ProgramKind::Checkerboard => 0,
            ProgramKind::Display => 3,
            ProgramKind::Advection
            | ProgramKind::Vorticity
            | ProgramKind::Pressure
            | ProgramKind::GradientSubtract => 2,
            _ => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Blend {
    Replace,
    /// `src + dst`, used by the bloom upsample chain.
    Additive,
    /// `src + dst * (1 - src.a)`, used when compositing onto the screen.
    Premultiplied,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Output {
    Field(FieldFormat),
    Screen,
}

/// Boolean compile-time switch handed to the program source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Keyword {
    pub name: &'static str,
    pub enabled: bool,
}

impl Keyword {
    pub const fn new(name: &'static str, enabled: bool) -> Self {
        Self { name, enabled }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ProgramDesc<'a> {
    pub kind: ProgramKind,
    pub keywords: &'a [Keyword],
    pub blend: Blend,
    pub output: Output,
}

impl<'a> ProgramDesc<'a> {
    pub fn new(kind: ProgramKind, output: Output) -> Self {
        Self {
            kind,
            keywords: &[],
            blend: Blend::Replace,
            output,
        }
    }

    pub fn blend(mut self, blend: Blend) -> Self {
        self.blend = blend;
        self
    }

    pub fn keywords(mut self, keywords: &'a [Keyword]) -> Self {
        self.keywords = keywords;
        self
    }
}

/// What a backend can do; gaps degrade quality instead of failing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    /// Half-float targets can be sampled with bilinear filtering.
    pub linear_filtering: bool,
    pub max_texture_size: u32,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            linear_filtering: true,
            max_texture_size: 8192,
        }
    }
}

pub enum Dest<'a, T> {
    Target(&'a T),
    Screen,
}

#[derive(Debug, Error)]
pub enum GpuError {
    #[error("failed to build program {program}: {message}")]
    Compile {
        program: &'static str,
        message: String,
    },
    #[error("keyword {0:?} is not a valid identifier")]
    InvalidKeyword(&'static str),
}

pub trait RenderBackend {
    type Target: Target;
    type Program;

    fn capabilities(&self) -> Capabilities;

    /// Size in pixels of the screen surface.
    fn drawing_buffer_size(&self) -> (u32, u32);

    fn create_target(&mut self, desc: &TargetDesc) -> Self::Target;

    fn compile_program(&mut self, desc: &ProgramDesc<'_>) -> Result<Self::Program, GpuError>;

    /// Draw a full-viewport triangle with `program` into `dest`, sampling
    /// `sources` in order. `uniforms` is the program's packed parameter block.
    fn blit(
        &mut self,
        program: &Self::Program,
        uniforms: &[u8],
        sources: &[&Self::Target],
        dest: Dest<'_, Self::Target>,
    );
}

/// Prepend one `const NAME: bool = ...;` declaration per keyword.
pub fn inject_keywords(source: &str, keywords: &[Keyword]) -> Result<String, GpuError> {
    let mut out = String::with_capacity(source.len() + keywords.len() * 32);
    for keyword in keywords {
        let valid = keyword
            .name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && keyword
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(GpuError::InvalidKeyword(keyword.name));
        }
        out.push_str(&format!("const {}: bool = {};\n", keyword.name, keyword.enabled));
    }
    out.push_str(source);
    Ok(out)
}
