use splash_core::gpu::{inject_keywords, GpuError, Keyword, ProgramKind};

pub static FULLSCREEN_WGSL: &str = include_str!("../shaders/fullscreen.wgsl");

pub const VERTEX_ENTRY: &str = "vs_fullscreen";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Fragment source for `kind`, without the shared prelude.
pub fn fragment_source(kind: ProgramKind) -> &'static str {
    match kind {
        ProgramKind::Copy => include_str!("../shaders/copy.wgsl"),
        ProgramKind::Clear => include_str!("../shaders/clear.wgsl"),
        ProgramKind::Color => include_str!("../shaders/color.wgsl"),
        ProgramKind::Checkerboard => include_str!("../shaders/checkerboard.wgsl"),
        ProgramKind::Display => include_str!("../shaders/display.wgsl"),
        ProgramKind::BloomPrefilter => include_str!("../shaders/bloom_prefilter.wgsl"),
        ProgramKind::BloomBlur => include_str!("../shaders/bloom_blur.wgsl"),
        ProgramKind::BloomFinal => include_str!("../shaders/bloom_final.wgsl"),
        ProgramKind::SunraysMask => include_str!("../shaders/sunrays_mask.wgsl"),
        ProgramKind::Sunrays => include_str!("../shaders/sunrays.wgsl"),
        ProgramKind::Blur => include_str!("../shaders/blur.wgsl"),
        ProgramKind::Splat => include_str!("../shaders/splat.wgsl"),
        ProgramKind::Advection => include_str!("../shaders/advection.wgsl"),
        ProgramKind::Divergence => include_str!("../shaders/divergence.wgsl"),
        ProgramKind::Curl => include_str!("../shaders/curl.wgsl"),
        ProgramKind::Vorticity => include_str!("../shaders/vorticity.wgsl"),
        ProgramKind::Pressure => include_str!("../shaders/pressure.wgsl"),
        ProgramKind::GradientSubtract => include_str!("../shaders/gradient_subtract.wgsl"),
    }
}

/// Full module text: keyword constants, the fullscreen prelude, then the
/// program body.
pub fn compose(kind: ProgramKind, keywords: &[Keyword]) -> Result<String, GpuError> {
    let body = format!("{FULLSCREEN_WGSL}\n{}", fragment_source(kind));
    inject_keywords(&body, keywords)
}
