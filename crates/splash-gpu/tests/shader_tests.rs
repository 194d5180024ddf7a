use splash_core::gpu::{Blend, FieldFormat, Keyword, ProgramKind};
use splash_gpu::helpers::{blend_state, texture_format};
use splash_gpu::shaders::{compose, fragment_source, FULLSCREEN_WGSL, VERTEX_ENTRY};

const ALL: [ProgramKind; 18] = [
    ProgramKind::Copy,
    ProgramKind::Clear,
    ProgramKind::Color,
    ProgramKind::Checkerboard,
    ProgramKind::Display,
    ProgramKind::BloomPrefilter,
    ProgramKind::BloomBlur,
    ProgramKind::BloomFinal,
    ProgramKind::SunraysMask,
    ProgramKind::Sunrays,
    ProgramKind::Blur,
    ProgramKind::Splat,
    ProgramKind::Advection,
    ProgramKind::Divergence,
    ProgramKind::Curl,
    ProgramKind::Vorticity,
    ProgramKind::Pressure,
    ProgramKind::GradientSubtract,
];

#[test]
fn every_program_has_a_fragment_entry() {
    for kind in ALL {
        assert!(
            fragment_source(kind).contains("fn fs_main"),
            "{} has no entry point",
            kind.name()
        );
    }
}

#[test]
fn bound_sources_match_input_count() {
    for kind in ALL {
        let source = fragment_source(kind);
        let textures = source.matches("texture_2d<f32>;").count();
        assert_eq!(textures, kind.inputs(), "{}", kind.name());
        for i in 0..kind.inputs() {
            let texture = format!("@binding({})", 1 + 2 * i);
            let sampler = format!("@binding({})", 2 + 2 * i);
            assert!(source.contains(&texture), "{} missing {texture}", kind.name());
            assert!(source.contains(&sampler), "{} missing {sampler}", kind.name());
        }
    }
}

#[test]
fn parameter_block_sits_at_binding_zero() {
    let parameterless = [ProgramKind::Copy, ProgramKind::SunraysMask];
    for kind in ALL {
        let declared = fragment_source(kind).contains("@binding(0) var<uniform>");
        assert_eq!(declared, !parameterless.contains(&kind), "{}", kind.name());
    }
}

#[test]
fn keywords_come_first() {
    let text = compose(
        ProgramKind::Advection,
        &[Keyword::new("MANUAL_FILTERING", false)],
    )
    .unwrap();
    assert!(text.starts_with("const MANUAL_FILTERING: bool = false;\n"));
    assert!(text.contains(&format!("fn {VERTEX_ENTRY}")));
    assert!(FULLSCREEN_WGSL.contains(VERTEX_ENTRY));
}

#[test]
fn display_switches_are_referenced() {
    let display = fragment_source(ProgramKind::Display);
    for name in ["SHADING", "BLOOM", "SUNRAYS"] {
        assert!(display.contains(&format!("if {name}")), "{name}");
    }
    assert!(fragment_source(ProgramKind::Advection).contains("if MANUAL_FILTERING"));
}

#[test]
fn field_formats_map_to_half_floats() {
    assert_eq!(texture_format(FieldFormat::R16F), wgpu::TextureFormat::R16Float);
    assert_eq!(texture_format(FieldFormat::Rg16F), wgpu::TextureFormat::Rg16Float);
    assert_eq!(texture_format(FieldFormat::Rgba16F), wgpu::TextureFormat::Rgba16Float);
}

#[test]
fn blend_modes() {
    assert_eq!(blend_state(Blend::Replace), None);
    let additive = blend_state(Blend::Additive).unwrap();
    assert_eq!(additive.color.src_factor, wgpu::BlendFactor::One);
    assert_eq!(additive.color.dst_factor, wgpu::BlendFactor::One);
    assert_eq!(
        blend_state(Blend::Premultiplied),
        Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING)
    );
}
