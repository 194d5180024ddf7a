//! Packed parameter blocks, one per program.
//!
//! Every struct is `#[repr(C)]`, a multiple of 16 bytes and laid out to
//! match the matching `Params` struct in the shader source.

use bytemuck::{Pod, Zeroable};

use crate::color::Rgb;
use crate::constants::MAX_SPLAT_BATCH;
use crate::splat::{Splat, SplatField};

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct NoUniforms {
    pub _pad: [f32; 4],
}

/// Curl, divergence, pressure, blur and bloom blur passes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct TexelUniforms {
    pub texel_size: [f32; 2],
    pub _pad: [f32; 2],
}

impl TexelUniforms {
    pub fn new(texel_size: [f32; 2]) -> Self {
        Self {
            texel_size,
            _pad: [0.0; 2],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct ClearUniforms {
    /// Multiplier applied to the sampled value.
    pub value: f32,
    pub _pad: [f32; 3],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct ColorUniforms {
    pub color: [f32; 4],
}

impl ColorUniforms {
    pub fn opaque(color: Rgb) -> Self {
        Self {
            color: [color.r, color.g, color.b, 1.0],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct CheckerboardUniforms {
    pub aspect_ratio: f32,
    pub _pad: [f32; 3],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct VorticityUniforms {
    pub texel_size: [f32; 2],
    pub curl: f32,
    pub dt: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct GradientSubtractUniforms {
    pub texel_size: [f32; 2],
    pub radius: f32,
    pub _pad: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct AdvectionUniforms {
    pub texel_size: [f32; 2],
    /// Texel size of the advected field; only read with manual filtering.
    pub source_texel_size: [f32; 2],
    pub dt: f32,
    pub dissipation: f32,
    pub radius: f32,
    pub fade_width: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct DisplayUniforms {
    pub texel_size: [f32; 2],
    pub radius: f32,
    pub fade_width: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct BloomPrefilterUniforms {
    pub curve: [f32; 3],
    pub threshold: f32,
}

impl BloomPrefilterUniforms {
    /// Soft-knee threshold curve.
    pub fn new(threshold: f32, soft_knee: f32) -> Self {
        let knee = threshold * soft_knee + 0.0001;
        Self {
            curve: [threshold - knee, knee * 2.0, 0.25 / knee],
            threshold,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct BloomFinalUniforms {
    pub texel_size: [f32; 2],
    pub intensity: f32,
    pub _pad: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct SunraysUniforms {
    pub weight: f32,
    pub _pad: [f32; 3],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct SplatParams {
    pub point: [f32; 2],
    pub radius: f32,
    pub attenuation: f32,
    /// Force in `xy` for velocity, colour in `rgb` for dye.
    pub value: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SplatUniforms {
    pub aspect_ratio: f32,
    pub count: u32,
    pub _pad: [f32; 2],
    pub splats: [SplatParams; MAX_SPLAT_BATCH],
}

impl SplatUniforms {
    /// Pack one chunk of at most [`MAX_SPLAT_BATCH`] splats for `field`.
    /// Radii without an explicit value fall back to `default_radius`.
    pub fn pack(field: SplatField, chunk: &[Splat], aspect_ratio: f32, default_radius: f32) -> Self {
        assert!(
            chunk.len() <= MAX_SPLAT_BATCH,
            "splat chunk of {} exceeds capacity {MAX_SPLAT_BATCH}",
            chunk.len()
        );
        let mut packed = Self::zeroed();
        packed.aspect_ratio = aspect_ratio;
        packed.count = chunk.len() as u32;
        for (slot, splat) in packed.splats.iter_mut().zip(chunk) {
            let radius = splat.radius.unwrap_or(default_radius);
            *slot = SplatParams {
                point: splat.point.to_array(),
                radius: correct_radius(radius / 100.0, aspect_ratio),
                attenuation: splat.attenuation,
                value: match field {
                    SplatField::Velocity => [splat.force.x, splat.force.y, 0.0, 0.0],
                    SplatField::Dye => [splat.color.r, splat.color.g, splat.color.b, 0.0],
                },
            };
        }
        packed
    }
}

/// Stretch the splat radius on wide targets so splats stay round.
pub fn correct_radius(radius: f32, aspect_ratio: f32) -> f32 {
    if aspect_ratio > 1.0 {
        radius * aspect_ratio
    } else {
        radius
    }
}
