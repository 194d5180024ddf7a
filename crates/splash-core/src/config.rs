//! Simulation and compositing knobs.
//!
//! The frame driver reads [`SimConfig`] once per frame; hosts may change any
//! field between frames. Field names serialize in the upper-case form used by
//! config files (`SIM_RESOLUTION`, `BLOOM_INTENSITY`, ...).

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::constants::DEGRADED_DYE_RESOLUTION;
use crate::gpu::Capabilities;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct SimConfig {
    /// Radius of the circular active region in texture space.
    pub radius: f32,
    pub fade_width: f32,
    pub sim_resolution: u32,
    pub dye_resolution: u32,
    pub density_dissipation: f32,
    pub velocity_dissipation: f32,
    pub pressure: f32,
    pub pressure_iterations: u32,
    pub curl: f32,
    pub splat_radius: f32,
    pub splat_force: f32,
    pub shading: bool,
    pub colorful: bool,
    pub color_update_speed: f32,
    pub paused: bool,
    /// Background in 0–255 channel units.
    pub back_color: Rgb,
    pub transparent: bool,
    pub bloom: bool,
    pub bloom_iterations: u32,
    pub bloom_resolution: u32,
    pub bloom_intensity: f32,
    pub bloom_threshold: f32,
    pub bloom_soft_knee: f32,
    pub sunrays: bool,
    pub sunrays_resolution: u32,
    pub sunrays_weight: f32,
    pub animate_parameters: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            radius: 0.5,
            fade_width: 0.025,
            sim_resolution: 256,
            dye_resolution: 1024,
            density_dissipation: 2.0,
            velocity_dissipation: 1.0,
            pressure: 0.8,
            pressure_iterations: 20,
            curl: 4.0,
            splat_radius: 0.15,
            splat_force: 6000.0,
            shading: true,
            colorful: false,
            color_update_speed: 10.0,
            paused: false,
            back_color: Rgb::BLACK,
            transparent: false,
            bloom: false,
            bloom_iterations: 8,
            bloom_resolution: 256,
            bloom_intensity: 0.8,
            bloom_threshold: 0.6,
            bloom_soft_knee: 0.7,
            sunrays: true,
            sunrays_resolution: 196,
            sunrays_weight: 1.0,
            animate_parameters: true,
        }
    }
}

impl SimConfig {
    /// Lower quality settings the provider cannot support.
    pub fn degrade_for(&mut self, caps: &Capabilities) {
        if caps.linear_filtering {
            return;
        }
        log::warn!(
            "[config] no half-float linear filtering; dye resolution {} -> {}, shading/bloom/sunrays off",
            self.dye_resolution,
            DEGRADED_DYE_RESOLUTION
        );
        self.dye_resolution = DEGRADED_DYE_RESOLUTION;
        self.shading = false;
        self.bloom = false;
        self.sunrays = false;
    }

    /// Settings that size framebuffers; a change means re-allocation.
    pub fn framebuffer_key(&self) -> FramebufferKey {
        FramebufferKey {
            sim_resolution: self.sim_resolution,
            dye_resolution: self.dye_resolution,
            bloom_resolution: self.bloom_resolution,
            bloom_iterations: self.bloom_iterations,
            sunrays_resolution: self.sunrays_resolution,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramebufferKey {
    pub sim_resolution: u32,
    pub dye_resolution: u32,
    pub bloom_resolution: u32,
    pub bloom_iterations: u32,
    pub sunrays_resolution: u32,
}
