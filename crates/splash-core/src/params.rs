//! Slow drift between preset simulation parameter sets.
//!
//! Each cycle holds the current values for a while, then tweens linearly to
//! a randomly chosen preset.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SimConfig;
use crate::constants::{PARAMETER_STAY_SECONDS, PARAMETER_TWEEN_SECONDS};

/// The animatable subset of [`SimConfig`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParameterSet {
    pub density_dissipation: f32,
    pub velocity_dissipation: f32,
    pub pressure: f32,
    pub curl: f32,
    pub splat_radius: f32,
}

impl ParameterSet {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            density_dissipation: config.density_dissipation,
            velocity_dissipation: config.velocity_dissipation,
            pressure: config.pressure,
            curl: config.curl,
            splat_radius: config.splat_radius,
        }
    }

    pub fn apply_to(&self, config: &mut SimConfig) {
        config.density_dissipation = self.density_dissipation;
        config.velocity_dissipation = self.velocity_dissipation;
        config.pressure = self.pressure;
        config.curl = self.curl;
        config.splat_radius = self.splat_radius;
    }

    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        let mix = |a: f32, b: f32| a * (1.0 - t) + b * t;
        Self {
            density_dissipation: mix(self.density_dissipation, other.density_dissipation),
            velocity_dissipation: mix(self.velocity_dissipation, other.velocity_dissipation),
            pressure: mix(self.pressure, other.pressure),
            curl: mix(self.curl, other.curl),
            splat_radius: mix(self.splat_radius, other.splat_radius),
        }
    }
}

pub const PRESETS: [ParameterSet; 3] = [
    ParameterSet {
        density_dissipation: 2.0,
        velocity_dissipation: 1.0,
        pressure: 0.8,
        curl: 4.0,
        splat_radius: 0.15,
    },
    ParameterSet {
        density_dissipation: 0.589_750_6,
        velocity_dissipation: 0.0,
        pressure: 0.8,
        curl: 24.0,
        splat_radius: 0.040_139_764,
    },
    ParameterSet {
        density_dissipation: 2.027_952_9,
        velocity_dissipation: 0.0,
        pressure: 1.0,
        curl: 0.0,
        splat_radius: 0.012_778_843,
    },
];

pub struct ParameterAnimator {
    sets: Vec<ParameterSet>,
    current_index: Option<usize>,
    current_cycle: u64,
    source: ParameterSet,
    target: ParameterSet,
    stay: f64,
    tween: f64,
    rng: StdRng,
}

impl ParameterAnimator {
    /// Jumps `config` straight to the first randomly chosen set.
    pub fn new(config: &mut SimConfig, sets: Vec<ParameterSet>, seed: u64) -> Self {
        let current = ParameterSet::from_config(config);
        let mut animator = Self {
            sets,
            current_index: None,
            current_cycle: 0,
            source: current,
            target: current,
            stay: PARAMETER_STAY_SECONDS,
            tween: PARAMETER_TWEEN_SECONDS,
            rng: StdRng::seed_from_u64(seed),
        };
        if let Some(first) = animator.next_set() {
            first.apply_to(config);
            animator.source = first;
            animator.target = first;
        }
        animator
    }

    pub fn with_timing(mut self, stay: f64, tween: f64) -> Self {
        self.stay = stay.max(0.0);
        self.tween = tween.max(f64::EPSILON);
        self
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn target(&self) -> ParameterSet {
        self.target
    }

    fn next_set(&mut self) -> Option<ParameterSet> {
        let len = self.sets.len();
        if len == 0 {
            return None;
        }
        let pick = self.rng.gen_range(0..len);
        let index = if Some(pick) == self.current_index {
            (pick + 1) % len
        } else {
            pick
        };
        self.current_index = Some(index);
        Some(self.sets[index])
    }

    /// Advance to `elapsed` seconds of play time and write the animated
    /// values into `config`.
    pub fn update(&mut self, elapsed: f64, config: &mut SimConfig) {
        if self.sets.is_empty() {
            return;
        }
        let cycle_length = self.stay + self.tween;
        let elapsed = elapsed.max(0.0);
        let cycle = (elapsed / cycle_length).floor() as u64;
        let local = elapsed % cycle_length;
        if cycle != self.current_cycle {
            self.target.apply_to(config);
            self.source = self.target;
            if let Some(next) = self.next_set() {
                self.target = next;
                log::debug!("[params] cycle {cycle}: tween to set {:?}", self.current_index);
            }
            self.current_cycle = cycle;
        }
        if local > self.stay {
            let t = ((local - self.stay) / self.tween).min(1.0) as f32;
            self.source.lerp(&self.target, t).apply_to(config);
        }
    }
}
