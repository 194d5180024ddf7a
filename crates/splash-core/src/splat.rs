//! Deferred splat injection.
//!
//! Pointer handlers and note splashes only ever append to a [`SplatQueue`];
//! the frame driver drains it once per frame into the velocity and dye
//! fields in bounded batches.

use glam::Vec2;

use crate::color::Rgb;

/// One localized injection of force and colour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Splat {
    /// Normalized `[0, 1]` target-space position.
    pub point: Vec2,
    pub force: Vec2,
    pub color: Rgb,
    pub attenuation: f32,
    /// Splat radius in config units; `None` uses `SPLAT_RADIUS` at drain time.
    pub radius: Option<f32>,
}

impl Splat {
    pub fn new(point: Vec2, force: Vec2, color: Rgb) -> Self {
        Self {
            point,
            force,
            color,
            attenuation: 1.0,
            radius: None,
        }
    }

    pub fn with_attenuation(mut self, attenuation: f32) -> Self {
        self.attenuation = attenuation;
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = Some(radius);
        self
    }
}

/// Which field a drain pass writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SplatField {
    /// Force vectors into the velocity field.
    Velocity,
    /// Colours into the dye field.
    Dye,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainStats {
    pub records: usize,
    pub chunks_per_pass: usize,
}

#[derive(Debug, Default)]
pub struct SplatQueue {
    pending: Vec<Splat>,
}

impl SplatQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, splat: Splat) {
        self.pending.push(splat);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn enqueue(
        &mut self,
        x: f32,
        y: f32,
        dx: f32,
        dy: f32,
        color: Rgb,
        attenuation: Option<f32>,
        radius: Option<f32>,
    ) {
        self.push(Splat {
            point: Vec2::new(x, y),
            force: Vec2::new(dx, dy),
            color,
            attenuation: attenuation.unwrap_or(1.0),
            radius,
        });
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> &[Splat] {
        &self.pending
    }

    /// Hand every pending splat to `apply` twice, first for the velocity
    /// field and then for the dye field, in FIFO chunks of at most
    /// `max_batch` records. The queue is empty afterwards.
    pub fn drain(
        &mut self,
        max_batch: usize,
        mut apply: impl FnMut(SplatField, &[Splat]),
    ) -> DrainStats {
        if self.pending.is_empty() {
            return DrainStats::default();
        }
        let batch = max_batch.max(1);
        for field in [SplatField::Velocity, SplatField::Dye] {
            for chunk in self.pending.chunks(batch) {
                apply(field, chunk);
            }
        }
        let stats = DrainStats {
            records: self.pending.len(),
            chunks_per_pass: self.pending.len().div_ceil(batch),
        };
        self.pending.clear();
        stats
    }
}
