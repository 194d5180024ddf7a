//! Mouse and touch pointers.
//!
//! Positions arrive in drawing-buffer pixels with the origin at the top left
//! and are stored as texture coordinates with `y` pointing up.

use glam::Vec2;
use rand::Rng;

use crate::color::{pointer_color, Rgb};
use crate::splat::{Splat, SplatQueue};

/// Id used for the mouse; touch ids come from the host.
pub const MOUSE_POINTER_ID: i64 = -1;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pointer {
    pub id: i64,
    pub texcoord: Vec2,
    pub prev_texcoord: Vec2,
    /// Aspect-corrected movement since the previous event.
    pub delta: Vec2,
    pub down: bool,
    pub moved: bool,
    pub color: Rgb,
}

impl Pointer {
    fn new(id: i64) -> Self {
        Self {
            id,
            texcoord: Vec2::ZERO,
            prev_texcoord: Vec2::ZERO,
            delta: Vec2::ZERO,
            down: false,
            moved: false,
            color: Rgb::BLACK,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Pointers {
    list: Vec<Pointer>,
}

fn texcoord(pos: Vec2, size: (u32, u32)) -> Vec2 {
    let (w, h) = (size.0.max(1) as f32, size.1.max(1) as f32);
    Vec2::new(pos.x / w, 1.0 - pos.y / h)
}

/// Scale a texture-space delta so equal screen distances give equal force
/// along both axes.
pub fn correct_delta(delta: Vec2, size: (u32, u32)) -> Vec2 {
    let aspect = size.0.max(1) as f32 / size.1.max(1) as f32;
    let mut d = delta;
    if aspect < 1.0 {
        d.x *= aspect;
    }
    if aspect > 1.0 {
        d.y /= aspect;
    }
    d
}

impl Pointers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: i64) -> Option<&Pointer> {
        self.list.iter().find(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pointer> {
        self.list.iter()
    }

    /// Press at `pos` pixels. Reuses the slot for `id` or any released one.
    pub fn down(&mut self, id: i64, pos: Vec2, size: (u32, u32), rng: &mut impl Rng) {
        let existing = self
            .list
            .iter()
            .position(|p| p.id == id)
            .or_else(|| self.list.iter().position(|p| !p.down));
        let slot = match existing {
            Some(i) => i,
            None => {
                self.list.push(Pointer::new(id));
                self.list.len() - 1
            }
        };
        let p = &mut self.list[slot];
        p.id = id;
        p.down = true;
        p.moved = false;
        p.texcoord = texcoord(pos, size);
        p.prev_texcoord = p.texcoord;
        p.delta = Vec2::ZERO;
        p.color = pointer_color(rng);
    }

    /// Drag to `pos` pixels; ignored unless the pointer is down.
    pub fn moved(&mut self, id: i64, pos: Vec2, size: (u32, u32)) {
        let Some(p) = self.list.iter_mut().find(|p| p.id == id && p.down) else {
            return;
        };
        p.prev_texcoord = p.texcoord;
        p.texcoord = texcoord(pos, size);
        p.delta = correct_delta(p.texcoord - p.prev_texcoord, size);
        p.moved = p.delta.x.abs() > 0.0 || p.delta.y.abs() > 0.0;
    }

    pub fn up(&mut self, id: i64) {
        if let Some(p) = self.list.iter_mut().find(|p| p.id == id) {
            p.down = false;
        }
    }

    pub fn recolor(&mut self, rng: &mut impl Rng) {
        for p in self.list.iter_mut() {
            p.color = pointer_color(rng);
        }
    }

    /// Enqueue one splat per pointer that moved since the last call.
    pub fn flush_moves(&mut self, splat_force: f32, queue: &mut SplatQueue) {
        for p in self.list.iter_mut().filter(|p| p.moved) {
            p.moved = false;
            queue.push(Splat::new(p.texcoord, p.delta * splat_force, p.color));
        }
    }
}
