use crate::gpu::{Dest, RenderBackend, Target, TargetDesc};
use crate::uniforms::NoUniforms;

/// Two targets of equal size with explicit read/write roles.
///
/// `read` is the last fully written texture, `write` the scratch target for
/// the next pass. Only [`DoubleTarget::swap`] exchanges the roles.
#[derive(Debug)]
pub struct DoubleTarget<T> {
    targets: [T; 2],
    read: usize,
}

impl<T: Target> DoubleTarget<T> {
    pub fn new<B: RenderBackend<Target = T>>(backend: &mut B, desc: &TargetDesc) -> Self {
        Self::from_pair(backend.create_target(desc), backend.create_target(desc))
    }

    pub fn from_pair(read: T, write: T) -> Self {
        Self {
            targets: [read, write],
            read: 0,
        }
    }

    pub fn read(&self) -> &T {
        &self.targets[self.read]
    }

    pub fn write(&self) -> &T {
        &self.targets[1 - self.read]
    }

    pub fn swap(&mut self) {
        self.read = 1 - self.read;
    }

    pub fn width(&self) -> u32 {
        self.read().width()
    }

    pub fn height(&self) -> u32 {
        self.read().height()
    }

    pub fn texel_size(&self) -> [f32; 2] {
        self.read().texel_size()
    }

    /// Reallocate at the size in `desc`, copying the current read contents
    /// into the new read target. The write target starts empty.
    pub fn resize<B: RenderBackend<Target = T>>(
        &mut self,
        backend: &mut B,
        desc: &TargetDesc,
        copy: &B::Program,
    ) {
        if self.width() == desc.width && self.height() == desc.height {
            return;
        }
        let read = backend.create_target(desc);
        backend.blit(
            copy,
            bytemuck::bytes_of(&NoUniforms::default()),
            &[self.read()],
            Dest::Target(&read),
        );
        let write = backend.create_target(desc);
        self.targets = [read, write];
        self.read = 0;
    }
}

/// Simulation grid size for a configured resolution and screen size.
///
/// The shorter screen side gets `resolution` texels and the longer side is
/// scaled by the aspect ratio, so the grid keeps the screen's proportions.
pub fn get_resolution(resolution: u32, width: u32, height: u32) -> (u32, u32) {
    let (w, h) = (width.max(1) as f32, height.max(1) as f32);
    let aspect = if w >= h { w / h } else { h / w };
    let min = resolution.max(1);
    let max = (resolution.max(1) as f32 * aspect).round() as u32;
    if width > height {
        (max, min)
    } else {
        (min, max)
    }
}
