use fnv::FnvHashMap;

/// Uniform buffers are allocated in multiples of this many bytes.
pub const UNIFORM_BLOCK: usize = 16;

/// Bytes a parameter block of `len` bytes occupies on the GPU.
pub fn padded_size(len: usize) -> usize {
    len.max(1).div_ceil(UNIFORM_BLOCK) * UNIFORM_BLOCK
}

/// Hands out one slot per blit for each buffer size, restarting every frame.
///
/// All `write_buffer` calls of a frame land before its single submit, so two
/// blits in the same frame must never share a buffer.
#[derive(Debug, Default)]
pub struct UniformSlots {
    used: FnvHashMap<usize, usize>,
}

impl UniformSlots {
    /// Index of the next free buffer of `size` bytes in this frame.
    pub fn claim(&mut self, size: usize) -> usize {
        let next = self.used.entry(size).or_insert(0);
        *next += 1;
        *next - 1
    }

    pub fn reset(&mut self) {
        self.used.clear();
    }
}

/// Uniform buffers kept alive across frames and rewritten in place.
#[derive(Default)]
pub struct UniformPool {
    buffers: FnvHashMap<usize, Vec<wgpu::Buffer>>,
    slots: UniformSlots,
}

impl UniformPool {
    /// Upload `bytes` into a buffer no other blit of this frame uses.
    pub fn write(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        bytes: &[u8],
    ) -> &wgpu::Buffer {
        let size = padded_size(bytes.len());
        let slot = self.slots.claim(size);
        let buffers = self.buffers.entry(size).or_default();
        if slot == buffers.len() {
            log::debug!("[gpu] uniform buffer {size}B #{slot} for {label}");
            buffers.push(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("splash_uniforms"),
                size: size as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
        }
        let buffer = &buffers[slot];
        if bytes.len() == size {
            queue.write_buffer(buffer, 0, bytes);
        } else {
            let mut padded = bytes.to_vec();
            padded.resize(size, 0);
            queue.write_buffer(buffer, 0, &padded);
        }
        buffer
    }

    /// Call after the frame's commands are submitted.
    pub fn recycle(&mut self) {
        self.slots.reset();
    }
}
