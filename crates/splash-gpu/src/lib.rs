//! wgpu implementation of the splash-core [`RenderBackend`].
//!
//! [`RenderBackend`]: splash_core::gpu::RenderBackend

pub mod backend;
pub mod helpers;
pub mod shaders;
pub mod uniforms;

pub use backend::*;
