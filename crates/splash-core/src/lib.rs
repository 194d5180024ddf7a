//! Platform-independent core of the splash visualizer: voice state, splat
//! batching, and the fluid step expressed against [`RenderBackend`].

pub mod color;
pub mod config;
pub mod constants;
pub mod envelope;
pub mod frame;
pub mod gpu;
pub mod idle;
pub mod midi;
pub mod note;
pub mod options;
pub mod params;
pub mod pointer;
pub mod post;
pub mod solver;
pub mod splash;
pub mod splat;
pub mod targets;
pub mod uniforms;
pub mod voices;

pub use color::*;
pub use config::*;
pub use envelope::*;
pub use frame::*;
pub use gpu::*;
pub use idle::*;
pub use midi::*;
pub use note::*;
pub use options::*;
pub use params::*;
pub use pointer::*;
pub use post::*;
pub use solver::*;
pub use splash::*;
pub use splat::*;
pub use targets::*;
pub use voices::*;
