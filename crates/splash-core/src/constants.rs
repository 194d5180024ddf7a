// Shared tuning constants used by the core and both frontends.

// MIDI
pub const MIDI_CHANNELS: usize = 16;
pub const MIDI_MAX_VALUE: f32 = 127.0; // note velocity / controller range
pub const PEDAL_THRESHOLD: u8 = 64; // controller value at which a pedal counts as down

// Controller numbers handled by the voice registry
pub const CC_HOLD: u8 = 64;
pub const CC_SOSTENUTO: u8 = 66;
pub const CC_ALL_SOUNDS_OFF: u8 = 120;
pub const CC_ALL_NOTES_OFF: u8 = 123;
pub const CC_ALL_CONTROLLERS_OFF: u8 = 127;

// Note splashes
pub const SECONDS_PER_ROTATION: f64 = 10.0; // one revolution of the splash ring
pub const SPLASH_FORCE_SCALE: f32 = 100_000.0; // point delta -> velocity force
pub const SPLASH_ATTENUATION: f32 = 40.0;
pub const SPLASH_MIN_RIM_INSET: f32 = 0.1; // lower bound on splat radius used to pull the rim inwards
pub const SPLASH_RADIUS_EXPONENT: i32 = 8;

// Pointer and random splats
pub const POINTER_COLOR_SCALE: f32 = 0.15;
pub const RANDOM_SPLAT_COLOR_SCALE: f32 = 10.0;
pub const RANDOM_SPLAT_FORCE: f32 = 1000.0;
pub const RANDOM_SPLAT_MIN: usize = 5;
pub const RANDOM_SPLAT_SPREAD: usize = 20;

// Splat program capacity; the uniform array in the splat shader has this many slots
pub const MAX_SPLAT_BATCH: usize = 64;

// Frame timing
pub const MAX_FRAME_DT: f32 = 0.016666; // seconds; longer gaps are clamped

// Framebuffer sizing
pub const DEGRADED_DYE_RESOLUTION: u32 = 512; // used without half-float linear filtering
pub const MIN_BLOOM_LEVEL_SIZE: u32 = 2;
pub const SUNRAYS_BLUR_ITERATIONS: u32 = 1;

// Parameter animation
pub const PARAMETER_STAY_SECONDS: f64 = 5.0;
pub const PARAMETER_TWEEN_SECONDS: f64 = 10.0;

// Host options
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CHANNEL_MASK: u16 = 0xFFFF;
