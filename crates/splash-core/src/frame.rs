//! Per-frame scheduling.
//!
//! The host calls [`FrameDriver::tick`] once per display refresh with its
//! monotonic clock in seconds. Within a tick the order is fixed: resize
//! targets, drain input into the splat queue, drain the queue into the
//! fields, step the solver, render. The driver never reschedules itself;
//! while stopped or paused a tick does nothing.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::color::{random_color, Rgb};
use crate::config::{FramebufferKey, SimConfig};
use crate::constants::{
    MAX_FRAME_DT, POINTER_COLOR_SCALE, RANDOM_SPLAT_COLOR_SCALE, RANDOM_SPLAT_FORCE, RANDOM_SPLAT_MIN,
    RANDOM_SPLAT_SPREAD,
};
use crate::envelope::Envelope;
use crate::gpu::{Filtering, GpuError, RenderBackend};
use crate::idle::IdleDetector;
use crate::midi::{decode, MidiMessage};
use crate::options::Options;
use crate::params::{ParameterAnimator, PRESETS};
use crate::pointer::Pointers;
use crate::post::Compositor;
use crate::solver::FluidSolver;
use crate::splat::{DrainStats, Splat, SplatQueue};
use crate::voices::VoiceRegistry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayState {
    Stopped,
    Playing,
    Paused,
}

/// Play clock that excludes paused spans from elapsed time.
#[derive(Clone, Debug)]
struct Clock {
    state: PlayState,
    origin: f64,
    paused_total: f64,
    pause_start: f64,
    current: f64,
    last_tick: Option<f64>,
    resuming: bool,
}

impl Clock {
    fn stopped() -> Self {
        Self {
            state: PlayState::Stopped,
            origin: 0.0,
            paused_total: 0.0,
            pause_start: 0.0,
            current: 0.0,
            last_tick: None,
            resuming: false,
        }
    }

    fn started(now: f64) -> Self {
        Self {
            state: PlayState::Playing,
            origin: now,
            current: now,
            ..Self::stopped()
        }
    }

    fn elapsed(&self) -> f64 {
        self.current - self.origin - self.paused_total
    }

    fn pause(&mut self) {
        self.pause_start = self.current;
        self.state = PlayState::Paused;
    }

    fn resume(&mut self) {
        self.state = PlayState::Playing;
        self.resuming = true;
    }

    /// Seconds since the previous tick; zero on the first tick after a start
    /// or a resume.
    fn advance(&mut self, now: f64) -> f64 {
        if self.resuming {
            self.paused_total += (now - self.pause_start).max(0.0);
            self.last_tick = None;
            self.resuming = false;
        }
        let dt = self.last_tick.map_or(0.0, |last| now - last);
        self.last_tick = Some(now);
        self.current = now;
        dt
    }
}

/// Frame statistics returned by [`FrameDriver::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub dt: f32,
    pub resized: bool,
    pub splats: DrainStats,
    pub stepped: bool,
}

pub struct FrameDriver<B: RenderBackend> {
    pub config: SimConfig,
    options: Options,
    solver: FluidSolver<B>,
    compositor: Compositor<B>,
    registry: VoiceRegistry,
    queue: SplatQueue,
    pointers: Pointers,
    animator: Option<ParameterAnimator>,
    idle: IdleDetector,
    clock: Clock,
    rng: StdRng,
    bursts: Vec<usize>,
    color_timer: f32,
    drawing_size: Option<(u32, u32)>,
    framebuffers: Option<FramebufferKey>,
}

impl<B: RenderBackend> FrameDriver<B> {
    /// Compile every program. A program that fails to build is fatal.
    pub fn new(backend: &mut B, mut config: SimConfig, options: Options) -> Result<Self, GpuError> {
        let caps = backend.capabilities();
        config.degrade_for(&caps);
        let filtering = if caps.linear_filtering {
            Filtering::Linear
        } else {
            Filtering::Nearest
        };
        let solver = FluidSolver::new(backend, &caps)?;
        let compositor = Compositor::new(backend, &config, filtering)?;
        let seed = options.seed.unwrap_or_else(rand::random);
        let mut registry = VoiceRegistry::new(Envelope::default(), seed);
        registry.set_velocity_map(options.velocity_map);
        let animator = config
            .animate_parameters
            .then(|| ParameterAnimator::new(&mut config, PRESETS.to_vec(), seed ^ 0x5EED));
        log::info!(
            "[driver] ready: mask={:?} batch={} idle={}s",
            options.channel_mask,
            options.splat_group_size,
            options.idle_timeout
        );
        Ok(Self {
            idle: IdleDetector::new(options.idle_timeout),
            config,
            options,
            solver,
            compositor,
            registry,
            queue: SplatQueue::new(),
            pointers: Pointers::new(),
            animator,
            clock: Clock::stopped(),
            rng: StdRng::seed_from_u64(seed.wrapping_add(1)),
            bursts: Vec::new(),
            color_timer: 0.0,
            drawing_size: None,
            framebuffers: None,
        })
    }

    pub fn state(&self) -> PlayState {
        self.clock.state
    }

    pub fn is_playing(&self) -> bool {
        self.clock.state == PlayState::Playing
    }

    /// Play time in seconds, excluding pauses.
    pub fn elapsed(&self) -> f64 {
        self.clock.elapsed()
    }

    pub fn start(&mut self, now: f64) {
        self.clock = Clock::started(now);
        self.idle.touch(now);
        log::info!("[driver] start");
    }

    pub fn stop(&mut self) {
        self.clock = Clock::stopped();
        log::info!("[driver] stop");
    }

    /// Pause or resume. Has no effect while stopped.
    pub fn set_playing(&mut self, playing: bool) {
        match (self.clock.state, playing) {
            (PlayState::Playing, false) => {
                self.clock.pause();
                log::info!("[driver] paused");
            }
            (PlayState::Paused, true) => {
                self.clock.resume();
                log::info!("[driver] resumed");
            }
            _ => {}
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn registry(&self) -> &VoiceRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut VoiceRegistry {
        &mut self.registry
    }

    pub fn queue(&self) -> &SplatQueue {
        &self.queue
    }

    pub fn solver(&self) -> &FluidSolver<B> {
        &self.solver
    }

    pub fn compositor(&self) -> &Compositor<B> {
        &self.compositor
    }

    /// Append one splat; coordinates are normalized, colour is additive.
    #[allow(clippy::too_many_arguments)]
    pub fn enqueue_splat(
        &mut self,
        x: f32,
        y: f32,
        dx: f32,
        dy: f32,
        color: Rgb,
        attenuation: Option<f32>,
        radius: Option<f32>,
    ) {
        self.queue.enqueue(x, y, dx, dy, color, attenuation, radius);
    }

    /// Decode raw bytes through the channel mask and apply the result. A
    /// message that gets through counts as activity.
    pub fn handle_midi_bytes(&mut self, bytes: &[u8], now: f64) -> Option<MidiMessage> {
        let message = decode(bytes, self.options.channel_mask)?;
        self.notify_activity(now);
        self.registry.handle(message, now);
        Some(message)
    }

    /// Record pointer, keyboard or MIDI activity, resuming from an idle pause.
    pub fn notify_activity(&mut self, now: f64) {
        self.idle.touch(now);
        if self.clock.state == PlayState::Paused {
            self.set_playing(true);
        }
    }

    pub fn pointer_down(&mut self, id: i64, pos: Vec2, size: (u32, u32), now: f64) {
        self.notify_activity(now);
        self.pointers.down(id, pos, size, &mut self.rng);
    }

    pub fn pointer_move(&mut self, id: i64, pos: Vec2, size: (u32, u32), now: f64) {
        self.notify_activity(now);
        self.pointers.moved(id, pos, size);
    }

    pub fn pointer_up(&mut self, id: i64, now: f64) {
        self.notify_activity(now);
        self.pointers.up(id);
    }

    /// Queue a burst of random splats for the next frame.
    pub fn request_random_splats(&mut self, now: f64) {
        self.notify_activity(now);
        let amount = RANDOM_SPLAT_MIN + self.rng.gen_range(0..RANDOM_SPLAT_SPREAD);
        self.bursts.push(amount);
    }

    pub fn toggle_paused(&mut self, now: f64) {
        self.notify_activity(now);
        self.config.paused = !self.config.paused;
        log::info!("[driver] simulation paused={}", self.config.paused);
    }

    /// Run one frame. Returns `None` without touching the backend when the
    /// driver is not playing.
    pub fn tick(&mut self, now: f64, backend: &mut B) -> Option<FrameReport> {
        if self.clock.state != PlayState::Playing {
            return None;
        }
        if self.idle.is_idle(now) {
            log::info!("[driver] idle for {}s", self.idle.timeout());
            self.set_playing(false);
            return None;
        }
        let dt = (self.clock.advance(now) as f32).clamp(0.0, MAX_FRAME_DT);
        let mut report = FrameReport {
            dt,
            ..Default::default()
        };

        report.resized = self.resize_if_needed(backend);

        if let Some(animator) = self.animator.as_mut() {
            if self.config.animate_parameters && !self.options.pause_parameter_animation {
                animator.update(self.clock.elapsed(), &mut self.config);
            }
        }
        self.update_colors(dt);
        self.apply_inputs(now);

        report.splats = self.solver.apply_splats(
            backend,
            &mut self.queue,
            self.options.splat_group_size,
            &self.config,
        );
        if !self.config.paused {
            self.solver.step(backend, &self.config, dt);
            report.stepped = true;
        }
        if let Some(fields) = self.solver.fields() {
            self.compositor.render(backend, fields, &self.config);
        }
        Some(report)
    }

    fn resize_if_needed(&mut self, backend: &mut B) -> bool {
        let size = backend.drawing_buffer_size();
        let key = self.config.framebuffer_key();
        if self.drawing_size == Some(size) && self.framebuffers == Some(key) {
            return false;
        }
        self.solver.init_fields(backend, &self.config);
        self.compositor.init_targets(backend, &self.config);
        self.drawing_size = Some(size);
        self.framebuffers = Some(key);
        true
    }

    fn update_colors(&mut self, dt: f32) {
        if !self.config.colorful {
            return;
        }
        self.color_timer += dt * self.config.color_update_speed;
        if self.color_timer >= 1.0 {
            self.color_timer = self.color_timer.fract();
            self.pointers.recolor(&mut self.rng);
        }
    }

    fn apply_inputs(&mut self, now: f64) {
        if let Some(amount) = self.bursts.pop() {
            for _ in 0..amount {
                let color = random_color(&mut self.rng, 1.0, 1.0)
                    .scale(POINTER_COLOR_SCALE * RANDOM_SPLAT_COLOR_SCALE);
                let point = Vec2::new(self.rng.gen(), self.rng.gen());
                let force = Vec2::new(
                    RANDOM_SPLAT_FORCE * (self.rng.gen::<f32>() - 0.5),
                    RANDOM_SPLAT_FORCE * (self.rng.gen::<f32>() - 0.5),
                );
                self.queue.push(Splat::new(point, force, color));
            }
        }
        self.pointers.flush_moves(self.config.splat_force, &mut self.queue);
        self.registry.tick(now, &self.config, &mut self.queue);
    }
}
