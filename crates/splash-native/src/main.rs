use std::time::Instant;

use glam::Vec2;
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::{ElementState, Event, KeyEvent, MouseButton, Touch, TouchPhase, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

use splash_core::{FrameDriver, Options, RenderBackend, SimConfig, MOUSE_POINTER_ID};
use splash_gpu::{probe_capabilities, WgpuBackend};

mod midi;
mod reload;

use reload::ConfigWatcher;

const WINDOW_SIZE: u32 = 800;

/// Sent by the MIDI thread so an idle loop waiting on window events drains
/// the channel.
#[derive(Debug, Clone, Copy)]
struct MidiPending;

struct GpuState<'w> {
    window: &'w winit::window::Window,
    surface: wgpu::Surface<'w>,
    config: wgpu::SurfaceConfiguration,
    backend: WgpuBackend,
}

impl<'w> GpuState<'w> {
    async fn new(window: &'w winit::window::Window) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No GPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: None,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The display pass writes display-referred values itself.
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);
        let alpha_mode = surface_caps
            .alpha_modes
            .iter()
            .copied()
            .find(|m| *m == wgpu::CompositeAlphaMode::PreMultiplied)
            .unwrap_or(surface_caps.alpha_modes[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            desired_maximum_frame_latency: 2,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let caps = probe_capabilities(&adapter, &device);
        let backend = WgpuBackend::new(device, queue, format, (config.width, config.height), caps);
        Ok(Self {
            window,
            surface,
            config,
            backend,
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(self.backend.device(), &self.config);
        self.backend.set_size(new_size.width, new_size.height);
    }

    fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// One driver tick into the next swapchain image. Nothing is presented
    /// while the driver is not playing.
    fn render(
        &mut self,
        driver: &mut FrameDriver<WgpuBackend>,
        now: f64,
    ) -> Result<(), wgpu::SurfaceError> {
        if !driver.is_playing() {
            return Ok(());
        }
        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.backend.begin_frame(view);
        let report = driver.tick(now, &mut self.backend);
        self.backend.end_frame();
        if let Some(report) = report {
            if report.resized {
                log::debug!("[native] framebuffers reinitialised");
            }
            frame.present();
        }
        Ok(())
    }
}

/// Pointer bookkeeping winit leaves to the application.
#[derive(Default)]
struct MouseState {
    position: Vec2,
    down: bool,
}

fn to_vec2(p: PhysicalPosition<f64>) -> Vec2 {
    Vec2::new(p.x as f32, p.y as f32)
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let options = Options::from_args(std::env::args().skip(1));
    let mut watcher = options.config_path.as_deref().map(ConfigWatcher::new);
    let mut sim_config = SimConfig::default();
    if let Some(loaded) = watcher.as_mut().and_then(|w| w.poll(&sim_config)) {
        sim_config = loaded;
    }

    let event_loop = EventLoopBuilder::<MidiPending>::with_user_event().build()?;
    let proxy = event_loop.create_proxy();
    let listener = match midi::connect(options.port_name.as_deref(), move || {
        // Fails only once the loop has exited.
        let _ = proxy.send_event(MidiPending);
    }) {
        Ok(listener) => Some(listener),
        Err(e) => {
            log::warn!("[midi] {e:#}; available ports: {:?}", midi::list_ports());
            None
        }
    };

    let window = WindowBuilder::new()
        .with_title("fluid-splash")
        .with_inner_size(LogicalSize::new(WINDOW_SIZE, WINDOW_SIZE))
        .build(&event_loop)?;

    let mut state = pollster::block_on(GpuState::new(&window))?;
    let mut driver = FrameDriver::new(&mut state.backend, sim_config, options)?;
    let start = Instant::now();
    let clock = move || start.elapsed().as_secs_f64();
    driver.start(clock());
    let mut mouse = MouseState::default();

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::Resized(size) => state.resize(size),
            WindowEvent::CloseRequested => elwt.exit(),
            WindowEvent::CursorMoved { position, .. } => {
                mouse.position = to_vec2(position);
                if mouse.down {
                    driver.pointer_move(MOUSE_POINTER_ID, mouse.position, state.size(), clock());
                } else {
                    driver.notify_activity(clock());
                }
            }
            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } => match button_state {
                ElementState::Pressed => {
                    mouse.down = true;
                    driver.pointer_down(MOUSE_POINTER_ID, mouse.position, state.size(), clock());
                }
                ElementState::Released => {
                    mouse.down = false;
                    driver.pointer_up(MOUSE_POINTER_ID, clock());
                }
            },
            WindowEvent::Touch(Touch {
                phase, location, id, ..
            }) => {
                let id = id as i64;
                let pos = to_vec2(location);
                match phase {
                    TouchPhase::Started => driver.pointer_down(id, pos, state.size(), clock()),
                    TouchPhase::Moved => driver.pointer_move(id, pos, state.size(), clock()),
                    TouchPhase::Ended | TouchPhase::Cancelled => driver.pointer_up(id, clock()),
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match logical_key {
                Key::Named(NamedKey::Space) => driver.request_random_splats(clock()),
                Key::Character(c) if c.eq_ignore_ascii_case("p") => driver.toggle_paused(clock()),
                Key::Named(NamedKey::Escape) => elwt.exit(),
                _ => driver.notify_activity(clock()),
            },
            _ => {}
        },
        // Wakes the loop; the channel is drained below.
        Event::UserEvent(MidiPending) => {}
        Event::AboutToWait => {
            let now = clock();
            if let Some(listener) = listener.as_ref() {
                for bytes in listener.receiver.try_iter() {
                    if let Some(message) = driver.handle_midi_bytes(&bytes, now) {
                        log::trace!("[midi] {} {message:?}", listener.port_name);
                    }
                }
            }
            if let Some(w) = watcher.as_mut() {
                if let Some(mut loaded) = w.poll(&driver.config) {
                    loaded.degrade_for(&state.backend.capabilities());
                    driver.config = loaded;
                }
            }
            match state.render(&mut driver, now) {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    state.resize(state.window.inner_size())
                }
                Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
                Err(e) => log::warn!("[native] surface: {e}"),
            }
            if driver.is_playing() {
                elwt.set_control_flow(ControlFlow::Poll);
            } else {
                // Idle: sleep until the next window event or MIDI message.
                elwt.set_control_flow(ControlFlow::Wait);
            }
        }
        _ => {}
    })?;
    Ok(())
}
