use std::cell::RefCell;
use std::rc::Rc;

use splash_gpu::{probe_capabilities, WgpuBackend};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

use crate::{dom, with_app};

pub struct GpuState {
    canvas: web::HtmlCanvasElement,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    pub backend: WgpuBackend,
}

impl GpuState {
    pub async fn new(canvas: web::HtmlCanvasElement) -> anyhow::Result<Self> {
        let width = canvas.width().max(1);
        let height = canvas.height().max(1);

        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No WebGPU adapter"))?;
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
            .await
            .map_err(|e| anyhow::anyhow!(format!("request_device error: {:?}", e)))?;
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(caps.formats[0]);
        let alpha_mode = caps
            .alpha_modes
            .iter()
            .copied()
            .find(|m| *m == wgpu::CompositeAlphaMode::PreMultiplied)
            .unwrap_or(caps.alpha_modes[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let caps = probe_capabilities(&adapter, &device);
        let backend = WgpuBackend::new(device, queue, format, (width, height), caps);
        Ok(Self {
            canvas,
            surface,
            config,
            backend,
        })
    }

    /// Follow CSS layout changes of the canvas.
    fn sync_size(&mut self) {
        let (width, height) = dom::sync_canvas_backing_size(&self.canvas);
        if (width, height) == (self.config.width, self.config.height) {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(self.backend.device(), &self.config);
        self.backend.set_size(width, height);
        log::info!("[web] canvas {width}x{height}");
    }
}

impl crate::App {
    fn frame(&mut self, now: f64) {
        self.gpu.sync_size();
        if !self.driver.is_playing() {
            return;
        }
        let frame = match self.gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("[web] surface: {e}");
                self.gpu.surface.configure(self.gpu.backend.device(), &self.gpu.config);
                return;
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.gpu.backend.begin_frame(view);
        let report = self.driver.tick(now, &mut self.gpu.backend);
        self.gpu.backend.end_frame();
        if report.is_some() {
            frame.present();
        }
    }
}

/// Drive [`crate::App::frame`] from `requestAnimationFrame` for the life of
/// the page.
pub fn run_loop() {
    let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let tick_clone = tick.clone();
    *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        with_app(|app, now| app.frame(now));
        if let (Some(w), Some(cb)) = (web::window(), tick_clone.borrow().as_ref()) {
            let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut()>));
    if let (Some(w), Some(cb)) = (web::window(), tick.borrow().as_ref()) {
        let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}
