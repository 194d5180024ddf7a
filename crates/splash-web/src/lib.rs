#![cfg(target_arch = "wasm32")]
use std::cell::RefCell;

use splash_core::{FrameDriver, Options, SimConfig};
use splash_gpu::WgpuBackend;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

mod dom;
mod frame;
mod input;

use frame::GpuState;

const CANVAS_ID: &str = "splash-canvas";

pub struct App {
    pub gpu: GpuState,
    pub driver: FrameDriver<WgpuBackend>,
}

thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
}

/// Run `f` against the running app with the current time in seconds. Does
/// nothing before start-up has finished.
pub(crate) fn with_app<R>(f: impl FnOnce(&mut App, f64) -> R) -> Option<R> {
    APP.with(|app| app.borrow_mut().as_mut().map(|app| f(app, dom::now_secs())))
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("splash-web starting");

    spawn_local(async move {
        if let Err(e) = init().await {
            log::error!("init error: {:?}", e);
        }
    });
    Ok(())
}

async fn init() -> anyhow::Result<()> {
    let document = web::window()
        .and_then(|w| w.document())
        .ok_or_else(|| anyhow::anyhow!("no document"))?;
    let canvas: web::HtmlCanvasElement = document
        .get_element_by_id(CANVAS_ID)
        .ok_or_else(|| anyhow::anyhow!("missing #{CANVAS_ID}"))?
        .dyn_into::<web::HtmlCanvasElement>()
        .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?;
    dom::sync_canvas_backing_size(&canvas);

    let options = Options::from_pairs(dom::query_pairs());
    let mut gpu = GpuState::new(canvas.clone()).await?;
    let mut driver = FrameDriver::new(&mut gpu.backend, SimConfig::default(), options)?;
    driver.start(dom::now_secs());
    APP.with(|app| *app.borrow_mut() = Some(App { gpu, driver }));

    input::install(&canvas)?;
    frame::run_loop();
    Ok(())
}

/// Feed one raw MIDI message from the page (Web MIDI `midimessage` data).
#[wasm_bindgen]
pub fn midi_message(data: &[u8]) {
    with_app(|app, now| app.driver.handle_midi_bytes(data, now));
}

/// Pause or resume the visualizer from the page.
#[wasm_bindgen]
pub fn set_playing(playing: bool) {
    with_app(|app, _| app.driver.set_playing(playing));
}

/// Release every voice on every channel.
#[wasm_bindgen]
pub fn reset_voices() {
    with_app(|app, now| app.driver.registry_mut().reset(now));
}
