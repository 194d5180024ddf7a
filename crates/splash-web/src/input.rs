use glam::Vec2;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

use crate::with_app;

/// Pointer position in canvas backing-store pixels.
#[inline]
pub fn pointer_canvas_px(ev: &web::PointerEvent, canvas: &web::HtmlCanvasElement) -> Vec2 {
    let rect = canvas.get_bounding_client_rect();
    let x_css = ev.client_x() as f32 - rect.left() as f32;
    let y_css = ev.client_y() as f32 - rect.top() as f32;
    let w = (rect.width() as f32).max(1.0);
    let h = (rect.height() as f32).max(1.0);
    Vec2::new(
        x_css / w * canvas.width() as f32,
        y_css / h * canvas.height() as f32,
    )
}

fn listen<E: JsCast + 'static>(
    target: &web::EventTarget,
    name: &str,
    mut handler: impl FnMut(E) + 'static,
) -> anyhow::Result<()> {
    let closure = Closure::wrap(Box::new(move |ev: web::Event| {
        if let Ok(ev) = ev.dyn_into::<E>() {
            handler(ev);
        }
    }) as Box<dyn FnMut(web::Event)>);
    target
        .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
        .map_err(|e| anyhow::anyhow!(format!("{name} listener: {e:?}")))?;
    closure.forget();
    Ok(())
}

/// Pointer events on the canvas drive splats; space and `p` on the window
/// trigger random bursts and toggle the simulation.
pub fn install(canvas: &web::HtmlCanvasElement) -> anyhow::Result<()> {
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;

    let c = canvas.clone();
    listen(canvas, "pointerdown", move |ev: web::PointerEvent| {
        let pos = pointer_canvas_px(&ev, &c);
        let size = (c.width(), c.height());
        with_app(|app, now| app.driver.pointer_down(ev.pointer_id() as i64, pos, size, now));
    })?;

    let c = canvas.clone();
    listen(canvas, "pointermove", move |ev: web::PointerEvent| {
        let pos = pointer_canvas_px(&ev, &c);
        let size = (c.width(), c.height());
        with_app(|app, now| app.driver.pointer_move(ev.pointer_id() as i64, pos, size, now));
    })?;

    for name in ["pointerup", "pointercancel", "pointerleave"] {
        listen(canvas, name, move |ev: web::PointerEvent| {
            with_app(|app, now| app.driver.pointer_up(ev.pointer_id() as i64, now));
        })?;
    }

    listen(&window, "keydown", move |ev: web::KeyboardEvent| {
        if ev.repeat() {
            return;
        }
        let key = ev.key();
        with_app(|app, now| match key.as_str() {
            " " => app.driver.request_random_splats(now),
            "p" | "P" => app.driver.toggle_paused(now),
            _ => app.driver.notify_activity(now),
        });
    })?;
    Ok(())
}
