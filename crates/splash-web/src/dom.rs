use wasm_bindgen::JsCast;
use web_sys as web;

/// Size the canvas backing store to the largest square that fits its CSS
/// box, in device pixels. Returns the new size.
pub fn sync_canvas_backing_size(canvas: &web::HtmlCanvasElement) -> (u32, u32) {
    let dpr = web::window().map_or(1.0, |w| w.device_pixel_ratio());
    let rect = canvas.get_bounding_client_rect();
    let side = ((rect.width().min(rect.height()) * dpr) as u32).max(1);
    if canvas.width() != side || canvas.height() != side {
        canvas.set_width(side);
        canvas.set_height(side);
    }
    (side, side)
}

/// `key=value` pairs from the page's query string.
pub fn query_pairs() -> Vec<(String, String)> {
    let Some(search) = web::window().and_then(|w| w.location().search().ok()) else {
        return Vec::new();
    };
    let Ok(params) = web::UrlSearchParams::new_with_str(&search) else {
        return Vec::new();
    };
    let Ok(Some(entries)) = js_sys::try_iter(params.as_ref()) else {
        return Vec::new();
    };
    entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let pair: js_sys::Array = entry.dyn_into().ok()?;
            Some((pair.get(0).as_string()?, pair.get(1).as_string()?))
        })
        .collect()
}

pub fn now_secs() -> f64 {
    instant::now() / 1000.0
}
