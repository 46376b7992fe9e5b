use crate::constants::MAX_PIXEL_RATIO;
use burst_core::Viewport;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

/// Device pixel ratio, capped.
pub fn pixel_ratio() -> f64 {
    web::window()
        .map(|w| w.device_pixel_ratio())
        .unwrap_or(1.0)
        .clamp(1.0, MAX_PIXEL_RATIO)
}

/// Window size and user agent for particle-count classification.
pub fn viewport() -> Viewport {
    let Some(w) = web::window() else {
        return Viewport::new(0.0, 0.0, "");
    };
    let px = |v: Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>| {
        v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
    };
    let user_agent = w.navigator().user_agent().unwrap_or_default();
    Viewport::new(px(w.inner_width()), px(w.inner_height()), user_agent)
}

/// Match the canvas backing store to its CSS size times the capped pixel
/// ratio. Returns the new backing size.
pub fn sync_canvas_backing_size(canvas: &web::HtmlCanvasElement) -> (u32, u32) {
    let dpr = pixel_ratio();
    let rect = canvas.get_bounding_client_rect();
    let w_px = ((rect.width() * dpr) as u32).max(1);
    let h_px = ((rect.height() * dpr) as u32).max(1);
    canvas.set_width(w_px);
    canvas.set_height(h_px);
    (w_px, h_px)
}

/// Listener removed by the browser after its first dispatch.
pub fn add_once_listener(
    target: &web::EventTarget,
    event: &str,
    handler: impl FnOnce() + 'static,
) {
    let options = web::AddEventListenerOptions::new();
    options.set_once(true);
    options.set_passive(true);
    let closure = Closure::once_into_js(handler);
    if let Err(e) = target.add_event_listener_with_callback_and_add_event_listener_options(
        event,
        closure.unchecked_ref(),
        &options,
    ) {
        log::error!("[dom] {} listener error: {:?}", event, e);
    }
}

pub fn add_resize_listener(mut handler: impl FnMut() + 'static) {
    let Some(window) = web::window() else {
        return;
    };
    let closure = Closure::wrap(Box::new(move || handler()) as Box<dyn FnMut()>);
    _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
    closure.forget();
}
