use std::cell::Cell;
use std::rc::Rc;

use js_sys::{Function, Reflect};
use mapty::Coords;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

/// One-shot position request. Exactly one of the callbacks runs, at most once;
/// a missing geolocation capability reports through `on_error` immediately.
pub fn request_position<S, E>(on_success: S, on_error: E)
where
    S: FnOnce(Coords) + 'static,
    E: FnOnce(String) + 'static,
{
    let on_error = Rc::new(Cell::new(Some(on_error)));

    let Some(geolocation) = web_sys::window().and_then(|w| w.navigator().geolocation().ok()) else {
        fire(&on_error, "geolocation is not available".to_string());
        return;
    };

    let success = {
        let on_error = on_error.clone();
        Closure::once_into_js(move |position: JsValue| match position_coords(&position) {
            Some(coords) => on_success(coords),
            None => fire(&on_error, "position had no coordinates".to_string()),
        })
    };
    let failure = {
        let on_error = on_error.clone();
        Closure::once_into_js(move |err: JsValue| {
            let message = Reflect::get(&err, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
                .unwrap_or_else(|| "position request denied".to_string());
            fire(&on_error, message);
        })
    };

    if let Err(err) = geolocation.get_current_position_with_error_callback(
        success.unchecked_ref::<Function>(),
        Some(failure.unchecked_ref::<Function>()),
    ) {
        fire(
            &on_error,
            err.as_string()
                .unwrap_or_else(|| "position request failed".to_string()),
        );
    }
}

fn fire<E: FnOnce(String)>(slot: &Cell<Option<E>>, message: String) {
    if let Some(f) = slot.take() {
        f(message);
    }
}

fn position_coords(position: &JsValue) -> Option<Coords> {
    let coords = Reflect::get(position, &JsValue::from_str("coords")).ok()?;
    let lat = Reflect::get(&coords, &JsValue::from_str("latitude")).ok()?.as_f64()?;
    let lng = Reflect::get(&coords, &JsValue::from_str("longitude")).ok()?.as_f64()?;
    Some(Coords::new(lat, lng))
}
