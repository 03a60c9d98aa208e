//! Bindings to the global Leaflet object (`window.L`), driven through
//! `js_sys::Reflect` so no Leaflet typings are needed at build time.

use js_sys::{Array, Function, Reflect};
use mapty::{Coords, PopupSpec, TrackerConfig};
use serde::Serialize;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

pub struct LeafletMap {
    map: JsValue,
    zoom: u8,
    pan_duration_s: f64,
    click: Option<Closure<dyn FnMut(JsValue)>>,
}

impl LeafletMap {
    /// Creates the map inside `container_id`, centered on `center`, with the
    /// configured tile layer attached.
    pub fn mount(container_id: &str, center: Coords, config: &TrackerConfig) -> Result<Self, JsValue> {
        let l = leaflet()?;
        let map = call(&l, "map", &[&JsValue::from_str(container_id)])?;
        call(&map, "setView", &[&lat_lng(center), &JsValue::from(config.zoom)])?;

        let tile_opts = to_js(&serde_json::json!({ "attribution": config.attribution }))?;
        let layer = call(&l, "tileLayer", &[&JsValue::from_str(&config.tile_url), &tile_opts])?;
        call(&layer, "addTo", &[&map])?;

        Ok(Self {
            map,
            zoom: config.zoom,
            pan_duration_s: config.pan_duration_s,
            click: None,
        })
    }

    /// Routes map clicks to `handler`. Replaces any earlier handler's closure;
    /// the registered closure lives as long as the map.
    pub fn on_click(&mut self, mut handler: impl FnMut(Coords) + 'static) -> Result<(), JsValue> {
        let closure = Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
            match event_coords(&event) {
                Ok(coords) => handler(coords),
                Err(err) => web_sys::console::error_2(&"map click without latlng".into(), &err),
            }
        });
        call(&self.map, "on", &[&JsValue::from_str("click"), closure.as_ref()])?;
        self.click = Some(closure);
        Ok(())
    }

    /// Places a marker with an already-open popup.
    pub fn add_marker(&self, coords: Coords, popup: &PopupSpec) -> Result<(), JsValue> {
        let l = leaflet()?;
        let marker = call(&l, "marker", &[&lat_lng(coords)])?;
        call(&marker, "addTo", &[&self.map])?;

        let popup_js = call(&l, "popup", &[&to_js(popup)?])?;
        call(&popup_js, "setContent", &[&JsValue::from_str(&popup.content)])?;
        call(&marker, "bindPopup", &[&popup_js])?;
        call(&marker, "openPopup", &[])?;
        Ok(())
    }

    /// Animated re-center at the configured zoom.
    pub fn pan_to(&self, coords: Coords) -> Result<(), JsValue> {
        let opts = to_js(&serde_json::json!({
            "animate": true,
            "pan": { "duration": self.pan_duration_s }
        }))?;
        call(
            &self.map,
            "setView",
            &[&lat_lng(coords), &JsValue::from(self.zoom), &opts],
        )?;
        Ok(())
    }
}

fn leaflet() -> Result<JsValue, JsValue> {
    let l = Reflect::get(&js_sys::global(), &JsValue::from_str("L"))?;
    if l.is_undefined() || l.is_null() {
        return Err(JsValue::from_str("Leaflet is not loaded (window.L missing)"));
    }
    Ok(l)
}

fn call(target: &JsValue, method: &str, args: &[&JsValue]) -> Result<JsValue, JsValue> {
    let func = Reflect::get(target, &JsValue::from_str(method))?
        .dyn_into::<Function>()
        .map_err(|_| JsValue::from_str(&format!("Leaflet object has no method {method}")))?;
    let js_args = Array::new();
    for arg in args {
        js_args.push(arg);
    }
    Reflect::apply(&func, target, &js_args)
}

// Plain objects, not ES Maps: Leaflet reads options by property.
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

fn lat_lng(coords: Coords) -> JsValue {
    Array::of2(&JsValue::from(coords.lat), &JsValue::from(coords.lng)).into()
}

fn event_coords(event: &JsValue) -> Result<Coords, JsValue> {
    let latlng = Reflect::get(event, &JsValue::from_str("latlng"))?;
    let lat = Reflect::get(&latlng, &JsValue::from_str("lat"))?.as_f64();
    let lng = Reflect::get(&latlng, &JsValue::from_str("lng"))?.as_f64();
    match (lat, lng) {
        (Some(lat), Some(lng)) => Ok(Coords::new(lat, lng)),
        _ => Err(latlng),
    }
}
