use mapty::{MaptyError, Storage};
use wasm_bindgen::JsValue;

/// `window.localStorage`. When the browser refuses access (private mode,
/// disabled storage) reads come back empty and writes fail.
pub struct BrowserStorage {
    inner: Option<web_sys::Storage>,
}

impl BrowserStorage {
    pub fn local() -> Self {
        let inner = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        if inner.is_none() {
            web_sys::console::warn_1(&"localStorage unavailable; workouts will not persist".into());
        }
        Self { inner }
    }

    fn inner(&self) -> Result<&web_sys::Storage, MaptyError> {
        self.inner
            .as_ref()
            .ok_or_else(|| MaptyError::Storage("localStorage unavailable".to_string()))
    }
}

impl Storage for BrowserStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, MaptyError> {
        match &self.inner {
            Some(storage) => storage.get_item(key).map_err(js_err),
            None => Ok(None),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), MaptyError> {
        self.inner()?.set_item(key, value).map_err(js_err)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), MaptyError> {
        self.inner()?.remove_item(key).map_err(js_err)
    }
}

fn js_err(err: JsValue) -> MaptyError {
    MaptyError::Storage(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}
