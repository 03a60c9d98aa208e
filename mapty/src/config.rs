use serde::{Deserialize, Serialize};

pub const DEFAULT_STORAGE_KEY: &str = "workouts";
pub const DEFAULT_ZOOM: u8 = 16;
pub const DEFAULT_TILE_URL: &str = "https://{s}.tile.openstreetmap.fr/hot/{z}/{x}/{y}.png";
pub const DEFAULT_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";

/// Tunables shared by the web and CLI front ends. Every field has a default,
/// so a partial JSON override only names what it changes.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    pub storage_key: String,
    pub zoom: u8,
    pub tile_url: String,
    pub attribution: String,
    pub pan_duration_s: f64,
    pub popup_max_width: u32,
    pub popup_min_width: u32,
    pub form_redisplay_ms: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            zoom: DEFAULT_ZOOM,
            tile_url: DEFAULT_TILE_URL.to_string(),
            attribution: DEFAULT_ATTRIBUTION.to_string(),
            pan_duration_s: 1.0,
            popup_max_width: 250,
            popup_min_width: 100,
            form_redisplay_ms: 600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_override_keeps_defaults() {
        let cfg: TrackerConfig =
            serde_json::from_str(r#"{ "storage_key": "alt", "zoom": 13 }"#).unwrap();
        assert_eq!(cfg.storage_key, "alt");
        assert_eq!(cfg.zoom, 13);
        assert_eq!(cfg.popup_max_width, 250);
        assert_eq!(cfg.form_redisplay_ms, 600);
    }
}
