//! Page settings
//!
//! Read from a JSON block embedded in the page
//! (`<script id="duck-config" type="application/json">`). Every field has a
//! default, so a missing or partial block is fine.

use serde::{Deserialize, Serialize};

use crate::consts::CONFETTI_COUNT;

/// DOM id of the settings block
pub const CONFIG_ELEMENT_ID: &str = "duck-config";

/// Duck images per mood level, plus the real photo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuckImages {
    /// Index 0 = in love, 1 = happy, 2-8 = anger escalation
    pub levels: Vec<String>,
    /// Shown during meltdown and on the success toggle
    pub photo: String,
}

impl Default for DuckImages {
    fn default() -> Self {
        Self {
            levels: [
                "images/0inlove_duck.png",
                "images/1happy_duck.jpg",
                "images/2neutral_duck.png",
                "images/3little_annoyed_duck.png",
                "images/4little_more_annoyed.png",
                "images/5more_annoyed.png",
                "images/6moremoreannoyed_duck.png",
                "images/7veryvery_annoyed.png",
                "images/sora_clipped_gif.gif",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            photo: "images/happy_alex.jpeg".into(),
        }
    }
}

impl DuckImages {
    /// Image for a mood level, falling back to the happy duck
    pub fn for_level(&self, level: u8) -> &str {
        self.levels
            .get(level as usize)
            .or_else(|| self.levels.get(1))
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Everything worth preloading
    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.levels
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.photo.as_str()))
    }
}

/// Page settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub images: DuckImages,
    /// Confetti pieces per burst
    pub confetti_count: usize,
    /// CSS colors for confetti
    pub palette: Vec<String>,
    /// Fixed RNG seed (clock-seeded when absent)
    pub seed: Option<u64>,
    /// `log` level name ("error" .. "trace")
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            images: DuckImages::default(),
            confetti_count: CONFETTI_COUNT,
            palette: [
                "#e91e63", "#f48fb1", "#ff6090", "#FFD93D", "#ff8a65", "#ce93d8", "#ef5350",
                "#fff176",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            seed: None,
            log_level: "info".into(),
        }
    }
}

impl Settings {
    /// Parse settings JSON, using defaults for missing fields
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse settings JSON, falling back to defaults on any error
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring malformed settings: {}", e);
                Self::default()
            }
        }
    }

    /// Configured log level (unknown names mean Info)
    pub fn level(&self) -> log::Level {
        self.log_level.parse().unwrap_or(log::Level::Info)
    }

    /// Load settings from the page (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let json = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(CONFIG_ELEMENT_ID))
            .and_then(|el| el.text_content());

        match json {
            Some(json) if !json.trim().is_empty() => Self::from_json_or_default(&json),
            _ => Self::default(),
        }
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.confetti_count, 120);
        assert_eq!(settings.palette.len(), 8);
        assert_eq!(settings.images.levels.len(), 9);
        assert_eq!(settings.level(), log::Level::Info);
        assert_eq!(settings.images.all().count(), 10);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{ "seed": 7, "log_level": "debug" }"#).unwrap();
        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.level(), log::Level::Debug);
        assert_eq!(settings.confetti_count, 120);
        assert_eq!(settings.images, DuckImages::default());
    }

    #[test]
    fn test_malformed_json_falls_back() {
        assert_eq!(Settings::from_json_or_default("{ nope"), Settings::default());
        let weird = Settings {
            log_level: "loud".into(),
            ..Default::default()
        };
        assert_eq!(weird.level(), log::Level::Info);
    }

    #[test]
    fn test_image_lookup_falls_back_to_happy() {
        let images = DuckImages::default();
        assert_eq!(images.for_level(0), "images/0inlove_duck.png");
        assert_eq!(images.for_level(8), "images/sora_clipped_gif.gif");
        assert_eq!(images.for_level(30), "images/1happy_duck.jpg");
    }
}
